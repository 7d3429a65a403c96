use std::collections::HashMap;

/// Aggregate of identifying device properties. Every key the aggregate
/// collects is present in the map; a failed lookup is stored as `None`
/// instead of being omitted.
#[derive(Debug)]
pub struct AdbDeviceInfo {
    pub serial: Option<String>,
    pub properties: HashMap<String, Option<String>>,
}

impl AdbDeviceInfo {
    pub fn new(serial: Option<String>) -> AdbDeviceInfo {
        AdbDeviceInfo {
            serial,
            properties: HashMap::new(),
        }
    }

    /// Value of a property, flattening the absent marker.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(|v| v.as_deref())
    }
}
