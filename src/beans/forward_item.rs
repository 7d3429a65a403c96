/// One `serial local remote` row of `forward --list` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardItem {
    pub serial: String,
    pub local: String,
    pub remote: String,
}

impl ForwardItem {
    pub fn new(serial: &str, local: &str, remote: &str) -> ForwardItem {
        ForwardItem {
            serial: serial.to_string(),
            local: local.to_string(),
            remote: remote.to_string(),
        }
    }
}

/// Parse `forward --list` output. Lines that do not have exactly three
/// columns are ignored.
pub fn parse_forward_list(raw: &str) -> Vec<ForwardItem> {
    let mut items = vec![];
    for line in raw.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() == 3 {
            items.push(ForwardItem::new(parts[0], parts[1], parts[2]));
        }
    }
    items
}
