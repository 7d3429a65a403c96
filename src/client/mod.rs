pub mod adb_client;
pub mod adb_device;

pub use adb_client::AdbClient;
pub use adb_device::AdbDevice;
