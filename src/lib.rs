pub mod beans;
pub mod client;
pub mod errors;
pub mod runners;
pub mod utils;

pub use beans::{AdbCommand, AdbDeviceInfo, AppInfo, ForwardItem, ProcessRecord};
pub use client::{AdbClient, AdbDevice};
pub use errors::{AdbError, AdbResult};
pub use runners::{
    AdbConfig, CommandRunner, EventStream, ProcessEvent, SpawnOptions, TokioCommandRunner,
};
pub use utils::adb_path;
