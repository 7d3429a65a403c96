pub(crate) mod app_info;
pub(crate) mod command;
pub(crate) mod device_info;
pub(crate) mod forward_item;
pub(crate) mod process_record;

pub use app_info::{parse_app_info, AppInfo};
pub use command::AdbCommand;
pub use device_info::AdbDeviceInfo;
pub use forward_item::{parse_forward_list, ForwardItem};
pub use process_record::{parse_jdwp_pids, parse_table, ProcessRecord, DEFAULT_PS_FIELDS};
