pub mod adb_config;
pub mod command_runner;

pub use adb_config::AdbConfig;
pub use command_runner::{
    CommandRunner, EventStream, ProcessEvent, SpawnOptions, TokioCommandRunner,
};
