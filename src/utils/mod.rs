use crate::errors::{AdbError, AdbResult};
use std::net::TcpListener;
use std::path::PathBuf;
use tracing::Level;
use which::which;

#[cfg(windows)]
pub const ADB_BIN_NAME: &'static str = "adb.exe";
#[cfg(not(windows))]
pub const ADB_BIN_NAME: &'static str = "adb";

const ADBUTIL_ADB_PATH: &'static str = "ADBUTIL_ADB_PATH";

/// Locate the bridge binary: the `ADBUTIL_ADB_PATH` environment variable
/// wins, otherwise the executable is looked up on `PATH`.
pub fn adb_path() -> AdbResult<PathBuf> {
    let adb_env = std::env::var(ADBUTIL_ADB_PATH);
    if let Ok(path) = adb_env {
        Ok(PathBuf::from(path))
    } else {
        match which(ADB_BIN_NAME) {
            Ok(path) => Ok(path),
            Err(_) => Err(AdbError::binary_not_found(format!(
                "{} not found in PATH",
                ADB_BIN_NAME
            ))),
        }
    }
}

/// Ask the OS for a currently unused local TCP port.
pub fn get_free_port() -> AdbResult<u16> {
    let socket = TcpListener::bind("127.0.0.1:0")?;
    Ok(socket.local_addr()?.port())
}

/// Install a global fmt subscriber. Repeat calls are harmless.
pub fn init_logger() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .try_init();
}
