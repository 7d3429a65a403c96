use crate::utils::{adb_path, ADB_BIN_NAME};
use std::path::PathBuf;

/// Which bridge binary to invoke.
///
/// The default resolves through `ADBUTIL_ADB_PATH` and then `PATH`; when
/// neither yields a hit the bare name is kept and resolution is left to
/// the OS at spawn time. Pointing `bin` at an sdb style tool works the
/// same way, nothing else in the crate assumes the binary is adb.
#[derive(Clone, Debug)]
pub struct AdbConfig {
    pub bin: PathBuf,
}

impl Default for AdbConfig {
    fn default() -> Self {
        AdbConfig {
            bin: adb_path().unwrap_or_else(|_| PathBuf::from(ADB_BIN_NAME)),
        }
    }
}

impl AdbConfig {
    pub fn new<T: Into<PathBuf>>(bin: T) -> Self {
        Self { bin: bin.into() }
    }

    pub fn set_bin<T: Into<PathBuf>>(&mut self, bin: T) {
        self.bin = bin.into();
    }

    /// The binary as a displayable program string for `Command::new`.
    pub fn bin_str(&self) -> String {
        self.bin.to_string_lossy().to_string()
    }
}
