use std::fmt;
use thiserror::Error;

/// Errors produced while driving the bridge binary.
#[derive(Error, Debug)]
pub enum AdbError {
    /// The adb/sdb executable could not be located.
    #[error("Binary not found: {message}")]
    BinaryNotFound { message: String },

    /// No attached device matches the requested serial.
    #[error("Device not found: {serial}")]
    DeviceNotFound { serial: String },

    /// A spawned command exited unsuccessfully.
    #[error("Command execution failed: {command}, reason: {reason}")]
    CommandFailed { command: String, reason: String },

    /// Command output did not have the shape the caller required.
    #[error("Parse error: {message}")]
    ParseError { message: String },

    /// Package level failure (install, uninstall, clear).
    #[error("Application error: {package_name} - {message}")]
    ApplicationError {
        package_name: String,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Parse number error: {0}")]
    ParseInt(#[from] std::num::ParseIntError),

    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),

    /// Anything that does not fit the categories above.
    #[error("Unknown error: {message}")]
    Unknown { message: String },
}

/// Result alias used throughout the crate.
pub type AdbResult<T> = Result<T, AdbError>;

impl AdbError {
    /// Build an `Unknown` error from anything that implements `Display`.
    pub fn from_display<E: fmt::Display>(err: E) -> Self {
        AdbError::Unknown {
            message: err.to_string(),
        }
    }

    pub fn binary_not_found<S: Into<String>>(message: S) -> Self {
        AdbError::BinaryNotFound {
            message: message.into(),
        }
    }

    pub fn device_not_found<S: Into<String>>(serial: S) -> Self {
        AdbError::DeviceNotFound {
            serial: serial.into(),
        }
    }

    pub fn command_failed<S1: Into<String>, S2: Into<String>>(command: S1, reason: S2) -> Self {
        AdbError::CommandFailed {
            command: command.into(),
            reason: reason.into(),
        }
    }

    pub fn parse_error<S: Into<String>>(message: S) -> Self {
        AdbError::ParseError {
            message: message.into(),
        }
    }

    pub fn application_error<S1: Into<String>, S2: Into<String>>(
        package_name: S1,
        message: S2,
    ) -> Self {
        AdbError::ApplicationError {
            package_name: package_name.into(),
            message: message.into(),
        }
    }

    pub fn unknown<S: Into<String>>(message: S) -> Self {
        AdbError::Unknown {
            message: message.into(),
        }
    }

    /// Whether retrying the same call could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AdbError::Io(_))
    }

    /// Whether the error is fatal and a retry is pointless.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AdbError::BinaryNotFound { .. }
                | AdbError::DeviceNotFound { .. }
                | AdbError::ParseError { .. }
        )
    }

    /// Short machine readable code for the error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AdbError::BinaryNotFound { .. } => "BINARY_NOT_FOUND",
            AdbError::DeviceNotFound { .. } => "DEVICE_NOT_FOUND",
            AdbError::CommandFailed { .. } => "COMMAND_FAILED",
            AdbError::ParseError { .. } => "PARSE_ERROR",
            AdbError::ApplicationError { .. } => "APPLICATION_ERROR",
            AdbError::Io(_) => "IO_ERROR",
            AdbError::Utf8(_) => "UTF8_ERROR",
            AdbError::ParseInt(_) => "PARSE_INT_ERROR",
            AdbError::Anyhow(_) => "ANYHOW_ERROR",
            AdbError::Unknown { .. } => "UNKNOWN_ERROR",
        }
    }
}

/// Extension methods for converting foreign results into `AdbResult`.
pub trait AdbResultExt<T> {
    fn to_adb_error(self) -> AdbResult<T>;

    /// Add context, named to avoid clashing with `anyhow::Context`.
    fn with_adb_context<F>(self, f: F) -> AdbResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> AdbResultExt<T> for anyhow::Result<T> {
    fn to_adb_error(self) -> AdbResult<T> {
        self.map_err(AdbError::Anyhow)
    }

    fn with_adb_context<F>(self, f: F) -> AdbResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AdbError::Anyhow(e.context(f())))
    }
}

impl<T> AdbResultExt<T> for Result<T, std::io::Error> {
    fn to_adb_error(self) -> AdbResult<T> {
        self.map_err(AdbError::Io)
    }

    fn with_adb_context<F>(self, f: F) -> AdbResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AdbError::Io(std::io::Error::new(e.kind(), format!("{}: {}", f(), e))))
    }
}

#[macro_export]
macro_rules! adb_bail {
    ($err:expr) => {
        return Err($err.into())
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::errors::AdbError::unknown(format!($fmt, $($arg)*)))
    };
}

#[macro_export]
macro_rules! adb_ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err.into());
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            return Err($crate::errors::AdbError::unknown(format!($fmt, $($arg)*)));
        }
    };
}
