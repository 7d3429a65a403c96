use crate::adb_ensure;
use crate::client::adb_device::AdbDevice;
use crate::errors::{AdbError, AdbResult};
use crate::runners::{AdbConfig, CommandRunner, TokioCommandRunner};
use futures_core::Stream;
use futures_util::stream;
use log::info;
use std::fmt;
use std::sync::Arc;

/// Host side view of the bridge: server management and device discovery.
pub struct AdbClient {
    pub config: AdbConfig,
    runner: Arc<dyn CommandRunner>,
}

impl Default for AdbClient {
    fn default() -> Self {
        AdbClient::new(AdbConfig::default())
    }
}

impl fmt::Debug for AdbClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdbClient")
            .field("config", &self.config)
            .finish()
    }
}

impl AdbClient {
    pub fn new(config: AdbConfig) -> Self {
        Self::with_runner(config, Arc::new(TokioCommandRunner))
    }

    /// Build a client over a caller supplied runner.
    pub fn with_runner(config: AdbConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    async fn host_output(&self, args: &[&str]) -> AdbResult<String> {
        let args: Vec<String> = args.iter().map(|x| x.to_string()).collect();
        self.runner.output(&self.config.bin_str(), &args).await
    }

    /// All attached devices currently in the `device` state.
    pub async fn list_devices(&self) -> AdbResult<Vec<AdbDevice>> {
        let resp = self.host_output(&["devices"]).await?;
        let mut devices = vec![];
        for line in resp.lines() {
            if line.starts_with("List of devices") || line.starts_with('*') {
                continue;
            }
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 2 && parts[1] == "device" {
                devices.push(self.device(parts[0]));
            }
        }
        info!("found {} attached devices", devices.len());
        Ok(devices)
    }

    /// The attached devices as a stream.
    pub async fn iter_devices(&self) -> AdbResult<impl Stream<Item = AdbDevice>> {
        Ok(stream::iter(self.list_devices().await?))
    }

    /// Version of the bridge tool, e.g. `1.0.41` out of
    /// `Android Debug Bridge version 1.0.41`.
    pub async fn server_version(&self) -> AdbResult<String> {
        let resp = self.host_output(&["version"]).await?;
        let first = resp.lines().next().unwrap_or("");
        first
            .split_whitespace()
            .last()
            .map(|version| version.to_string())
            .ok_or_else(|| AdbError::parse_error(format!("unexpected version output: {}", resp)))
    }

    pub async fn start_server(&self) -> AdbResult<()> {
        self.host_output(&["start-server"]).await?;
        Ok(())
    }

    pub async fn server_kill(&self) -> AdbResult<()> {
        self.host_output(&["kill-server"]).await?;
        Ok(())
    }

    /// Connect to a device over TCP, `adb connect <addr>`.
    pub async fn connect_device(&self, addr: &str) -> AdbResult<String> {
        let result = self.host_output(&["connect", addr]).await?;
        Ok(result.trim().to_string())
    }

    /// Drop a TCP device, `adb disconnect <addr>`.
    pub async fn disconnect_device(&self, addr: &str) -> AdbResult<String> {
        adb_ensure!(!addr.is_empty(), AdbError::unknown("serial is empty"));
        let result = self.host_output(&["disconnect", addr]).await?;
        Ok(result.trim().to_string())
    }

    /// A handle on one device, addressed by serial.
    pub fn device(&self, serial: &str) -> AdbDevice {
        AdbDevice::new(serial, self.config.clone(), Arc::clone(&self.runner))
    }

    /// A handle that addresses whichever single device is attached; no
    /// selector flag is passed along.
    pub fn any_device(&self) -> AdbDevice {
        AdbDevice::any(self.config.clone(), Arc::clone(&self.runner))
    }
}
