use crate::adb_bail;
use crate::beans::app_info::parse_app_info;
use crate::beans::command::AdbCommand;
use crate::beans::device_info::AdbDeviceInfo;
use crate::beans::forward_item::{parse_forward_list, ForwardItem};
use crate::beans::process_record::{
    parse_jdwp_pids, parse_table, ProcessRecord, DEFAULT_PS_FIELDS,
};
use crate::beans::AppInfo;
use crate::errors::{AdbError, AdbResult};
use crate::runners::{
    AdbConfig, CommandRunner, EventStream, ProcessEvent, SpawnOptions, TokioCommandRunner,
};
use crate::utils::get_free_port;
use async_stream::stream;
use futures_core::Stream;
use futures_util::StreamExt;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

static GETPROP_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(.+?)\]:\s*\[(.*?)\]").unwrap());

const PACKAGE_PREFIX: &str = "package:";

/// A handle on one attached device, addressed by serial. When `serial`
/// is `None` no selector flag is passed and the bridge resolves the
/// single attached device itself.
pub struct AdbDevice {
    pub serial: Option<String>,
    pub config: AdbConfig,
    runner: Arc<dyn CommandRunner>,
}

impl fmt::Debug for AdbDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdbDevice")
            .field("serial", &self.serial)
            .field("config", &self.config)
            .finish()
    }
}

impl AdbDevice {
    /// Handle on the device with this serial. An empty serial is
    /// normalized to the unselected form.
    pub fn new<T: Into<String>>(
        serial: T,
        config: AdbConfig,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        let serial = serial.into();
        Self {
            serial: if serial.is_empty() { None } else { Some(serial) },
            config,
            runner,
        }
    }

    /// Handle with the default config and the process backed runner.
    pub fn new_default(serial: &str) -> Self {
        Self::new(serial, AdbConfig::default(), Arc::new(TokioCommandRunner))
    }

    /// Handle that addresses whichever single device is attached.
    pub fn any(config: AdbConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            serial: None,
            config,
            runner,
        }
    }

    /// Full argument list for one invocation: `[-s <serial>]` when a
    /// serial is selected, then the subcommand tokens.
    pub fn command_args<S: AsRef<str>>(&self, args: &[S]) -> Vec<String> {
        let mut full = Vec::with_capacity(args.len() + 2);
        if let Some(serial) = self.serial.as_ref() {
            full.push("-s".to_string());
            full.push(serial.clone());
        }
        for arg in args {
            full.push(arg.as_ref().to_string());
        }
        full
    }

    /// Run a subcommand against this device and collect its output.
    pub async fn adb_output(&self, command: &[&str]) -> AdbResult<String> {
        let args = self.command_args(command);
        self.runner.output(&self.config.bin_str(), &args).await
    }

    /// Run a shell command on the device and collect its output.
    ///
    /// # Arguments
    /// - `command`: the command in any [`AdbCommand`] form, a single
    ///   string or pre-split tokens.
    pub async fn shell<'a, T: Into<AdbCommand<'a>>>(&self, command: T) -> AdbResult<String> {
        let command = command.into();
        let mut args = vec!["shell".to_string()];
        args.extend(command.to_args());
        let full_args = self.command_args(&args);
        self.runner.output(&self.config.bin_str(), &full_args).await
    }

    pub async fn shell_trim<'a, T: Into<AdbCommand<'a>>>(&self, command: T) -> AdbResult<String> {
        let output = self.shell(command).await?;
        Ok(output.trim().to_string())
    }

    /// Spawn a shell command and observe its output incrementally. The
    /// process is killed when the returned stream is dropped.
    pub async fn shell_stream<'a, T: Into<AdbCommand<'a>>>(
        &self,
        command: T,
    ) -> AdbResult<EventStream> {
        let command = command.into();
        let mut args = vec!["shell".to_string()];
        args.extend(command.to_args());
        let full_args = self.command_args(&args);
        let options = SpawnOptions {
            kill_tree: true,
            status_as_error: false,
        };
        self.runner
            .stream(&self.config.bin_str(), &full_args, options)
            .await
    }

    /// adb get-state => device
    pub async fn get_state(&self) -> AdbResult<String> {
        let output = self.adb_output(&["get-state"]).await?;
        Ok(output.trim().to_string())
    }

    /// adb get-serialno => emulator-5554
    pub async fn get_serialno(&self) -> AdbResult<String> {
        let output = self.adb_output(&["get-serialno"]).await?;
        Ok(output.trim().to_string())
    }

    /// One system property, trimmed.
    pub async fn getprop(&self, name: &str) -> AdbResult<String> {
        self.shell_trim(&["getprop", name]).await
    }

    /// The full property table as reported by a bare `getprop`.
    pub async fn properties(&self) -> AdbResult<HashMap<String, String>> {
        let output = self.shell("getprop").await?;
        let mut properties = HashMap::new();
        for line in output.lines() {
            if let Some(cap) = GETPROP_LINE_RE.captures(line) {
                properties.insert(cap[1].to_string(), cap[2].to_string());
            }
        }
        Ok(properties)
    }

    pub async fn get_sdk_version(&self) -> AdbResult<String> {
        self.getprop("ro.build.version.sdk").await
    }

    pub async fn get_android_version(&self) -> AdbResult<String> {
        self.getprop("ro.build.version.release").await
    }

    /// Marketing model of the device. Emulator images report the
    /// placeholder `sdk`, which is mapped to `emulator`.
    pub async fn get_device_model(&self) -> AdbResult<String> {
        let model = self.getprop("ro.product.model").await?;
        if model == "sdk" {
            Ok("emulator".to_string())
        } else {
            Ok(model)
        }
    }

    pub async fn get_device_brand(&self) -> AdbResult<String> {
        self.getprop("ro.product.brand").await
    }

    pub async fn get_device_manufacturer(&self) -> AdbResult<String> {
        self.getprop("ro.product.manufacturer").await
    }

    /// Aggregate of identifying properties. Never fails: a lookup that
    /// errors is recorded as `None` under its key, so callers can tell
    /// "unknown" from "missing".
    pub async fn device_info(&self) -> AdbDeviceInfo {
        let mut device_info = AdbDeviceInfo::new(self.serial.clone());
        let properties = &mut device_info.properties;
        properties.insert("state".to_string(), self.get_state().await.ok());
        properties.insert(
            "device_model".to_string(),
            self.get_device_model().await.ok(),
        );
        properties.insert("sdk_version".to_string(), self.get_sdk_version().await.ok());
        properties.insert(
            "android_version".to_string(),
            self.get_android_version().await.ok(),
        );
        properties.insert(
            "manufacturer".to_string(),
            self.get_device_manufacturer().await.ok(),
        );
        properties.insert("brand".to_string(), self.get_device_brand().await.ok());
        device_info
    }

    /// Package names of everything `pm list packages` reports.
    pub async fn list_packages(&self) -> AdbResult<Vec<String>> {
        let output = self.shell(&["pm", "list", "packages"]).await?;
        let mut packages = vec![];
        for line in output.lines() {
            if let Some(name) = line.trim().strip_prefix(PACKAGE_PREFIX) {
                packages.push(name.to_string());
            }
        }
        Ok(packages)
    }

    /// Whether a package with exactly this name is installed.
    pub async fn is_installed(&self, package_name: &str) -> AdbResult<bool> {
        Ok(self
            .list_packages()
            .await?
            .iter()
            .any(|package| package == package_name))
    }

    /// Install a local apk, `adb install -r <path>`. The bridge prints
    /// `Success` on a good install even when it exits zero on failure,
    /// so the output is checked too.
    pub async fn install(&self, apk_path: &str) -> AdbResult<String> {
        let output = self.adb_output(&["install", "-r", apk_path]).await?;
        if !output.contains("Success") {
            adb_bail!(AdbError::application_error(apk_path, output.trim()));
        }
        info!("installed {} >> {}", apk_path, output.trim());
        Ok(output)
    }

    /// Install an apk already present on the device, optionally
    /// deleting it afterwards.
    pub async fn install_remote(&self, path: &str, clean: bool) -> AdbResult<String> {
        let args = ["pm", "install", "-r", "-t", path];
        let output = self.shell(&args).await?;
        if !output.contains("Success") {
            return Err(AdbError::application_error(path, output.trim()));
        }
        if clean {
            self.shell(&["rm", path]).await?;
        }
        Ok(output)
    }

    pub async fn uninstall(&self, package_name: &str) -> AdbResult<String> {
        let output = self.adb_output(&["uninstall", package_name]).await?;
        Ok(output.trim().to_string())
    }

    /// Launch an activity, `am start -n <component>`.
    pub async fn app_start(&self, component: &str) -> AdbResult<String> {
        self.shell(&["am", "start", "-n", component]).await
    }

    pub async fn app_stop(&self, package_name: &str) -> AdbResult<String> {
        self.shell(&["am", "force-stop", package_name]).await
    }

    pub async fn app_clear_data(&self, package_name: &str) -> AdbResult<String> {
        self.shell(&["pm", "clear", package_name]).await
    }

    /// Details of an installed package, `None` when it is not installed
    /// or `dumpsys` cannot be read.
    pub async fn app_info(&self, package_name: &str) -> Option<AppInfo> {
        if !self.is_installed(package_name).await.ok()? {
            return None;
        }
        let output = self
            .shell(&["dumpsys", "package", package_name])
            .await
            .ok()?;
        Some(parse_app_info(package_name, &output))
    }

    /// Records of `ps` output restricted to the requested fields.
    pub async fn processes(&self, fields: &[&str]) -> AdbResult<Vec<ProcessRecord>> {
        let output = self.shell(&["ps"]).await?;
        Ok(parse_table(&output, fields))
    }

    /// `ps` with the default user/pid/name projection.
    pub async fn ps(&self) -> AdbResult<Vec<ProcessRecord>> {
        self.processes(DEFAULT_PS_FIELDS).await
    }

    /// Pids of processes with a JDWP endpoint.
    ///
    /// `adb jdwp` prints the current pids and then blocks waiting for
    /// new ones, so only the first chunk of output is taken and the
    /// process is killed afterwards. Any failure of the scan reads as
    /// "no JDWP processes", never as an error.
    pub async fn jdwp_pids(&self) -> Vec<u32> {
        let args = self.command_args(&["jdwp"]);
        let options = SpawnOptions {
            kill_tree: true,
            status_as_error: false,
        };
        let mut events = match self
            .runner
            .stream(&self.config.bin_str(), &args, options)
            .await
        {
            Ok(events) => events,
            Err(e) => {
                debug!("jdwp scan failed to spawn: {}", e);
                return vec![];
            }
        };
        while let Some(event) = events.next().await {
            match event {
                ProcessEvent::Stdout(chunk) => return parse_jdwp_pids(&chunk),
                ProcessEvent::Stderr(_) => continue,
                ProcessEvent::Error(_) | ProcessEvent::Exit(_) => break,
            }
        }
        vec![]
    }

    /// The `ps` records whose pid currently exposes a JDWP endpoint,
    /// i.e. the debuggable Java processes.
    pub async fn java_processes(&self) -> AdbResult<Vec<ProcessRecord>> {
        let pids = self.jdwp_pids().await;
        let records = self.ps().await?;
        Ok(records
            .into_iter()
            .filter(|record| record.pid().map_or(false, |pid| pids.contains(&pid)))
            .collect())
    }

    /// Forward a local TCP port to the JDWP endpoint of `pid`. A free
    /// local port is picked when none is given; the chosen port is
    /// returned.
    pub async fn forward_jdwp(&self, pid: u32, port: Option<u16>) -> AdbResult<u16> {
        let local_port = match port {
            Some(port) => port,
            None => get_free_port()?,
        };
        self.forward(
            &format!("tcp:{}", local_port),
            &format!("jdwp:{}", pid),
            false,
        )
        .await?;
        Ok(local_port)
    }

    pub async fn forward(&self, local: &str, remote: &str, norebind: bool) -> AdbResult<()> {
        let mut args = vec!["forward"];
        if norebind {
            args.push("--no-rebind");
        }
        args.push(local);
        args.push(remote);
        self.adb_output(&args).await?;
        Ok(())
    }

    pub async fn forward_list(&self) -> AdbResult<Vec<ForwardItem>> {
        let output = self.adb_output(&["forward", "--list"]).await?;
        Ok(parse_forward_list(&output))
    }

    pub async fn remove_forward(&self, local: &str) -> AdbResult<()> {
        self.adb_output(&["forward", "--remove", local]).await?;
        Ok(())
    }

    /// Forward some free local TCP port to `tcp:<remote>` on the device,
    /// reusing an existing forward when one is already in place.
    pub async fn forward_remote_port(&self, remote: u16) -> AdbResult<u16> {
        let remote_str = format!("tcp:{}", remote);
        if let Some(serial) = self.serial.as_ref() {
            for item in self.forward_list().await? {
                if item.serial == *serial
                    && item.remote == remote_str
                    && item.local.starts_with("tcp:")
                {
                    if let Ok(port) = u16::from_str(&item.local["tcp:".len()..]) {
                        return Ok(port);
                    }
                }
            }
        }
        let local_port = get_free_port()?;
        self.forward(&format!("tcp:{}", local_port), &remote_str, false)
            .await?;
        Ok(local_port)
    }

    /// Follow `logcat` line by line.
    ///
    /// # Arguments
    /// - `flush_exist`: clear the buffered log first (`logcat -c`).
    /// - `command`: replacement for the default `logcat -v time`
    ///   invocation.
    ///
    /// The underlying process is killed when the stream is dropped.
    pub async fn logcat(
        &self,
        flush_exist: bool,
        command: Option<&[&str]>,
    ) -> AdbResult<impl Stream<Item = String>> {
        if flush_exist {
            self.shell(&["logcat", "-c"]).await?;
        }
        let run_command = command.map_or(["logcat", "-v", "time"].as_slice(), |x| x);
        let mut events = self.shell_stream(run_command).await?;
        Ok(stream! {
            let mut pending = String::new();
            while let Some(event) = events.next().await {
                match event {
                    ProcessEvent::Stdout(chunk) => {
                        pending.push_str(&chunk);
                        while let Some(pos) = pending.find('\n') {
                            let line = pending[..pos].trim_end_matches('\r').to_string();
                            pending.drain(..=pos);
                            yield line;
                        }
                    }
                    ProcessEvent::Stderr(_) => continue,
                    ProcessEvent::Error(_) | ProcessEvent::Exit(_) => break,
                }
            }
            if !pending.is_empty() {
                yield pending.trim_end_matches('\r').to_string();
            }
        })
    }
}
