use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static VERSION_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"versionName=(?P<name>\S+)").unwrap());
static VERSION_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"versionCode=(?P<code>\d+)").unwrap());
static SIGNATURE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"PackageSignatures\{.*?\[(.*)]}").unwrap());
static PKG_FLAGS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"pkgFlags=\[\s*(.*?)\s*]").unwrap());
static FIRST_INSTALL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"firstInstallTime=(?P<time>[-\d]+\s+[:\d]+)").unwrap());
static LAST_UPDATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"lastUpdateTime=(?P<time>[-\d]+\s+[:\d]+)").unwrap());

/// Package details as reported by `dumpsys package`.
#[derive(Debug, PartialEq, Eq)]
pub struct AppInfo {
    pub package_name: String,
    pub version_name: Option<String>,
    pub version_code: Option<u32>,
    pub flags: Vec<String>,
    pub first_install_time: Option<DateTime<Utc>>,
    pub last_update_time: Option<DateTime<Utc>>,
    pub signature: Option<String>,
}

impl AppInfo {
    pub fn new(package_name: &str) -> AppInfo {
        Self {
            package_name: package_name.to_string(),
            version_name: None,
            version_code: None,
            flags: vec![],
            first_install_time: None,
            last_update_time: None,
            signature: None,
        }
    }
}

fn parse_dumpsys_time(value: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(value.trim(), "%Y-%m-%d %H:%M:%S").ok()?;
    Some(naive.and_utc())
}

/// Pick package details out of raw `dumpsys package <name>` output.
/// Fields that do not appear stay `None`; the parse itself never fails.
pub fn parse_app_info(package_name: &str, raw: &str) -> AppInfo {
    let mut app_info = AppInfo::new(package_name);
    if let Some(cap) = VERSION_NAME_RE.captures(raw) {
        app_info.version_name = Some(cap["name"].to_string());
    }
    if let Some(cap) = VERSION_CODE_RE.captures(raw) {
        app_info.version_code = cap["code"].parse().ok();
    }
    if let Some(cap) = SIGNATURE_RE.captures(raw) {
        app_info.signature = cap.get(1).map(|m| m.as_str().to_string());
    }
    if let Some(cap) = PKG_FLAGS_RE.captures(raw) {
        app_info.flags = cap[1]
            .split_whitespace()
            .map(|flag| flag.to_string())
            .collect();
    }
    if let Some(cap) = FIRST_INSTALL_RE.captures(raw) {
        app_info.first_install_time = parse_dumpsys_time(&cap["time"]);
    }
    if let Some(cap) = LAST_UPDATE_RE.captures(raw) {
        app_info.last_update_time = parse_dumpsys_time(&cap["time"]);
    }
    app_info
}
