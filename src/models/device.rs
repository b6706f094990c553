use serde::{Deserialize, Serialize};
use sysinfo::System;

/// Host device description sent once with the session-start payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub model: String,
    pub os_version: String,
    pub identifier: Option<String>,
}

impl DeviceInfo {
    /// Best-effort description of the machine this process runs on.
    pub fn detect() -> Self {
        let os_version = System::long_os_version()
            .or_else(System::os_version)
            .unwrap_or_else(|| std::env::consts::OS.to_string());

        Self {
            model: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
            os_version,
            identifier: None,
        }
    }
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self::detect()
    }
}
