//! Steam installation discovery.
//!
//! On Windows the installation record lives in the user registry hive
//! (`HKCU:\Software\Valve\Steam`) and is read through the shell runner:
//! executable path, install path, and the auto-login account name (the
//! last may legitimately be empty, meaning no auto-login is configured).
//! On other systems the well-known Steam directories are probed instead.
//!
//! Read once at facade construction; never re-read unless the facade is
//! reset.

use std::path::PathBuf;

use serde_json::Value;
use steampad_shell::PowerShell;

use crate::SteamError;

/// Registry path of the per-user Steam installation record.
pub const REGISTRY_PATH: &str = r"HKCU:\Software\Valve\Steam";

#[cfg(windows)]
const REGISTRY_PROPERTIES: &[&str] = &["SteamExe", "SteamPath", "AutoLoginUser"];

/// The located Steam installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installation {
    pub exe_path: PathBuf,
    pub install_path: PathBuf,
    /// Empty when no auto-login account is configured.
    pub auto_login_account: String,
}

impl Installation {
    /// Reads the installation record from the configuration store.
    #[cfg(windows)]
    pub async fn detect(powershell: &PowerShell) -> Result<Self, SteamError> {
        let entry = powershell
            .read_registry_entry(REGISTRY_PATH, REGISTRY_PROPERTIES)
            .await
            .map_err(|e| {
                tracing::error!("registry read failed: {e}");
                SteamError::ConfigMissing
            })?;
        Self::from_registry_entry(&entry)
    }

    /// Probes the well-known Steam directories (no configuration store on
    /// these systems; the `steam` launcher is expected on PATH).
    #[cfg(not(windows))]
    pub async fn detect(_powershell: &PowerShell) -> Result<Self, SteamError> {
        let install_path = well_known_dir().ok_or(SteamError::ConfigMissing)?;
        Ok(Self {
            exe_path: PathBuf::from("steam"),
            install_path,
            auto_login_account: String::new(),
        })
    }

    /// Builds an installation from a decoded registry entry. Requires both
    /// path fields; the auto-login account defaults to empty.
    pub fn from_registry_entry(entry: &Value) -> Result<Self, SteamError> {
        if !entry.is_object() {
            return Err(SteamError::ConfigMissing);
        }

        let exe = entry
            .get("SteamExe")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or(SteamError::ConfigMissing)?;
        let path = entry
            .get("SteamPath")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or(SteamError::ConfigMissing)?;
        let auto_login = entry
            .get("AutoLoginUser")
            .and_then(Value::as_str)
            .unwrap_or("");

        Ok(Self {
            exe_path: normalize_path(exe),
            install_path: normalize_path(path),
            auto_login_account: auto_login.to_string(),
        })
    }

    /// The steamapps directory under the installation.
    pub fn steamapps_dir(&self) -> PathBuf {
        self.install_path.join("steamapps")
    }

    /// The per-installation config directory.
    pub fn config_dir(&self) -> PathBuf {
        self.install_path.join("config")
    }
}

/// Canonicalizes separators to the platform's without touching the disk.
pub fn normalize_path(raw: &str) -> PathBuf {
    let sep = std::path::MAIN_SEPARATOR;
    let normalized: String = raw
        .chars()
        .map(|c| if c == '/' || c == '\\' { sep } else { c })
        .collect();
    PathBuf::from(normalized)
}

#[cfg(not(windows))]
fn well_known_dir() -> Option<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from)?;
    let candidates = [
        home.join(".steam").join("steam"),
        home.join(".local").join("share").join("Steam"),
    ];
    candidates.into_iter().find(|dir| dir.exists())
}
