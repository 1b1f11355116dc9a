//! Persistent settings: hotkey bindings, autostart and keep-awake.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::manager::KeepAwake;

/// Accepted `sleep_after_minutes` values. 0 means never sleep.
pub const SLEEP_AFTER_CHOICES: [u32; 6] = [0, 30, 60, 120, 180, 300];

const CONFIG_FILE: &str = "config.json";

/// A global hotkey: modifier names ("ctrl", "shift", "alt", "super") plus a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotkeyBinding {
    pub modifiers: Vec<String>,
    pub key: String,
}

impl HotkeyBinding {
    pub fn new(modifiers: &[&str], key: &str) -> Self {
        Self {
            modifiers: modifiers.iter().map(|m| m.to_string()).collect(),
            key: key.to_string(),
        }
    }
}

impl std::fmt::Display for HotkeyBinding {
    /// Renders as `Ctrl+Alt+R`. Unknown modifiers are skipped.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for modifier in &self.modifiers {
            let label = match modifier.as_str() {
                "ctrl" => "Ctrl",
                "shift" => "Shift",
                "alt" => "Alt",
                "super" => "Super",
                _ => continue,
            };
            write!(f, "{label}+")?;
        }
        if self.key.chars().count() == 1 {
            write!(f, "{}", self.key.to_uppercase())
        } else {
            f.write_str(&self.key)
        }
    }
}

/// On-disk settings. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub hotkey: HotkeyBinding,
    pub swipe_hotkey: HotkeyBinding,
    pub auto_start: bool,
    pub keep_awake: bool,
    pub sleep_after_minutes: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hotkey: HotkeyBinding::new(&["ctrl", "alt"], "r"),
            swipe_hotkey: HotkeyBinding::new(&["ctrl", "alt"], "w"),
            auto_start: false,
            keep_awake: true,
            sleep_after_minutes: 60,
        }
    }
}

/// Reject `sleep_after_minutes` values outside [`SLEEP_AFTER_CHOICES`].
pub fn validate_sleep_after(minutes: u32) -> Result<u32> {
    if SLEEP_AFTER_CHOICES.contains(&minutes) {
        Ok(minutes)
    } else {
        Err(Error::OutOfRange {
            field: "sleep_after_minutes",
            value: minutes,
            allowed: "0, 30, 60, 120, 180, 300",
        })
    }
}

/// Default settings file under the platform config directory.
pub fn default_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "r1-control")
        .ok_or_else(|| Error::Config("cannot determine config directory".into()))?;
    Ok(dirs.config_dir().join(CONFIG_FILE))
}

impl Settings {
    /// Keep-awake settings in the form the device manager takes.
    pub fn keep_awake(&self) -> KeepAwake {
        KeepAwake {
            enabled: self.keep_awake,
            sleep_after_minutes: self.sleep_after_minutes,
        }
    }

    /// Validate and apply new keep-awake settings. Nothing changes on error.
    pub fn set_keep_awake(&mut self, enabled: bool, sleep_after_minutes: u32) -> Result<()> {
        let minutes = validate_sleep_after(sleep_after_minutes)?;
        self.keep_awake = enabled;
        self.sleep_after_minutes = minutes;
        Ok(())
    }

    /// Read settings from `path`; a missing file is created with defaults.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No settings file, writing defaults");
                let settings = Self::default();
                settings.save(path)?;
                return Ok(settings);
            }
            Err(e) => {
                return Err(Error::Config(format!("read {}: {e}", path.display())));
            }
        };

        let settings: Self = serde_json::from_str(&data)
            .map_err(|e| Error::Config(format!("parse {}: {e}", path.display())))?;
        debug!(path = %path.display(), "Settings loaded");
        Ok(settings)
    }

    /// Write settings atomically: temp file in the same directory, then rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("create {}: {e}", parent.display())))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("serialize settings: {e}")))?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .map_err(|e| Error::Config(format!("write {}: {e}", tmp.display())))?;
        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(Error::Config(format!("rename {}: {e}", path.display())));
        }

        debug!(path = %path.display(), "Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.hotkey.to_string(), "Ctrl+Alt+R");
        assert_eq!(settings.swipe_hotkey.to_string(), "Ctrl+Alt+W");
        assert!(!settings.auto_start);
        assert_eq!(settings.keep_awake(), KeepAwake::default());
    }

    #[test]
    fn hotkey_display() {
        assert_eq!(
            HotkeyBinding::new(&["shift", "super"], "f5").to_string(),
            "Shift+Super+f5"
        );
        assert_eq!(HotkeyBinding::new(&["meta"], "space").to_string(), "space");
    }

    #[test]
    fn sleep_after_validation() {
        for minutes in SLEEP_AFTER_CHOICES {
            assert_eq!(validate_sleep_after(minutes).unwrap(), minutes);
        }
        assert!(matches!(
            validate_sleep_after(45),
            Err(Error::OutOfRange { value: 45, .. })
        ));
    }

    #[test]
    fn rejected_keep_awake_update_changes_nothing() {
        let mut settings = Settings::default();
        assert!(settings.set_keep_awake(false, 15).is_err());
        assert_eq!(settings, Settings::default());

        settings.set_keep_awake(false, 0).unwrap();
        assert!(!settings.keep_awake);
        assert_eq!(settings.sleep_after_minutes, 0);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"auto_start": true}"#).unwrap();
        assert!(settings.auto_start);
        assert!(settings.keep_awake);
        assert_eq!(settings.sleep_after_minutes, 60);
        assert_eq!(settings.hotkey, HotkeyBinding::new(&["ctrl", "alt"], "r"));
    }

    #[test]
    fn load_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let settings = Settings::load_or_create(&path).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(path.exists());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let mut settings = Settings::default();
        settings.set_keep_awake(true, 120).unwrap();
        settings.swipe_hotkey = HotkeyBinding::new(&["ctrl", "shift"], "s");
        settings.save(&path).unwrap();

        assert_eq!(Settings::load_or_create(&path).unwrap(), settings);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            Settings::load_or_create(&path),
            Err(Error::Config(_))
        ));
    }
}
