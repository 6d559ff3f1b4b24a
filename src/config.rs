//! Application configuration.
//!
//! The configuration is loaded from a TOML file (or JSON, if the file name
//! ends in `.json`) whose path is passed on the command line
//! (`--config <path>`) or found in the platform config directory
//! (`%APPDATA%\twm\config.toml` on Windows).
//!
//! # Example
//!
//! ```toml
//! update_interval_seconds = 0.1
//! draw_focus_border = true
//! focused_border_color = 0x5e81ac
//!
//! [desktop_switch]
//! left = "ctrl+win+left"
//! right = "ctrl+win+right"
//!
//! [hotkeys]
//! "alt+h" = "focus window left"
//! "alt+shift+l" = "swap window right"
//! "alt+shift+r" = "reload"
//! ```

use crate::dispatcher::{DesktopSwitch, DisplaySettings};
use crate::keycombo::KeyCombo;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
///
/// Every field is optional; an empty file is valid and everything falls
/// back to the compiled-in defaults.  A `[hotkeys]` table replaces the
/// default bindings as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sleep between two scheduler iterations, in seconds.
    pub tick_interval_seconds: f64,
    /// Minimum time between two periodic full refreshes, in seconds.
    pub update_interval_seconds: f64,

    /// Turn off drop shadows system-wide while running.
    pub disable_drop_shadows: bool,
    /// Square the corners of managed windows.
    pub disable_rounded_corners: bool,
    /// Paint window borders in the colors below, depending on focus.
    pub draw_focus_border: bool,
    /// `0xRRGGBB`
    pub focused_border_color: u32,
    /// `0xRRGGBB`
    pub unfocused_border_color: u32,

    /// The operating system's own desktop switch shortcuts.
    pub desktop_switch: DesktopSwitchConfig,

    /// Keycombo → action string.
    pub hotkeys: BTreeMap<String, String>,
}

/// Keycombos replayed to switch to the neighbouring virtual desktop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopSwitchConfig {
    pub left: String,
    pub right: String,
}

impl Default for DesktopSwitchConfig {
    fn default() -> Self {
        Self {
            left: "ctrl+win+left".into(),
            right: "ctrl+win+right".into(),
        }
    }
}

const DEFAULT_HOTKEYS: &[(&str, &str)] = &[
    ("alt+h", "focus window left"),
    ("alt+j", "focus window down"),
    ("alt+k", "focus window up"),
    ("alt+l", "focus window right"),
    ("alt+shift+h", "swap window left"),
    ("alt+shift+j", "swap window down"),
    ("alt+shift+k", "swap window up"),
    ("alt+shift+l", "swap window right"),
    ("alt+u", "focus desktop left"),
    ("alt+i", "focus desktop right"),
    ("alt+shift+u", "move_to_desktop window left"),
    ("alt+shift+i", "move_to_desktop window right"),
    ("alt+q", "close window"),
    ("alt+shift+q", "terminate window"),
    ("alt+shift+r", "reload"),
];

impl Default for Config {
    fn default() -> Self {
        let display = DisplaySettings::default();
        Self {
            tick_interval_seconds: 0.005,
            update_interval_seconds: 0.1,
            disable_drop_shadows: display.disable_drop_shadows,
            disable_rounded_corners: display.disable_rounded_corners,
            draw_focus_border: display.draw_focus_border,
            focused_border_color: display.focused_border_color,
            unfocused_border_color: display.unfocused_border_color,
            desktop_switch: DesktopSwitchConfig::default(),
            hotkeys: DEFAULT_HOTKEYS
                .iter()
                .map(|(k, a)| (k.to_string(), a.to_string()))
                .collect(),
        }
    }
}

impl Config {
    /// Load configuration from `path`.
    ///
    /// Files ending in `.json` are parsed as JSON, everything else as TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            serde_json::from_str(&contents)
                .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))
        } else {
            toml::from_str(&contents)
                .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))
        }
    }

    /// Like [`load`](Config::load), but a file that does not exist yields
    /// the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError(format!("failed to parse config: {}", e)))
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError(format!("failed to serialize config: {}", e)))
    }

    /// Write the configuration to `path` as TOML, creating parent
    /// directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError(format!("failed to create {}: {}", parent.display(), e)))?;
        }
        std::fs::write(path, self.to_toml_string()?)
            .map_err(|e| ConfigError(format!("failed to write {}: {}", path.display(), e)))
    }

    /// `<config dir>/twm/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("twm").join("config.toml"))
    }

    /// [`tick_interval_seconds`](Config::tick_interval_seconds); negative
    /// or non-finite values become zero.
    pub fn tick_interval(&self) -> Duration {
        seconds(self.tick_interval_seconds)
    }

    /// [`update_interval_seconds`](Config::update_interval_seconds); negative
    /// or non-finite values become zero.
    pub fn update_interval(&self) -> Duration {
        seconds(self.update_interval_seconds)
    }

    pub fn display_settings(&self) -> DisplaySettings {
        DisplaySettings {
            disable_drop_shadows: self.disable_drop_shadows,
            disable_rounded_corners: self.disable_rounded_corners,
            draw_focus_border: self.draw_focus_border,
            focused_border_color: self.focused_border_color,
            unfocused_border_color: self.unfocused_border_color,
        }
    }

    /// The parsed `[desktop_switch]` combos.
    pub fn desktop_switch(&self) -> Result<DesktopSwitch, ConfigError> {
        let parse = |s: &str| {
            s.parse::<KeyCombo>()
                .map_err(|e| ConfigError(format!("desktop_switch: {}", e)))
        };
        Ok(DesktopSwitch {
            left: parse(&self.desktop_switch.left)?,
            right: parse(&self.desktop_switch.right)?,
        })
    }
}

fn seconds(s: f64) -> Duration {
    Duration::try_from_secs_f64(s).unwrap_or(Duration::ZERO)
}

/// Error from loading, parsing or saving a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);
