use crate::host::ModifierKey;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tuning for click and drag detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerSettings {
    /// Maximum time between a release and the next press of the same button
    /// for the press to count as a repeat click.
    #[serde(default = "default_double_click_interval")]
    pub double_click_interval_ms: u64,
    /// Repeat clicks must land strictly closer than this on both axes.
    #[serde(default = "default_double_click_radius")]
    pub double_click_radius: i32,
    /// Motion further than this from the press position starts a drag.
    #[serde(default = "default_drag_radius")]
    pub drag_radius: i32,
    /// Modifier that turns a primary press into a button 2 press. `None`
    /// disables the remap.
    #[serde(default = "default_secondary_click_modifier")]
    pub secondary_click_modifier: Option<ModifierKey>,
}

fn default_double_click_interval() -> u64 {
    250
}

fn default_double_click_radius() -> i32 {
    4
}

fn default_drag_radius() -> i32 {
    4
}

fn default_secondary_click_modifier() -> Option<ModifierKey> {
    Some(ModifierKey::Control)
}

impl Default for PointerSettings {
    fn default() -> Self {
        Self {
            double_click_interval_ms: default_double_click_interval(),
            double_click_radius: default_double_click_radius(),
            drag_radius: default_drag_radius(),
            secondary_click_modifier: default_secondary_click_modifier(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// When enabled the logger is initialised at debug level.
    /// Defaults to `false` when the field is missing in the settings file.
    #[serde(default)]
    pub debug_logging: bool,
    /// File receiving log output. When absent logs go to stdout.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default)]
    pub pointer: PointerSettings,
}

impl Settings {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"pointer":{"drag_radius":9}}"#).unwrap();
        assert!(!settings.debug_logging);
        assert_eq!(settings.pointer.drag_radius, 9);
        assert_eq!(settings.pointer.double_click_interval_ms, 250);
        assert_eq!(settings.pointer.double_click_radius, 4);
        assert_eq!(
            settings.pointer.secondary_click_modifier,
            Some(ModifierKey::Control)
        );
    }

    #[test]
    fn null_modifier_disables_remap() {
        let settings: PointerSettings =
            serde_json::from_str(r#"{"secondary_click_modifier":null}"#).unwrap();
        assert_eq!(settings.secondary_click_modifier, None);
    }
}
