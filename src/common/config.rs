use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::bail;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::input::{Action, KeyBinding, KeyCode, KeyMap};

const DEFAULT_CONFIG: &str = include_str!("../../spatial-nav.default.toml");

/// Throttle windows longer than this make navigation feel stuck.
const MAX_THROTTLE_MS: u64 = 2_000;

pub fn config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("spatial-nav").join("config.toml"))
}

/// Engine settings, passed to `initialize`.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Emit per-navigation diagnostics at debug level.
    #[serde(default = "no")]
    pub debug_logging: bool,
    /// Record a trace of every directional move for overlay drawing.
    #[serde(default = "no")]
    pub visual_debug: bool,
    /// Minimum interval between two dispatched key-downs. 0 disables throttling.
    #[serde(default)]
    pub throttle_ms: u64,
    /// Keep the throttle window open across key-ups.
    #[serde(default = "no")]
    pub throttle_keypresses: bool,
}

impl Settings {
    pub fn throttle(&self) -> ThrottleSettings {
        ThrottleSettings {
            throttle_ms: self.throttle_ms,
            throttle_keypresses: self.throttle_keypresses,
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.throttle_ms > MAX_THROTTLE_MS {
            issues.push(format!(
                "throttle_ms ({}) should not exceed {MAX_THROTTLE_MS}",
                self.throttle_ms
            ));
        }
        if self.throttle_keypresses && self.throttle_ms == 0 {
            issues.push("throttle_keypresses has no effect while throttle_ms is 0".to_string());
        }
        issues
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Default)]
#[serde(deny_unknown_fields)]
pub struct ThrottleSettings {
    #[serde(default)]
    pub throttle_ms: u64,
    #[serde(default = "no")]
    pub throttle_keypresses: bool,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    settings: Settings,
    #[serde(default)]
    keys: BTreeMap<String, KeyBinding>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Config {
    pub settings: Settings,
    pub keys: Vec<(Action, Vec<KeyCode>)>,
}

fn no() -> bool { false }

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)?;
        Self::parse(&buf)
    }

    pub fn default() -> Config {
        Self::parse(DEFAULT_CONFIG).unwrap_or_else(|err| {
            warn!("built-in config failed to parse: {err}");
            Config { settings: Settings::default(), keys: vec![] }
        })
    }

    /// Default key map with this config's `[keys]` applied on top.
    pub fn key_map(&self) -> KeyMap {
        let mut map = KeyMap::default();
        for (action, codes) in &self.keys {
            if !codes.is_empty() {
                map.set(*action, codes.clone());
            }
        }
        map
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = self.settings.validate();
        for (action, codes) in &self.keys {
            if codes.is_empty() {
                issues.push(format!("[keys] entry `{action}` has no key codes"));
            }
        }
        let mut seen: BTreeMap<&KeyCode, Action> = BTreeMap::new();
        for (action, codes) in &self.keys {
            for code in codes {
                if let Some(first) = seen.insert(code, *action)
                    && first != *action
                {
                    issues.push(format!("key `{code}` is bound to both `{first}` and `{action}`"));
                }
            }
        }
        issues
    }

    pub fn parse(buf: &str) -> anyhow::Result<Config> {
        let file: ConfigFile = toml::from_str(buf)?;
        let mut keys = Vec::new();
        for (name, binding) in file.keys {
            let Ok(action) = name.parse::<Action>() else {
                match Action::suggest(&name) {
                    Some(suggestion) => {
                        bail!("unknown action `{name}` in [keys]\nDid you mean `{suggestion}`?")
                    }
                    None => bail!("unknown action `{name}` in [keys]"),
                }
            };
            keys.push((action, binding.into_codes()));
        }
        Ok(Config { settings: file.settings, keys })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn default_config_parses() {
        let config = Config::default();
        assert_eq!(config.settings, Settings::default());
        assert!(config.validate().is_empty(), "{:?}", config.validate());
        assert_eq!(config.key_map(), KeyMap::default());
    }

    #[test]
    fn settings_defaults_apply_per_field() {
        let config = Config::parse(
            r#"
            [settings]
            throttle_ms = 120
            "#,
        )
        .unwrap();
        assert_eq!(
            config.settings,
            Settings { throttle_ms: 120, ..Default::default() }
        );
        assert_eq!(
            config.settings.throttle(),
            ThrottleSettings { throttle_ms: 120, throttle_keypresses: false }
        );
    }

    #[test]
    fn unknown_setting_is_rejected() {
        let err = Config::parse("[settings]\nthrotle_ms = 5\n").unwrap_err();
        assert!(err.to_string().contains("throtle_ms"), "{err}");
    }

    #[test]
    fn keys_override_defaults() {
        let config = Config::parse(
            r#"
            [keys]
            left = [214, "GamepadLeft"]
            activate = 195
            "#,
        )
        .unwrap();
        let map = config.key_map();
        assert_eq!(map.decode(&KeyCode::Code(214)), Some(Action::Left));
        assert_eq!(map.decode(&"GamepadLeft".into()), Some(Action::Left));
        assert_eq!(map.decode(&KeyCode::Code(195)), Some(Action::Enter));
        assert_eq!(map.decode(&KeyCode::Code(37)), None);
        assert_eq!(map.decode(&KeyCode::Code(40)), Some(Action::Down));
    }

    #[test]
    fn misspelt_action_gets_suggestion() {
        let err = Config::parse("[keys]\nrigth = 39\n").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Did you mean `right`?"), "{msg}");
    }

    #[test]
    fn validate_reports_problems() {
        let config = Config::parse(
            r#"
            [settings]
            throttle_keypresses = true

            [keys]
            up = []
            down = 40
            enter = 40
            "#,
        )
        .unwrap();
        let issues = config.validate();
        assert_eq!(issues.len(), 3, "{issues:?}");
        assert!(issues.iter().any(|i| i.contains("throttle_keypresses")));
        assert!(issues.iter().any(|i| i.contains("no key codes")));
        assert!(issues.iter().any(|i| i.contains("bound to both")));
    }

    #[test]
    fn read_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[settings]\ndebug_logging = true\nvisual_debug = true").unwrap();
        let config = Config::read(file.path()).unwrap();
        assert!(config.settings.debug_logging);
        assert!(config.settings.visual_debug);
    }

    #[test]
    fn read_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::read(&dir.path().join("missing.toml")).is_err());
    }
}
