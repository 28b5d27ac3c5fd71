//! Server configuration read from the environment.
//!
//! Every variable is optional; unparsable values fall back to the default.
//!
//! | Variable             | Meaning                                  |
//! |----------------------|------------------------------------------|
//! | `BATTLE_DATA_DIR`    | content directory (bundled data if unset)|
//! | `BATTLE_TICK_MS`     | tick interval in milliseconds            |
//! | `BATTLE_SEED`        | fixed RNG seed                           |
//! | `BATTLE_AUTOPILOT`   | let the AI drive the player team too     |
//! | `BATTLE_START_LEVEL` | first level to play                      |
//! | `BATTLE_MAX_TICKS`   | stop after this many ticks               |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use battle_core::BattleConfig;
use battle_runtime::RuntimeConfig;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub data_dir: PathBuf,
    pub tick_interval: Duration,
    pub seed: Option<u64>,
    pub autopilot: bool,
    pub start_level: u32,
    pub max_ticks: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_dir: battle_content::bundled_data_dir(),
            tick_interval: Duration::from_millis(40),
            seed: None,
            autopilot: true,
            start_level: 0,
            max_ticks: 200_000,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).map(|value| value.trim().to_string());
        let mut config = Self::default();

        if let Some(dir) = read("BATTLE_DATA_DIR").filter(|dir| !dir.is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(ms) = read("BATTLE_TICK_MS").and_then(|v| v.parse::<u64>().ok()) {
            config.tick_interval = Duration::from_millis(ms.max(1));
        }
        if let Some(seed) = read("BATTLE_SEED").and_then(|v| v.parse::<u64>().ok()) {
            config.seed = Some(seed);
        }
        if let Some(autopilot) = read("BATTLE_AUTOPILOT").and_then(|v| parse_bool(&v)) {
            config.autopilot = autopilot;
        }
        if let Some(level) = read("BATTLE_START_LEVEL").and_then(|v| v.parse::<u32>().ok()) {
            config.start_level = level;
        }
        if let Some(ticks) = read("BATTLE_MAX_TICKS").and_then(|v| v.parse::<u64>().ok()) {
            config.max_ticks = ticks.max(1);
        }

        config
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            battle: BattleConfig::default().with_autopilot(self.autopilot),
            seed: self.seed,
            tick_interval: self.tick_interval,
            ..RuntimeConfig::default()
        }
    }

    /// Wall-clock budget implied by `max_ticks`.
    pub fn time_budget(&self) -> Duration {
        self.tick_interval
            .saturating_mul(u32::try_from(self.max_ticks).unwrap_or(u32::MAX))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config_from(&[]);
        assert_eq!(config.data_dir, battle_content::bundled_data_dir());
        assert_eq!(config.tick_interval, Duration::from_millis(40));
        assert_eq!(config.seed, None);
        assert!(config.autopilot);
        assert_eq!(config.start_level, 0);
    }

    #[test]
    fn variables_override_defaults() {
        let config = config_from(&[
            ("BATTLE_DATA_DIR", "/srv/battle"),
            ("BATTLE_TICK_MS", "5"),
            ("BATTLE_SEED", "42"),
            ("BATTLE_AUTOPILOT", "off"),
            ("BATTLE_START_LEVEL", "2"),
            ("BATTLE_MAX_TICKS", "100"),
        ]);
        assert_eq!(config.data_dir, PathBuf::from("/srv/battle"));
        assert_eq!(config.seed, Some(42));
        assert!(!config.autopilot);
        assert_eq!(config.start_level, 2);
        assert_eq!(config.time_budget(), Duration::from_millis(500));

        let runtime = config.runtime_config();
        assert_eq!(runtime.seed, Some(42));
        assert!(!runtime.battle.autopilot);
    }

    #[test]
    fn garbage_values_are_ignored() {
        let config = config_from(&[("BATTLE_TICK_MS", "fast"), ("BATTLE_AUTOPILOT", "maybe")]);
        assert_eq!(config.tick_interval, Duration::from_millis(40));
        assert!(config.autopilot);
    }
}
