use std::path::PathBuf;

const DATA_DIR_ENV: &str = "WORKTIME_DATA_DIR";
const DEBUG_ENV: &str = "WORKTIME_DEBUG";
const DEFAULT_DATA_DIR: &str = "worktime-data";

const DATABASE_FILE: &str = "worktime.sqlite3";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            debug: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let data_dir = lookup(DATA_DIR_ENV)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);
        let debug = lookup(DEBUG_ENV)
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self { data_dir, debug }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_defaults() {
        let config = AppConfig::from_lookup(|key| match key {
            "WORKTIME_DATA_DIR" => Some("/var/lib/worktime".into()),
            "WORKTIME_DEBUG" => Some("TRUE".into()),
            _ => None,
        });
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/worktime"));
        assert!(config.debug);
        assert_eq!(
            config.database_path(),
            PathBuf::from("/var/lib/worktime/worktime.sqlite3")
        );
    }

    #[test]
    fn blank_values_fall_back() {
        let config = AppConfig::from_lookup(|key| match key {
            "WORKTIME_DATA_DIR" => Some("  ".into()),
            "WORKTIME_DEBUG" => Some("no".into()),
            _ => None,
        });
        assert_eq!(config, AppConfig::default());
    }
}
