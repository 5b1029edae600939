use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub interval_secs: u64,
    pub output_dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            interval_secs: 5,
            output_dir: "logs".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Width budget for the process name column.
    pub name_width: usize,
    /// How many memory consumers the system summary lists.
    pub top_memory_count: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            name_width: 30,
            top_memory_count: 5,
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("procwatch").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
        Err(_) => Config::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = Config::default();
        assert_eq!(config.logging.interval_secs, 5);
        assert_eq!(config.logging.output_dir, "logs");
        assert_eq!(config.display.name_width, 30);
        assert_eq!(config.display.top_memory_count, 5);
    }

    #[test]
    fn parse_partial_toml() {
        let toml_str = r#"
[logging]
interval_secs = 30
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.logging.interval_secs, 30);
        // Other fields should be defaults
        assert_eq!(config.logging.output_dir, "logs");
        assert_eq!(config.display.name_width, 30);
    }

    #[test]
    fn parse_full_toml() {
        let toml_str = r#"
[logging]
interval_secs = 10
output_dir = "/var/log/procwatch"

[display]
name_width = 40
top_memory_count = 10
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.logging.interval_secs, 10);
        assert_eq!(config.logging.output_dir, "/var/log/procwatch");
        assert_eq!(config.display.name_width, 40);
        assert_eq!(config.display.top_memory_count, 10);
    }

    #[test]
    fn missing_file_returns_default() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.toml"));
        assert_eq!(config.logging.interval_secs, 5);
    }

    #[test]
    fn invalid_toml_returns_default() {
        let temp = std::env::temp_dir().join("procwatch_test_invalid.toml");
        std::fs::write(&temp, "this is not valid toml {{{{").unwrap();
        let config = load_config_from_path(&temp);
        assert_eq!(config.logging.interval_secs, 5);
        let _ = std::fs::remove_file(&temp);
    }
}
