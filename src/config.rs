use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub store: StoreConfig,

    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// SQLite URL, e.g. `sqlite:data/recipebox.db` or `sqlite::memory:`
    pub database_path: String,

    pub log_level: String,

    /// Emit logs as JSON lines instead of the human readable format
    pub json_logs: bool,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/recipebox.db".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Upper bound for a single catalog call, in milliseconds
    pub query_timeout_ms: u64,

    /// Recipes aggregated concurrently when materializing a list
    pub aggregate_concurrency: usize,

    /// Maximum number of recipes a search returns
    pub search_result_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            query_timeout_ms: 5_000,
            aggregate_concurrency: 4,
            search_result_limit: 50,
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub const fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

/// Reference data inserted on `migrate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub ingredients: Vec<String>,

    pub tags: Vec<SeedTag>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedTag {
    pub name: String,

    #[serde(default)]
    pub color: Option<String>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        let ingredients = [
            "Flour", "Sugar", "Salt", "Butter", "Eggs", "Milk", "Olive Oil", "Garlic", "Onion",
            "Tomatoes", "Basil",
        ];
        let tags = [
            ("Vegetarian", "#28a745"),
            ("Vegan", "#20c997"),
            ("Dessert", "#e83e8c"),
            ("Quick", "#ffc107"),
            ("Breakfast", "#fd7e14"),
            ("Dinner", "#007bff"),
        ];

        Self {
            ingredients: ingredients.iter().map(ToString::to_string).collect(),
            tags: tags
                .iter()
                .map(|(name, color)| SeedTag {
                    name: (*name).to_string(),
                    color: Some((*color).to_string()),
                })
                .collect(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![Self::default_config_path()];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("recipebox").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".recipebox").join("config.toml"));
        }

        paths
    }

    #[must_use]
    pub fn default_config_path() -> PathBuf {
        PathBuf::from("recipebox.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.store.query_timeout_ms == 0 {
            anyhow::bail!("store.query_timeout_ms must be > 0");
        }

        if self.store.aggregate_concurrency == 0 {
            anyhow::bail!("store.aggregate_concurrency must be > 0");
        }

        if self.general.min_db_connections > self.general.max_db_connections {
            anyhow::bail!(
                "general.min_db_connections ({}) exceeds general.max_db_connections ({})",
                self.general.min_db_connections,
                self.general.max_db_connections
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.database_path, "sqlite:data/recipebox.db");
        assert_eq!(config.store.query_timeout(), Duration::from_secs(5));
        assert_eq!(config.store.search_result_limit, 50);
        assert!(config.seed.ingredients.iter().any(|i| i == "Basil"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[store]"));
        assert!(toml_str.contains("[[seed.tags]]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [store]
            search_result_limit = 10

            [seed]
            ingredients = ["Saffron"]
            tags = [{ name = "Spicy" }]
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.store.search_result_limit, 10);
        assert_eq!(config.store.aggregate_concurrency, 4);
        assert_eq!(config.seed.ingredients, vec!["Saffron".to_string()]);
        assert_eq!(config.seed.tags[0].color, None);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.store.query_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.store.aggregate_concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.general.min_db_connections = 6;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = std::env::temp_dir().join(format!("recipebox-config-{}.toml", std::process::id()));
        let mut config = Config::default();
        config.general.json_logs = true;
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert!(loaded.general.json_logs);
        std::fs::remove_file(&path).ok();
    }
}
