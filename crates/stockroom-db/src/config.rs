//! # Stockroom Configuration
//!
//! Where the ledger lives and how the pool and history reads behave.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOCKROOM_DB_PATH=/srv/stockroom.db                                │
//! │     STOCKROOM_MAX_CONNECTIONS=8                                        │
//! │     STOCKROOM_HISTORY_LIMIT=100                                        │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/stockroom/stockroom.toml (Linux)                         │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     ~/.local/share/stockroom/stockroom.db, 5 connections, 50 history   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/var/lib/stockroom/stockroom.db"
//! max_connections = 5
//! min_connections = 1
//! connect_timeout_secs = 30
//! busy_timeout_secs = 5
//!
//! [ledger]
//! history_limit = 50
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use stockroom_core::DEFAULT_HISTORY_LIMIT;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::pool::DbConfig;

const DB_FILE_NAME: &str = "stockroom.db";
const CONFIG_FILE_NAME: &str = "stockroom.toml";

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file; `:memory:` for a throwaway database.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// How long a writer waits on a locked database before failing.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_secs: u64,
}

fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("com", "stockroom", "stockroom")
        .map(|dirs| dirs.data_dir().join(DB_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(DB_FILE_NAME))
}

fn default_max_connections() -> u32 {
    5
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_busy_timeout() -> u64 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            busy_timeout_secs: default_busy_timeout(),
        }
    }
}

// =============================================================================
// Ledger Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSettings {
    /// Movements returned by a history read without an explicit limit.
    #[serde(default = "default_history_limit")]
    pub history_limit: i64,
}

fn default_history_limit() -> i64 {
    DEFAULT_HISTORY_LIMIT
}

impl Default for LedgerSettings {
    fn default() -> Self {
        LedgerSettings {
            history_limit: default_history_limit(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete Stockroom configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockroomConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub ledger: LedgerSettings,
}

impl StockroomConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`stockroom.toml`)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> DbResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading stockroom config from file");
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| DbError::Config(format!("{}: {e}", path.display())))?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load stockroom config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses a TOML document; missing keys fall back to defaults.
    pub fn from_toml(contents: &str) -> DbResult<Self> {
        toml::from_str(contents).map_err(|e| DbError::Config(e.to_string()))
    }

    /// Validates the configuration.
    pub fn validate(&self) -> DbResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(DbError::Config("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(DbError::Config(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(DbError::Config(
                "database.min_connections must not exceed max_connections".into(),
            ));
        }

        if self.ledger.history_limit <= 0 {
            return Err(DbError::Config(
                "ledger.history_limit must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies `STOCKROOM_*` overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("STOCKROOM_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = lookup("STOCKROOM_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring invalid STOCKROOM_MAX_CONNECTIONS"),
            }
        }

        if let Some(limit) = lookup("STOCKROOM_HISTORY_LIMIT") {
            match limit.parse::<i64>() {
                Ok(n) => self.ledger.history_limit = n,
                Err(_) => warn!(value = %limit, "Ignoring invalid STOCKROOM_HISTORY_LIMIT"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "stockroom", "stockroom")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Pool settings for [`Database::new`](crate::Database::new).
    pub fn db_config(&self) -> DbConfig {
        let db = &self.database;
        let base = if db.path.as_os_str() == ":memory:" {
            DbConfig::in_memory()
        } else {
            DbConfig::new(&db.path)
                .max_connections(db.max_connections)
                .min_connections(db.min_connections)
        };

        base.connect_timeout(Duration::from_secs(db.connect_timeout_secs))
            .busy_timeout(Duration::from_secs(db.busy_timeout_secs))
            .history_limit(self.ledger.history_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = StockroomConfig::default();
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.ledger.history_limit, 50);
        assert!(config.database.path.ends_with("stockroom.db"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = StockroomConfig::from_toml(
            r#"
            [database]
            path = "/tmp/shop.db"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.path, PathBuf::from("/tmp/shop.db"));
        assert_eq!(config.database.busy_timeout_secs, 5);
        assert_eq!(config.ledger.history_limit, 50);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("STOCKROOM_DB_PATH", ":memory:"),
            ("STOCKROOM_MAX_CONNECTIONS", "not-a-number"),
            ("STOCKROOM_HISTORY_LIMIT", "10"),
        ]
        .into_iter()
        .collect();

        let mut config = StockroomConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.path, PathBuf::from(":memory:"));
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.ledger.history_limit, 10);

        let db = config.db_config();
        assert!(db.is_in_memory());
        assert_eq!(db.history_limit, 10);
    }

    #[test]
    fn test_config_validation() {
        let mut config = StockroomConfig::default();
        config.database.max_connections = 0;
        assert!(matches!(config.validate(), Err(DbError::Config(_))));

        let mut config = StockroomConfig::default();
        config.ledger.history_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&StockroomConfig::default()).unwrap();
        assert!(toml_str.contains("[database]"));
        assert!(toml_str.contains("[ledger]"));
    }

    #[tokio::test]
    async fn test_configured_path_in_fresh_directory_opens() {
        let root = std::env::temp_dir().join(format!(
            "stockroom-config-{}-{}",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let path = root.join("share").join("stockroom").join("stockroom.db");

        let mut config = StockroomConfig::default();
        config.database.path = path.clone();

        let db = crate::Database::new(config.db_config()).await.unwrap();
        assert!(db.health_check().await);
        assert!(path.exists());
        db.close().await;

        std::fs::remove_dir_all(&root).unwrap();
    }
}
