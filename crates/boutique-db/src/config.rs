//! # Configuration
//!
//! Settings for the database and the order and inventory services.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     BOUTIQUE_DB_PATH=/srv/boutique.db                                  │
//! │     BOUTIQUE_NUMBERING=legacy                                          │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/boutique/boutique.toml (Linux)                           │
//! │     ~/Library/Application Support/com.boutique.backoffice/... (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "boutique.db"
//! max_connections = 5
//!
//! [orders]
//! numbering = "date_prefixed"   # date_prefixed | legacy
//! max_allocation_attempts = 5
//!
//! [inventory]
//! overdraft_policy = "reject"   # reject | clamp | allow_negative
//! max_update_attempts = 5
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use boutique_core::allocator::DEFAULT_ALLOCATION_ATTEMPTS;
use boutique_core::deduction::DEFAULT_UPDATE_ATTEMPTS;
use boutique_core::{AllocatorSettings, DeductionSettings, NumberingScheme, OverdraftPolicy};

use crate::error::{DbError, DbResult};
use crate::pool::DbConfig;

const CONFIG_FILE: &str = "boutique.toml";

// =============================================================================
// Sections
// =============================================================================

/// `[database]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file; relative paths resolve against the working directory.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("boutique.db")
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
fn default_idle_timeout() -> u64 {
    600
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

/// `[orders]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSettings {
    #[serde(default)]
    pub numbering: NumberingScheme,

    #[serde(default = "default_allocation_attempts")]
    pub max_allocation_attempts: u32,
}

fn default_allocation_attempts() -> u32 {
    DEFAULT_ALLOCATION_ATTEMPTS
}

impl Default for OrderSettings {
    fn default() -> Self {
        OrderSettings {
            numbering: NumberingScheme::default(),
            max_allocation_attempts: default_allocation_attempts(),
        }
    }
}

/// `[inventory]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventorySettings {
    #[serde(default)]
    pub overdraft_policy: OverdraftPolicy,

    #[serde(default = "default_update_attempts")]
    pub max_update_attempts: u32,
}

fn default_update_attempts() -> u32 {
    DEFAULT_UPDATE_ATTEMPTS
}

impl Default for InventorySettings {
    fn default() -> Self {
        InventorySettings {
            overdraft_policy: OverdraftPolicy::default(),
            max_update_attempts: default_update_attempts(),
        }
    }
}

// =============================================================================
// Boutique Config
// =============================================================================

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoutiqueConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub orders: OrderSettings,

    #[serde(default)]
    pub inventory: InventorySettings,
}

impl BoutiqueConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (boutique.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> DbResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parses a config document without touching the environment.
    pub fn from_toml(contents: &str) -> DbResult<Self> {
        Ok(toml::from_str(contents)?)
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

        if self.orders.max_allocation_attempts == 0 {
            return Err(DbError::Config(
                "orders.max_allocation_attempts must be greater than 0".into(),
            ));
        }

        if self.inventory.max_update_attempts == 0 {
            return Err(DbError::Config(
                "inventory.max_update_attempts must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("BOUTIQUE_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Ok(max) = std::env::var("BOUTIQUE_DB_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring invalid BOUTIQUE_DB_MAX_CONNECTIONS"),
            }
        }

        if let Ok(scheme) = std::env::var("BOUTIQUE_NUMBERING") {
            match scheme.parse() {
                Ok(parsed) => {
                    debug!(scheme = %scheme, "Overriding numbering scheme from environment");
                    self.orders.numbering = parsed;
                }
                Err(_) => warn!(scheme = %scheme, "Unknown numbering scheme in environment"),
            }
        }

        if let Ok(policy) = std::env::var("BOUTIQUE_OVERDRAFT_POLICY") {
            match policy.parse() {
                Ok(parsed) => self.inventory.overdraft_policy = parsed,
                Err(_) => warn!(policy = %policy, "Unknown overdraft policy in environment"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "boutique", "backoffice")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    // =========================================================================
    // Conversions
    // =========================================================================

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path)
            .max_connections(self.database.max_connections)
            .min_connections(self.database.min_connections)
            .connect_timeout(Duration::from_secs(self.database.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(self.database.idle_timeout_secs))
    }

    pub fn allocator_settings(&self) -> AllocatorSettings {
        AllocatorSettings {
            scheme: self.orders.numbering,
            max_attempts: self.orders.max_allocation_attempts,
        }
    }

    pub fn deduction_settings(&self) -> DeductionSettings {
        DeductionSettings {
            policy: self.inventory.overdraft_policy,
            max_attempts: self.inventory.max_update_attempts,
        }
    }
}
