//! Store configuration.
//!
//! [`StoreConfig`] carries the tunables of a
//! [`WorldRegistry`](crate::engine::registry::WorldRegistry). It can be built
//! in code, taken from [`Default`], or parsed from TOML:
//!
//! ```ignore
//! let cfg = StoreConfig::from_toml_str(r#"
//!     column_capacity = 4096
//!     default_tick_interval = 2
//! "#)?;
//! let world = WorldRegistry::with_config(cfg)?;
//! ```
//!
//! Missing keys fall back to their defaults.

use serde::{Deserialize, Serialize};

use crate::engine::error::{
    ECSError,
    ECSResult,
};

use crate::engine::types::{
    Tick,
    DEFAULT_COLUMN_CAPACITY,
    DEFAULT_TICK_INTERVAL,
};


/// Tunables for a store instance.
///
/// ## Fields
/// * `column_capacity` - fixed row bound of every column. Writing a row at or
///   beyond it fails with [`ECSError::CapacityExceeded`].
/// * `default_tick_interval` - interval used by systems built without an
///   explicit [`every`](crate::engine::query::SystemBuilder::every).

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Maximum rows per column.
    pub column_capacity: usize,

    /// Interval for systems that do not set one.
    pub default_tick_interval: Tick,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            column_capacity: DEFAULT_COLUMN_CAPACITY,
            default_tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

impl StoreConfig {
    /// Parses a configuration from TOML text and validates it.
    pub fn from_toml_str(text: &str) -> ECSResult<Self> {
        let cfg: StoreConfig =
            toml::from_str(text).map_err(|e| ECSError::InvalidConfig(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Serializes the configuration to TOML text.
    pub fn to_toml_string(&self) -> ECSResult<String> {
        toml::to_string(self).map_err(|e| ECSError::InvalidConfig(e.to_string()))
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> ECSResult<()> {
        if self.column_capacity == 0 {
            return Err(ECSError::InvalidConfig(
                "column_capacity must be greater than zero".into(),
            ));
        }
        if self.default_tick_interval == 0 {
            return Err(ECSError::InvalidTickInterval);
        }
        Ok(())
    }
}
