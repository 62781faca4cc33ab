//! Ledger engine configuration management.

use serde::Deserialize;

/// Configuration for the balance ledger engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LedgerConfig {
    /// Earliest year an accounting period may be created for.
    #[serde(default = "default_min_year")]
    pub min_period_year: i32,
    /// Latest year an accounting period may be created for.
    #[serde(default = "default_max_year")]
    pub max_period_year: i32,
}

fn default_min_year() -> i32 {
    1900
}

fn default_max_year() -> i32 {
    2100
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            min_period_year: default_min_year(),
            max_period_year: default_max_year(),
        }
    }
}

impl LedgerConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("FUNDLEDGER").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Returns true if the year falls within the configured sane range.
    #[must_use]
    pub const fn year_in_range(&self, year: i32) -> bool {
        year >= self.min_period_year && year <= self.max_period_year
    }
}
