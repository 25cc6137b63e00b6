//! Configuration loading for the order agent.
//!
//! The file is YAML with `${VAR}` / `${VAR:-default}` environment
//! interpolation. Strategy multipliers and the notification level are
//! re-read from the same file on every loop iteration (see
//! [`crate::infrastructure::settings::ConfigFileSettings`]).
//!
//! ```rust,ignore
//! use order_agent::config::load_config;
//!
//! let config = load_config(None)?;
//! println!("exchange: {}", config.exchange.name);
//! ```

mod exchange;
mod governor;
mod ladder;
mod notifications;
mod observability;
mod paper;
mod strategy;
mod sweeper;

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use exchange::ExchangeConfig;
pub use governor::GovernorConfig;
pub use ladder::LadderConfig;
pub use notifications::NotificationsConfig;
pub use observability::ObservabilityConfig;
pub use paper::{PaperConfig, PaperMarketConfig};
pub use strategy::StrategyConfigExternal;
pub use sweeper::SweeperConfig;

use crate::domain::shared::MarketPair;
use crate::domain::strategy::DynamicSettings;

/// Path used when none is given.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Environment variable overriding the config path.
pub const CONFIG_PATH_ENV: &str = "ORDER_AGENT_CONFIG";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Exchange identity and session storage.
    #[serde(default)]
    pub exchange: ExchangeConfig,
    /// Strategy settings.
    #[serde(default)]
    pub strategy: StrategyConfigExternal,
    /// Notification settings.
    #[serde(default)]
    pub notifications: NotificationsConfig,
    /// Stale-order sweeper.
    #[serde(default)]
    pub sweeper: SweeperConfig,
    /// Request governor.
    #[serde(default)]
    pub governor: GovernorConfig,
    /// Logging and metrics.
    #[serde(default)]
    pub observability: ObservabilityConfig,
    /// Paper exchange seed.
    #[serde(default)]
    pub paper: PaperConfig,
    /// Buy ladder reconciled at start-up.
    #[serde(default)]
    pub ladder: Option<LadderConfig>,
}

impl Config {
    /// Settings re-read every iteration.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming the offending field.
    pub fn dynamic_settings(&self) -> Result<DynamicSettings, ConfigError> {
        Ok(DynamicSettings {
            level: self.notifications.level()?,
            take_profit: self.strategy.take_profit()?,
            stop_loss: self.strategy.stop_loss()?,
        })
    }
}

/// Load configuration from a YAML file with environment variable interpolation.
///
/// `path` defaults to `$ORDER_AGENT_CONFIG`, then `config.yaml`.
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(
        || std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string()),
        str::to_string,
    );

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map_or("", |m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.exchange.name.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "exchange.name must not be empty".to_string(),
        ));
    }

    config.dynamic_settings()?;
    config.strategy.to_strategy(config.exchange.api_version)?;

    if config.sweeper.interval_secs <= 0 {
        return Err(ConfigError::ValidationError(
            "sweeper.interval_secs must be positive".to_string(),
        ));
    }
    if config.sweeper.max_order_age_days <= 0 {
        return Err(ConfigError::ValidationError(
            "sweeper.max_order_age_days must be positive".to_string(),
        ));
    }

    if let Some(call) = config.governor.calls.iter().find(|c| !c.path.starts_with('/')) {
        return Err(ConfigError::ValidationError(format!(
            "governor.calls path '{}' must start with '/'",
            call.path
        )));
    }

    if let Some(addr) = &config.observability.metrics_addr
        && addr.parse::<SocketAddr>().is_err()
    {
        return Err(ConfigError::ValidationError(format!(
            "observability.metrics_addr '{addr}' is not a socket address"
        )));
    }

    for market in &config.paper.markets {
        if market.base.trim().is_empty() || market.quote.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "paper.markets entries need base and quote".to_string(),
            ));
        }
        if market.ticker <= rust_decimal::Decimal::ZERO
            || market.min_trade_size <= rust_decimal::Decimal::ZERO
        {
            return Err(ConfigError::ValidationError(format!(
                "paper market {}: ticker and min_trade_size must be positive",
                market.symbol()
            )));
        }
    }

    if let Some(ladder) = &config.ladder {
        ladder.to_request()?;
        MarketPair::parse(&ladder.market, config.exchange.api_version)
            .map_err(|e| ConfigError::ValidationError(format!("ladder.market: {e}")))?;
    }

    Ok(())
}
