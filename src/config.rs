use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Configuration for the Palmarès economy service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomyConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Security configuration
    pub security: SecurityConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Economy tuning knobs
    pub economy: EconomySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Rate limit per minute per IP
    pub rate_limit_per_minute: u32,
    /// Maximum request body size in bytes
    pub max_request_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    pub postgres_url: Option<String>,
    /// Enable PostgreSQL (if false, uses in-memory fallback)
    pub postgres_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug)
    pub level: String,
}

/// Reward and pricing knobs for the point and gem economies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomySettings {
    /// Points granted for answering someone else's question
    pub answer_reward_points: i64,
    /// Smallest stake a question may offer
    pub min_stake: i64,
    /// Largest stake a question may offer
    pub max_stake: i64,
    /// Points consumed per gem when converting
    pub gem_conversion_rate: i64,
    /// Gems credited alongside a best-answer selection
    pub best_answer_gem_bonus: i64,
    /// Seed demo users and offers on startup (memory backend only)
    pub seed_demo_data: bool,
}

impl Default for EconomySettings {
    fn default() -> Self {
        Self {
            answer_reward_points: 2,
            min_stake: 1,
            max_stake: 15,
            gem_conversion_rate: 10,
            best_answer_gem_bonus: 1,
            seed_demo_data: true,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            postgres_url: None,
            postgres_enabled: false,
        }
    }
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8090,
            },
            security: SecurityConfig {
                rate_limit_per_minute: 120,
                max_request_size: 1024 * 1024, // 1MB
            },
            database: DatabaseConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            economy: EconomySettings::default(),
        }
    }
}

impl EconomyConfig {
    /// Load configuration from environment variables and validate it
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        // Server configuration
        if let Ok(host) = env::var("PALMARES_HOST") {
            config.server.host = host;
        }

        if let Ok(port) = env::var("PALMARES_PORT") {
            config.server.port = port.parse().context("Invalid PALMARES_PORT value")?;
        }

        // Security configuration
        if let Ok(rate_limit) = env::var("PALMARES_RATE_LIMIT_PER_MINUTE") {
            config.security.rate_limit_per_minute = rate_limit
                .parse()
                .context("Invalid PALMARES_RATE_LIMIT_PER_MINUTE value")?;
        }

        if let Ok(max_size) = env::var("PALMARES_MAX_REQUEST_SIZE") {
            config.security.max_request_size = max_size
                .parse()
                .context("Invalid PALMARES_MAX_REQUEST_SIZE value")?;
        }

        // Database configuration
        if let Ok(url) = env::var("PALMARES_POSTGRES_URL") {
            config.database.postgres_url = Some(url);
        }

        if let Ok(enabled) = env::var("PALMARES_POSTGRES_ENABLED") {
            config.database.postgres_enabled = enabled
                .parse()
                .context("Invalid PALMARES_POSTGRES_ENABLED value")?;
        }

        // Logging configuration
        if let Ok(log_level) = env::var("PALMARES_LOG_LEVEL") {
            config.logging.level = log_level;
        }

        // Economy configuration
        if let Ok(reward) = env::var("PALMARES_ANSWER_REWARD_POINTS") {
            config.economy.answer_reward_points = reward
                .parse()
                .context("Invalid PALMARES_ANSWER_REWARD_POINTS value")?;
        }

        if let Ok(stake) = env::var("PALMARES_MIN_STAKE") {
            config.economy.min_stake = stake.parse().context("Invalid PALMARES_MIN_STAKE value")?;
        }

        if let Ok(stake) = env::var("PALMARES_MAX_STAKE") {
            config.economy.max_stake = stake.parse().context("Invalid PALMARES_MAX_STAKE value")?;
        }

        if let Ok(rate) = env::var("PALMARES_GEM_CONVERSION_RATE") {
            config.economy.gem_conversion_rate = rate
                .parse()
                .context("Invalid PALMARES_GEM_CONVERSION_RATE value")?;
        }

        if let Ok(bonus) = env::var("PALMARES_BEST_ANSWER_GEM_BONUS") {
            config.economy.best_answer_gem_bonus = bonus
                .parse()
                .context("Invalid PALMARES_BEST_ANSWER_GEM_BONUS value")?;
        }

        if let Ok(seed) = env::var("PALMARES_SEED_DEMO_DATA") {
            config.economy.seed_demo_data = seed
                .parse()
                .context("Invalid PALMARES_SEED_DEMO_DATA value")?;
        }

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration for consistency
    fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            return Err(anyhow::anyhow!("Server host cannot be empty"));
        }

        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port must be non-zero"));
        }

        if self.database.postgres_enabled && self.database.postgres_url.is_none() {
            return Err(anyhow::anyhow!(
                "PALMARES_POSTGRES_URL is required when PALMARES_POSTGRES_ENABLED is true"
            ));
        }

        if self.economy.min_stake < 1 {
            return Err(anyhow::anyhow!("Minimum stake must be at least 1"));
        }

        if self.economy.max_stake < self.economy.min_stake {
            return Err(anyhow::anyhow!(
                "Maximum stake {} is below minimum stake {}",
                self.economy.max_stake,
                self.economy.min_stake
            ));
        }

        if self.economy.answer_reward_points < 0 {
            return Err(anyhow::anyhow!("Answer reward cannot be negative"));
        }

        if self.economy.gem_conversion_rate < 1 {
            return Err(anyhow::anyhow!("Gem conversion rate must be at least 1"));
        }

        if self.economy.best_answer_gem_bonus < 0 {
            return Err(anyhow::anyhow!("Best answer gem bonus cannot be negative"));
        }

        Ok(())
    }
}

/// Sanitize bearer tokens and similar secrets for logging
pub fn sanitize_for_logging(data: &str) -> String {
    if data.len() > 8 {
        format!("{}***{}", &data[..3], &data[data.len() - 3..])
    } else {
        "***".to_string()
    }
}
