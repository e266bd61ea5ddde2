//! Configuration management for Cargomail.
//!
//! Loads configuration from environment variables (and `.env` when present).

use std::env;
use std::sync::OnceLock;
use std::time::Duration;

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration
pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Initialize configuration (call once at startup)
pub fn init() -> &'static Config {
    config()
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub sequencer: SequencerConfig,
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_connections: u32,
    pub busy_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SequencerConfig {
    /// Upper bound on waiting for a user's write scope
    pub lock_timeout: Duration,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_millis(5000),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SmtpConfig {
    pub auth_username: Option<String>,
    pub auth_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            database: DatabaseConfig {
                path: env_or("DATABASE_PATH", "./data/cargomail.db"),
                max_connections: env_or("DATABASE_MAX_CONNECTIONS", "10")
                    .parse()
                    .unwrap_or(10),
                busy_timeout: Duration::from_secs(
                    env_or("DATABASE_BUSY_TIMEOUT_SECS", "30")
                        .parse()
                        .unwrap_or(30),
                ),
            },
            sequencer: SequencerConfig {
                lock_timeout: Duration::from_millis(
                    env_or("SEQUENCER_LOCK_TIMEOUT_MS", "5000")
                        .parse()
                        .unwrap_or(5000),
                ),
            },
            smtp: SmtpConfig {
                auth_username: env::var("SMTP_AUTH_USERNAME").ok(),
                auth_password: env::var("SMTP_AUTH_PASSWORD").ok(),
            },
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_falls_back_to_default() {
        assert_eq!(env_or("CARGOMAIL_TEST_UNSET_VARIABLE", "fallback"), "fallback");
    }

    #[test]
    fn test_sequencer_default_timeout() {
        assert_eq!(SequencerConfig::default().lock_timeout, Duration::from_secs(5));
    }
}
