//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Per-event locking configuration.
    #[serde(default)]
    pub locking: LockingConfig,
    /// In-event programme configuration.
    #[serde(default)]
    pub programme: ProgrammeConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Per-event lock acquisition settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LockingConfig {
    /// How long a registration/cancellation request may wait for the event
    /// lock before failing with `Busy`.
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
}

/// Wall-clock offsets and round durations for the three-phase programme.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgrammeConfig {
    /// Minutes after event start when the voting session opens.
    #[serde(default = "default_voting_start_offset")]
    pub voting_start_offset_minutes: i64,
    /// Minutes after event start when the voting session closes.
    #[serde(default = "default_voting_end_offset")]
    pub voting_end_offset_minutes: i64,
    /// Standard speed-dating round length.
    #[serde(default = "default_round_minutes")]
    pub round_minutes: i32,
    /// Round length for top-match pairs when the extended-time twist won.
    #[serde(default = "default_extended_round_minutes")]
    pub extended_round_minutes: i32,
    /// How often the phase scheduler checks for due transitions, in seconds.
    #[serde(default = "default_scheduler_interval")]
    pub scheduler_interval_secs: u64,
}

impl Default for LockingConfig {
    fn default() -> Self {
        Self {
            acquire_timeout_ms: default_acquire_timeout_ms(),
        }
    }
}

impl Default for ProgrammeConfig {
    fn default() -> Self {
        Self {
            voting_start_offset_minutes: default_voting_start_offset(),
            voting_end_offset_minutes: default_voting_end_offset(),
            round_minutes: default_round_minutes(),
            extended_round_minutes: default_extended_round_minutes(),
            scheduler_interval_secs: default_scheduler_interval(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    50
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_acquire_timeout_ms() -> u64 {
    3000
}

const fn default_voting_start_offset() -> i64 {
    15
}

const fn default_voting_end_offset() -> i64 {
    30
}

const fn default_round_minutes() -> i32 {
    5
}

const fn default_extended_round_minutes() -> i32 {
    8
}

const fn default_scheduler_interval() -> u64 {
    30
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `RENDEZVOUS_ENV`)
    /// 3. Environment variables with `RENDEZVOUS_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("RENDEZVOUS_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("RENDEZVOUS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("RENDEZVOUS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_programme_defaults() {
        let programme = ProgrammeConfig::default();
        assert_eq!(programme.round_minutes, 5);
        assert_eq!(programme.extended_round_minutes, 8);
        assert!(programme.voting_start_offset_minutes < programme.voting_end_offset_minutes);
    }

    #[test]
    fn test_locking_defaults() {
        let locking = LockingConfig::default();
        assert_eq!(locking.acquire_timeout_ms, 3000);
    }
}
