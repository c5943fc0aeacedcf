//! Application configuration loaded from environment variables.
//!
//! Policy thresholds that are expected to change (the Walk minimum duration
//! and the per-kind awards) are configurable here; both the gateway and any
//! in-process client build their policy through [`Config::policy`].

use crate::services::policy::{
    KindThresholds, ValidationPolicy, DEFAULT_BIKE_AWARD_POINTS, DEFAULT_WALK_AWARD_POINTS,
    DEFAULT_WALK_MIN_DURATION_SECS,
};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default client-side bound on a submission round trip.
pub const DEFAULT_SUBMISSION_TIMEOUT_SECS: u64 = 12;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,

    // --- Policy ---
    pub walk_min_duration_secs: u64,
    pub walk_award_points: u32,
    pub bike_award_points: u32,

    // --- Client ---
    /// Upper bound on one submission round trip
    pub submission_timeout: Duration,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:3000".to_string(),
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            walk_min_duration_secs: DEFAULT_WALK_MIN_DURATION_SECS,
            walk_award_points: DEFAULT_WALK_AWARD_POINTS,
            bike_award_points: DEFAULT_BIKE_AWARD_POINTS,
            submission_timeout: Duration::from_secs(DEFAULT_SUBMISSION_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            port: parse_or("PORT", 8080)?,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            walk_min_duration_secs: parse_or(
                "WALK_MIN_DURATION_SECS",
                DEFAULT_WALK_MIN_DURATION_SECS,
            )?,
            walk_award_points: parse_or("WALK_AWARD_POINTS", DEFAULT_WALK_AWARD_POINTS)?,
            bike_award_points: parse_or("BIKE_AWARD_POINTS", DEFAULT_BIKE_AWARD_POINTS)?,
            submission_timeout: Duration::from_secs(parse_or(
                "SUBMISSION_TIMEOUT_SECS",
                DEFAULT_SUBMISSION_TIMEOUT_SECS,
            )?),
        })
    }

    /// Deterministic configuration for tests.
    pub fn test_default() -> Self {
        Self::default()
    }

    /// Validation policy with the configured overrides applied.
    pub fn policy(&self) -> ValidationPolicy {
        let mut walk = KindThresholds::walk();
        walk.min_duration_secs = self.walk_min_duration_secs;
        walk.award_points = self.walk_award_points;

        let mut bike = KindThresholds::bike();
        bike.award_points = self.bike_award_points;

        ValidationPolicy::new(walk, bike)
    }
}

/// Read an optional variable, falling back to `default` when unset.
fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
