//! Configuration module for the MedPredict API
//!
//! Defaults live in utils/constants.rs; every value can be overridden
//! through the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use super::errors::{AppError, AppResult};
use crate::utils::constants::{
    DEFAULT_HOST, DEFAULT_PASSWORD_ROUNDS, DEFAULT_PORT, DEFAULT_RATE_LIMIT,
    DEFAULT_TELEMETRY_BUFFER, DEFAULT_TELEMETRY_DIR, MIN_PASSWORD_ROUNDS, RATE_LIMIT_WINDOW_SECS,
};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind host (`MEDPREDICT_HOST`)
    pub host: String,
    /// Bind port (`PORT`, then `MEDPREDICT_PORT`)
    pub port: u16,
    /// Load demo accounts with fixed tokens (`MEDPREDICT_SEED_DEMO`, off unless set)
    pub seed_demo: bool,
    /// PBKDF2 iterations for new password hashes (`MEDPREDICT_PASSWORD_ROUNDS`)
    pub password_rounds: u32,
    /// Requests per key per window (`MEDPREDICT_RATE_LIMIT`)
    pub rate_limit: u32,
    pub rate_limit_window: Duration,
    /// Telemetry export directory (`MEDPREDICT_TELEMETRY_DIR`)
    pub telemetry_dir: PathBuf,
    pub telemetry_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            seed_demo: false,
            password_rounds: DEFAULT_PASSWORD_ROUNDS,
            rate_limit: DEFAULT_RATE_LIMIT,
            rate_limit_window: Duration::from_secs(RATE_LIMIT_WINDOW_SECS),
            telemetry_dir: PathBuf::from(DEFAULT_TELEMETRY_DIR),
            telemetry_buffer: DEFAULT_TELEMETRY_BUFFER,
        }
    }
}

impl ServerConfig {
    /// Load from process environment
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("MEDPREDICT_HOST").filter(|h| !h.trim().is_empty()) {
            config.host = host.trim().to_string();
        }

        // Hosting platforms set PORT; MEDPREDICT_PORT is for local runs
        if let Some((key, raw)) = ["PORT", "MEDPREDICT_PORT"]
            .iter()
            .find_map(|k| lookup(k).map(|v| (*k, v)))
        {
            config.port = raw
                .trim()
                .parse()
                .map_err(|_| AppError::invalid_config(key, &raw))?;
        }

        if let Some(raw) = lookup("MEDPREDICT_SEED_DEMO") {
            config.seed_demo = parse_bool(&raw)
                .ok_or_else(|| AppError::invalid_config("MEDPREDICT_SEED_DEMO", &raw))?;
        }

        if let Some(raw) = lookup("MEDPREDICT_PASSWORD_ROUNDS") {
            config.password_rounds = raw
                .trim()
                .parse()
                .ok()
                .filter(|n| *n >= MIN_PASSWORD_ROUNDS)
                .ok_or_else(|| AppError::invalid_config("MEDPREDICT_PASSWORD_ROUNDS", &raw))?;
        }

        if let Some(raw) = lookup("MEDPREDICT_RATE_LIMIT") {
            config.rate_limit = raw
                .trim()
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| AppError::invalid_config("MEDPREDICT_RATE_LIMIT", &raw))?;
        }

        if let Some(dir) = lookup("MEDPREDICT_TELEMETRY_DIR").filter(|d| !d.trim().is_empty()) {
            config.telemetry_dir = PathBuf::from(dir.trim());
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> AppResult<SocketAddr> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse()
            .map_err(|_| AppError::invalid_config("MEDPREDICT_HOST", &self.host))
    }

    pub fn log_summary(&self) {
        info!(
            host = %self.host,
            port = self.port,
            seed_demo = self.seed_demo,
            password_rounds = self.password_rounds,
            rate_limit = self.rate_limit,
            telemetry_dir = %self.telemetry_dir.display(),
            "Configuration loaded"
        );
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
