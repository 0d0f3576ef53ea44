//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;

use crate::game::Tuning;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub json_logs: bool,

    /// Allowed client origins for CORS (comma-separated)
    pub client_origin: String,

    /// Override for the match clock, in seconds
    pub match_duration: Option<f32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            log_level: "info".to_string(),
            json_logs: false,
            client_origin: "http://localhost:5173".to_string(),
            match_duration: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        };

        let match_duration = match env::var("MATCH_DURATION_SECS") {
            Ok(raw) => Some(parse_duration(&raw)?),
            Err(_) => None,
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress(server_addr.clone()))?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            json_logs: matches!(env::var("LOG_FORMAT").as_deref(), Ok("json")),

            client_origin: env::var("CLIENT_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),

            match_duration,
        })
    }

    /// Gameplay tuning with configured overrides applied
    pub fn tuning(&self) -> Tuning {
        let mut tuning = Tuning::default();
        if let Some(duration) = self.match_duration {
            tuning.matches.duration = duration;
        }
        tuning
    }
}

fn parse_duration(raw: &str) -> Result<f32, ConfigError> {
    match raw.trim().parse::<f32>() {
        Ok(secs) if secs.is_finite() && secs > 0.0 => Ok(secs),
        _ => Err(ConfigError::Invalid {
            key: "MATCH_DURATION_SECS",
            value: raw.to_string(),
        }),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server address: {0}")]
    InvalidAddress(String),

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}
