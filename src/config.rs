//! Runtime configuration from environment variables.
//!
//! `.env` files are honored through `dotenvy` in `main`; this module only
//! reads the resulting variables. Every variable has a default except
//! `DATABASE_URL`, whose presence selects the Postgres backend.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;

use layout::PositionPolicy;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATA_FILE: &str = "data/db.json";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_CANVAS_WIDTH: f64 = 1920.0;
const DEFAULT_CANVAS_HEIGHT: f64 = 1080.0;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

/// Canvas size used when a layout request does not specify one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StorageConfig {
    File(PathBuf),
    Postgres { url: String, max_connections: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub storage: StorageConfig,
    /// Built frontend served for any non-API path.
    pub static_dir: Option<PathBuf>,
    /// Whether re-layouts keep positions users placed by hand.
    pub position_policy: PositionPolicy,
    pub canvas: CanvasSize,
    /// Hides panic details from 500 responses.
    pub production: bool,
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first variable that fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup`, which returns a variable's value
    /// or `None` if unset.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first variable that fails to parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = parse_or(var("PORT"), "PORT", DEFAULT_PORT)?;
        let storage = match var("DATABASE_URL") {
            Some(url) => StorageConfig::Postgres {
                url,
                max_connections: parse_or(var("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            },
            None => StorageConfig::File(var("DATA_FILE").map_or_else(|| PathBuf::from(DEFAULT_DATA_FILE), PathBuf::from)),
        };
        let position_policy = parse_or(var("POSITION_POLICY"), "POSITION_POLICY", PositionPolicy::default())?;
        let canvas = CanvasSize {
            width: parse_dimension(var("CANVAS_WIDTH"), "CANVAS_WIDTH", DEFAULT_CANVAS_WIDTH)?,
            height: parse_dimension(var("CANVAS_HEIGHT"), "CANVAS_HEIGHT", DEFAULT_CANVAS_HEIGHT)?,
        };
        let production = var("APP_ENV").is_some_and(|env| env.eq_ignore_ascii_case("production"));

        Ok(Self {
            port,
            storage,
            static_dir: var("STATIC_DIR").map(PathBuf::from),
            position_policy,
            canvas,
            production,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            storage: StorageConfig::File(PathBuf::from(DEFAULT_DATA_FILE)),
            static_dir: None,
            position_policy: PositionPolicy::default(),
            canvas: CanvasSize { width: DEFAULT_CANVAS_WIDTH, height: DEFAULT_CANVAS_HEIGHT },
            production: false,
        }
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, var: &'static str, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue { var, value }),
    }
}

fn parse_dimension(raw: Option<String>, var: &'static str, default: f64) -> Result<f64, ConfigError> {
    let value = parse_or(raw, var, default)?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue { var, value: value.to_string() })
    }
}
