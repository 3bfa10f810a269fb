//! Configuration loader for the `scale-telemetry` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
//!
//! A named profile (`APP_PROFILE`) decides which database variable is read and
//! whether one is mandatory.
use std::{env, fmt, str::FromStr};

use anyhow::{anyhow, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Named configuration set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    // ---
    Development,
    Testing,
    Production,
}

impl Profile {
    // ---
    /// Log level used when neither `RUST_LOG` nor `AXUM_LOG_LEVEL` is set.
    pub fn default_log_level(&self) -> &'static str {
        match self {
            Profile::Development => "debug",
            Profile::Testing => "warn",
            Profile::Production => "info",
        }
    }

    /// Environment variable holding this profile's database URL.
    pub fn database_url_var(&self) -> &'static str {
        match self {
            Profile::Development => "DEV_DATABASE_URL",
            Profile::Testing => "TEST_DATABASE_URL",
            Profile::Production => "DATABASE_URL",
        }
    }
}

impl FromStr for Profile {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "default" => Ok(Profile::Development),
            "testing" => Ok(Profile::Testing),
            "production" => Ok(Profile::Production),
            other => Err(anyhow!(
                "Invalid APP_PROFILE '{}': expected development, testing or production",
                other
            )),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Profile::Development => "development",
            Profile::Testing => "testing",
            Profile::Production => "production",
        };
        f.write_str(name)
    }
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Active profile.
    pub profile: Profile,

    /// PostgreSQL connection string. `None` selects the in-memory store.
    pub db_url: Option<String>,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// TCP port the HTTP server binds on all interfaces.
    pub http_port: u16,

    /// Per-device retention for the in-memory store (0 = unbounded).
    pub max_readings_per_device: u32,
}

/// Read `APP_PROFILE`, defaulting to development.
pub fn profile_from_env() -> Result<Profile> {
    // ---
    match env::var("APP_PROFILE") {
        Ok(name) => name.parse(),
        Err(_) => Ok(Profile::Development),
    }
}

/// Load configuration for `profile` from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string (production only)
///
/// Optional:
/// - `DEV_DATABASE_URL` / `TEST_DATABASE_URL` – database for the
///   development / testing profiles; in-memory store when unset
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `HTTP_PORT` – listen port (default: 8080)
/// - `MAX_READINGS_PER_DEVICE` – in-memory retention (default: 10000)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env(profile: Profile) -> Result<Config> {
    // ---
    let db_url = match profile {
        Profile::Production => Some(require_env!(profile.database_url_var())),
        _ => env::var(profile.database_url_var())
            .ok()
            .filter(|url| !url.trim().is_empty()),
    };
    let db_pool_max = parse_env_u32!("DB_POOL_MAX", 5);
    let http_port = parse_env_u32!("HTTP_PORT", 8080);
    let http_port =
        u16::try_from(http_port).map_err(|_| anyhow!("Invalid HTTP_PORT: {}", http_port))?;
    let max_readings_per_device = parse_env_u32!("MAX_READINGS_PER_DEVICE", 10_000);

    Ok(Config {
        profile,
        db_url,
        db_pool_max,
        http_port,
        max_readings_per_device,
    })
}

/// Mask the password component of a database URL for logging.
fn mask_db_url(db_url: &str) -> String {
    // ---
    if let Some(at_pos) = db_url.rfind('@') {
        if let Some(colon_pos) = db_url[..at_pos].rfind(':') {
            // `scheme://host@...` has no password: the colon belongs to the scheme
            if !db_url[colon_pos..].starts_with("://") {
                return format!("{}:****{}", &db_url[..colon_pos], &db_url[at_pos..]);
            }
        }
    }
    db_url.to_string()
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks the database password while showing all configuration values
    /// that were loaded.
    pub fn log_config(&self) {
        // ---
        let db_url = self
            .db_url
            .as_deref()
            .map(mask_db_url)
            .unwrap_or_else(|| "(none, in-memory store)".to_string());

        tracing::info!("Configuration loaded:");
        tracing::info!("  APP_PROFILE             : {}", self.profile);
        tracing::info!("  DATABASE_URL            : {}", db_url);
        tracing::info!("  DB_POOL_MAX             : {}", self.db_pool_max);
        tracing::info!("  HTTP_PORT               : {}", self.http_port);
        tracing::info!("  MAX_READINGS_PER_DEVICE : {}", self.max_readings_per_device);
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_profile_names() {
        // ---
        assert_eq!("development".parse::<Profile>().unwrap(), Profile::Development);
        assert_eq!("default".parse::<Profile>().unwrap(), Profile::Development);
        assert_eq!("Testing".parse::<Profile>().unwrap(), Profile::Testing);
        assert_eq!("production".parse::<Profile>().unwrap(), Profile::Production);
        assert!("staging".parse::<Profile>().is_err());
    }

    #[test]
    fn test_profile_database_variables() {
        // ---
        assert_eq!(Profile::Production.database_url_var(), "DATABASE_URL");
        assert_eq!(Profile::Development.database_url_var(), "DEV_DATABASE_URL");
        assert_eq!(Profile::Testing.default_log_level(), "warn");
    }

    #[test]
    fn test_mask_db_url() {
        // ---
        assert_eq!(
            mask_db_url("postgres://scale:secret@db:5432/telemetry"),
            "postgres://scale:****@db:5432/telemetry"
        );
        assert_eq!(
            mask_db_url("postgres://db:5432/telemetry"),
            "postgres://db:5432/telemetry"
        );
        assert_eq!(
            mask_db_url("postgres://scale@db/telemetry"),
            "postgres://scale@db/telemetry"
        );
    }
}
