//! Configuration for the API server
//!
//! Settings are layered, later sources winning:
//!
//! 1. Built-in defaults
//! 2. `taskdesk.toml` in the working directory (optional)
//! 3. Environment variables, nested with `__`
//!
//! # Environment Variables
//!
//! - `API__HOST`, `API__PORT`: bind address (default `0.0.0.0:8080`)
//! - `API__CORS_ORIGINS`: comma-separated allowed origins, `*` for any
//! - `DATABASE__URL`: PostgreSQL connection string (or plain `DATABASE_URL`)
//! - `DATABASE__MAX_CONNECTIONS`, `DATABASE__RUN_MIGRATIONS`
//! - `JWT__SECRET`: signing secret, at least 32 bytes (or plain `JWT_SECRET`)
//! - `JWT__ISSUER`, `JWT__AUDIENCE`, `JWT__ACCESS_TOKEN_MINUTES`
//!
//! The result is validated once and then shared read-only.
//!
//! # Example
//!
//! ```no_run
//! use taskdesk_api::config::Config;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! println!("Server will listen on {}", config.bind_address());
//! # Ok(())
//! # }
//! ```

use ::config::{Config as Layers, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use taskdesk_shared::auth::jwt::{TokenSettings, DEFAULT_ACCESS_TOKEN_MINUTES, MIN_SECRET_BYTES};
use taskdesk_shared::db::pool::DatabaseConfig;

/// Optional config file, looked up without extension
const CONFIG_FILE: &str = "taskdesk";

/// Text settings read exactly as given, even when they look like numbers
const VERBATIM_VARS: [(&str, &str); 4] = [
    ("DATABASE__URL", "database.url"),
    ("JWT__SECRET", "jwt.secret"),
    ("JWT__ISSUER", "jwt.issuer"),
    ("JWT__AUDIENCE", "jwt.audience"),
];

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    pub api: ApiConfig,

    /// Connection pool settings
    pub database: DatabaseConfig,

    /// Token issuer settings
    pub jwt: TokenSettings,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Origins allowed to make cross-origin requests
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Loads configuration from `.env`, the config file and the process environment
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars().collect(), Some(CONFIG_FILE))
    }

    /// Builds configuration from an explicit set of environment variables
    ///
    /// # Errors
    ///
    /// Fails if a value cannot be parsed or the result does not pass
    /// [`Config::validate`].
    pub fn from_vars(vars: HashMap<String, String>, file: Option<&str>) -> anyhow::Result<Self> {
        let fallback = |key: &str| vars.get(key).cloned().unwrap_or_default();

        let mut builder = Layers::builder()
            .set_default("api.host", "0.0.0.0")?
            .set_default("api.port", 8080_i64)?
            .set_default("api.cors_origins", vec!["http://localhost:5173"])?
            .set_default("database.url", fallback("DATABASE_URL"))?
            .set_default("jwt.secret", fallback("JWT_SECRET"))?
            .set_default("jwt.issuer", "taskdesk")?
            .set_default("jwt.audience", "taskdesk-client")?
            .set_default("jwt.access_token_minutes", DEFAULT_ACCESS_TOKEN_MINUTES)?;

        if let Some(file) = file {
            builder = builder.add_source(File::with_name(file).required(false));
        }

        // Parsing types ports, counts and flags, but would also turn a secret
        // such as `1e40...` into a float; text keys are set back verbatim.
        builder = builder.add_source(
            Environment::default()
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("api.cors_origins")
                .try_parsing(true)
                .source(Some(vars.clone())),
        );

        for (var, key) in VERBATIM_VARS {
            if let Some(value) = vars.get(var) {
                builder = builder.set_override(key, value.as_str())?;
            }
        }

        let layers = builder.build()?;

        let config: Config = layers.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Checks values that would make the server unusable or insecure
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.url.trim().is_empty() {
            anyhow::bail!("DATABASE__URL (or DATABASE_URL) is required");
        }

        if self.jwt.secret.len() < MIN_SECRET_BYTES {
            anyhow::bail!("JWT secret must be at least {MIN_SECRET_BYTES} bytes long");
        }

        if self.jwt.issuer.trim().is_empty() {
            anyhow::bail!("JWT issuer must not be empty");
        }

        if self.jwt.audience.trim().is_empty() {
            anyhow::bail!("JWT audience must not be empty");
        }

        if self.jwt.access_token_minutes < 1 {
            anyhow::bail!("JWT access token lifetime must be at least 1 minute");
        }

        Ok(())
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
