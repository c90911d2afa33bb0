//! Service configuration read from the process environment.
//!
//! Required variables abort startup when missing; everything else falls back
//! to a default. `.env` files are not read here.

use thiserror::Error;

pub const DEFAULT_API_PORT: u16 = 8080;
pub const DEFAULT_PG_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_S3_REGION: &str = "us-east-1";
pub const DEFAULT_GENERATE_URL: &str = "https://api.openai.com/v1/responses";
pub const DEFAULT_STATIC_DIR: &str = "public";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Object store connection settings
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub pg_max_connections: u32,
    pub jwks_url: String,
    pub s3: S3Config,
    pub generate_url: String,
    pub generate_api_key: Option<String>,
    pub static_dir: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from any key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let port = match get("API_PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "API_PORT",
                value: raw,
            })?,
            None => DEFAULT_API_PORT,
        };
        let pg_max_connections = match get("PG_MAX_CONNECTIONS") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "PG_MAX_CONNECTIONS",
                value: raw,
            })?,
            None => DEFAULT_PG_MAX_CONNECTIONS,
        };

        Ok(Self {
            port,
            database_url: required("DATABASE_URL")?,
            pg_max_connections,
            jwks_url: required("JWKS_URL")?,
            s3: S3Config {
                bucket: required("S3_BUCKET")?,
                region: get("S3_REGION").unwrap_or_else(|| DEFAULT_S3_REGION.to_string()),
                endpoint: get("S3_ENDPOINT"),
                access_key_id: get("S3_ACCESS_KEY_ID"),
                secret_access_key: get("S3_SECRET_ACCESS_KEY"),
            },
            generate_url: get("OPENAI_API_URL").unwrap_or_else(|| DEFAULT_GENERATE_URL.to_string()),
            generate_api_key: get("OPENAI_API_KEY"),
            static_dir: get("STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("DATABASE_URL", "postgres://localhost/tower"),
        ("JWKS_URL", "https://idp.example/.well-known/jwks.json"),
        ("S3_BUCKET", "tower-assets"),
    ];

    #[test]
    fn test_defaults_applied() {
        let config = AppConfig::from_lookup(lookup_from(REQUIRED)).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.pg_max_connections, 10);
        assert_eq!(config.s3.region, "us-east-1");
        assert_eq!(config.generate_url, DEFAULT_GENERATE_URL);
        assert!(config.generate_api_key.is_none());
        assert_eq!(config.static_dir, "public");
    }

    #[test]
    fn test_missing_required_variable() {
        let err = AppConfig::from_lookup(lookup_from(&REQUIRED[..2])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("S3_BUCKET"));
    }

    #[test]
    fn test_blank_required_variable_counts_as_missing() {
        let mut pairs = REQUIRED.to_vec();
        pairs[0] = ("DATABASE_URL", "   ");
        let err = AppConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn test_invalid_port_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("API_PORT", "eighty"));
        let err = AppConfig::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "API_PORT", .. }));
    }

    #[test]
    fn test_overrides_read() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend_from_slice(&[
            ("API_PORT", "9000"),
            ("S3_ENDPOINT", "http://minio:9000"),
            ("OPENAI_API_KEY", "sk-test"),
        ]);
        let config = AppConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.s3.endpoint.as_deref(), Some("http://minio:9000"));
        assert_eq!(config.generate_api_key.as_deref(), Some("sk-test"));
    }
}
