use anyhow::{Context, Result};

/// Server configuration loaded from environment variables.
/// Startup fails if a required variable is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    /// Base URL uploaded objects are served from. Defaults to `{endpoint}/{bucket}`.
    pub s3_public_url: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub aws_region: String,
    pub port: u16,
    pub rust_log: String,
    pub cors_origin: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key).with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let s3_bucket = require("S3_BUCKET")?;
        let s3_endpoint = require("S3_ENDPOINT")?.trim_end_matches('/').to_string();
        let s3_public_url = lookup("S3_PUBLIC_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("{s3_endpoint}/{s3_bucket}"));

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            s3_public_url,
            s3_bucket,
            s3_endpoint,
            aws_access_key_id: require("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require("AWS_SECRET_ACCESS_KEY")?,
            aws_region: lookup("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            port: lookup("PORT")
                .unwrap_or_else(|| "4000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            cors_origin: lookup("CORS_ORIGIN")
                .unwrap_or_else(|| "http://localhost:5173".to_string()),
        })
    }
}
