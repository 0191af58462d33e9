use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct StudioConfig {
    pub api_url: String,
    pub api_timeout: Duration,
    /// Oversampling factor for thumbnail and print rasterization.
    pub export_scale: f32,
    /// Extra fonts for the rasterizer, on top of the system fonts.
    pub font_dir: Option<PathBuf>,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:4000".to_string(),
            api_timeout: Duration::from_secs(10),
            export_scale: 2.0,
            font_dir: None,
        }
    }
}

impl StudioConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let api_url = lookup("FOLIO_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);

        let api_timeout = match lookup("FOLIO_API_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.parse::<u64>()
                    .context("FOLIO_API_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            None => defaults.api_timeout,
        };

        let export_scale = match lookup("FOLIO_EXPORT_SCALE") {
            Some(raw) => raw
                .parse::<f32>()
                .context("FOLIO_EXPORT_SCALE must be a number")?,
            None => defaults.export_scale,
        };
        if !(export_scale.is_finite() && export_scale > 0.0) {
            bail!("FOLIO_EXPORT_SCALE must be positive, got {export_scale}");
        }

        Ok(Self {
            api_url,
            api_timeout,
            export_scale,
            font_dir: lookup("FOLIO_FONT_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = StudioConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, StudioConfig::default());
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = StudioConfig::from_lookup(lookup(&[
            ("FOLIO_API_URL", "https://api.example.com/"),
            ("FOLIO_API_TIMEOUT_SECS", "3"),
            ("FOLIO_EXPORT_SCALE", "1.5"),
            ("FOLIO_FONT_DIR", "/opt/fonts"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "https://api.example.com");
        assert_eq!(config.api_timeout, Duration::from_secs(3));
        assert_eq!(config.export_scale, 1.5);
        assert_eq!(config.font_dir, Some(PathBuf::from("/opt/fonts")));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(StudioConfig::from_lookup(lookup(&[("FOLIO_API_TIMEOUT_SECS", "soon")])).is_err());
        assert!(StudioConfig::from_lookup(lookup(&[("FOLIO_EXPORT_SCALE", "0")])).is_err());
    }
}
