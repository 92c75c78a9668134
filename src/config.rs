//! Runtime configuration loaded from the environment (and `.env`).

use std::time::Duration;

use tracing::warn;

/// Relative path of the catalog document under the base URL
pub const CATALOG_PATH: &str = "trip-data.yml";

const DEFAULT_CATALOG_URL: &str = "http://localhost:8080/";
const DEFAULT_DEBOUNCE_MS: u64 = 100;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Catalog source settings
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL the catalog path is resolved against
    pub base_url: String,
    pub http_timeout: Duration,
}

impl CatalogConfig {
    /// Full URL of the catalog document.
    ///
    /// Accepts a base with or without a trailing slash.
    pub fn catalog_url(&self) -> String {
        if self.base_url.ends_with('/') {
            format!("{}{}", self.base_url, CATALOG_PATH)
        } else {
            format!("{}/{}", self.base_url, CATALOG_PATH)
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CATALOG_URL.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

/// Price engine settings
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Quiescence window before an add-on recomputation fires
    pub debounce: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub engine: EngineConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Reads `.env` first if present. Unparseable numbers fall back to defaults.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = lookup("TRIP_CATALOG_URL").unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string());
        let debounce_ms = parse_or_default(&lookup, "TRIP_PRICE_DEBOUNCE_MS", DEFAULT_DEBOUNCE_MS);
        let timeout_secs =
            parse_or_default(&lookup, "TRIP_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS);

        Self {
            catalog: CatalogConfig {
                base_url,
                http_timeout: Duration::from_secs(timeout_secs),
            },
            engine: EngineConfig {
                debounce: Duration::from_millis(debounce_ms),
            },
        }
    }
}

fn parse_or_default(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> u64 {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid value {:?} for {}, using {}", raw, key, default);
            default
        }),
        None => default,
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
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[]));
        assert_eq!(config.engine.debounce, Duration::from_millis(100));
        assert_eq!(config.catalog.http_timeout, Duration::from_secs(10));
        assert_eq!(config.catalog.catalog_url(), "http://localhost:8080/trip-data.yml");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("TRIP_CATALOG_URL", "https://trips.example.com/app"),
            ("TRIP_PRICE_DEBOUNCE_MS", "250"),
        ]));
        assert_eq!(config.engine.debounce, Duration::from_millis(250));
        assert_eq!(
            config.catalog.catalog_url(),
            "https://trips.example.com/app/trip-data.yml"
        );
    }

    #[test]
    fn test_invalid_number_falls_back() {
        let config = Config::from_lookup(lookup_from(&[("TRIP_PRICE_DEBOUNCE_MS", "soon")]));
        assert_eq!(config.engine.debounce, Duration::from_millis(100));
    }
}
