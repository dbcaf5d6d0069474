use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use multi_language_core::store::content_lake::DEFAULT_API_VERSION;

/// Where the content lake lives. Absent means the in-memory store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLakeConfig {
    pub url: String,
    pub dataset: String,
    pub token: Option<String>,
    pub api_version: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub content_lake: Option<ContentLakeConfig>,
    /// JSON file with the configured languages, see `LanguagesConfig`.
    pub languages_file: Option<PathBuf>,
    /// JSON array of schema types.
    pub schema_file: Option<PathBuf>,
    pub validate_clean_duplicates: bool,
    pub event_bus_capacity: usize,
    /// Log level (e.g., "info", "debug", "trace").
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3030,
            content_lake: None,
            languages_file: None,
            schema_file: None,
            validate_clean_duplicates: false,
            event_bus_capacity: 1024,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let content_lake = match lookup("CONTENT_LAKE_URL") {
            Some(url) => Some(ContentLakeConfig {
                url,
                dataset: lookup("CONTENT_LAKE_DATASET").unwrap_or_else(|| "production".to_string()),
                token: lookup("CONTENT_LAKE_TOKEN"),
                api_version: lookup("CONTENT_LAKE_API_VERSION")
                    .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            }),
            None => None,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT", defaults.port)?,
            content_lake,
            languages_file: lookup("LANGUAGES_FILE").map(PathBuf::from),
            schema_file: lookup("SCHEMA_FILE").map(PathBuf::from),
            validate_clean_duplicates: parse_var(
                &lookup,
                "VALIDATE_CLEAN_DUPLICATES",
                defaults.validate_clean_duplicates,
            )?,
            event_bus_capacity: parse_var(&lookup, "EVENT_BUS_CAPACITY", defaults.event_bus_capacity)?,
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
        })
    }

    /// Build the socket address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value `{raw}`")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_without_variables() {
        let config = load(&[]).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.addr(), "0.0.0.0:3030");
    }

    #[test]
    fn content_lake_settings() {
        let config = load(&[
            ("CONTENT_LAKE_URL", "https://abc.api.sanity.io"),
            ("CONTENT_LAKE_TOKEN", "sk-test"),
            ("VALIDATE_CLEAN_DUPLICATES", "true"),
        ])
        .unwrap();
        let lake = config.content_lake.unwrap();
        assert_eq!(lake.dataset, "production");
        assert_eq!(lake.token.as_deref(), Some("sk-test"));
        assert_eq!(lake.api_version, DEFAULT_API_VERSION);
        assert!(config.validate_clean_duplicates);
    }

    #[test]
    fn malformed_values_are_errors() {
        let err = load(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
        assert!(load(&[("VALIDATE_CLEAN_DUPLICATES", "yes")]).is_err());
    }
}
