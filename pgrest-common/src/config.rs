//! Configuration types for the PostgREST data provider

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the PostgREST API (default: "http://localhost:3000")
    pub api_url: String,
    /// Operator used for filter keys without an `@operator` suffix
    pub default_operator: String,
    /// Resource name to ordered primary-key columns.
    /// Resources not listed here use `["id"]`.
    pub primary_keys: HashMap<String, Vec<String>>,
    /// HTTP transport configuration
    pub http: HttpConfig,
    /// Logging configuration
    pub log: LogConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".to_string(),
            default_operator: "eq".to_string(),
            primary_keys: HashMap::new(),
            http: HttpConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl ProviderConfig {
    /// Check the parts of the configuration that do not depend on the query layer
    ///
    /// # Errors
    /// Returns `ConfigError` for an empty API URL, an empty primary key or a
    /// primary key that lists the same column twice.
    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(Error::ConfigError("api_url must not be empty".to_string()));
        }

        if self.default_operator.trim().is_empty() {
            return Err(Error::ConfigError(
                "default_operator must not be empty".to_string(),
            ));
        }

        for (resource, columns) in &self.primary_keys {
            validate_key_columns(resource, columns)?;
        }

        Ok(())
    }

    /// API base URL without trailing slashes
    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}

/// Validate one configured primary key
///
/// # Errors
/// Returns `ConfigError` if `columns` is empty, contains a blank name or repeats a column.
pub fn validate_key_columns(resource: &str, columns: &[String]) -> Result<()> {
    if columns.is_empty() {
        return Err(Error::ConfigError(format!(
            "primary key for '{resource}' must list at least one column"
        )));
    }

    let mut seen = HashSet::new();
    for column in columns {
        if column.trim().is_empty() {
            return Err(Error::ConfigError(format!(
                "primary key for '{resource}' contains an empty column name"
            )));
        }
        if !seen.insert(column.as_str()) {
            return Err(Error::ConfigError(format!(
                "primary key for '{resource}' repeats column '{column}'"
            )));
        }
    }

    Ok(())
}

/// HTTP transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Extra headers sent with every request (e.g. `Authorization`, `apikey`)
    pub headers: HashMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            headers: HashMap::new(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default level when `RUST_LOG` is not set (trace, debug, info, warn, error)
    pub level: String,
    /// Emit JSON formatted log lines
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProviderConfig::default();
        assert_eq!(config.api_url, "http://localhost:3000");
        assert_eq!(config.default_operator, "eq");
        assert!(config.primary_keys.is_empty());
        assert_eq!(config.http.timeout_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let config: ProviderConfig = toml::from_str(
            r#"
            api_url = "https://api.example.com/"
            default_operator = "ilike"

            [primary_keys]
            order_items = ["order_id", "item_id"]

            [http.headers]
            apikey = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.base_url(), "https://api.example.com");
        assert_eq!(config.default_operator, "ilike");
        assert_eq!(
            config.primary_keys["order_items"],
            vec!["order_id".to_string(), "item_id".to_string()]
        );
        assert_eq!(config.http.headers["apikey"], "secret");
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.log.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_primary_key() {
        let mut config = ProviderConfig::default();
        config.primary_keys.insert("posts".to_string(), vec![]);
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_rejects_repeated_key_column() {
        let columns = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        assert!(validate_key_columns("pairs", &columns).is_err());
    }

    #[test]
    fn test_rejects_empty_api_url() {
        let config = ProviderConfig {
            api_url: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
