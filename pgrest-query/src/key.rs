//! Primary keys and the per-resource key registry

use std::collections::HashMap;
use std::fmt;

use pgrest_common::config::validate_key_columns;
use pgrest_common::error::Result;

/// Column used when a resource has no configured key
pub const DEFAULT_KEY_COLUMN: &str = "id";

/// Ordered primary-key columns of a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimaryKey {
    /// Single column key
    Simple(String),
    /// Two or more columns, order significant
    Compound(Vec<String>),
}

impl PrimaryKey {
    /// Build a key from its ordered column list
    ///
    /// # Errors
    /// Returns `ConfigError` for an empty list, a blank name or a repeated column.
    pub fn new(columns: Vec<String>) -> Result<Self> {
        validate_key_columns("<key>", &columns)?;
        Ok(Self::from_validated(columns))
    }

    fn from_validated(mut columns: Vec<String>) -> Self {
        if columns.len() == 1 {
            Self::Simple(columns.remove(0))
        } else {
            Self::Compound(columns)
        }
    }

    pub fn simple(column: impl Into<String>) -> Self {
        Self::Simple(column.into())
    }

    /// Key columns in order
    pub fn columns(&self) -> &[String] {
        match self {
            Self::Simple(column) => std::slice::from_ref(column),
            Self::Compound(columns) => columns,
        }
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, Self::Compound(_))
    }
}

impl Default for PrimaryKey {
    fn default() -> Self {
        Self::simple(DEFAULT_KEY_COLUMN)
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.columns().join(", "))
    }
}

/// Immutable resource name to primary key mapping
#[derive(Debug, Clone, Default)]
pub struct PrimaryKeyRegistry {
    keys: HashMap<String, PrimaryKey>,
    default_key: PrimaryKey,
}

impl PrimaryKeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from configured column lists
    ///
    /// # Errors
    /// Returns `ConfigError` naming the first resource whose key is malformed.
    pub fn from_config(config: &HashMap<String, Vec<String>>) -> Result<Self> {
        let mut keys = HashMap::with_capacity(config.len());
        for (resource, columns) in config {
            validate_key_columns(resource, columns)?;
            keys.insert(
                resource.clone(),
                PrimaryKey::from_validated(columns.clone()),
            );
        }

        Ok(Self {
            keys,
            default_key: PrimaryKey::default(),
        })
    }

    /// Register a key, replacing any previous one for the resource
    #[must_use]
    pub fn with_key(mut self, resource: impl Into<String>, key: PrimaryKey) -> Self {
        self.keys.insert(resource.into(), key);
        self
    }

    /// Key for `resource`, falling back to `id`
    pub fn resolve(&self, resource: &str) -> &PrimaryKey {
        self.keys.get(resource).unwrap_or(&self.default_key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_key_shape() {
        assert_eq!(
            PrimaryKey::new(cols(&["uuid"])).unwrap(),
            PrimaryKey::Simple("uuid".to_string())
        );

        let key = PrimaryKey::new(cols(&["tenant_id", "item_id"])).unwrap();
        assert!(key.is_compound());
        assert_eq!(key.columns(), &cols(&["tenant_id", "item_id"])[..]);
        assert_eq!(key.to_string(), "(tenant_id, item_id)");
    }

    #[test]
    fn test_key_rejects_empty() {
        assert!(PrimaryKey::new(vec![]).is_err());
    }

    #[test]
    fn test_resolve_falls_back_to_id() {
        let mut config = HashMap::new();
        config.insert("order_items".to_string(), cols(&["order_id", "item_id"]));
        let registry = PrimaryKeyRegistry::from_config(&config).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
        assert!(PrimaryKeyRegistry::new().is_empty());

        assert_eq!(registry.resolve("posts"), &PrimaryKey::simple("id"));
        assert_eq!(
            registry.resolve("order_items").columns(),
            &cols(&["order_id", "item_id"])[..]
        );
    }

    #[test]
    fn test_registry_rejects_bad_key() {
        let mut config = HashMap::new();
        config.insert("broken".to_string(), vec![]);
        let err = PrimaryKeyRegistry::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }
}
