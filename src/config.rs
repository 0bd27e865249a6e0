//! Catalog configuration: defaults, an optional TOML file, then environment
//! overrides.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::ConfigError;

pub const BASE_URL_ENV: &str = "CATALOG_BASE_URL";
pub const LOAD_FAILURE_ENV: &str = "CATALOG_LOAD_FAILURE";

/// What a failed `load()` does to the local collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadFailurePolicy {
    /// Leave the collection empty.
    #[default]
    Clear,
    /// Keep whatever was there before the load.
    Keep,
}

impl FromStr for LoadFailurePolicy {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.trim().to_ascii_lowercase().as_str() {
            "clear" => Ok(LoadFailurePolicy::Clear),
            "keep" => Ok(LoadFailurePolicy::Keep),
            other => Err(ConfigError::InvalidValue {
                key: "load_failure",
                message: format!("expected \"clear\" or \"keep\", got {:?}", other),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Root of the remote store, e.g. `http://localhost:5000`.
    pub base_url: String,
    /// Collection path segment under `base_url`.
    pub resource: String,
    /// Mailbox size of the synchronizer actor.
    pub mailbox_capacity: usize,
    pub load_failure: LoadFailurePolicy,
    /// Transport-level timeout for the HTTP store. The synchronizer itself
    /// never times out a request.
    pub request_timeout_secs: Option<u64>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            resource: "products".to_string(),
            mailbox_capacity: 32,
            load_failure: LoadFailurePolicy::default(),
            request_timeout_secs: None,
        }
    }
}

impl CatalogConfig {
    /// Defaults, overlaid by `path` when given, overlaid by the process
    /// environment. The result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        debug!(path = %path.display(), "Loaded config file");
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Applies overrides from `lookup`, usually the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(BASE_URL_ENV) {
            self.base_url = base_url;
        }
        if let Some(policy) = lookup(LOAD_FAILURE_ENV) {
            self.load_failure = policy.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base_url()?;
        if self.resource.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "resource",
                message: "must not be empty".to_string(),
            });
        }
        if self.mailbox_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "mailbox_capacity",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidValue {
            key: "base_url",
            message: e.to_string(),
        })?;
        if url.cannot_be_a_base() {
            return Err(ConfigError::InvalidValue {
                key: "base_url",
                message: format!("{} cannot be a base URL", url),
            });
        }
        Ok(url)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_point_at_local_store() {
        let config = CatalogConfig::default();
        assert_eq!(config.base_url().unwrap().as_str(), "http://localhost:5000/");
        assert_eq!(config.load_failure, LoadFailurePolicy::Clear);
        assert_eq!(config.request_timeout(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn toml_overrides_only_given_fields() {
        let config = CatalogConfig::from_toml_str(
            r#"
            base_url = "http://store.test:8080/api"
            load_failure = "keep"
            request_timeout_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.base_url, "http://store.test:8080/api");
        assert_eq!(config.load_failure, LoadFailurePolicy::Keep);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.resource, "products");
        assert_eq!(config.mailbox_capacity, 32);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            CatalogConfig::from_toml_str("base_uri = \"x\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn environment_wins_over_file() {
        let env: HashMap<&str, &str> = HashMap::from([
            (BASE_URL_ENV, "http://env.test"),
            (LOAD_FAILURE_ENV, "KEEP"),
        ]);
        let mut config = CatalogConfig::from_toml_str("base_url = \"http://file.test\"").unwrap();
        config
            .apply_env(|key| env.get(key).map(|value| value.to_string()))
            .unwrap();

        assert_eq!(config.base_url, "http://env.test");
        assert_eq!(config.load_failure, LoadFailurePolicy::Keep);
    }

    #[test]
    fn bad_policy_in_environment_is_reported() {
        let mut config = CatalogConfig::default();
        let result = config.apply_env(|key| (key == LOAD_FAILURE_ENV).then(|| "sometimes".to_string()));
        assert!(matches!(result, Err(ConfigError::InvalidValue { key: "load_failure", .. })));
    }

    #[test]
    fn invalid_values_fail_validation() {
        let config = CatalogConfig {
            base_url: "not a url".to_string(),
            ..CatalogConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { key: "base_url", .. })));

        let config = CatalogConfig {
            base_url: "mailto:someone@example.com".to_string(),
            ..CatalogConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { key: "base_url", .. })));

        let config = CatalogConfig {
            mailbox_capacity: 0,
            ..CatalogConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key: "mailbox_capacity", .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = CatalogConfig::from_file(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
