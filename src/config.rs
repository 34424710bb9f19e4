//! Configuration management for bookfill using the prefer crate.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::SiteId;
use crate::scrapers::{BrowserEngineConfig, SiteStrategy, SiteStrategyOverride, ACCEPT_LANGUAGE};

/// Default static request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 20;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {format} config {path}: {message}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// User agent config: None for the default, "impersonate", or a custom string.
    pub user_agent: Option<String>,
    pub accept_language: String,
    /// Static request timeout in seconds.
    pub request_timeout: u64,
    pub browser: BrowserEngineConfig,
    /// Per-store toggles. Stores not listed are enabled.
    pub enabled: HashMap<SiteId, bool>,
    /// Resolved per-store strategies.
    pub strategies: HashMap<SiteId, SiteStrategy>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_agent: None,
            accept_language: ACCEPT_LANGUAGE.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            browser: BrowserEngineConfig::default(),
            enabled: HashMap::new(),
            strategies: SiteId::SUPPORTED
                .iter()
                .map(|site| (*site, SiteStrategy::for_site(*site)))
                .collect(),
        }
    }
}

impl Settings {
    /// Turn a store off for this run.
    pub fn disable(&mut self, site: SiteId) {
        self.enabled.insert(site, false);
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// User agent string ("impersonate" picks a real browser's).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_language: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// Headless browser settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<BrowserEngineConfig>,
    /// Store toggles keyed by store name (`yes24`, `KYOBO`, ...).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub enabled: HashMap<String, bool>,
    /// Per-store strategy overrides keyed by store name.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub sites: HashMap<String, SiteStrategyOverride>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers bookfill config files in standard locations.
    pub async fn load() -> Self {
        // Use prefer for file discovery, then parse with serde
        match prefer::load("bookfill").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            warn!("{}; using defaults", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            Err(_) => {
                // No config file found
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parse_error = |format: &'static str, message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            format,
            message,
        };

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents).map_err(|e| parse_error("TOML", e.to_string()))?,
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents).map_err(|e| parse_error("YAML", e.to_string()))?
            }
            _ => serde_json::from_str(&contents).map_err(|e| parse_error("JSON", e.to_string()))?,
        };

        debug!("Loaded config from {}", path.display());
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(ref language) = self.accept_language {
            settings.accept_language = language.clone();
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(ref browser) = self.browser {
            settings.browser = browser.clone();
        }

        for (name, on) in &self.enabled {
            match SiteId::from_str(name) {
                Some(site) => {
                    settings.enabled.insert(site, *on);
                }
                None => warn!("Ignoring toggle for unknown store {:?}", name),
            }
        }

        for (name, overrides) in &self.sites {
            match SiteId::from_str(name).filter(|s| *s != SiteId::Unknown) {
                Some(site) => overrides.apply(
                    settings
                        .strategies
                        .entry(site)
                        .or_insert_with(|| SiteStrategy::for_site(site)),
                ),
                None => warn!("Ignoring strategy for unknown store {:?}", name),
            }
        }
    }
}

/// Resolve settings from an explicit config file, or a discovered one.
pub async fn load_settings(config_path: Option<&Path>) -> Result<(Settings, Config), ConfigError> {
    let config = match config_path {
        Some(path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings);
    Ok((settings, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::{SoldOutPricing, StrategyTier};
    use std::io::Write;

    fn write_config(ext: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(&format!(".{}", ext))
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_load_toml_and_apply() {
        let file = write_config(
            "toml",
            r#"
            request_timeout = 10
            user_agent = "impersonate"

            [enabled]
            kyobo = false

            [browser]
            headless = false

            [sites.KYOBO]
            suspicion_floor = 7000
            sold_out_pricing = "zero"

            [sites.yes24]
            strategies = ["static"]
            "#,
        );

        let config = Config::load_from_path(file.path()).await.unwrap();
        assert_eq!(config.source_path.as_deref(), Some(file.path()));

        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings);

        assert_eq!(settings.request_timeout, 10);
        assert_eq!(settings.user_agent.as_deref(), Some("impersonate"));
        assert_eq!(settings.enabled.get(&SiteId::Kyobo), Some(&false));
        assert!(!settings.browser.headless);
        assert_eq!(settings.browser.timeout, 30);

        let kyobo = &settings.strategies[&SiteId::Kyobo];
        assert_eq!(kyobo.suspicion_floor, Some(7000));
        assert_eq!(kyobo.sold_out_pricing, SoldOutPricing::Zero);
        assert_eq!(kyobo.settle_ms, 1200);
        assert_eq!(
            settings.strategies[&SiteId::Yes24].strategies,
            vec![StrategyTier::Static]
        );
    }

    #[tokio::test]
    async fn test_load_yaml() {
        let file = write_config(
            "yaml",
            "accept_language: en-US\nsites:\n  aladin:\n    price_policy: required\n",
        );
        let (settings, _) = load_settings(Some(file.path())).await.unwrap();
        assert_eq!(settings.accept_language, "en-US");
        assert_eq!(
            settings.strategies[&SiteId::Aladin].price_policy,
            crate::scrapers::PricePolicy::Required
        );
    }

    #[tokio::test]
    async fn test_unknown_store_names_are_ignored() {
        let file = write_config("json", r#"{"enabled": {"amazon": false}, "sites": {"unknown": {}}}"#);
        let (settings, _) = load_settings(Some(file.path())).await.unwrap();
        assert!(settings.enabled.is_empty());
        assert_eq!(settings.strategies.len(), 4);
    }

    #[tokio::test]
    async fn test_errors_name_the_file() {
        let file = write_config("toml", "request_timeout = \"soon\"");
        let err = Config::load_from_path(file.path()).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse { format: "TOML", .. }));

        let err = Config::load_from_path(Path::new("/nonexistent/bookfill.toml"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.request_timeout, 20);
        assert_eq!(settings.accept_language, "ko-KR,ko;q=0.9,en;q=0.8");
        assert_eq!(settings.strategies.len(), 4);
    }
}
