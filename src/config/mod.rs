//! Handler configuration.
//!
//! ```text
//! handlers:
//!   <name>:
//!     enabled: bool
//!     urls: [glob]
//!     order: i32
//!     format: rest | graphql
//! ```
//!
//! The built-in `default` and `graphql` entries are always present unless a
//! user entry with the same name replaces them.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::exception::ResponseFormat;

pub const DEFAULT_HANDLER: &str = "default";
pub const GRAPHQL_HANDLER: &str = "graphql";

const ENV_PREFIX: &str = "SECURITY_HANDLERS_";
const DEFAULT_ORDER: i32 = 100;

/// Configuration service
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    /// Seeded from the process environment.
    pub fn new() -> Self {
        let service = Self::default();
        for (key, value) in env::vars() {
            service.set(&key, &value);
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }

    /// All entries whose key starts with `prefix`, sorted by key.
    pub fn entries_with_prefix(&self, prefix: &str) -> Vec<(String, String)> {
        let mut entries: Vec<_> = self
            .config
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        entries.sort();
        entries
    }
}

/// Settings for one named handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    pub enabled: bool,
    pub urls: Vec<String>,
    #[serde(alias = "priority")]
    pub order: i32,
    /// Defaults to `graphql` for the `graphql` entry and `rest` otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ResponseFormat>,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            urls: Vec::new(),
            order: DEFAULT_ORDER,
            format: None,
        }
    }
}

impl HandlerConfig {
    pub fn enabled(urls: &[&str], order: i32) -> Self {
        Self {
            enabled: true,
            urls: urls.iter().map(|u| u.to_string()).collect(),
            order,
            format: None,
        }
    }

    pub fn response_format(&self, name: &str) -> ResponseFormat {
        self.format.unwrap_or(if name == GRAPHQL_HANDLER {
            ResponseFormat::Graphql
        } else {
            ResponseFormat::Rest
        })
    }
}

/// The `handlers` map, built-in defaults merged under user entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawProperties")]
pub struct SecurityHandlerProperties {
    handlers: BTreeMap<String, HandlerConfig>,
}

#[derive(Deserialize)]
struct RawProperties {
    #[serde(default)]
    handlers: BTreeMap<String, HandlerConfig>,
}

impl From<RawProperties> for SecurityHandlerProperties {
    fn from(raw: RawProperties) -> Self {
        Self::with_handlers(raw.handlers)
    }
}

impl Default for SecurityHandlerProperties {
    fn default() -> Self {
        Self {
            handlers: default_handlers(),
        }
    }
}

/// One `SECURITY_HANDLERS_<NAME>_<FIELD>` value.
enum Setting {
    Enabled(bool),
    Urls(Vec<String>),
    Order(i32),
    Format(ResponseFormat),
}

fn default_handlers() -> BTreeMap<String, HandlerConfig> {
    BTreeMap::from([
        (
            DEFAULT_HANDLER.to_string(),
            HandlerConfig::enabled(&["/**"], 100),
        ),
        (
            GRAPHQL_HANDLER.to_string(),
            HandlerConfig::enabled(&["/graphql"], 0),
        ),
    ])
}

impl SecurityHandlerProperties {
    /// Defaults overlaid with `handlers`; an entry replaces the default of the same name.
    pub fn with_handlers(handlers: impl IntoIterator<Item = (String, HandlerConfig)>) -> Self {
        let mut merged = default_handlers();
        merged.extend(handlers);
        Self { handlers: merged }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads `SECURITY_HANDLERS_<NAME>_{ENABLED,URLS,ORDER,FORMAT}` entries.
    ///
    /// Any key for a name starts that entry over from [`HandlerConfig::default`],
    /// matching how a user entry replaces a built-in one.
    pub fn from_config(config: &ConfigService) -> Result<Self> {
        let mut overrides: BTreeMap<String, HandlerConfig> = BTreeMap::new();

        for (key, value) in config.entries_with_prefix(ENV_PREFIX) {
            let rest = &key[ENV_PREFIX.len()..];
            let Some((name, field)) = rest.rsplit_once('_') else {
                tracing::warn!(key = %key, "ignoring malformed handler setting");
                continue;
            };
            let name = name.to_ascii_lowercase();
            if name.is_empty() {
                tracing::warn!(key = %key, "ignoring handler setting without a name");
                continue;
            }
            let value = value.trim();

            // parsed before touching `overrides` so an unknown field leaves the entry alone
            let setting = match field {
                "ENABLED" => Setting::Enabled(
                    value
                        .parse()
                        .map_err(|_| Error::invalid_config(&key, "expected true or false"))?,
                ),
                "URLS" => Setting::Urls(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|url| !url.is_empty())
                        .map(str::to_string)
                        .collect(),
                ),
                "ORDER" | "PRIORITY" => Setting::Order(
                    value
                        .parse()
                        .map_err(|_| Error::invalid_config(&key, "expected an integer"))?,
                ),
                "FORMAT" => Setting::Format(
                    value
                        .parse::<ResponseFormat>()
                        .map_err(|e| Error::invalid_config(&key, e.to_string()))?,
                ),
                _ => {
                    tracing::warn!(key = %key, "ignoring unknown handler setting");
                    continue;
                }
            };

            let entry = overrides.entry(name).or_default();
            match setting {
                Setting::Enabled(enabled) => entry.enabled = enabled,
                Setting::Urls(urls) => entry.urls = urls,
                Setting::Order(order) => entry.order = order,
                Setting::Format(format) => entry.format = Some(format),
            }
        }

        Ok(Self::with_handlers(overrides))
    }

    pub fn get(&self, name: &str) -> Option<&HandlerConfig> {
        self.handlers.get(name)
    }

    pub fn handlers(&self) -> impl Iterator<Item = (&str, &HandlerConfig)> {
        self.handlers.iter().map(|(name, config)| (name.as_str(), config))
    }
}
