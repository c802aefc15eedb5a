//! Settings shared by key bits and key constructors.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Key bit settings.
///
/// Loaded once at startup and borrowed by every key context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBitSettings {
    /// Value used when a bit cannot distinguish the context.
    #[serde(default = "default_cache_any_value")]
    pub default_cache_any_value: String,

    /// Locale used when the request does not carry one.
    #[serde(default = "default_language_code")]
    pub language_code: String,

    /// Whether constructors memoize keys per request by default.
    #[serde(default)]
    pub memoize_for_request: bool,
}

fn default_cache_any_value() -> String {
    "_any_".to_string()
}

fn default_language_code() -> String {
    "en-us".to_string()
}

impl Default for KeyBitSettings {
    fn default() -> Self {
        Self {
            default_cache_any_value: default_cache_any_value(),
            language_code: default_language_code(),
            memoize_for_request: false,
        }
    }
}

impl KeyBitSettings {
    /// Load settings from a TOML or JSON file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON settings: {}", path))
        } else {
            Self::from_toml(&content)
                .with_context(|| format!("Failed to parse TOML settings: {}", path))
        }
    }

    /// Parse settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Set the any-value sentinel.
    pub fn with_any_value(mut self, value: impl Into<String>) -> Self {
        self.default_cache_any_value = value.into();
        self
    }

    /// Set the fallback locale.
    pub fn with_language_code(mut self, code: impl Into<String>) -> Self {
        self.language_code = code.into();
        self
    }
}
