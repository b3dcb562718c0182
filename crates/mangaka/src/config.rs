//! Runtime configuration loaded from the process environment.
//!
//! Environment variables:
//! - `GEMINI_API_KEY` (required)
//! - `MANGAKA_TEXT_MODEL` (optional, defaults to [`DEFAULT_TEXT_MODEL`])
//! - `MANGAKA_IMAGE_MODEL` (optional, defaults to [`DEFAULT_IMAGE_MODEL`])
//! - `MANGAKA_MIN_PANELS` (optional, defaults to 4)
//! - `MANGAKA_MAX_CONCURRENT_IMAGES` (optional, defaults to 1)
//! - `MANGAKA_TRANSPORT_POLICY` (optional, `abort` or `continue`, defaults to `abort`)

use crate::hydrate::{HydrationConfig, TransportPolicy};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
/// Number of panels the script prompt asks for.
pub const DEFAULT_PANEL_COUNT: usize = 6;
/// Fewest panels a script may yield and still be drawn.
pub const DEFAULT_MIN_PANELS: usize = 4;

const API_KEY_VAR: &str = "GEMINI_API_KEY";
const TEXT_MODEL_VAR: &str = "MANGAKA_TEXT_MODEL";
const IMAGE_MODEL_VAR: &str = "MANGAKA_IMAGE_MODEL";
const MIN_PANELS_VAR: &str = "MANGAKA_MIN_PANELS";
const MAX_CONCURRENT_VAR: &str = "MANGAKA_MAX_CONCURRENT_IMAGES";
const TRANSPORT_POLICY_VAR: &str = "MANGAKA_TRANSPORT_POLICY";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("Invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings for one generator instance.
#[derive(Clone, Serialize, Deserialize)]
pub struct MangaConfig {
    #[serde(skip)]
    pub api_key: String,
    pub text_model: String,
    pub image_model: String,
    pub panel_count: usize,
    pub min_panels: usize,
    #[serde(default)]
    pub hydration: HydrationConfig,
}

impl Default for MangaConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            panel_count: DEFAULT_PANEL_COUNT,
            min_panels: DEFAULT_MIN_PANELS,
            hydration: HydrationConfig::default(),
        }
    }
}

impl fmt::Debug for MangaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MangaConfig")
            .field("api_key", &"<redacted>")
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .field("panel_count", &self.panel_count)
            .field("min_panels", &self.min_panels)
            .field("hydration", &self.hydration)
            .finish()
    }
}

impl MangaConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let mut config = Self::new(api_key);

        if let Some(model) = lookup(TEXT_MODEL_VAR).filter(|s| !s.trim().is_empty()) {
            config.text_model = model;
        }
        if let Some(model) = lookup(IMAGE_MODEL_VAR).filter(|s| !s.trim().is_empty()) {
            config.image_model = model;
        }
        if let Some(raw) = lookup(MIN_PANELS_VAR) {
            config.min_panels = parse_positive(MIN_PANELS_VAR, &raw)?;
        }
        if let Some(raw) = lookup(MAX_CONCURRENT_VAR) {
            config.hydration.max_concurrent_requests = parse_positive(MAX_CONCURRENT_VAR, &raw)?;
        }
        if let Some(raw) = lookup(TRANSPORT_POLICY_VAR) {
            config.hydration.transport_policy = raw
                .parse::<TransportPolicy>()
                .map_err(|reason| ConfigError::InvalidValue {
                    key: TRANSPORT_POLICY_VAR,
                    value: raw.clone(),
                    reason,
                })?;
        }

        Ok(config)
    }

    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    pub fn with_min_panels(mut self, min_panels: usize) -> Self {
        self.min_panels = min_panels;
        self
    }

    pub fn with_hydration(mut self, hydration: HydrationConfig) -> Self {
        self.hydration = hydration;
        self
    }
}

fn parse_positive(key: &'static str, raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: "must be greater than zero".to_string(),
        }),
        Ok(n) => Ok(n),
        Err(err) => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: err.to_string(),
        }),
    }
}
