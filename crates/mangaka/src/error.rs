//! Error types shared across the generation pipeline.

use crate::config::ConfigError;
use crate::hydrate::HydrationError;
use crate::script::ScriptParseError;
use rand::Rng;
use std::time::Duration;
use thiserror::Error;

const BASE_RETRY_DELAY: Duration = Duration::from_millis(500);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(8);
const MAX_JITTER_MS: u64 = 250;

/// Failures talking to the text or image collaborator.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The request never produced an HTTP response (connect, DNS, TLS, ...).
    #[error("Request failed: {message}")]
    Request { message: String, is_retryable: bool },

    /// The service answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        is_retryable: bool,
        retry_after: Option<Duration>,
    },

    /// The request did not complete within the configured timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The response body could not be understood.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// Check if this error should trigger an automatic retry.
    ///
    /// Connection failures, timeouts and the HTTP statuses flagged retryable
    /// (429 and 5xx gateway errors) qualify. Malformed responses do not.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Request { is_retryable, .. } => *is_retryable,
            TransportError::Http { is_retryable, .. } => *is_retryable,
            TransportError::Timeout(_) => true,
            TransportError::InvalidResponse(_) | TransportError::Other(_) => false,
        }
    }

    /// Delay before retry number `attempt` (1-based).
    ///
    /// A server-provided `Retry-After` wins; otherwise the delay doubles per
    /// attempt from 500ms, capped at 8s, plus up to 250ms of jitter.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        if let TransportError::Http {
            retry_after: Some(delay),
            ..
        } = self
        {
            return *delay;
        }

        let exponent = attempt.saturating_sub(1).min(16);
        let backoff = BASE_RETRY_DELAY
            .saturating_mul(1u32 << exponent)
            .min(MAX_RETRY_DELAY);
        let jitter = rand::thread_rng().gen_range(0..=MAX_JITTER_MS);
        backoff + Duration::from_millis(jitter)
    }
}

/// Top-level error for a generation run.
#[derive(Debug, Error)]
pub enum MangaError {
    /// The script could not be decomposed into any panel.
    #[error("Failed to parse script: {0}")]
    Parse(#[from] ScriptParseError),

    /// The script parsed but produced too few panels to be usable.
    #[error("Script produced {found} panel(s), at least {required} required")]
    InsufficientPanels { found: usize, required: usize },

    /// The text collaborator call failed.
    #[error("Script generation failed: {0}")]
    Transport(#[from] TransportError),

    /// The image loop was aborted.
    #[error(transparent)]
    Hydration(#[from] HydrationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to render prompt template: {0}")]
    Template(#[from] minijinja::Error),
}

impl MangaError {
    /// Whether the run ended because a newer run superseded it.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, MangaError::Hydration(HydrationError::Cancelled))
    }
}
