//! Configuration for panel hydration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// What the image loop does when a request fails at the transport level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportPolicy {
    /// Stop the run at the first transport error. Images already attached stay visible.
    #[default]
    Abort,
    /// Mark the failed panel and keep going with the next one.
    Continue,
}

impl FromStr for TransportPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "continue" => Ok(Self::Continue),
            other => Err(format!(
                "unknown transport policy '{}', expected 'abort' or 'continue'",
                other
            )),
        }
    }
}

impl fmt::Display for TransportPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => write!(f, "abort"),
            Self::Continue => write!(f, "continue"),
        }
    }
}

/// Configuration for [`PanelHydrator`](super::PanelHydrator).
///
/// # Examples
///
/// ```
/// use mangaka::hydrate::{HydrationConfig, TransportPolicy};
/// use std::time::Duration;
///
/// let config = HydrationConfig::new()
///     .with_max_concurrent_requests(3)
///     .with_transport_policy(TransportPolicy::Continue)
///     .with_request_timeout(Duration::from_secs(90));
/// assert_eq!(config.max_concurrent_requests, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HydrationConfig {
    /// Maximum number of image requests in flight at once.
    ///
    /// `1` (the default) issues requests strictly one after another. Higher
    /// values still attach each result at its own index.
    pub max_concurrent_requests: usize,

    /// Behavior on transport errors.
    ///
    /// **Default:** [`TransportPolicy::Abort`]
    #[serde(default)]
    pub transport_policy: TransportPolicy,

    /// Timeout for a single image request. `None` means no timeout.
    #[serde(default)]
    pub request_timeout: Option<Duration>,
}

impl Default for HydrationConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 1,
            transport_policy: TransportPolicy::Abort,
            request_timeout: None,
        }
    }
}

impl HydrationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request pool size. Values below 1 are treated as 1.
    pub fn with_max_concurrent_requests(mut self, max: usize) -> Self {
        self.max_concurrent_requests = max.max(1);
        self
    }

    pub fn with_transport_policy(mut self, policy: TransportPolicy) -> Self {
        self.transport_policy = policy;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}
