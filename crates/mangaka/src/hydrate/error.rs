use crate::error::TransportError;
use thiserror::Error;

/// Reasons a hydration run ends early.
#[derive(Debug, Clone, Error)]
pub enum HydrationError {
    /// An image request failed and the run was aborted at that panel.
    #[error("Image request for panel {panel} (index {index}) failed: {source}")]
    Transport {
        index: usize,
        panel: u32,
        source: TransportError,
    },

    /// A newer run or a reset superseded this one.
    #[error("Hydration was superseded by a newer run")]
    Cancelled,
}
