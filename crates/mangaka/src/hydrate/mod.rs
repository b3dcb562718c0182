//! Progressive attachment of generated artwork to parsed panels.
//!
//! [`PanelHydrator`] owns the panel collection for the current run. It
//! publishes N placeholders as soon as a run starts, then requests one image
//! per panel through an [`ImageRequester`] and republishes the whole
//! collection after every change. Observers hold a
//! [`tokio::sync::watch::Receiver`] and only ever see complete snapshots.

pub mod config;
pub mod controller;
pub mod error;

pub use self::config::{HydrationConfig, TransportPolicy};
pub use self::controller::{HydrationReport, ImageRequester, PanelHydrator, PanelSnapshot};
pub use self::error::HydrationError;
