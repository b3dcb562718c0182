//! 'mangaka' - Turns a topic into an illustrated manga strip.
//!
//! A generation run makes one call to a text model for a panel script and
//! one call per panel to an image model. This crate owns the two pieces of
//! real logic in between:
//!
//! - **Script parsing** ([`script`]): a free-form `Panel N:` /
//!   `Description:` / `Dialogue:` / `SFX:` blob becomes an ordered list of
//!   [`PanelScript`] records.
//! - **Panel hydration** ([`hydrate`]): placeholders for every panel are
//!   published immediately and filled in, index by index, as images arrive.
//!
//! Both collaborators sit behind traits ([`ScriptWriter`], [`ImageRequester`])
//! so the pipeline can run against the bundled Gemini client (feature
//! `gemini-api`) or any other backend.
//!
//! # Example
//!
//! ```rust
//! use mangaka::{PanelHydrator, ImageData, ImageRequester, PanelScript, TransportError, parse_script};
//!
//! struct Sketcher;
//!
//! #[async_trait::async_trait]
//! impl ImageRequester for Sketcher {
//!     async fn request_image(
//!         &self,
//!         panel: &PanelScript,
//!         _all: &[PanelScript],
//!         _index: usize,
//!     ) -> Result<Option<ImageData>, TransportError> {
//!         Ok(Some(ImageData::new("image/png", panel.description.clone().into_bytes())))
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let panels = parse_script("Panel 1:\nDescription: Dawn.\nPanel 2:\nDescription: Dusk.").unwrap();
//! let hydrator = PanelHydrator::default();
//! let report = hydrator.hydrate(panels, &Sketcher).await.unwrap();
//! assert!(report.is_complete());
//! # });
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod hydrate;
pub mod image;
pub mod observability;
pub mod panel;
pub mod prompts;
pub mod script;

#[cfg(feature = "gemini-api")]
pub mod gemini;

pub use config::{ConfigError, MangaConfig};
pub use error::{MangaError, TransportError};
pub use generator::{MangaGenerator, ScriptRequest, ScriptWriter, validate_panel_count};
pub use hydrate::{
    HydrationConfig, HydrationError, HydrationReport, ImageRequester, PanelHydrator, PanelSnapshot,
    TransportPolicy,
};
pub use image::ImageData;
pub use panel::{MangaPanelData, PanelScript, PanelStatus};
pub use script::{ScriptParseError, ScriptParser, parse_script};

#[cfg(feature = "gemini-api")]
pub use gemini::GeminiClient;
