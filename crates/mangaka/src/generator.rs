//! The end-to-end generation pipeline: topic → script → panels → artwork.
//!
//! # Example
//!
//! ```rust,ignore
//! use mangaka::{MangaConfig, MangaGenerator};
//! use mangaka::gemini::GeminiClient;
//!
//! let config = MangaConfig::from_env()?;
//! let client = GeminiClient::from_config(&config);
//! let generator = MangaGenerator::with_config(client.clone(), client, &config);
//!
//! let mut updates = generator.subscribe();
//! let report = generator.generate("How vaccines train the immune system").await?;
//! println!("{} of {} panels drawn", report.drawn, report.panels.len());
//! ```

use crate::config::{DEFAULT_MIN_PANELS, DEFAULT_PANEL_COUNT, MangaConfig};
use crate::error::{MangaError, TransportError};
use crate::hydrate::{
    HydrationConfig, HydrationError, HydrationReport, ImageRequester, PanelHydrator, PanelSnapshot,
};
use crate::panel::PanelScript;
use crate::prompts;
use crate::script::ScriptParser;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// A rendered request for the text collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRequest {
    pub topic: String,
    pub prompt: String,
    pub system_instruction: String,
}

/// Abstraction over the text-generation collaborator.
#[async_trait]
pub trait ScriptWriter: Send + Sync {
    /// Returns the raw script text for `request`.
    async fn write_script(&self, request: &ScriptRequest) -> Result<String, TransportError>;
}

#[async_trait]
impl<T: ScriptWriter + ?Sized> ScriptWriter for Arc<T> {
    async fn write_script(&self, request: &ScriptRequest) -> Result<String, TransportError> {
        (**self).write_script(request).await
    }
}

/// Fails with [`MangaError::InsufficientPanels`] when `panels` holds fewer than `min` records.
pub fn validate_panel_count(panels: &[PanelScript], min: usize) -> Result<(), MangaError> {
    if panels.len() < min {
        return Err(MangaError::InsufficientPanels {
            found: panels.len(),
            required: min,
        });
    }
    Ok(())
}

/// Drives one generation request at a time through both collaborators.
///
/// Starting a new [`generate`](Self::generate) supersedes the previous one:
/// its text request is abandoned and its panel collection is replaced.
pub struct MangaGenerator<W, I> {
    writer: W,
    images: I,
    parser: ScriptParser,
    hydrator: PanelHydrator,
    panel_count: usize,
    min_panels: usize,
    current: Mutex<CancellationToken>,
}

impl<W, I> MangaGenerator<W, I>
where
    W: ScriptWriter,
    I: ImageRequester,
{
    pub fn new(writer: W, images: I) -> Self {
        Self {
            writer,
            images,
            parser: ScriptParser::new(),
            hydrator: PanelHydrator::default(),
            panel_count: DEFAULT_PANEL_COUNT,
            min_panels: DEFAULT_MIN_PANELS,
            current: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn with_config(writer: W, images: I, config: &MangaConfig) -> Self {
        Self::new(writer, images)
            .with_panel_count(config.panel_count)
            .with_min_panels(config.min_panels)
            .with_hydration(config.hydration.clone())
    }

    /// Number of panels requested from the text model.
    pub fn with_panel_count(mut self, panel_count: usize) -> Self {
        self.panel_count = panel_count;
        self
    }

    pub fn with_min_panels(mut self, min_panels: usize) -> Self {
        self.min_panels = min_panels;
        self
    }

    pub fn with_hydration(mut self, config: HydrationConfig) -> Self {
        self.hydrator = PanelHydrator::new(config);
        self
    }

    pub fn with_parser(mut self, parser: ScriptParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<PanelSnapshot> {
        self.hydrator.subscribe()
    }

    pub fn snapshot(&self) -> PanelSnapshot {
        self.hydrator.snapshot()
    }

    /// Cancels the running generation, if any, and clears the panels.
    pub fn reset(&self) {
        self.supersede();
    }

    /// Requests, parses and validates a script for `topic`.
    pub async fn write_script(&self, topic: &str) -> Result<Vec<PanelScript>, MangaError> {
        let request = ScriptRequest {
            topic: topic.trim().to_string(),
            prompt: prompts::script_prompt(topic)?,
            system_instruction: prompts::system_instruction(self.panel_count)?,
        };

        let raw = self.writer.write_script(&request).await?;
        let panels = self.parser.parse(&raw)?;
        validate_panel_count(&panels, self.min_panels)?;
        Ok(panels)
    }

    /// Runs the whole pipeline for `topic`.
    ///
    /// The previous run's panels are discarded as soon as this one starts, so
    /// a script failure leaves an empty collection. A transport error during
    /// the image loop aborts the run (under the default policy) but keeps the
    /// panels drawn so far visible.
    #[tracing::instrument(skip(self))]
    pub async fn generate(&self, topic: &str) -> Result<HydrationReport, MangaError> {
        let token = self.supersede();

        let panels = tokio::select! {
            biased;
            _ = token.cancelled() => {
                info!("Generation superseded while writing the script");
                return Err(HydrationError::Cancelled.into());
            }
            result = self.write_script(topic) => result,
        };

        let panels = match panels {
            Ok(panels) => panels,
            Err(err) => {
                warn!(error = %err, "Script generation failed");
                return Err(err);
            }
        };
        info!(panels = panels.len(), "Script parsed");

        self.hydrator
            .hydrate_with_cancel(panels, &self.images, &token)
            .await
            .map_err(MangaError::from)
    }

    /// Cancels the previous run, discards its panels and returns the token
    /// for a new one.
    ///
    /// The collection is cleared while `current` is held, so a run that has
    /// already been superseded can never clear a newer run's panels.
    fn supersede(&self) -> CancellationToken {
        let mut current = self
            .current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        current.cancel();
        self.hydrator.reset();
        *current = CancellationToken::new();
        current.clone()
    }
}
