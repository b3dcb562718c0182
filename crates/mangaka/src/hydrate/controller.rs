use super::config::{HydrationConfig, TransportPolicy};
use super::error::HydrationError;
use crate::error::TransportError;
use crate::image::ImageData;
use crate::panel::{MangaPanelData, PanelScript, PanelStatus};
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// One published state of the panel collection.
pub type PanelSnapshot = Arc<[MangaPanelData]>;

/// Abstraction over the image-generation collaborator.
///
/// `Ok(None)` means the request succeeded but carried no usable image; the
/// panel stays empty and the run goes on. `Err` is a transport failure and is
/// handled according to the configured [`TransportPolicy`].
#[async_trait]
pub trait ImageRequester: Send + Sync {
    async fn request_image(
        &self,
        panel: &PanelScript,
        all_panels: &[PanelScript],
        index: usize,
    ) -> Result<Option<ImageData>, TransportError>;
}

#[async_trait]
impl<T: ImageRequester + ?Sized> ImageRequester for Arc<T> {
    async fn request_image(
        &self,
        panel: &PanelScript,
        all_panels: &[PanelScript],
        index: usize,
    ) -> Result<Option<ImageData>, TransportError> {
        (**self).request_image(panel, all_panels, index).await
    }
}

/// Summary of a completed hydration run.
#[derive(Debug, Clone)]
pub struct HydrationReport {
    /// The final published collection.
    pub panels: PanelSnapshot,
    pub drawn: usize,
    pub absent: usize,
    pub failed: usize,
}

impl HydrationReport {
    fn from_panels(panels: PanelSnapshot) -> Self {
        let count = |wanted: fn(&PanelStatus) -> bool| {
            panels.iter().filter(|p| wanted(&p.status)).count()
        };
        Self {
            drawn: count(|s| matches!(s, PanelStatus::Drawn)),
            absent: count(|s| matches!(s, PanelStatus::ImageAbsent)),
            failed: count(|s| matches!(s, PanelStatus::Failed(_))),
            panels,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.drawn == self.panels.len()
    }
}

struct ActiveRun {
    generation: u64,
    token: CancellationToken,
}

/// Sole writer of the observable panel collection.
pub struct PanelHydrator {
    config: HydrationConfig,
    sender: watch::Sender<PanelSnapshot>,
    active: Mutex<ActiveRun>,
}

impl Default for PanelHydrator {
    fn default() -> Self {
        Self::new(HydrationConfig::default())
    }
}

impl PanelHydrator {
    pub fn new(config: HydrationConfig) -> Self {
        let (sender, _) = watch::channel(PanelSnapshot::from(Vec::new()));
        Self {
            config,
            sender,
            active: Mutex::new(ActiveRun {
                generation: 0,
                token: CancellationToken::new(),
            }),
        }
    }

    pub fn config(&self) -> &HydrationConfig {
        &self.config
    }

    /// Returns a receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<PanelSnapshot> {
        self.sender.subscribe()
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> PanelSnapshot {
        self.sender.borrow().clone()
    }

    /// Cancels the current run, if any, and publishes an empty collection.
    pub fn reset(&self) {
        let mut active = self.lock_active();
        active.token.cancel();
        active.generation += 1;
        active.token = CancellationToken::new();
        self.sender.send_replace(PanelSnapshot::from(Vec::new()));
    }

    /// Hydrates `panels` with images obtained from `requester`.
    ///
    /// Placeholders for every panel are published before the first request is
    /// issued. Any previous run is cancelled and its collection discarded.
    /// Each result is written at its panel's index and the whole collection is
    /// republished.
    ///
    /// # Errors
    ///
    /// - [`HydrationError::Transport`] when a request fails under
    ///   [`TransportPolicy::Abort`]. The failing panel is published as
    ///   [`PanelStatus::Failed`] and no later panel is requested; images
    ///   attached so far remain published.
    /// - [`HydrationError::Cancelled`] when a newer run or [`reset`](Self::reset)
    ///   superseded this one.
    pub async fn hydrate<R>(
        &self,
        panels: Vec<PanelScript>,
        requester: &R,
    ) -> Result<HydrationReport, HydrationError>
    where
        R: ImageRequester + ?Sized,
    {
        self.run(panels, requester, None).await
    }

    /// Like [`hydrate`](Self::hydrate), but also stops when `cancel` fires.
    ///
    /// A run whose `cancel` token is already cancelled publishes nothing.
    pub async fn hydrate_with_cancel<R>(
        &self,
        panels: Vec<PanelScript>,
        requester: &R,
        cancel: &CancellationToken,
    ) -> Result<HydrationReport, HydrationError>
    where
        R: ImageRequester + ?Sized,
    {
        self.run(panels, requester, Some(cancel)).await
    }

    #[tracing::instrument(name = "hydrate", skip_all, fields(panels = panels.len()))]
    async fn run<R>(
        &self,
        panels: Vec<PanelScript>,
        requester: &R,
        parent: Option<&CancellationToken>,
    ) -> Result<HydrationReport, HydrationError>
    where
        R: ImageRequester + ?Sized,
    {
        let mut collection: Vec<MangaPanelData> =
            panels.iter().cloned().map(MangaPanelData::placeholder).collect();
        let (generation, token) = self.begin(&collection, parent)?;

        let limit = self.config.max_concurrent_requests.max(1);
        info!(
            concurrency = limit,
            policy = %self.config.transport_policy,
            "Starting panel hydration"
        );

        let scripts = panels.as_slice();
        let mut requests = futures::stream::iter(0..scripts.len())
            .map(move |index| async move {
                (index, self.request_one(requester, scripts, index).await)
            })
            .buffer_unordered(limit);

        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    info!("Hydration superseded, stopping");
                    return Err(HydrationError::Cancelled);
                }
                next = requests.next() => next,
            };

            let Some((index, result)) = next else {
                break;
            };
            let panel_number = scripts[index].panel;

            match result {
                Ok(Some(image)) => {
                    debug!(
                        index,
                        panel = panel_number,
                        bytes = image.data.len(),
                        "Panel drawn"
                    );
                    collection[index].image_url = Some(image.to_data_url());
                    collection[index].status = PanelStatus::Drawn;
                }
                Ok(None) => {
                    warn!(index, panel = panel_number, "Response contained no image data");
                    collection[index].status = PanelStatus::ImageAbsent;
                }
                Err(err) => match self.config.transport_policy {
                    TransportPolicy::Abort => {
                        warn!(
                            index,
                            panel = panel_number,
                            error = %err,
                            "Image request failed, aborting run"
                        );
                        collection[index].status = PanelStatus::Failed(err.to_string());
                        if !self.publish(generation, &collection) {
                            return Err(HydrationError::Cancelled);
                        }
                        return Err(HydrationError::Transport {
                            index,
                            panel: panel_number,
                            source: err,
                        });
                    }
                    TransportPolicy::Continue => {
                        warn!(
                            index,
                            panel = panel_number,
                            error = %err,
                            "Image request failed, continuing"
                        );
                        collection[index].status = PanelStatus::Failed(err.to_string());
                    }
                },
            }

            if !self.publish(generation, &collection) {
                return Err(HydrationError::Cancelled);
            }
        }

        let report = HydrationReport::from_panels(PanelSnapshot::from(collection));
        info!(
            drawn = report.drawn,
            absent = report.absent,
            failed = report.failed,
            "Panel hydration finished"
        );
        Ok(report)
    }

    /// Supersedes any previous run and publishes the placeholders.
    fn begin(
        &self,
        collection: &[MangaPanelData],
        parent: Option<&CancellationToken>,
    ) -> Result<(u64, CancellationToken), HydrationError> {
        let mut active = self.lock_active();
        if parent.is_some_and(|p| p.is_cancelled()) {
            return Err(HydrationError::Cancelled);
        }
        active.token.cancel();
        active.generation += 1;
        active.token = parent.map_or_else(CancellationToken::new, |p| p.child_token());
        self.sender.send_replace(PanelSnapshot::from(collection));
        Ok((active.generation, active.token.clone()))
    }

    /// Publishes `collection` if `generation` is still the active run.
    fn publish(&self, generation: u64, collection: &[MangaPanelData]) -> bool {
        let active = self.lock_active();
        if active.generation != generation || active.token.is_cancelled() {
            return false;
        }
        self.sender.send_replace(PanelSnapshot::from(collection));
        true
    }

    async fn request_one<R>(
        &self,
        requester: &R,
        scripts: &[PanelScript],
        index: usize,
    ) -> Result<Option<ImageData>, TransportError>
    where
        R: ImageRequester + ?Sized,
    {
        let request = requester.request_image(&scripts[index], scripts, index);
        match self.config.request_timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .unwrap_or(Err(TransportError::Timeout(limit))),
            None => request.await,
        }
    }

    fn lock_active(&self) -> MutexGuard<'_, ActiveRun> {
        // The guarded state is two plain fields; a poisoned lock still holds valid data.
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
