//! Generates a manga strip for a topic and writes every drawn panel to disk.
//!
//! Run with:
//! GEMINI_API_KEY=... cargo run --example generate_manga -- "How volcanoes form"
//!
//! Optional: MANGAKA_MAX_CONCURRENT_IMAGES=3, MANGAKA_TRANSPORT_POLICY=continue

use anyhow::Context;
use mangaka::observability::{self, ObservabilityConfig};
use mangaka::{GeminiClient, ImageData, MangaConfig, MangaGenerator, PanelStatus};
use std::path::PathBuf;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init(ObservabilityConfig::default())
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    let topic = std::env::args()
        .skip(1)
        .collect::<Vec<_>>()
        .join(" ");
    let topic = if topic.trim().is_empty() {
        "The life cycle of a star".to_string()
    } else {
        topic
    };

    let config = MangaConfig::from_env().context("reading configuration")?;
    info!(?config, "Starting generation");

    let client = GeminiClient::from_config(&config);
    let generator = MangaGenerator::with_config(client.clone(), client, &config);

    let mut updates = generator.subscribe();
    let progress = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            let settled = snapshot.iter().filter(|p| p.status.is_settled()).count();
            info!(settled, total = snapshot.len(), "Panels updated");
        }
    });

    let result = generator.generate(&topic).await;

    // Panels drawn before a failure are still worth keeping.
    let snapshot = generator.snapshot();

    for panel in snapshot.iter() {
        match (&panel.status, panel.image_url.as_deref()) {
            (PanelStatus::Drawn, Some(url)) => {
                let image = ImageData::try_from(url).map_err(|e| anyhow::anyhow!(e))?;
                let path = PathBuf::from(format!("panel-{}.{}", panel.panel(), image.extension()));
                std::fs::write(&path, &image.data)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("Panel {}: {}", panel.panel(), path.display());
            }
            (status, _) => {
                warn!(panel = panel.panel(), ?status, "Panel has no artwork");
            }
        }
        println!("  {}", panel.script.description);
        if !panel.script.dialogue.is_empty() {
            println!("  \"{}\"", panel.script.dialogue);
        }
        if let Some(sfx) = &panel.script.sfx {
            println!("  *{sfx}*");
        }
    }

    drop(generator);
    progress.abort();

    let report = result.context("generation failed")?;
    println!(
        "\n{} drawn, {} without artwork, {} failed",
        report.drawn, report.absent, report.failed
    );
    Ok(())
}
