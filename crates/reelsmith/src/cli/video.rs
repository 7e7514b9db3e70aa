//! Image-to-video command handler.

use super::run::{ctrl_c, interruptible, log_stage_changes};
use reelsmith::{DataUrl, ReelsmithConfig, ReelsmithResult, ValidationError, mime_for_path};
use std::path::Path;
use tracing::warn;

/// Animate `image` and print the video locator.
pub async fn animate_image(
    config: &ReelsmithConfig,
    image: &Path,
    prompt: Option<String>,
) -> ReelsmithResult<()> {
    let mime = mime_for_path(image).ok_or_else(|| {
        ValidationError::new(format!("Unsupported image type: {}", image.display()))
    })?;
    let bytes = tokio::fs::read(image).await.map_err(|e| {
        ValidationError::new(format!("Failed to read {}: {}", image.display(), e))
    })?;
    let image = DataUrl::from_bytes(mime, &bytes).to_string();

    let pipeline = config.pipeline(super::backend(config)?);
    let stages = log_stage_changes(&pipeline);

    let result = interruptible(pipeline.generate_video_direct(image, prompt), ctrl_c()).await;

    stages.abort();
    result?;

    match &pipeline.snapshot().generated_video_url {
        Some(url) => println!("{}", url),
        None => warn!("Generation finished without a video"),
    }
    Ok(())
}
