//! Full pipeline command handler.

use reelsmith::{
    GenerationError, GenerationErrorKind, Pipeline, ReelsmithConfig, ReelsmithResult, Stage,
    ValidationError,
};
use std::future::Future;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Options for `reelsmith run`.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Input text file
    pub input: PathBuf,
    /// Model to select before starting
    pub model: Option<u32>,
    /// Skip character concept art
    pub skip_images: bool,
}

/// Run every stage from raw text to a finished video.
pub async fn run_pipeline(config: &ReelsmithConfig, options: RunOptions) -> ReelsmithResult<()> {
    let text = tokio::fs::read_to_string(&options.input).await.map_err(|e| {
        ValidationError::new(format!(
            "Failed to read {}: {}",
            options.input.display(),
            e
        ))
    })?;

    let pipeline = config.pipeline(super::backend(config)?);
    let stages = log_stage_changes(&pipeline);

    let result = interruptible(drive(&pipeline, text, &options), ctrl_c()).await;

    stages.abort();
    result?;

    match &pipeline.snapshot().generated_video_url {
        Some(url) => println!("{}", url),
        None => warn!("Pipeline finished without a video"),
    }
    Ok(())
}

async fn drive(pipeline: &Pipeline, text: String, options: &RunOptions) -> ReelsmithResult<()> {
    pipeline.set_raw_input(text);
    if let Some(id) = options.model {
        pipeline.select_model(id)?;
    }

    pipeline.analyze().await?;
    pipeline.extract_characters().await?;

    let characters = pipeline.snapshot().characters.clone();
    info!(count = characters.len(), "Characters extracted");
    if !options.skip_images {
        for character in &characters {
            pipeline.generate_character_image(character.id()).await?;
            info!(name = %character.name(), "Concept art ready");
        }
    }

    pipeline.advance_to_visual_dev().await?;
    pipeline.generate_video().await
}

pub(crate) fn log_stage_changes(pipeline: &Pipeline) -> JoinHandle<()> {
    let mut updates = pipeline.subscribe();
    tokio::spawn(async move {
        let mut last = Stage::Input;
        while updates.changed().await.is_ok() {
            let stage = updates.borrow_and_update().current_stage;
            if stage != last {
                info!(from = %last, to = %stage, "{}", stage.label());
                last = stage;
            }
        }
    })
}

/// Run `operation` until it finishes or `interrupt` fires.
///
/// An interrupt drops the operation, which releases the pipeline and reverts
/// the in-flight stage, and stops any later steps from starting.
pub(crate) async fn interruptible<F, I>(operation: F, interrupt: I) -> ReelsmithResult<()>
where
    F: Future<Output = ReelsmithResult<()>>,
    I: Future<Output = ()>,
{
    tokio::select! {
        result = operation => result,
        () = interrupt => {
            warn!("Interrupt received, cancelling the running operation");
            Err(GenerationError::new(GenerationErrorKind::Cancelled).into())
        }
    }
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
pub(crate) async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
