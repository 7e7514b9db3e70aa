//! Reelsmith CLI binary.
//!
//! This binary provides command-line access to the pipeline:
//! - Run the full text-to-video pipeline
//! - Animate a single image
//! - Chat with the assistant
//! - List the model catalogue

use clap::Parser;
use reelsmith::{ReelsmithConfig, init_logging};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, RunOptions, animate_image, list_models, run_chat, run_pipeline};

    // .env may provide GEMINI_API_KEY
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.verbose).map_err(|e| e as Box<dyn std::error::Error>)?;

    let config = match &cli.config {
        Some(path) => ReelsmithConfig::from_file(path)?,
        None => ReelsmithConfig::load()?,
    };

    match cli.command {
        Commands::Run {
            input,
            model,
            skip_images,
        } => {
            run_pipeline(
                &config,
                RunOptions {
                    input,
                    model,
                    skip_images,
                },
            )
            .await?;
        }

        Commands::Video { image, prompt } => {
            animate_image(&config, &image, prompt).await?;
        }

        Commands::Chat => {
            run_chat(&config).await?;
        }

        Commands::Models => {
            list_models();
        }
    }

    Ok(())
}
