//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Reelsmith - turn a story, script or idea into a generated video
#[derive(Parser, Debug)]
#[command(name = "reelsmith")]
#[command(about = "Turn a story, script or idea into a generated video", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file to load over the bundled defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline: analysis, characters, concept art, video
    Run {
        /// Text file with the novel excerpt, script or idea
        #[arg(long)]
        input: PathBuf,

        /// Catalogue id of the model to select
        #[arg(long)]
        model: Option<u32>,

        /// Do not generate character concept art
        #[arg(long)]
        skip_images: bool,
    },

    /// Animate a single image
    Video {
        /// Image file (png, jpg, webp, gif)
        #[arg(long)]
        image: PathBuf,

        /// Motion prompt
        #[arg(long)]
        prompt: Option<String>,
    },

    /// Chat with the film creation assistant
    Chat,

    /// List the model catalogue
    Models,
}
