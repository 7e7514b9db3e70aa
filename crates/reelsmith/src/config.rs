//! Layered configuration loading.
//!
//! Sources, later overriding earlier:
//! 1. Bundled defaults (`reelsmith.toml` at the workspace root, via `include_str!`)
//! 2. `~/.config/reelsmith/reelsmith.toml`
//! 3. `./reelsmith.toml`
//! 4. `REELSMITH__<SECTION>__<KEY>` environment variables

use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use reelsmith_error::{ConfigError, ReelsmithError, ReelsmithResult};
use reelsmith_interface::StudioBackend;
use reelsmith_models::GeminiSettings;
use reelsmith_pipeline::{ChatSession, ChatSettings, Pipeline, PipelineSettings, PollPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument};

const DEFAULT_CONFIG: &str = include_str!("../../../reelsmith.toml");
const ENV_PREFIX: &str = "REELSMITH";

/// Top-level Reelsmith configuration.
///
/// # Example
///
/// ```no_run
/// use reelsmith::ReelsmithConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ReelsmithConfig::load()?;
/// println!("Polling every {} ms", config.poll.interval_ms());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReelsmithConfig {
    /// Pipeline limits and prompt fragments
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// Video status polling schedule
    #[serde(default)]
    pub poll: PollPolicy,

    /// Chat assistant texts
    #[serde(default)]
    pub chat: ChatSettings,

    /// Gemini/Veo backend settings
    #[serde(default)]
    pub gemini: GeminiSettings,
}

impl ReelsmithConfig {
    /// Load configuration with precedence: environment > current dir > home dir > bundled defaults.
    ///
    /// User config files are optional and silently skipped when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if a present file or variable cannot be parsed.
    #[instrument]
    pub fn load() -> ReelsmithResult<Self> {
        debug!("Loading configuration with precedence: env > current dir > home dir > bundled defaults");

        let mut builder = Self::defaults_builder();

        if let Some(config_dir) = dirs::config_dir() {
            let home_config = config_dir.join("reelsmith").join("reelsmith.toml");
            debug!(path = %home_config.display(), "Checking user configuration");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("reelsmith").required(false));

        Self::finish(builder.add_source(Self::environment()), "layered sources")
    }

    /// Load an explicit configuration file over the bundled defaults.
    ///
    /// Environment variables still take precedence over the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or cannot be parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> ReelsmithResult<Self> {
        debug!("Loading configuration from file");

        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::new("Configuration file not found")
                .in_source(path.display())
                .into());
        }

        let builder = Self::defaults_builder()
            .add_source(File::from(path))
            .add_source(Self::environment());
        Self::finish(builder, path.display())
    }

    /// Build a pipeline from these settings.
    pub fn pipeline(&self, backend: Arc<dyn StudioBackend>) -> Pipeline {
        Pipeline::new(backend, self.pipeline.clone(), self.poll.clone())
    }

    /// Build a chat session from these settings.
    pub fn chat_session(&self, backend: Arc<dyn StudioBackend>) -> ChatSession {
        ChatSession::new(backend, self.chat.clone())
    }

    fn defaults_builder() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
    }

    fn finish(
        builder: ConfigBuilder<DefaultState>,
        source: impl std::fmt::Display,
    ) -> ReelsmithResult<Self> {
        builder
            .build()
            .map_err(|e| {
                ReelsmithError::from(
                    ConfigError::new(format!("Failed to build configuration: {}", e))
                        .in_source(&source),
                )
            })?
            .try_deserialize()
            .map_err(|e| {
                ReelsmithError::from(
                    ConfigError::new(format!("Failed to parse configuration: {}", e))
                        .in_source(&source),
                )
            })
    }
}
