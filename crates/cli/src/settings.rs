//! Layered configuration
//!
//! Built-in defaults, then an optional TOML file, then `MEDIQUEUE_*`
//! environment variables (`MEDIQUEUE_SPEECH__ENGINE=say` for nested keys).

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use directories::ProjectDirs;
use mediqueue_infra_system::{SpeechConfig, SpeechEngine};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const FALLBACK_DB_PATH: &str = "~/.mediqueue/mediqueue.db";
const DEFAULT_COUNTER: &str = "Counter 1";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub db_path: String,
    pub default_counter: String,
    pub speech: SpeechSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechSettings {
    pub enabled: bool,
    pub engine: String,
    #[serde(default)]
    pub voice: Option<String>,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "mediqueue", "mediqueue")
}

impl Settings {
    /// Load settings; `config_file` must exist when given
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let dirs = project_dirs();
        let default_db = dirs
            .as_ref()
            .map(|d| d.data_dir().join("mediqueue.db").display().to_string())
            .unwrap_or_else(|| FALLBACK_DB_PATH.to_string());

        let mut builder = Config::builder()
            .set_default("db_path", default_db)?
            .set_default("default_counter", DEFAULT_COUNTER)?
            .set_default("speech.enabled", true)?
            .set_default("speech.engine", "espeak")?
            .set_default("speech.rate", 0.85)?
            .set_default("speech.pitch", 1.1)?
            .set_default("speech.volume", 1.0)?;

        builder = match (config_file, &dirs) {
            (Some(path), _) => builder.add_source(File::from(path).required(true)),
            (None, Some(dirs)) => {
                builder.add_source(File::from(dirs.config_dir().join("config.toml")).required(false))
            }
            (None, None) => builder,
        };

        let mut settings: Settings = builder
            .add_source(
                Environment::with_prefix("MEDIQUEUE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        settings.db_path = shellexpand::tilde(&settings.db_path).into_owned();
        Ok(settings)
    }

    /// sqlx URL for `db_path`, creating the parent directory of a file path
    pub fn database_url(&self) -> Result<String> {
        if self.db_path.starts_with("sqlite:") {
            return Ok(self.db_path.clone());
        }

        let path = PathBuf::from(&self.db_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create data directory {}", parent.display()))?;
        }
        Ok(format!("sqlite://{}", self.db_path))
    }

    pub fn speech_config(&self) -> SpeechConfig {
        SpeechConfig {
            engine: SpeechEngine::from_name(&self.speech.engine),
            voice: self.speech.voice.clone(),
            rate: self.speech.rate,
            pitch: self.speech.pitch,
            volume: self.speech.volume,
        }
    }
}
