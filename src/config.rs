use crate::error::{Error, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str =
	"https://raw.githubusercontent.com/mohammedarifsn12/multiple_disease_prediction/main";

const REGISTRY_FILE: &str = "artifacts.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
	pub models_dir: PathBuf,
	pub base_url: String,
	pub registry_path: PathBuf,
}

/// On-disk configuration. Every field is optional; environment variables win.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
	pub models_dir: Option<PathBuf>,
	pub base_url: Option<String>,
}

impl ConfigFile {
	pub fn load(path: &Path) -> Result<Self> {
		if !path.exists() {
			return Ok(Self::default());
		}

		let content = std::fs::read_to_string(path)?;
		toml::from_str(&content)
			.map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))
	}
}

impl Config {
	pub fn with_models_dir(models_dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Result<Self> {
		let models_dir = models_dir.into();
		let base_url = base_url.into();

		if base_url.trim().is_empty() {
			return Err(Error::ConfigError("Base URL must not be empty".to_string()));
		}

		std::fs::create_dir_all(&models_dir)?;
		let registry_path = models_dir.join(REGISTRY_FILE);

		Ok(Self {
			models_dir,
			base_url: base_url.trim_end_matches('/').to_string(),
			registry_path,
		})
	}

	pub fn from_env() -> Result<Self> {
		let file = match Self::config_file_path() {
			Some(path) => {
				tracing::debug!("Reading configuration from {:?}", path);
				ConfigFile::load(&path)?
			}
			None => ConfigFile::default(),
		};

		Self::resolve(file, |key| std::env::var(key).ok())
	}

	/// Environment first, then the config file, then built-in defaults.
	pub fn resolve(file: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
		let models_dir = env("MEDPREDICT_MODELS_DIR")
			.map(PathBuf::from)
			.or(file.models_dir)
			.unwrap_or_else(|| PathBuf::from("."));

		let base_url = env("MEDPREDICT_BASE_URL")
			.or(file.base_url)
			.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

		Self::with_models_dir(models_dir, base_url)
	}

	fn config_file_path() -> Option<PathBuf> {
		if let Ok(path) = std::env::var("MEDPREDICT_CONFIG") {
			return Some(PathBuf::from(path));
		}

		ProjectDirs::from("", "", "medpredict").map(|dirs| dirs.config_dir().join("config.toml"))
	}
}
