use crate::config::Config;
use crate::error::Result;
use crate::schema::Disease;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// Record of one artifact fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactInfo {
    pub disease: Disease,
    pub url: String,
    pub path: PathBuf,
    pub bytes: u64,
    pub fetched_at: String,
}

/// Manifest of fetched artifacts. Informational only: cache hits are decided
/// by file existence, never by this registry.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ArtifactRegistry {
    artifacts: BTreeMap<String, ArtifactInfo>,
}

impl ArtifactRegistry {
    pub fn load(config: &Config) -> Result<Self> {
        if !config.registry_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config.registry_path)?;
        let registry: ArtifactRegistry = toml::from_str(&content)?;
        Ok(registry)
    }

    /// Like [`load`](Self::load), but an unreadable manifest counts as empty.
    pub fn load_or_default(config: &Config) -> Self {
        Self::load(config).unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable {:?}: {}", config.registry_path, e);
            Self::default()
        })
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(&config.registry_path, content)?;
        Ok(())
    }

    pub fn record(&mut self, info: ArtifactInfo) {
        self.artifacts.insert(info.disease.name().to_string(), info);
    }

    pub fn get(&self, disease: Disease) -> Option<&ArtifactInfo> {
        self.artifacts.get(disease.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_and_reload() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::with_models_dir(tmp.path(), "https://host").unwrap();

        let mut registry = ArtifactRegistry::load(&config).unwrap();
        assert!(registry.get(Disease::Heart).is_none());

        registry.record(ArtifactInfo {
            disease: Disease::Heart,
            url: "https://host/heart_model.json".to_string(),
            path: tmp.path().join("heart_model.json"),
            bytes: 512,
            fetched_at: "2026-01-01T00:00:00+00:00".to_string(),
        });
        registry.save(&config).unwrap();

        let reloaded = ArtifactRegistry::load(&config).unwrap();
        let info = reloaded.get(Disease::Heart).unwrap();
        assert_eq!(info.bytes, 512);
        assert_eq!(info.url, "https://host/heart_model.json");
        assert!(reloaded.get(Disease::Diabetes).is_none());
    }

    #[test]
    fn unreadable_manifest_falls_back_to_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::with_models_dir(tmp.path(), "https://host").unwrap();
        std::fs::write(&config.registry_path, "not = [valid toml").unwrap();

        assert!(ArtifactRegistry::load(&config).is_err());
        let registry = ArtifactRegistry::load_or_default(&config);
        assert!(registry.get(Disease::Heart).is_none());
    }

    #[test]
    fn record_replaces_previous_entry() {
        let mut registry = ArtifactRegistry::default();
        for bytes in [1, 2] {
            registry.record(ArtifactInfo {
                disease: Disease::Diabetes,
                url: "u".to_string(),
                path: PathBuf::from("p"),
                bytes,
                fetched_at: String::new(),
            });
        }
        assert_eq!(registry.get(Disease::Diabetes).unwrap().bytes, 2);
    }
}
