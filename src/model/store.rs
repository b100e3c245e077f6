use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{ArtifactInfo, ArtifactRegistry, Model, ModelSet};
use crate::schema::Disease;
use std::path::PathBuf;
use std::time::Duration;

/// Retrieves the raw bytes of a remote artifact.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Plain HTTP GET. No authentication, no retry.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| Error::DownloadFailed(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::DownloadFailed(format!("{}: {}", url, e)))?;

        let bytes = response
            .bytes()
            .map_err(|e| Error::DownloadFailed(format!("{}: {}", url, e)))?;

        Ok(bytes.to_vec())
    }
}

/// Local cache of model artifacts, filled from the remote source on demand.
pub struct ArtifactStore<F: Fetcher = HttpFetcher> {
    config: Config,
    fetcher: F,
}

impl ArtifactStore<HttpFetcher> {
    pub fn from_config(config: Config) -> Result<Self> {
        Ok(Self::new(config, HttpFetcher::new()?))
    }
}

impl<F: Fetcher> ArtifactStore<F> {
    pub fn new(config: Config, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn local_path(&self, disease: Disease) -> PathBuf {
        self.config.models_dir.join(disease.artifact_filename())
    }

    pub fn remote_url(&self, disease: Disease) -> String {
        format!("{}/{}", self.config.base_url, disease.artifact_filename())
    }

    /// Make sure the artifact for `disease` exists locally and return its path.
    ///
    /// An existing file is never refreshed. A missing one is fetched, written
    /// next to its final location and renamed into place, so a failed fetch
    /// leaves nothing at the returned path.
    pub fn ensure_local(&self, disease: Disease) -> Result<PathBuf> {
        let path = self.local_path(disease);
        if path.exists() {
            tracing::debug!("Using cached {} artifact at {:?}", disease, path);
            return Ok(path);
        }

        let url = self.remote_url(disease);
        tracing::info!("Fetching {} model from {}", disease, url);

        let bytes = self.fetcher.fetch(&url)?;

        let partial = path.with_extension("json.part");
        if partial.exists() {
            tracing::warn!("Overwriting stale partial download {:?}", partial);
        }
        std::fs::write(&partial, &bytes)?;
        std::fs::rename(&partial, &path)?;

        tracing::info!(model = %disease, bytes = bytes.len(), "Artifact cached at {:?}", path);

        let info = ArtifactInfo {
            disease,
            url,
            path: path.clone(),
            bytes: bytes.len() as u64,
            fetched_at: chrono::Utc::now().to_rfc3339(),
        };
        if let Err(e) = self.record_fetch(info) {
            tracing::warn!(model = %disease, "Could not update {:?}: {}", self.config.registry_path, e);
        }

        Ok(path)
    }

    fn record_fetch(&self, info: ArtifactInfo) -> Result<()> {
        let mut registry = ArtifactRegistry::load(&self.config)?;
        registry.record(info);
        registry.save(&self.config)
    }

    pub fn load(&self, disease: Disease) -> Result<Model> {
        let path = self.ensure_local(disease)?;
        Model::load(&path, disease)
    }

    pub fn load_all(&self) -> Result<ModelSet> {
        let mut models = ModelSet::default();
        for disease in Disease::ALL {
            models.insert(self.load(disease)?);
        }
        Ok(models)
    }
}
