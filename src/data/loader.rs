//! CSV Data Loader Module
//! Fetches CSV from a URL or a local file and parses it with Polars.

use crate::data::Dataset;
use crate::error::{DashError, Result};
use moka::sync::Cache;
use reqwest::blocking::Client;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Where a page's CSV comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Url(String),
    File(PathBuf),
}

impl DataSource {
    /// `http://` and `https://` strings are URLs, everything else is a path.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            DataSource::Url(trimmed.to_string())
        } else {
            DataSource::File(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Url(url) => write!(f, "{url}"),
            DataSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fetch settings.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    pub timeout: Duration,
    /// `None` re-fetches on every load.
    pub cache_ttl: Option<Duration>,
    pub cache_capacity: u64,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            cache_ttl: None,
            cache_capacity: 32,
        }
    }
}

/// Loads datasets, optionally reusing recent fetches of the same source.
pub struct DataLoader {
    client: Client,
    cache: Option<Cache<String, Arc<Dataset>>>,
}

impl DataLoader {
    pub fn new(options: &LoaderOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| DashError::Config(format!("HTTP client: {e}")))?;

        let cache = options.cache_ttl.filter(|ttl| !ttl.is_zero()).map(|ttl| {
            Cache::builder()
                .max_capacity(options.cache_capacity)
                .time_to_live(ttl)
                .build()
        });

        Ok(Self { client, cache })
    }

    /// Load and parse a source. Blocks for the whole fetch.
    pub fn load(&self, source: &DataSource) -> Result<Arc<Dataset>> {
        let key = source.to_string();

        if let Some(cache) = &self.cache {
            if let Some(dataset) = cache.get(&key) {
                debug!(source = %key, "dataset cache hit");
                return Ok(dataset);
            }
        }

        let bytes = self.fetch_bytes(source)?;
        let dataset = Arc::new(Dataset::from_csv_bytes(bytes, &key)?);
        info!(
            source = %key,
            rows = dataset.row_count(),
            columns = dataset.column_names().len(),
            "loaded dataset"
        );

        if let Some(cache) = &self.cache {
            cache.insert(key, Arc::clone(&dataset));
        }

        Ok(dataset)
    }

    fn fetch_bytes(&self, source: &DataSource) -> Result<Vec<u8>> {
        let failure = |reason: String| DashError::FetchFailure {
            source_name: source.to_string(),
            reason,
        };

        match source {
            DataSource::File(path) => std::fs::read(path).map_err(|e| failure(e.to_string())),
            DataSource::Url(url) => {
                debug!(%url, "fetching CSV");
                let response = self
                    .client
                    .get(url)
                    .send()
                    .map_err(|e| failure(e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(failure(format!("HTTP status {status}")));
                }

                response
                    .bytes()
                    .map(|b| b.to_vec())
                    .map_err(|e| failure(e.to_string()))
            }
        }
    }
}
