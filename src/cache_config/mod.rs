// Cache configuration: points the backend at a FastF1 cache directory before
// any session catalog can be listed.

pub mod index;

use std::path::Path;

use log::{info, warn};
use serde::Deserialize;

use crate::{PaddockError, api::ApiClient};
use index::{INDEX_FILE_NAME, SessionIndexBuilder};

pub const CACHE_PATH_ENDPOINT: &str = "/config/cache_path";

/// Configures the cache directory and reports how many sessions were added
/// to the session index.
pub trait CacheConfigurator: Send + Sync {
    fn configure(&self, cache_dir: &Path) -> Result<usize, PaddockError>;
}

#[derive(Debug, Deserialize)]
struct CachePathResponse {
    added: usize,
    #[serde(default)]
    index: Option<String>,
}

/// Asks the browser API to index and serve the given cache directory
pub struct HttpCacheConfigurator {
    client: ApiClient,
}

impl HttpCacheConfigurator {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

impl CacheConfigurator for HttpCacheConfigurator {
    fn configure(&self, cache_dir: &Path) -> Result<usize, PaddockError> {
        let path = cache_dir.to_string_lossy();
        let response: CachePathResponse = self
            .client
            .post(CACHE_PATH_ENDPOINT, &[("path", path.as_ref())])
            .map_err(|e| match e {
                PaddockError::ApiStatusError { detail, .. } => {
                    PaddockError::CacheConfigurationFailed { detail }
                }
                other => other,
            })?;
        info!(
            "API configured cache {:?}, added {} sessions to {}",
            cache_dir,
            response.added,
            response.index.as_deref().unwrap_or(INDEX_FILE_NAME)
        );
        Ok(response.added)
    }
}

/// Indexes a cache directory on this machine, for browsing without the API
pub struct LocalCacheConfigurator;

impl CacheConfigurator for LocalCacheConfigurator {
    fn configure(&self, cache_dir: &Path) -> Result<usize, PaddockError> {
        if !cache_dir.is_dir() {
            return Err(PaddockError::InvalidCacheDirectory {
                path: cache_dir.display().to_string(),
            });
        }
        let builder = SessionIndexBuilder::new(cache_dir);
        match builder.build() {
            Ok(added) => Ok(added),
            // an existing index is still usable when the pickles were pruned
            Err(PaddockError::NoCachedSessions { path }) if builder.index_path().is_file() => {
                warn!("No cached sessions left in {}, using existing index", path);
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }
}
