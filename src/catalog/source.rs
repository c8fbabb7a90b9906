use std::path::PathBuf;

use log::info;

use super::SessionRecord;
use crate::{PaddockError, api::ApiClient, cache_config::index::read_index};

pub const SESSIONS_PATH: &str = "/sessions";

/// Read-only provider of session records.
///
/// Fetching is idempotent and has no side effects on the remote system; it is
/// called from a worker thread, once per catalog load.
pub trait CatalogSource: Send + Sync {
    /// Short description used in logs and status messages
    fn describe(&self) -> String;

    fn fetch_sessions(&self) -> Result<Vec<SessionRecord>, PaddockError>;
}

/// Sessions listed by the browser API (`GET /sessions`)
pub struct HttpCatalogSource {
    client: ApiClient,
}

impl HttpCatalogSource {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

impl CatalogSource for HttpCatalogSource {
    fn describe(&self) -> String {
        self.client.url(SESSIONS_PATH)
    }

    fn fetch_sessions(&self) -> Result<Vec<SessionRecord>, PaddockError> {
        let records: Vec<SessionRecord> = self.client.get(SESSIONS_PATH, &[])?;
        info!("Fetched {} sessions from {}", records.len(), self.describe());
        Ok(records)
    }
}

/// Sessions listed in a local `session_index.csv`
pub struct IndexFileCatalogSource {
    index_path: PathBuf,
}

impl IndexFileCatalogSource {
    pub fn new(index_path: PathBuf) -> Self {
        Self { index_path }
    }
}

impl CatalogSource for IndexFileCatalogSource {
    fn describe(&self) -> String {
        self.index_path.display().to_string()
    }

    fn fetch_sessions(&self) -> Result<Vec<SessionRecord>, PaddockError> {
        let rows = read_index(&self.index_path)?;
        info!("Read {} sessions from {}", rows.len(), self.describe());
        Ok(rows.into_iter().map(SessionRecord::from).collect())
    }
}
