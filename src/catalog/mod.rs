// Session catalog: the immutable snapshot of sessions the cascade selects from,
// and the sources it can be loaded from.

pub mod record;
pub mod source;

use std::collections::HashSet;

use log::warn;

pub use record::SessionRecord;
pub use source::{CatalogSource, HttpCatalogSource, IndexFileCatalogSource};

/// Snapshot of the sessions available for selection.
///
/// Session ids are unique within a catalog. When a source repeats an id the
/// first record wins and the duplicates are dropped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionCatalog {
    records: Vec<SessionRecord>,
}

impl SessionCatalog {
    pub fn new(records: Vec<SessionRecord>) -> Self {
        let mut seen = HashSet::with_capacity(records.len());
        let records = records
            .into_iter()
            .filter(|record| {
                let is_new = seen.insert(record.session_id.clone());
                if !is_new {
                    warn!(
                        "Dropping duplicate session id {} ({} {} {})",
                        record.session_id, record.year, record.event_name, record.session_type
                    );
                }
                is_new
            })
            .collect();
        Self { records }
    }

    pub fn records(&self) -> &[SessionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find(&self, session_id: &str) -> Option<&SessionRecord> {
        self.records.iter().find(|r| r.session_id == session_id)
    }
}

/// Load state of the catalog as seen by the views.
#[derive(Clone, Debug, PartialEq)]
pub enum CatalogState {
    Loading,
    Ready(SessionCatalog),
    Failed { reason: String },
}

impl CatalogState {
    pub fn catalog(&self) -> Option<&SessionCatalog> {
        match self {
            CatalogState::Ready(catalog) => Some(catalog),
            _ => None,
        }
    }
}
