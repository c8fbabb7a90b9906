use std::sync::mpsc::Sender;

use log::{info, warn};
use snafu::Snafu;

use super::CascadeState;
use crate::catalog::{SessionCatalog, SessionRecord};

#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
pub enum CommitError {
    #[snafu(display("No session selected"))]
    IncompleteSelection,
    #[snafu(display("Session {session_id} is no longer available, please select it again"))]
    StaleSelection { session_id: String },
}

/// Resolves a complete cascade selection to its catalog record.
///
/// The record must match the selected session id as well as the selected year
/// and event; a selection made against a catalog that has since been reloaded
/// fails with [`CommitError::StaleSelection`]. Neither the catalog nor the state
/// is modified.
pub fn commit(catalog: &SessionCatalog, state: &CascadeState) -> Result<SessionRecord, CommitError> {
    let session_id = state
        .selected_session_id()
        .ok_or(CommitError::IncompleteSelection)?;
    let (year, event) = match (state.selected_year(), state.selected_event()) {
        (Some(year), Some(event)) => (year, event),
        _ => return Err(CommitError::IncompleteSelection),
    };
    catalog
        .records()
        .iter()
        .find(|r| r.session_id == session_id && r.is_in(year, event))
        .cloned()
        .ok_or_else(|| CommitError::StaleSelection {
            session_id: session_id.to_string(),
        })
}

/// Receiver of committed sessions (charts, telemetry views).
pub trait SelectionConsumer {
    fn session_committed(&mut self, record: &SessionRecord);
}

impl SelectionConsumer for Sender<SessionRecord> {
    fn session_committed(&mut self, record: &SessionRecord) {
        if let Err(e) = self.send(record.clone()) {
            warn!("No consumer listening for committed session {}: {}", record.session_id, e);
        }
    }
}

impl SelectionConsumer for Vec<SessionRecord> {
    fn session_committed(&mut self, record: &SessionRecord) {
        self.push(record.clone());
    }
}

/// Turns explicit apply actions into exactly one consumer notification each.
pub struct SelectionCommitter<C: SelectionConsumer> {
    consumer: C,
}

impl<C: SelectionConsumer> SelectionCommitter<C> {
    pub fn new(consumer: C) -> Self {
        Self { consumer }
    }

    pub fn commit(
        &mut self,
        catalog: &SessionCatalog,
        state: &CascadeState,
    ) -> Result<SessionRecord, CommitError> {
        let record = commit(catalog, state)?;
        info!(
            "Applying session {} ({} {} {})",
            record.session_id, record.year, record.event_name, record.session_type
        );
        self.consumer.session_committed(&record);
        Ok(record)
    }

    pub fn consumer(&self) -> &C {
        &self.consumer
    }
}
