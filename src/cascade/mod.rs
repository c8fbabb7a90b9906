// Cascading session selection: year -> event -> session.
//
// Option lists are derived from the catalog on demand; the selection itself is
// a small value type whose setters enforce that changing an upper level
// invalidates everything below it.

pub mod commit;

use itertools::Itertools;
use log::debug;

use crate::catalog::{SessionCatalog, SessionRecord};

pub use commit::{CommitError, SelectionCommitter, SelectionConsumer, commit};

/// The three selection fields of the cascade.
///
/// An event is only ever set while a year is set, and a session id only while
/// an event is set. Every setter returns a new state that upholds this.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CascadeState {
    selected_year: Option<String>,
    selected_event: Option<String>,
    selected_session_id: Option<String>,
}

impl CascadeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_year(&self) -> Option<&str> {
        self.selected_year.as_deref()
    }

    pub fn selected_event(&self) -> Option<&str> {
        self.selected_event.as_deref()
    }

    pub fn selected_session_id(&self) -> Option<&str> {
        self.selected_session_id.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.selected_year.is_none()
    }

    pub fn is_complete(&self) -> bool {
        self.selected_session_id.is_some()
    }

    /// Selects a year (empty means unset) and clears event and session.
    pub fn set_year(&self, new_year: &str) -> CascadeState {
        CascadeState {
            selected_year: label(new_year),
            selected_event: None,
            selected_session_id: None,
        }
    }

    /// Selects an event and clears the session. Ignored while no year is set.
    pub fn set_event(&self, new_event: &str) -> CascadeState {
        if self.selected_year.is_none() {
            return self.clone();
        }
        CascadeState {
            selected_year: self.selected_year.clone(),
            selected_event: label(new_event),
            selected_session_id: None,
        }
    }

    /// Selects a session id. Ignored while no event is set.
    ///
    /// The id is not checked against the derived session options here, a
    /// mismatch is reported when the selection is committed.
    pub fn set_session(&self, new_session_id: &str) -> CascadeState {
        if self.selected_event.is_none() {
            return self.clone();
        }
        CascadeState {
            selected_session_id: label(new_session_id),
            ..self.clone()
        }
    }
}

fn label(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Distinct years of the catalog, most recent label first.
pub fn derive_year_options(catalog: &SessionCatalog) -> Vec<&str> {
    catalog
        .records()
        .iter()
        .map(|r| r.year.as_str())
        .unique()
        .sorted_by(|a, b| b.cmp(a))
        .collect()
}

/// Distinct events held in `selected_year`, sorted ascending.
pub fn derive_event_options<'c>(
    catalog: &'c SessionCatalog,
    selected_year: Option<&str>,
) -> Vec<&'c str> {
    let Some(year) = selected_year else {
        return Vec::new();
    };
    catalog
        .records()
        .iter()
        .filter(|r| r.year == year)
        .map(|r| r.event_name.as_str())
        .unique()
        .sorted()
        .collect()
}

/// Sessions of the selected event, in catalog order.
///
/// Catalog order carries the practice -> qualifying -> race sequence, so the
/// result is never re-sorted, and records sharing a session type are all kept.
pub fn derive_session_options<'c>(
    catalog: &'c SessionCatalog,
    selected_year: Option<&str>,
    selected_event: Option<&str>,
) -> Vec<&'c SessionRecord> {
    let (Some(year), Some(event)) = (selected_year, selected_event) else {
        return Vec::new();
    };
    catalog
        .records()
        .iter()
        .filter(|r| r.is_in(year, event))
        .collect()
}

/// Owner of the cascade state. All selection changes go through here.
#[derive(Debug, Default)]
pub struct CascadeSelector {
    state: CascadeState,
}

impl CascadeSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CascadeState {
        &self.state
    }

    pub fn select_year(&mut self, year: &str) {
        debug!("Selecting year {:?}", year);
        self.state = self.state.set_year(year);
    }

    pub fn select_event(&mut self, event: &str) {
        debug!("Selecting event {:?}", event);
        self.state = self.state.set_event(event);
    }

    pub fn select_session(&mut self, session_id: &str) {
        debug!("Selecting session {:?}", session_id);
        self.state = self.state.set_session(session_id);
    }

    pub fn reset(&mut self) {
        if !self.state.is_empty() {
            debug!("Resetting session selection");
        }
        self.state = CascadeState::default();
    }

    pub fn year_options<'c>(&self, catalog: &'c SessionCatalog) -> Vec<&'c str> {
        derive_year_options(catalog)
    }

    pub fn event_options<'c>(&self, catalog: &'c SessionCatalog) -> Vec<&'c str> {
        derive_event_options(catalog, self.state.selected_year())
    }

    pub fn session_options<'c>(&self, catalog: &'c SessionCatalog) -> Vec<&'c SessionRecord> {
        derive_session_options(
            catalog,
            self.state.selected_year(),
            self.state.selected_event(),
        )
    }
}
