use std::{sync::Arc, time::Duration};

use log::{debug, error, info, warn};

use crate::{
    PaddockError,
    cascade::{CascadeSelector, CascadeState, CommitError, SelectionCommitter, SelectionConsumer},
    catalog::{CatalogSource, CatalogState, SessionCatalog, SessionRecord},
    flight::SingleFlight,
};

/// Top level application state. The cache has to be configured once before
/// any catalog is requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    AwaitingCacheConfiguration,
    Ready,
}

/// Message surfaced to the user, non-fatal in every case
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    CacheConfigured { added: usize },
    CacheConfigurationFailed { detail: String },
    CatalogLoadFailed { reason: String },
    StaleSelection { session_id: String },
}

impl Notice {
    pub fn is_error(&self) -> bool {
        !matches!(self, Notice::CacheConfigured { .. })
    }

    pub fn message(&self) -> String {
        match self {
            Notice::CacheConfigured { added } => format!("Success: added {} records", added),
            Notice::CacheConfigurationFailed { detail } => format!("Failed: {}", detail),
            Notice::CatalogLoadFailed { reason } => {
                format!("Could not load sessions: {}", reason)
            }
            Notice::StaleSelection { session_id } => format!(
                "Session {} is no longer available, please select it again",
                session_id
            ),
        }
    }
}

/// Event driven session browser.
///
/// Owns the catalog, the cascade selection and the committer. Every method is
/// called from the UI thread; the only background work is the catalog fetch,
/// whose result is picked up by [`SessionBrowser::poll`].
pub struct SessionBrowser<C: SelectionConsumer> {
    lifecycle: Lifecycle,
    source: Arc<dyn CatalogSource>,
    catalog: CatalogState,
    loader: SingleFlight<SessionCatalog>,
    selector: CascadeSelector,
    committer: SelectionCommitter<C>,
    notice: Option<Notice>,
}

impl<C: SelectionConsumer> SessionBrowser<C> {
    pub fn new(source: Arc<dyn CatalogSource>, consumer: C) -> Self {
        Self {
            lifecycle: Lifecycle::AwaitingCacheConfiguration,
            source,
            catalog: CatalogState::Loading,
            loader: SingleFlight::new("catalog"),
            selector: CascadeSelector::new(),
            committer: SelectionCommitter::new(consumer),
            notice: None,
        }
    }

    /// Browser for a backend whose cache is already configured. The catalog
    /// load starts immediately.
    pub fn configured(source: Arc<dyn CatalogSource>, consumer: C) -> Self {
        let mut browser = Self::new(source, consumer);
        browser.lifecycle = Lifecycle::Ready;
        browser.reload_catalog();
        browser
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Applies the outcome of the cache configuration step. The first success
    /// moves the browser to [`Lifecycle::Ready`] and loads the catalog; a
    /// failure leaves it waiting for another attempt.
    pub fn cache_configured(&mut self, result: Result<usize, PaddockError>) {
        match (self.lifecycle, result) {
            (Lifecycle::AwaitingCacheConfiguration, Ok(added)) => {
                info!("Cache configured, {} sessions added", added);
                self.lifecycle = Lifecycle::Ready;
                self.notice = Some(Notice::CacheConfigured { added });
                self.reload_catalog();
            }
            (Lifecycle::AwaitingCacheConfiguration, Err(e)) => {
                error!("Cache configuration failed: {}", e.detail());
                self.notice = Some(Notice::CacheConfigurationFailed { detail: e.detail() });
            }
            (Lifecycle::Ready, _) => {
                debug!("Ignoring cache configuration result, browser is already configured");
            }
        }
    }

    /// Starts a fresh catalog load. The selection is cleared now, not when the
    /// load completes, and any load still in flight is superseded.
    pub fn reload_catalog(&mut self) {
        if self.lifecycle != Lifecycle::Ready {
            warn!("Catalog requested before the cache was configured");
            return;
        }
        self.selector.reset();
        self.catalog = CatalogState::Loading;
        let source = Arc::clone(&self.source);
        info!("Loading sessions from {}", source.describe());
        self.loader
            .start(move || source.fetch_sessions().map(SessionCatalog::new));
    }

    /// Picks up a finished catalog load. Returns true when the catalog state
    /// changed.
    pub fn poll(&mut self) -> bool {
        match self.loader.poll() {
            Some(result) => {
                self.apply_catalog(result);
                true
            }
            None => false,
        }
    }

    /// Blocks until the pending catalog load completes or `timeout` elapses.
    pub fn wait_for_catalog(&mut self, timeout: Duration) -> Result<&SessionCatalog, PaddockError> {
        if self.loader.is_pending() {
            match self.loader.wait(timeout) {
                Some(result) => self.apply_catalog(result),
                None => {
                    return Err(PaddockError::CatalogTimeout {
                        seconds: timeout.as_secs(),
                    });
                }
            }
        }
        match &self.catalog {
            CatalogState::Ready(catalog) => Ok(catalog),
            CatalogState::Failed { reason } => Err(PaddockError::CatalogLoadFailed {
                reason: reason.clone(),
            }),
            CatalogState::Loading => Err(PaddockError::CatalogTimeout {
                seconds: timeout.as_secs(),
            }),
        }
    }

    fn apply_catalog(&mut self, result: Result<SessionCatalog, PaddockError>) {
        match result {
            Ok(catalog) => {
                info!("Session catalog ready with {} sessions", catalog.len());
                self.catalog = CatalogState::Ready(catalog);
            }
            Err(e) => {
                let reason = e.detail();
                error!("Session catalog failed to load: {}", reason);
                self.catalog = CatalogState::Failed {
                    reason: reason.clone(),
                };
                self.notice = Some(Notice::CatalogLoadFailed { reason });
            }
        }
    }

    pub fn catalog_state(&self) -> &CatalogState {
        &self.catalog
    }

    pub fn is_loading(&self) -> bool {
        self.lifecycle == Lifecycle::Ready && self.catalog == CatalogState::Loading
    }

    pub fn selection(&self) -> &CascadeState {
        self.selector.state()
    }

    /// Selection widgets are only live once a catalog is on screen.
    pub fn selection_enabled(&self) -> bool {
        self.lifecycle == Lifecycle::Ready && self.catalog.catalog().is_some()
    }

    pub fn can_commit(&self) -> bool {
        self.selection_enabled() && self.selection().is_complete()
    }

    pub fn year_options(&self) -> Vec<&str> {
        self.catalog
            .catalog()
            .map(|c| self.selector.year_options(c))
            .unwrap_or_default()
    }

    pub fn event_options(&self) -> Vec<&str> {
        self.catalog
            .catalog()
            .map(|c| self.selector.event_options(c))
            .unwrap_or_default()
    }

    pub fn session_options(&self) -> Vec<&SessionRecord> {
        self.catalog
            .catalog()
            .map(|c| self.selector.session_options(c))
            .unwrap_or_default()
    }

    pub fn select_year(&mut self, year: &str) {
        if self.selection_enabled() {
            self.selector.select_year(year);
        }
    }

    pub fn select_event(&mut self, event: &str) {
        if self.selection_enabled() {
            self.selector.select_event(event);
        }
    }

    pub fn select_session(&mut self, session_id: &str) {
        if self.selection_enabled() {
            self.selector.select_session(session_id);
        }
    }

    /// Applies the current selection, notifying the consumer on success. A
    /// stale selection is reported and the cascade starts over from the top.
    pub fn commit(&mut self) -> Result<SessionRecord, CommitError> {
        let empty = SessionCatalog::default();
        let catalog = self.catalog.catalog().unwrap_or(&empty);
        match self.committer.commit(catalog, self.selector.state()) {
            Ok(record) => {
                self.notice = None;
                Ok(record)
            }
            Err(CommitError::StaleSelection { session_id }) => {
                warn!("Selected session {} is stale, resetting selection", session_id);
                self.selector.reset();
                self.notice = Some(Notice::StaleSelection {
                    session_id: session_id.clone(),
                });
                Err(CommitError::StaleSelection { session_id })
            }
            Err(e) => Err(e),
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn consumer(&self) -> &C {
        self.committer.consumer()
    }
}
