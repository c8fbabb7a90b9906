// Integration tests for the session browser on top of a local FastF1 cache
//
// This test suite validates the complete workflow:
// 1. Index a cache directory holding nested and flat pickles
// 2. Load the catalog from the index file in the background
// 3. Narrow year, event and session through the cascade
// 4. Apply the selection and receive it on the consumer side
// 5. Reload after new sessions land in the cache

use std::{
    fs::{self, File},
    path::Path,
    sync::{Arc, mpsc},
    time::Duration,
};

use paddock::{
    CacheConfigurator, CatalogState, Lifecycle, SessionBrowser, SessionRecord,
    cache_config::{LocalCacheConfigurator, index::INDEX_FILE_NAME},
    catalog::IndexFileCatalogSource,
};
use tempfile::TempDir;

const WAIT: Duration = Duration::from_secs(5);

fn add_nested_session(cache: &Path, year: &str, event: &str, session_dir: &str) {
    let dir = cache.join(year).join(event).join(session_dir);
    fs::create_dir_all(&dir).unwrap();
    File::create(dir.join("timing_app_data.ff1pkl")).unwrap();
}

fn create_cache() -> TempDir {
    let cache = TempDir::new().unwrap();
    add_nested_session(cache.path(), "2023", "Test_GP", "2023-07-01_Practice_1");
    add_nested_session(cache.path(), "2023", "Test_GP", "2023-07-02_Qualifying");
    add_nested_session(cache.path(), "2024", "Monaco_Grand_Prix", "2024-05-24_Practice_1");
    add_nested_session(cache.path(), "2024", "Monaco_Grand_Prix", "2024-05-26_Race");
    File::create(
        cache
            .path()
            .join("2024_2024-03-02_Bahrain_Grand_Prix_R.ff1pkl"),
    )
    .unwrap();
    cache
}

fn local_browser(
    cache: &Path,
) -> (
    SessionBrowser<mpsc::Sender<SessionRecord>>,
    mpsc::Receiver<SessionRecord>,
) {
    let (tx, rx) = mpsc::channel();
    let source = Arc::new(IndexFileCatalogSource::new(cache.join(INDEX_FILE_NAME)));
    (SessionBrowser::new(source, tx), rx)
}

#[test]
fn test_browse_local_cache_end_to_end() {
    let cache = create_cache();
    let (mut browser, committed_rx) = local_browser(cache.path());
    assert_eq!(browser.lifecycle(), Lifecycle::AwaitingCacheConfiguration);
    assert!(!browser.selection_enabled());

    let added = LocalCacheConfigurator.configure(cache.path());
    assert_eq!(added.as_ref().ok(), Some(&5));
    browser.cache_configured(added);
    assert_eq!(browser.lifecycle(), Lifecycle::Ready);

    let catalog = browser.wait_for_catalog(WAIT).unwrap();
    assert_eq!(catalog.len(), 5);

    assert_eq!(browser.year_options(), vec!["2024", "2023"]);
    browser.select_year("2024");
    assert_eq!(
        browser.event_options(),
        vec!["Bahrain Grand Prix", "Monaco Grand Prix"]
    );
    browser.select_event("Monaco Grand Prix");
    let sessions = browser
        .session_options()
        .into_iter()
        .map(|r| (r.session_id.clone(), r.session_type.clone()))
        .collect::<Vec<_>>();
    assert_eq!(
        sessions,
        vec![
            (
                "2024_Monaco_Grand_Prix_FP1".to_string(),
                "Practice 1".to_string()
            ),
            ("2024_Monaco_Grand_Prix_R".to_string(), "Race".to_string()),
        ]
    );

    assert!(!browser.can_commit());
    browser.select_session("2024_Monaco_Grand_Prix_R");
    assert!(browser.can_commit());
    let record = browser.commit().unwrap();
    assert_eq!(record.event_name, "Monaco Grand Prix");

    let delivered = committed_rx.try_recv().unwrap();
    assert_eq!(delivered, record);
    assert!(committed_rx.try_recv().is_err());
}

#[test]
fn test_reload_picks_up_new_sessions_and_resets_selection() {
    let cache = create_cache();
    LocalCacheConfigurator.configure(cache.path()).unwrap();

    let (tx, _rx) = mpsc::channel();
    let source = Arc::new(IndexFileCatalogSource::new(
        cache.path().join(INDEX_FILE_NAME),
    ));
    let mut browser = SessionBrowser::configured(source, tx);
    browser.wait_for_catalog(WAIT).unwrap();
    browser.select_year("2023");
    browser.select_event("Test GP");
    assert!(!browser.selection().is_empty());

    add_nested_session(cache.path(), "2025", "Australian_Grand_Prix", "2025-03-16_Race");
    assert_eq!(LocalCacheConfigurator.configure(cache.path()).unwrap(), 1);

    browser.reload_catalog();
    assert!(browser.selection().is_empty());
    assert!(matches!(browser.catalog_state(), CatalogState::Loading));
    assert!(!browser.selection_enabled());

    let catalog = browser.wait_for_catalog(WAIT).unwrap();
    assert_eq!(catalog.len(), 6);
    assert_eq!(browser.year_options(), vec!["2025", "2024", "2023"]);
}

#[test]
fn test_missing_index_leaves_selection_disabled() {
    let cache = TempDir::new().unwrap();
    let (tx, _rx) = mpsc::channel();
    let source = Arc::new(IndexFileCatalogSource::new(
        cache.path().join(INDEX_FILE_NAME),
    ));
    let mut browser = SessionBrowser::configured(source, tx);

    assert!(browser.wait_for_catalog(WAIT).is_err());
    assert!(matches!(
        browser.catalog_state(),
        CatalogState::Failed { .. }
    ));
    assert!(!browser.selection_enabled());
    assert!(browser.year_options().is_empty());
    assert!(browser.notice().is_some_and(|n| n.is_error()));
}

#[test]
fn test_empty_cache_keeps_awaiting_configuration() {
    let cache = TempDir::new().unwrap();
    let (mut browser, _rx) = local_browser(cache.path());

    browser.cache_configured(LocalCacheConfigurator.configure(cache.path()));

    assert_eq!(browser.lifecycle(), Lifecycle::AwaitingCacheConfiguration);
    assert!(browser.notice().is_some_and(|n| n.is_error()));
    assert!(!browser.is_loading());
}
