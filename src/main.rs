mod ui;

use std::{
    path::{Path, PathBuf},
    sync::{Arc, mpsc},
    time::Duration,
};

use clap::{Parser, Subcommand, arg};
use egui::Vec2;
use log::{error, info, warn};

use paddock::{
    AppConfig, CacheConfigurator, CatalogSource, PaddockError, SelectionConsumer, SessionBrowser,
    SessionRecord,
    api::ApiClient,
    cache_config::{
        HttpCacheConfigurator, LocalCacheConfigurator,
        index::{INDEX_FILE_NAME, SessionIndexBuilder},
    },
    catalog::{HttpCatalogSource, IndexFileCatalogSource},
    telemetry::TelemetryClient,
};
use ui::BrowserApp;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Opens the session browser window
    Browse {
        #[arg(short, long)]
        api_url: Option<String>,

        /// Pre-fills the cache directory, or indexes it directly with --offline
        #[arg(short, long)]
        cache_dir: Option<PathBuf>,

        /// Browses the local session index without the API
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Skips cache configuration when the API already serves a cache
        #[arg(long, default_value_t = false)]
        configured: bool,
    },
    /// Indexes the sessions of a FastF1 cache directory
    Index {
        #[arg(short, long)]
        cache_dir: PathBuf,

        #[arg(short, long)]
        index: Option<PathBuf>,
    },
    /// Prints the options of the selection cascade and applies complete selections
    Sessions {
        #[arg(short, long)]
        api_url: Option<String>,

        /// Reads sessions from an index file instead of the API
        #[arg(short, long)]
        index: Option<PathBuf>,

        #[arg(short, long)]
        year: Option<String>,

        #[arg(short, long)]
        event: Option<String>,

        #[arg(short, long)]
        session: Option<String>,
    },
}

/// Prints every applied session to stdout as JSON
struct StdoutConsumer;

impl SelectionConsumer for StdoutConsumer {
    fn session_committed(&mut self, record: &SessionRecord) {
        match serde_json::to_string_pretty(record) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Could not serialize session {}: {}", record.session_id, e),
        }
    }
}

fn api_client(api_url: Option<&str>, app_config: &AppConfig) -> ApiClient {
    ApiClient::new(api_url.unwrap_or(&app_config.api_url))
        .with_timeout(Duration::from_secs(app_config.request_timeout_s))
}

fn browse(
    api_url: Option<&str>,
    cache_dir: Option<&Path>,
    offline: bool,
    configured: bool,
) -> Result<(), PaddockError> {
    let mut app_config = AppConfig::from_local_file().unwrap_or_default();
    if let Some(url) = api_url {
        app_config.api_url = url.to_string();
    }
    if let Some(dir) = cache_dir {
        app_config.last_cache_dir = Some(dir.to_path_buf());
    }

    let (committed_tx, committed_rx) = mpsc::channel::<SessionRecord>();
    let client = api_client(api_url, &app_config);

    let (browser, configurator, telemetry_client): (_, Arc<dyn CacheConfigurator>, _) =
        if offline {
            let cache_dir = app_config.last_cache_dir.clone().ok_or_else(|| {
                PaddockError::InvalidCacheDirectory {
                    path: "<none>, pass --cache-dir".to_string(),
                }
            })?;
            let added = LocalCacheConfigurator.configure(&cache_dir)?;
            info!("Indexed {} new sessions in {:?}", added, cache_dir);
            let source: Arc<dyn CatalogSource> =
                Arc::new(IndexFileCatalogSource::new(cache_dir.join(INDEX_FILE_NAME)));
            (
                SessionBrowser::configured(source, committed_tx),
                Arc::new(LocalCacheConfigurator) as Arc<dyn CacheConfigurator>,
                None,
            )
        } else {
            let source: Arc<dyn CatalogSource> = Arc::new(HttpCatalogSource::new(client.clone()));
            let browser = if configured {
                SessionBrowser::configured(source, committed_tx)
            } else {
                SessionBrowser::new(source, committed_tx)
            };
            (
                browser,
                Arc::new(HttpCacheConfigurator::new(client.clone())) as Arc<dyn CacheConfigurator>,
                Some(TelemetryClient::new(client)),
            )
        };

    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = native_options
        .viewport
        .with_inner_size(Vec2::new(960., 640.));

    eframe::run_native(
        "Paddock",
        native_options,
        Box::new(|cc| {
            Ok(Box::new(BrowserApp::new(
                browser,
                committed_rx,
                configurator,
                telemetry_client,
                app_config,
                cc,
            )))
        }),
    )
    .map_err(|e| PaddockError::UiError {
        reason: e.to_string(),
    })
}

fn index(cache_dir: &Path, index: Option<&Path>) -> Result<(), PaddockError> {
    let mut builder = SessionIndexBuilder::new(cache_dir);
    if let Some(index_path) = index {
        builder = builder.with_index_path(index_path.to_path_buf());
    }
    let added = builder.build()?;
    println!(
        "Added {} sessions to {}",
        added,
        builder.index_path().display()
    );
    Ok(())
}

fn print_options(title: &str, options: &[&str]) {
    println!("{}:", title);
    for option in options {
        println!("  {}", option);
    }
}

fn sessions(
    api_url: Option<&str>,
    index: Option<&Path>,
    year: Option<&str>,
    event: Option<&str>,
    session: Option<&str>,
) -> Result<(), PaddockError> {
    let app_config = AppConfig::from_local_file().unwrap_or_default();
    let source: Arc<dyn CatalogSource> = match index {
        Some(index_path) => Arc::new(IndexFileCatalogSource::new(index_path.to_path_buf())),
        None => Arc::new(HttpCatalogSource::new(api_client(api_url, &app_config))),
    };
    info!("Listing sessions from {}", source.describe());

    let mut browser = SessionBrowser::configured(source, StdoutConsumer);
    browser.wait_for_catalog(Duration::from_secs(app_config.request_timeout_s))?;

    let Some(year) = year else {
        print_options("Years", &browser.year_options());
        return Ok(());
    };
    browser.select_year(year);

    let Some(event) = event else {
        print_options("Events", &browser.event_options());
        return Ok(());
    };
    browser.select_event(event);

    let Some(session_id) = session else {
        println!("Sessions:");
        for record in browser.session_options() {
            println!("  {}  {}", record.session_id, record.session_type);
        }
        return Ok(());
    };
    browser.select_session(session_id);

    browser
        .commit()
        .map(|_| ())
        .map_err(|source| PaddockError::SelectionError { source })
}

fn main() {
    #[cfg(debug_assertions)]
    colog::init();

    let cli = Args::parse();
    if let Err(e) = ctrlc::set_handler(move || {
        println!("Exiting...");
        std::process::exit(0);
    }) {
        warn!("Could not set Ctrl-C handler: {}", e);
    }

    let result = match &cli.command {
        Commands::Browse {
            api_url,
            cache_dir,
            offline,
            configured,
        } => browse(
            api_url.as_deref(),
            cache_dir.as_deref(),
            *offline,
            *configured,
        ),
        Commands::Index { cache_dir, index: index_path } => {
            index(cache_dir, index_path.as_deref())
        }
        Commands::Sessions {
            api_url,
            index: index_path,
            year,
            event,
            session,
        } => sessions(
            api_url.as_deref(),
            index_path.as_deref(),
            year.as_deref(),
            event.as_deref(),
            session.as_deref(),
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e.detail());
        std::process::exit(1);
    }
}
