// Library interface for paddock
// The binary adds the egui front-end on top of these modules

pub mod api;
pub mod browser;
pub mod cache_config;
pub mod cascade;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod flight;
pub mod telemetry;

// Re-export commonly used types
pub use browser::{Lifecycle, Notice, SessionBrowser};
pub use cache_config::CacheConfigurator;
pub use cascade::{CascadeSelector, CascadeState, CommitError, SelectionConsumer};
pub use catalog::{CatalogSource, CatalogState, SessionCatalog, SessionRecord};
pub use config::AppConfig;
pub use errors::PaddockError;
