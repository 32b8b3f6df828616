pub mod catalog;
pub mod config;
pub mod import;
pub mod source;
pub mod testing;

pub use catalog::{
    CatalogError, CatalogListQuery, CatalogRecord, CatalogStats, CatalogStore, SqliteCatalog,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use import::{
    ImportConfig, ImportCursor, ImportError, ImportManager, ImportResult, ImportStatus,
};
pub use source::{CatalogSource, MangadexClient, MangadexConfig, PassFilter, SourceError};
