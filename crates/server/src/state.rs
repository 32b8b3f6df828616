use std::sync::Arc;
use mangawatch_core::{CatalogSource, CatalogStore, Config, ImportManager, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    catalog: Arc<dyn CatalogStore>,
    source: Arc<dyn CatalogSource>,
    import_manager: Arc<ImportManager>,
}

impl AppState {
    pub fn new(
        config: Config,
        catalog: Arc<dyn CatalogStore>,
        source: Arc<dyn CatalogSource>,
        import_manager: Arc<ImportManager>,
    ) -> Self {
        Self {
            config,
            catalog,
            source,
            import_manager,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn catalog(&self) -> &dyn CatalogStore {
        self.catalog.as_ref()
    }

    pub fn source(&self) -> &dyn CatalogSource {
        self.source.as_ref()
    }

    pub fn import_manager(&self) -> &ImportManager {
        self.import_manager.as_ref()
    }
}
