//! Application state management.

use std::sync::Arc;
use tracing::info;
use wordbadge_core::{Config, DirectoryLoader, SettingsFile, StoreLayout, StoreManager};

/// Shared application state.
pub struct App {
    /// Configuration
    pub config: Config,

    /// User settings (edition selection)
    pub settings: Arc<SettingsFile>,

    /// The membership store and its lifecycle
    pub manager: Arc<StoreManager>,
}

impl App {
    /// Create a new application instance.
    ///
    /// Nothing is opened or built until the caller initializes the manager.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let options = config.store_options()?;
        let resource_dir = config.resource_dir()?;
        let settings = Arc::new(SettingsFile::new(config.settings_path()?));

        info!(
            data_dir = %options.data_dir.display(),
            resources = %resource_dir.display(),
            settings = %settings.path().display(),
            "Application initialized"
        );

        let manager = Arc::new(StoreManager::new(
            options,
            Arc::new(DirectoryLoader::new(resource_dir)),
            settings.clone(),
        ));

        Ok(App {
            config,
            settings,
            manager,
        })
    }

    /// On-disk layout of the store.
    pub fn layout(&self) -> StoreLayout {
        StoreLayout::new(&self.manager.options().data_dir)
    }
}
