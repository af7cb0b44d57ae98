use std::path::PathBuf;

use color_eyre::Result;
use dirs::data_dir;
use taskdeck_storage::file_store::FileStore;
use tracing::debug;

use crate::config::Config;

/// Resolve the default data directory for taskdeck.
pub fn default_data_dir() -> Result<PathBuf> {
    let base = data_dir().ok_or_else(|| color_eyre::eyre::eyre!("no data dir available"))?;
    Ok(base.join("taskdeck"))
}

/// Build the file store, honouring the config's `data_dir` override.
pub fn store_from_config(config: &Config) -> Result<FileStore> {
    let root = match &config.data_dir {
        Some(root) => root.clone(),
        None => default_data_dir()?,
    };
    debug!(?root, "opening file store");
    Ok(FileStore::new(root))
}
