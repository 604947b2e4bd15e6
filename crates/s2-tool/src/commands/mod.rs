mod config;
mod discover;
mod extract;
mod list;
mod pack;
mod resolve;
mod shader;

pub use config::*;
pub use discover::*;
pub use extract::*;
pub use list::*;
pub use pack::*;
pub use resolve::*;
pub use shader::*;

use crate::utils::config::load_config;
use camino::Utf8PathBuf;
use miette::Result;
use s2_vfs::{ArchiveCache, GameFileLoader, SearchRoot};
use std::sync::Arc;

/// Options shared by every command that resolves files.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct LoaderArgs {
    /// The file being viewed; its game folders are discovered from here
    #[arg(short, long)]
    pub file: Option<String>,

    /// The package the file was opened from; searched first
    #[arg(short, long)]
    pub archive: Option<String>,

    /// Extra folders or .vpk files to search, in order (repeatable)
    #[arg(short, long = "root")]
    pub roots: Vec<String>,
}

impl LoaderArgs {
    pub fn has_context(&self) -> bool {
        self.file.is_some() || self.archive.is_some()
    }

    /// Command-line roots first, then the configured defaults.
    pub fn search_roots(&self, configured: &[Utf8PathBuf]) -> Vec<SearchRoot> {
        self.roots
            .iter()
            .map(Utf8PathBuf::from)
            .chain(configured.iter().cloned())
            .map(SearchRoot::from_path)
            .collect()
    }

    pub fn build_loader(&self) -> Result<GameFileLoader> {
        let config = load_config();
        let cache = Arc::new(ArchiveCache::new());

        let mut loader =
            GameFileLoader::new(cache).with_search_roots(self.search_roots(&config.search_roots));
        if let Some(file) = &self.file {
            loader = loader.with_current_file(file.as_str());
        }
        if let Some(archive) = &self.archive {
            loader = loader
                .with_current_archive(archive.as_str())
                .map_err(crate::errors::CliError::from)?;
        }
        Ok(loader)
    }

    /// Build a loader, run `f` with it, then release the loader and its cache.
    ///
    /// The cache is disposed whether or not `f` succeeds.
    pub fn with_loader<T>(&self, f: impl FnOnce(&GameFileLoader) -> Result<T>) -> Result<T> {
        let loader = self.build_loader()?;
        let cache = Arc::clone(loader.cache());

        let result = f(&loader);

        loader.dispose();
        let released = cache.dispose();
        tracing::debug!("Released {} cached packages", released);
        result
    }
}
