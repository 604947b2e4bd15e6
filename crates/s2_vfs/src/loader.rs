use crate::archive::{is_volume_file_name, Archive};
use crate::cache::ArchiveCache;
use crate::discovery::{DiscoveryRequest, GameDiscovery, ModContext, SearchPathDiscovery};
use crate::error::Result;
use crate::location::{LoadedFile, Resolved, ResourceParser, SearchRoot};
use crate::paths::{normalize_logical_path, resolve_in_folders};
use crate::shader::{base_shader_name, resolve_shader, Platform, ShaderCollection};
use camino::{Utf8Path, Utf8PathBuf};
use s2_vpk::EntryData;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

enum ScanState<T> {
    NotScanned,
    Scanned(Arc<T>),
}

/// A value computed on first use and then shared. The scan runs under the lock, so
/// concurrent first callers wait for a single scan instead of racing.
struct OneShot<T> {
    state: Mutex<ScanState<T>>,
}

impl<T> OneShot<T> {
    fn new() -> Self {
        Self {
            state: Mutex::new(ScanState::NotScanned),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ScanState<T>> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn get_or_scan(&self, scan: impl FnOnce() -> T) -> Arc<T> {
        let mut state = self.lock();
        match &*state {
            ScanState::Scanned(value) => Arc::clone(value),
            ScanState::NotScanned => {
                let value = Arc::new(scan());
                *state = ScanState::Scanned(Arc::clone(&value));
                value
            }
        }
    }

    fn get(&self) -> Option<Arc<T>> {
        match &*self.lock() {
            ScanState::Scanned(value) => Some(Arc::clone(value)),
            ScanState::NotScanned => None,
        }
    }

    fn take(&self) -> Option<Arc<T>> {
        match std::mem::replace(&mut *self.lock(), ScanState::NotScanned) {
            ScanState::Scanned(value) => Some(value),
            ScanState::NotScanned => None,
        }
    }
}

/// Resolves logical paths for one opened file.
///
/// Lookup order for [`resolve`](Self::resolve):
///
/// 1. the archive the current file was opened from;
/// 2. explicit archive roots, discovered `pakNN_dir.vpk` packages and any shader
///    packages found by an earlier [`load_shader`](Self::load_shader);
/// 3. packages nested inside the current archive;
/// 4. loose folders (explicit, then discovered), preferring folders that contain the
///    current file.
///
/// Discovery runs once, on the first lookup. Archives are shared with every other
/// loader through the [`ArchiveCache`].
pub struct GameFileLoader {
    cache: Arc<ArchiveCache>,
    current_file: Option<Utf8PathBuf>,
    current_archive: Option<Arc<dyn Archive>>,
    current_archive_path: Option<Utf8PathBuf>,
    search_roots: Vec<SearchRoot>,
    discovery: Box<dyn SearchPathDiscovery>,
    mod_context: OneShot<ModContext>,
    nested_archives: OneShot<Vec<Arc<dyn Archive>>>,
    shader_packages: OneShot<Vec<Arc<dyn Archive>>>,
    shaders: Mutex<HashMap<String, Arc<ShaderCollection>>>,
}

impl fmt::Debug for GameFileLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameFileLoader")
            .field("current_file", &self.current_file)
            .field("current_archive", &self.current_archive_path)
            .field("search_roots", &self.search_roots)
            .finish_non_exhaustive()
    }
}

impl GameFileLoader {
    pub fn new(cache: Arc<ArchiveCache>) -> Self {
        Self {
            cache,
            current_file: None,
            current_archive: None,
            current_archive_path: None,
            search_roots: Vec::new(),
            discovery: Box::new(GameDiscovery::default()),
            mod_context: OneShot::new(),
            nested_archives: OneShot::new(),
            shader_packages: OneShot::new(),
            shaders: Mutex::new(HashMap::new()),
        }
    }

    /// The file being viewed. Drives discovery and path affinity.
    pub fn with_current_file(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.current_file = Some(path.into());
        self
    }

    /// The package the current file was opened from. Searched first.
    ///
    /// Unlike other archives, failing to open this one is an error.
    pub fn with_current_archive(mut self, path: impl Into<Utf8PathBuf>) -> Result<Self> {
        let path = path.into();
        let archive = self.cache.get_or_open(&path)?;
        if self.current_file.is_none() {
            self.current_file = Some(path.clone());
        }
        self.current_archive = Some(archive);
        self.current_archive_path = Some(path);
        Ok(self)
    }

    /// Extra roots, searched before anything discovery finds.
    pub fn with_search_roots(mut self, roots: impl IntoIterator<Item = SearchRoot>) -> Self {
        self.search_roots.extend(roots);
        self
    }

    pub fn with_discovery(mut self, discovery: impl SearchPathDiscovery + 'static) -> Self {
        self.discovery = Box::new(discovery);
        self
    }

    pub fn cache(&self) -> &Arc<ArchiveCache> {
        &self.cache
    }

    pub fn current_file(&self) -> Option<&Utf8Path> {
        self.current_file.as_deref()
    }

    /// The discovered context, running discovery if it has not run yet.
    pub fn mod_context(&self) -> Arc<ModContext> {
        self.mod_context.get_or_scan(|| self.discover())
    }

    fn discover(&self) -> ModContext {
        let Some(current_file) = self.current_file.as_deref() else {
            tracing::debug!("No current file; skipping game discovery");
            return ModContext::new();
        };

        let request = DiscoveryRequest {
            current_file,
            current_archive: self.current_archive_path.as_deref(),
            explicit_roots: &self.search_roots,
            cache: &self.cache,
        };
        let context = self.discovery.discover(&request);
        tracing::info!(
            "Discovered {} folders and {} archives for {}",
            context.folders().len(),
            context.archives().len(),
            current_file
        );
        context
    }

    fn nested_archives(&self) -> Arc<Vec<Arc<dyn Archive>>> {
        self.nested_archives.get_or_scan(|| {
            let Some(outer) = self.current_archive.as_deref() else {
                return Vec::new();
            };

            outer
                .entries_with_extension("vpk")
                .into_iter()
                .filter(|entry| !is_volume_file_name(&format!("{}.vpk", entry.file_name)))
                .filter_map(|entry| match self.cache.get_or_open_nested(outer, &entry) {
                    Ok(archive) => Some(archive),
                    Err(e) => {
                        tracing::warn!("Failed to open nested archive {}: {}", entry.full_path(), e);
                        None
                    }
                })
                .collect()
        })
    }

    fn shader_packages(&self) -> Arc<Vec<Arc<dyn Archive>>> {
        self.shader_packages.get_or_scan(|| {
            let context = self.mod_context();
            let mut packages = Vec::new();

            for folder in context.folders() {
                for platform in Platform::ALL {
                    let path = folder.join(format!("shaders_{}_dir.vpk", platform.name()));
                    if !path.is_file() {
                        continue;
                    }
                    match self.cache.get_or_open(&path) {
                        Ok(archive) => packages.push(archive),
                        Err(e) => tracing::warn!("Failed to preload {}: {}", path, e),
                    }
                }
            }

            tracing::debug!("Found {} shader packages", packages.len());
            packages
        })
    }

    /// Find where `path` lives. Never fails; absence is [`Resolved::NotFound`].
    pub fn resolve(&self, path: &str) -> Resolved {
        let resolved = self.locate(path);
        if !resolved.is_found() {
            tracing::warn!("Failed to resolve {}", path);
        }
        resolved
    }

    fn locate(&self, path: &str) -> Resolved {
        let logical = normalize_logical_path(path);

        if let Some(archive) = &self.current_archive {
            if let Some(entry) = archive.find_entry(&logical) {
                return Resolved::InArchive {
                    archive: Arc::clone(archive),
                    entry,
                };
            }
        }

        let context = self.mod_context();
        let shader_packages = self.shader_packages.get();

        let roots = self
            .search_roots
            .iter()
            .cloned()
            .chain(context.roots())
            .chain(
                shader_packages
                    .iter()
                    .flat_map(|packages| packages.iter().cloned())
                    .map(SearchRoot::ArchiveHandle),
            );

        let mut folders = Vec::new();
        for root in roots {
            let archive = match root {
                SearchRoot::LooseFolder(folder) => {
                    folders.push(folder);
                    continue;
                }
                SearchRoot::ArchiveHandle(archive) => archive,
                SearchRoot::ArchivePath(archive_path) => {
                    match self.cache.get_or_open(&archive_path) {
                        Ok(archive) => archive,
                        Err(e) => {
                            tracing::warn!("Skipping search root {}: {}", archive_path, e);
                            continue;
                        }
                    }
                }
            };

            if let Some(entry) = archive.find_entry(&logical) {
                return Resolved::InArchive { archive, entry };
            }
        }

        for archive in self.nested_archives().iter() {
            if let Some(entry) = archive.find_entry(&logical) {
                return Resolved::InArchive {
                    archive: Arc::clone(archive),
                    entry,
                };
            }
        }

        match resolve_in_folders(&folders, &logical, self.current_file()) {
            Some(found) => Resolved::OnDisk(found),
            None => Resolved::NotFound,
        }
    }

    /// Resolve `path` and read its bytes. `Ok(None)` when the file does not exist.
    pub fn load_file(&self, path: &str) -> Result<Option<LoadedFile>> {
        self.read(self.resolve(path))
    }

    fn read(&self, resolved: Resolved) -> Result<Option<LoadedFile>> {
        let data = match &resolved {
            Resolved::NotFound => return Ok(None),
            Resolved::OnDisk(file) => EntryData::Owned(std::fs::read(file)?),
            Resolved::InArchive { archive, entry } => {
                self.cache.read_entry(archive.as_ref(), entry)?
            }
        };
        Ok(Some(LoadedFile { resolved, data }))
    }

    /// Resolve, read and parse. `Ok(None)` when the file does not exist.
    pub fn load_resource<P: ResourceParser>(
        &self,
        path: &str,
        parser: &P,
    ) -> Result<Option<P::Output>> {
        let Some(file) = self.load_file(path)? else {
            return Ok(None);
        };
        parser.parse(&file.file_name(), &file.data).map(Some)
    }

    /// All stages of the best available variant of `shader_name`.
    ///
    /// Results are cached per loader, including empty results for shaders that could
    /// not be found.
    pub fn load_shader(&self, shader_name: &str) -> Arc<ShaderCollection> {
        let key = base_shader_name(shader_name);
        let mut shaders = self
            .shaders
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(collection) = shaders.get(&key) {
            return Arc::clone(collection);
        }

        self.shader_packages();
        // Most probed variants don't exist, so probe without the not-found warning.
        let collection = Arc::new(resolve_shader(shader_name, |path| {
            match self.read(self.locate(path)) {
                Ok(Some(file)) => Some((file.file_name(), file.data.into_vec())),
                Ok(None) => None,
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", path, e);
                    None
                }
            }
        }));

        shaders.insert(key, Arc::clone(&collection));
        collection
    }

    /// Every root this loader currently searches, in lookup order.
    ///
    /// Runs discovery if it has not run yet.
    pub fn search_roots_snapshot(&self) -> Vec<SearchRoot> {
        let mut roots = Vec::new();
        if let Some(archive) = &self.current_archive {
            roots.push(SearchRoot::ArchiveHandle(Arc::clone(archive)));
        }

        let context = self.mod_context();
        let (folders, archives): (Vec<_>, Vec<_>) = self
            .search_roots
            .iter()
            .cloned()
            .chain(context.roots())
            .partition(|root| matches!(root, SearchRoot::LooseFolder(_)));

        roots.extend(archives);
        if let Some(packages) = self.shader_packages.get() {
            roots.extend(packages.iter().cloned().map(SearchRoot::ArchiveHandle));
        }
        roots.extend(
            self.nested_archives()
                .iter()
                .cloned()
                .map(SearchRoot::ArchiveHandle),
        );
        roots.extend(folders);
        roots
    }

    /// Release this loader's archive references and cached shaders.
    ///
    /// The shared [`ArchiveCache`] is untouched; call [`ArchiveCache::dispose`] on it
    /// when the whole session ends.
    pub fn dispose(self) {
        let context = self.mod_context.take();
        let nested = self.nested_archives.take();
        let shaders = self.shader_packages.take();
        tracing::debug!(
            "Disposing loader for {:?} ({} discovered, {} nested, {} shader archives)",
            self.current_file,
            context.map_or(0, |c| c.archives().len()),
            nested.map_or(0, |n| n.len()),
            shaders.map_or(0, |s| s.len())
        );
    }
}
