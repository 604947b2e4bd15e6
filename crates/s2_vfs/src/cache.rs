use crate::archive::{Archive, ArchiveOpener, VpkOpener};
use crate::error::{Error, Result};
use crate::paths::normalize_path;
use camino::Utf8Path;
use s2_vpk::{EntryData, PackageEntry};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Process-wide map from normalized archive path to the opened archive.
///
/// One cache is shared (via `Arc`) by every loader in a session, so each physical
/// package is opened at most once. The check, the open and the insert happen under a
/// single lock; two threads asking for the same path never both open it.
pub struct ArchiveCache {
    opener: Box<dyn ArchiveOpener>,
    archives: Mutex<HashMap<String, Arc<dyn Archive>>>,
}

impl std::fmt::Debug for ArchiveCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveCache")
            .field("archives", &self.len())
            .finish()
    }
}

impl Default for ArchiveCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveCache {
    /// A cache that opens VPK files from disk.
    pub fn new() -> Self {
        Self::with_opener(VpkOpener)
    }

    pub fn with_opener(opener: impl ArchiveOpener + 'static) -> Self {
        Self {
            opener: Box::new(opener),
            archives: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<dyn Archive>>> {
        // A panic while holding the lock leaves the map itself intact.
        self.archives
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The key an archive at `path` is stored under.
    pub fn cache_key(path: &Utf8Path) -> String {
        normalize_path(path).into_string()
    }

    /// Return the cached archive for `path`, opening and caching it on first use.
    ///
    /// Failures are not cached; a later call tries again.
    pub fn get_or_open(&self, path: &Utf8Path) -> Result<Arc<dyn Archive>> {
        let key = Self::cache_key(path);
        let mut archives = self.lock();

        if let Some(archive) = archives.get(&key) {
            return Ok(Arc::clone(archive));
        }

        let archive = self.opener.open(Utf8Path::new(&key))?;
        tracing::info!("Preloaded archive {}", key);
        archives.insert(key, Arc::clone(&archive));
        Ok(archive)
    }

    /// Open a package stored as an entry of `outer`, cached under `"{outer}!{entry}"`.
    pub fn get_or_open_nested(
        &self,
        outer: &dyn Archive,
        entry: &PackageEntry,
    ) -> Result<Arc<dyn Archive>> {
        let key = format!("{}!{}", outer.path(), entry.full_path());
        let mut archives = self.lock();

        if let Some(archive) = archives.get(&key) {
            return Ok(Arc::clone(archive));
        }

        let bytes = outer.read_entry(entry)?.into_vec();
        let archive = self.opener.open_bytes(&key, bytes)?;
        tracing::info!("Preloaded nested archive {}", key);
        archives.insert(key, Arc::clone(&archive));
        Ok(archive)
    }

    /// Already-opened archive for `path`, without opening anything.
    pub fn get(&self, path: &Utf8Path) -> Option<Arc<dyn Archive>> {
        self.lock().get(&Self::cache_key(path)).cloned()
    }

    pub fn contains(&self, path: &Utf8Path) -> bool {
        self.lock().contains_key(&Self::cache_key(path))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys of every cached archive, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Read an entry of a cached archive.
    pub fn read_entry(&self, archive: &dyn Archive, entry: &PackageEntry) -> Result<EntryData> {
        archive.read_entry(entry).map_err(|err| match err {
            Error::Vpk(source) => Error::ArchiveOpen {
                path: archive.path().into(),
                source,
            },
            other => other,
        })
    }

    /// Drop every cached archive. Returns how many were released.
    ///
    /// Archives still referenced by a live loader stay open until that loader is
    /// dropped.
    pub fn dispose(&self) -> usize {
        let released = self.lock().drain().count();
        tracing::debug!("Released {} cached archives", released);
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use s2_vpk::PackageBuilder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingOpener {
        opens: Arc<AtomicUsize>,
    }

    impl ArchiveOpener for CountingOpener {
        fn open(&self, path: &Utf8Path) -> Result<Arc<dyn Archive>> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            VpkOpener.open(path)
        }

        fn open_bytes(&self, key: &str, bytes: Vec<u8>) -> Result<Arc<dyn Archive>> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            VpkOpener.open_bytes(key, bytes)
        }
    }

    fn write_package(dir: &Utf8Path, name: &str) -> Utf8PathBuf {
        let mut builder = PackageBuilder::new();
        builder.add_file("scripts/a.txt", b"a".to_vec());
        let path = dir.join(name);
        std::fs::write(&path, builder.to_bytes().unwrap()).unwrap();
        path
    }

    #[test]
    fn test_get_or_open_caches_by_normalized_path() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        std::fs::create_dir(root.join("sub")).unwrap();
        let path = write_package(root, "pak01_dir.vpk");

        let opens = Arc::new(AtomicUsize::new(0));
        let cache = ArchiveCache::with_opener(CountingOpener {
            opens: opens.clone(),
        });

        let first = cache.get_or_open(&path).unwrap();
        let second = cache
            .get_or_open(&root.join("sub/../pak01_dir.vpk"))
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(opens.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&path));
    }

    #[test]
    fn test_failed_open_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let path = root.join("pak01_dir.vpk");

        let cache = ArchiveCache::new();
        assert!(cache.get_or_open(&path).is_err());
        assert!(cache.is_empty());

        write_package(root, "pak01_dir.vpk");
        assert!(cache.get_or_open(&path).is_ok());
    }

    #[test]
    fn test_nested_archive_key() {
        let mut inner = PackageBuilder::new();
        inner.add_file("models/m.vmdl_c", b"model".to_vec());
        let mut outer = PackageBuilder::new();
        outer.add_file("addons/inner_dir.vpk", inner.to_bytes().unwrap());

        let cache = ArchiveCache::new();
        let outer = VpkOpener
            .open_bytes("outer.vpk", outer.to_bytes().unwrap())
            .unwrap();
        let entry = outer.find_entry("addons/inner_dir.vpk").unwrap();

        let nested = cache.get_or_open_nested(outer.as_ref(), &entry).unwrap();
        assert_eq!(nested.path(), "outer.vpk!addons/inner_dir.vpk");
        let again = cache.get_or_open_nested(outer.as_ref(), &entry).unwrap();
        assert!(Arc::ptr_eq(&nested, &again));

        let model = nested.find_entry("models/m.vmdl_c").unwrap();
        assert_eq!(&cache.read_entry(nested.as_ref(), &model).unwrap()[..], b"model");
    }

    #[test]
    fn test_dispose_releases_everything() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let a = write_package(root, "a.vpk");
        let b = write_package(root, "b.vpk");

        let cache = ArchiveCache::new();
        cache.get_or_open(&a).unwrap();
        cache.get_or_open(&b).unwrap();
        assert_eq!(cache.keys().len(), 2);

        assert_eq!(cache.dispose(), 2);
        assert!(cache.is_empty());
        assert!(cache.get(&a).is_none());
    }
}
