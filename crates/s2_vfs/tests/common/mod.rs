#![allow(dead_code)]

use camino::{Utf8Path, Utf8PathBuf};
use s2_vfs::{
    Archive, ArchiveOpener, DiscoveryRequest, EntryData, ModContext, PackageEntry,
    SearchPathDiscovery,
};
use std::collections::BTreeMap;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// An in-memory archive. Entries are inline, keyed by lowercase path.
#[derive(Debug)]
pub struct FakeArchive {
    path: String,
    files: BTreeMap<String, Vec<u8>>,
}

impl FakeArchive {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            files: BTreeMap::new(),
        }
    }

    pub fn with_file(mut self, name: &str, data: &[u8]) -> Self {
        self.files.insert(name.to_ascii_lowercase(), data.to_vec());
        self
    }

    fn entry(name: &str, data: &[u8]) -> PackageEntry {
        let (directory, file) = name.rsplit_once('/').unwrap_or(("", name));
        let (file_name, type_name) = file.rsplit_once('.').unwrap_or((file, ""));
        PackageEntry {
            directory: directory.to_string(),
            file_name: file_name.to_string(),
            type_name: type_name.to_string(),
            crc32: 0,
            small_data: data.to_vec(),
            archive_index: s2_vpk::DIR_ARCHIVE_INDEX,
            offset: 0,
            length: 0,
        }
    }
}

impl Archive for FakeArchive {
    fn path(&self) -> &str {
        &self.path
    }

    fn find_entry(&self, name: &str) -> Option<PackageEntry> {
        let key = name.replace('\\', "/").to_ascii_lowercase();
        self.files.get(&key).map(|data| Self::entry(&key, data))
    }

    fn entries_with_extension(&self, type_name: &str) -> Vec<PackageEntry> {
        self.files
            .iter()
            .map(|(name, data)| Self::entry(name, data))
            .filter(|e| e.type_name.eq_ignore_ascii_case(type_name))
            .collect()
    }

    fn read_entry(&self, entry: &PackageEntry) -> s2_vfs::Result<EntryData> {
        Ok(EntryData::Owned(entry.small_data.clone()))
    }
}

/// Serves empty fake archives and counts every open.
#[derive(Clone, Default)]
pub struct CountingOpener {
    pub opens: Arc<AtomicUsize>,
}

impl CountingOpener {
    pub fn count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl ArchiveOpener for CountingOpener {
    fn open(&self, path: &Utf8Path) -> s2_vfs::Result<Arc<dyn Archive>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if !path.is_file() {
            return Err(s2_vfs::Error::Other(format!("{} does not exist", path)));
        }
        Ok(Arc::new(FakeArchive::new(path.as_str())))
    }

    fn open_bytes(&self, key: &str, _bytes: Vec<u8>) -> s2_vfs::Result<Arc<dyn Archive>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeArchive::new(key)))
    }
}

/// Wraps another discovery and counts how often it runs.
pub struct CountingDiscovery<D> {
    pub inner: D,
    pub runs: Arc<AtomicUsize>,
}

impl<D> CountingDiscovery<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            runs: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl<D: SearchPathDiscovery> SearchPathDiscovery for CountingDiscovery<D> {
    fn discover(&self, request: &DiscoveryRequest<'_>) -> ModContext {
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.inner.discover(request)
    }
}

/// Discovery that always returns the same folders.
pub struct FixedDiscovery(pub Vec<Utf8PathBuf>);

impl SearchPathDiscovery for FixedDiscovery {
    fn discover(&self, _request: &DiscoveryRequest<'_>) -> ModContext {
        let mut context = ModContext::new();
        for folder in &self.0 {
            context.add_folder(folder.clone());
        }
        context
    }
}

pub fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    (dir, root)
}

pub fn write_file(path: &Utf8Path, contents: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Install a test subscriber so `RUST_LOG=debug cargo test` shows resolver logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
