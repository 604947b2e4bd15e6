use crate::archive::Archive;
use crate::error::Result;
use crate::paths::same_path;
use camino::{Utf8Path, Utf8PathBuf};
use s2_vpk::{EntryData, PackageEntry};
use std::fmt;
use std::sync::Arc;

/// One place to look for files.
#[derive(Debug, Clone)]
pub enum SearchRoot {
    /// A directory on disk; logical paths are joined onto it.
    LooseFolder(Utf8PathBuf),
    /// A package on disk, opened through the shared cache on demand.
    ArchivePath(Utf8PathBuf),
    /// An archive that is already open.
    ArchiveHandle(Arc<dyn Archive>),
}

impl SearchRoot {
    /// Classify a user-supplied path: `*.vpk` is an archive, anything else a folder.
    pub fn from_path(path: impl Into<Utf8PathBuf>) -> Self {
        let path = path.into();
        let is_vpk = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("vpk"));
        if is_vpk {
            SearchRoot::ArchivePath(path)
        } else {
            SearchRoot::LooseFolder(path)
        }
    }

    /// `true` if this root refers to the archive at `path`.
    pub fn is_archive(&self, path: &Utf8Path) -> bool {
        match self {
            SearchRoot::ArchivePath(p) => same_path(p, path),
            SearchRoot::ArchiveHandle(archive) => same_path(Utf8Path::new(archive.path()), path),
            SearchRoot::LooseFolder(_) => false,
        }
    }

    /// `true` if this root is the loose folder `path`.
    pub fn is_folder(&self, path: &Utf8Path) -> bool {
        matches!(self, SearchRoot::LooseFolder(p) if same_path(p, path))
    }
}

impl fmt::Display for SearchRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchRoot::LooseFolder(path) => write!(f, "folder {}", path),
            SearchRoot::ArchivePath(path) => write!(f, "archive {}", path),
            SearchRoot::ArchiveHandle(archive) => write!(f, "archive {}", archive.path()),
        }
    }
}

/// Where a logical path was found.
#[derive(Debug, Clone)]
pub enum Resolved {
    OnDisk(Utf8PathBuf),
    InArchive {
        archive: Arc<dyn Archive>,
        entry: PackageEntry,
    },
    NotFound,
}

impl Resolved {
    pub fn is_found(&self) -> bool {
        !matches!(self, Resolved::NotFound)
    }

    /// File name (with extension) of the resolved file.
    pub fn file_name(&self) -> Option<String> {
        match self {
            Resolved::OnDisk(path) => path.file_name().map(str::to_string),
            Resolved::InArchive { entry, .. } => {
                let full = entry.full_path();
                Some(match full.rsplit_once('/') {
                    Some((_, name)) => name.to_string(),
                    None => full,
                })
            }
            Resolved::NotFound => None,
        }
    }
}

impl fmt::Display for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::OnDisk(path) => write!(f, "{}", path),
            Resolved::InArchive { archive, entry } => {
                write!(f, "{}:{}", archive.path(), entry.full_path())
            }
            Resolved::NotFound => write!(f, "<not found>"),
        }
    }
}

/// A resolved file together with its bytes.
#[derive(Debug)]
pub struct LoadedFile {
    pub resolved: Resolved,
    pub data: EntryData,
}

impl LoadedFile {
    pub fn file_name(&self) -> String {
        self.resolved.file_name().unwrap_or_default()
    }
}

/// Turns raw bytes into a typed resource for [`GameFileLoader::load_resource`].
///
/// [`GameFileLoader::load_resource`]: crate::GameFileLoader::load_resource
pub trait ResourceParser {
    type Output;

    fn parse(&self, file_name: &str, data: &[u8]) -> Result<Self::Output>;
}
