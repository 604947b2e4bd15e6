//! The archive seam.
//!
//! The resolver never talks to the VPK format directly. It sees archives through
//! [`Archive`] and creates them through an [`ArchiveOpener`], which lets tests count
//! opens or serve archives from memory.

use crate::error::{Error, Result};
use camino::Utf8Path;
use s2_vpk::{EntryData, Package, PackageEntry};
use std::fmt;
use std::sync::Arc;

/// An opened, indexed package.
pub trait Archive: Send + Sync + fmt::Debug {
    /// Identity of the archive: the normalized disk path, or a synthetic key for
    /// archives opened from memory.
    fn path(&self) -> &str;

    /// Case-insensitive lookup of a logical path.
    fn find_entry(&self, name: &str) -> Option<PackageEntry>;

    /// Entries whose extension matches `type_name` (without the dot).
    fn entries_with_extension(&self, type_name: &str) -> Vec<PackageEntry>;

    /// Read an entry's bytes. Implementations serialize access to any shared cursor.
    fn read_entry(&self, entry: &PackageEntry) -> Result<EntryData>;
}

/// Creates archives for the [`ArchiveCache`](crate::ArchiveCache).
pub trait ArchiveOpener: Send + Sync {
    fn open(&self, path: &Utf8Path) -> Result<Arc<dyn Archive>>;

    /// Open an archive from bytes, e.g. a package stored inside another package.
    /// `key` becomes the archive's [`path`](Archive::path).
    fn open_bytes(&self, key: &str, bytes: Vec<u8>) -> Result<Arc<dyn Archive>>;
}

/// A VPK package plus the key it was opened under.
#[derive(Debug)]
pub struct VpkArchive {
    key: String,
    package: Package,
}

impl VpkArchive {
    pub fn new(key: impl Into<String>, package: Package) -> Self {
        Self {
            key: key.into(),
            package,
        }
    }

    pub fn package(&self) -> &Package {
        &self.package
    }
}

impl Archive for VpkArchive {
    fn path(&self) -> &str {
        &self.key
    }

    fn find_entry(&self, name: &str) -> Option<PackageEntry> {
        self.package.find_entry(name).cloned()
    }

    fn entries_with_extension(&self, type_name: &str) -> Vec<PackageEntry> {
        self.package
            .entries_with_extension(type_name)
            .cloned()
            .collect()
    }

    fn read_entry(&self, entry: &PackageEntry) -> Result<EntryData> {
        Ok(self.package.read_entry(entry)?)
    }
}

/// Opens `.vpk` files with [`s2_vpk`].
#[derive(Debug, Default, Clone, Copy)]
pub struct VpkOpener;

impl ArchiveOpener for VpkOpener {
    fn open(&self, path: &Utf8Path) -> Result<Arc<dyn Archive>> {
        let package = Package::open(path).map_err(|source| Error::ArchiveOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Arc::new(VpkArchive::new(path.as_str(), package)))
    }

    fn open_bytes(&self, key: &str, bytes: Vec<u8>) -> Result<Arc<dyn Archive>> {
        let package = Package::from_bytes(key, bytes).map_err(|source| Error::ArchiveOpen {
            path: key.into(),
            source,
        })?;
        Ok(Arc::new(VpkArchive::new(key, package)))
    }
}

/// `true` for numbered data volumes such as `pak01_003.vpk`, which cannot be opened
/// on their own.
pub(crate) fn is_volume_file_name(file_name: &str) -> bool {
    let Some(stem) = file_name
        .get(..file_name.len().saturating_sub(4))
        .filter(|_| file_name.to_ascii_lowercase().ends_with(".vpk"))
    else {
        return false;
    };

    match stem.rsplit_once('_') {
        Some((_, index)) => index.len() == 3 && index.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}
