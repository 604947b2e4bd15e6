use crate::entry::{split_entry_path, PackageEntry, DIR_ARCHIVE_INDEX};
use crate::error::{Result, VpkError};
use crate::header::Header;
use crate::package::checksum;
use crate::tree::write_tree;
use binrw::BinWrite;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;
use std::io::{Cursor, Seek, Write};

/// Writes version 2 packages.
///
/// Files are grouped by extension and directory as the format requires. Up to
/// `preload_limit` leading bytes of each file are stored inline in the tree; the rest
/// goes to the data section (single-file packages) or to volume `000` (split packages).
#[derive(Debug, Default)]
pub struct PackageBuilder {
    /// Keyed by (extension, directory, file name) so the tree comes out grouped.
    files: BTreeMap<(String, String, String), Vec<u8>>,
    preload_limit: usize,
}

impl PackageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preload_limit(mut self, limit: usize) -> Self {
        self.preload_limit = limit.min(u16::MAX as usize);
        self
    }

    /// Add or replace a file. `path` uses `/` or `\` separators.
    pub fn add_file(&mut self, path: impl AsRef<str>, data: Vec<u8>) -> &mut Self {
        let (directory, file_name, type_name) = split_entry_path(path.as_ref());
        self.files.insert((type_name, directory, file_name), data);
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Lay out entries and the external data blob.
    fn layout(&self, archive_index: u16) -> Result<(Vec<PackageEntry>, Vec<u8>)> {
        let mut entries = Vec::with_capacity(self.files.len());
        let mut blob = Vec::new();

        for ((type_name, directory, file_name), data) in &self.files {
            if file_name.is_empty() {
                return Err(VpkError::InvalidEntryPath(format!("{}/", directory)));
            }

            let split = data.len().min(self.preload_limit);
            let (small, rest) = data.split_at(split);

            let offset = u32::try_from(blob.len())
                .map_err(|_| VpkError::EntryTooLarge(file_name.clone()))?;
            let length = u32::try_from(rest.len())
                .map_err(|_| VpkError::EntryTooLarge(file_name.clone()))?;
            blob.extend_from_slice(rest);

            entries.push(PackageEntry {
                directory: directory.clone(),
                file_name: file_name.clone(),
                type_name: type_name.clone(),
                crc32: checksum(data),
                small_data: small.to_vec(),
                archive_index: if rest.is_empty() {
                    DIR_ARCHIVE_INDEX
                } else {
                    archive_index
                },
                offset: if rest.is_empty() { 0 } else { offset },
                length,
            });
        }

        Ok((entries, blob))
    }

    fn write_directory<W: Write + Seek>(
        writer: &mut W,
        entries: &[PackageEntry],
        embedded_data: &[u8],
    ) -> Result<()> {
        let mut tree = Vec::new();
        write_tree(&mut tree, entries)?;

        let tree_size =
            u32::try_from(tree.len()).map_err(|_| VpkError::EntryTooLarge("tree".into()))?;
        let data_size = u32::try_from(embedded_data.len())
            .map_err(|_| VpkError::EntryTooLarge("data section".into()))?;

        Header::new_v2(tree_size, data_size).write(writer)?;
        writer.write_all(&tree)?;
        writer.write_all(embedded_data)?;
        Ok(())
    }

    /// Write a self-contained package: all data follows the tree.
    pub fn write<W: Write + Seek>(&self, writer: &mut W) -> Result<()> {
        let (entries, blob) = self.layout(DIR_ARCHIVE_INDEX)?;
        Self::write_directory(writer, &entries, &blob)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Write `dir_path` (which should end in `_dir.vpk`) plus its `_000.vpk` volume.
    ///
    /// Returns the path of the volume file.
    pub fn write_split(&self, dir_path: &Utf8Path) -> Result<Utf8PathBuf> {
        let stem = dir_path
            .file_stem()
            .and_then(|s| s.strip_suffix("_dir"))
            .ok_or_else(|| VpkError::InvalidEntryPath(dir_path.to_string()))?;
        let volume_path = dir_path.with_file_name(format!("{}_000.vpk", stem));

        let (entries, blob) = self.layout(0)?;

        let mut file = std::fs::File::create(dir_path.as_std_path())?;
        Self::write_directory(&mut file, &entries, &[])?;
        std::fs::write(volume_path.as_std_path(), &blob)?;

        tracing::debug!(
            "Wrote split VPK {} ({} entries, {} volume bytes)",
            dir_path,
            entries.len(),
            blob.len()
        );
        Ok(volume_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Package;

    #[test]
    fn test_add_file_replaces_same_path() {
        let mut builder = PackageBuilder::new();
        builder
            .add_file("a/b.txt", b"one".to_vec())
            .add_file("a\\b.txt", b"two".to_vec());
        assert_eq!(builder.len(), 1);

        let package = Package::from_bytes("p", builder.to_bytes().unwrap()).unwrap();
        let entry = package.find_entry("a/b.txt").unwrap();
        assert_eq!(&package.read_entry(entry).unwrap()[..], b"two");
    }

    #[test]
    fn test_fully_preloaded_entry_is_inline() {
        let mut builder = PackageBuilder::new().with_preload_limit(64);
        builder.add_file("small.txt", b"tiny".to_vec());
        let package = Package::from_bytes("p", builder.to_bytes().unwrap()).unwrap();

        let entry = package.find_entry("small.txt").unwrap();
        assert!(entry.is_inline());
        assert_eq!(entry.archive_index, DIR_ARCHIVE_INDEX);
        assert_eq!(package.header().v2.unwrap().file_data_section_size, 0);
    }

    #[test]
    fn test_write_split_requires_dir_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8Path::from_path(dir.path()).unwrap().join("pak01.vpk");
        let err = PackageBuilder::new().write_split(&path).unwrap_err();
        assert!(matches!(err, VpkError::InvalidEntryPath(_)));
    }
}
