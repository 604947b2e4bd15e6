use crate::data::EntryData;
use crate::entry::{normalize_entry_name, PackageEntry};
use crate::error::{Result, VpkError};
use crate::header::Header;
use crate::tree::read_tree;
use camino::{Utf8Path, Utf8PathBuf};
use crc::{Crc, CRC_32_ISO_HDLC};
use memmap2::MmapOptions;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::sync::{Mutex, PoisonError};

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

trait ReadSeek: Read + Seek + Send {}
impl<T: Read + Seek + Send> ReadSeek for T {}

/// An opened VPK package.
///
/// Opening reads the whole directory tree and sorts it once for case-insensitive binary
/// search. Data is only read on demand through [`read_entry`](Self::read_entry).
pub struct Package {
    /// File stem, e.g. `pak01_dir`.
    name: String,
    /// Location on disk; `None` for packages opened from memory.
    path: Option<Utf8PathBuf>,
    header: Header,
    /// Sorted by `lookup` key.
    entries: Vec<PackageEntry>,
    /// Lowercased full paths, parallel to `entries`.
    lookup: Vec<String>,
    /// Shared cursor over the `_dir.vpk` (or the in-memory bytes).
    reader: Mutex<Box<dyn ReadSeek>>,
    is_split: bool,
}

impl fmt::Debug for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Package")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("header", &self.header)
            .field("entries", &self.entries.len())
            .field("is_split", &self.is_split)
            .finish()
    }
}

impl Package {
    /// Open a package from disk.
    ///
    /// A file named `*_dir.vpk` is treated as split: entries may point into sibling
    /// volume files `*_000.vpk`, `*_001.vpk`, ...
    pub fn open(path: &Utf8Path) -> Result<Self> {
        let file = File::open(path.as_std_path())?;
        let name = path.file_stem().unwrap_or_default().to_string();
        let is_split = name.to_ascii_lowercase().ends_with("_dir");

        let package = Self::read_from(
            name,
            Some(path.to_path_buf()),
            Box::new(BufReader::new(file)),
            is_split,
        )?;

        tracing::debug!(
            "Opened VPK {} (v{}, {} entries, split={})",
            path,
            package.header.version,
            package.entries.len(),
            package.is_split
        );
        Ok(package)
    }

    /// Open a package held in memory, e.g. one nested inside another package.
    ///
    /// Only entries stored inline or in the directory file itself can be read.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        Self::read_from(name.into(), None, Box::new(Cursor::new(bytes)), false)
    }

    fn read_from(
        name: String,
        path: Option<Utf8PathBuf>,
        mut reader: Box<dyn ReadSeek>,
        is_split: bool,
    ) -> Result<Self> {
        let header = Header::read_validated(&mut reader)?;

        // Sized by what is actually read; a corrupt header can claim up to 4 GiB.
        let mut tree = Vec::new();
        reader
            .by_ref()
            .take(header.tree_size as u64)
            .read_to_end(&mut tree)?;
        if tree.len() < header.tree_size as usize {
            return Err(VpkError::TruncatedTree {
                expected: header.tree_size,
                found: tree.len(),
            });
        }
        let mut entries = read_tree(&mut Cursor::new(tree))?;

        entries.sort_by_cached_key(|e| normalize_entry_name(&e.full_path()));
        let lookup = entries
            .iter()
            .map(|e| normalize_entry_name(&e.full_path()))
            .collect();

        Ok(Self {
            name,
            path,
            header,
            entries,
            lookup,
            reader: Mutex::new(reader),
            is_split,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&Utf8Path> {
        self.path.as_deref()
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn is_split(&self) -> bool {
        self.is_split
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, sorted case-insensitively by full path.
    pub fn entries(&self) -> &[PackageEntry] {
        &self.entries
    }

    pub fn entries_with_extension<'a>(
        &'a self,
        type_name: &'a str,
    ) -> impl Iterator<Item = &'a PackageEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.type_name.eq_ignore_ascii_case(type_name))
    }

    /// Look up an entry by path, ignoring ASCII case and slash direction.
    pub fn find_entry(&self, name: &str) -> Option<&PackageEntry> {
        let key = normalize_entry_name(name);
        self.lookup
            .binary_search_by(|probe| probe.as_str().cmp(key.as_str()))
            .ok()
            .map(|idx| &self.entries[idx])
    }

    /// Path of the numbered volume holding `archive_index`.
    pub fn volume_path(&self, archive_index: u16) -> Option<Utf8PathBuf> {
        let path = self.path.as_ref()?;
        let stem = self.name.get(..self.name.len().checked_sub(4)?)?;
        Some(path.with_file_name(format!("{}_{:03}.vpk", stem, archive_index)))
    }

    /// Read an entry's bytes.
    pub fn read_entry(&self, entry: &PackageEntry) -> Result<EntryData> {
        if entry.is_inline() {
            return Ok(EntryData::Owned(entry.small_data.clone()));
        }

        if entry.is_in_directory_file() {
            return self.read_from_directory_file(entry);
        }

        if !self.is_split {
            return Err(VpkError::NotSplit {
                path: entry.full_path(),
                index: entry.archive_index,
            });
        }

        self.map_from_volume(entry)
    }

    fn read_from_directory_file(&self, entry: &PackageEntry) -> Result<EntryData> {
        let mut buf = Vec::with_capacity(entry.total_length() as usize);
        buf.extend_from_slice(&entry.small_data);

        let start = buf.len();
        buf.resize(start + entry.length as usize, 0);

        let mut reader = self.reader.lock().unwrap_or_else(PoisonError::into_inner);
        reader.seek(SeekFrom::Start(
            self.header.data_offset() + entry.offset as u64,
        ))?;
        reader.read_exact(&mut buf[start..])?;

        Ok(EntryData::Owned(buf))
    }

    fn map_from_volume(&self, entry: &PackageEntry) -> Result<EntryData> {
        let volume = self
            .volume_path(entry.archive_index)
            .ok_or_else(|| VpkError::NotSplit {
                path: entry.full_path(),
                index: entry.archive_index,
            })?;

        let file = File::open(volume.as_std_path()).map_err(|source| VpkError::MissingVolume {
            path: volume.clone(),
            source,
        })?;

        let end = entry.offset as u64 + entry.length as u64;
        if end > file.metadata()?.len() {
            return Err(VpkError::EntryOutOfBounds {
                path: entry.full_path(),
            });
        }

        // SAFETY: the volume is opened read-only and the mapping is bounds-checked above.
        // Volumes are not expected to change while a package is open.
        let map = unsafe {
            MmapOptions::new()
                .offset(entry.offset as u64)
                .len(entry.length as usize)
                .map(&file)?
        };

        if entry.small_data.is_empty() {
            return Ok(EntryData::Mapped(map));
        }

        let mut buf = Vec::with_capacity(entry.total_length() as usize);
        buf.extend_from_slice(&entry.small_data);
        buf.extend_from_slice(&map);
        Ok(EntryData::Owned(buf))
    }

    /// Check entry bytes against the CRC-32 stored in the tree.
    pub fn verify_entry(entry: &PackageEntry, data: &[u8]) -> bool {
        CRC32.checksum(data) == entry.crc32
    }
}

/// CRC-32 (ISO-HDLC) as stored in the directory tree.
pub fn checksum(data: &[u8]) -> u32 {
    CRC32.checksum(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::PackageBuilder;
    use tempfile::tempdir;

    fn sample_builder() -> PackageBuilder {
        let mut builder = PackageBuilder::new();
        builder
            .add_file("materials/dev/floor.vmat_c", b"floor material".to_vec())
            .add_file("Models/Hero.vmdl_c", vec![7u8; 4096])
            .add_file("readme.txt", b"hello".to_vec())
            .add_file("empty.txt", Vec::new());
        builder
    }

    #[test]
    fn test_from_bytes_find_and_read() {
        let bytes = sample_builder().to_bytes().unwrap();
        let package = Package::from_bytes("memory", bytes).unwrap();

        assert_eq!(package.len(), 4);
        assert!(!package.is_split());

        let entry = package.find_entry("materials/dev/floor.vmat_c").unwrap();
        let data = package.read_entry(entry).unwrap();
        assert_eq!(&data[..], b"floor material");
        assert!(Package::verify_entry(entry, &data));
    }

    #[test]
    fn test_find_is_case_and_slash_insensitive() {
        let package = Package::from_bytes("memory", sample_builder().to_bytes().unwrap()).unwrap();

        let entry = package.find_entry("\\MODELS\\hero.VMDL_C").unwrap();
        assert_eq!(entry.full_path(), "Models/Hero.vmdl_c");
        assert!(package.find_entry("models/villain.vmdl_c").is_none());
    }

    #[test]
    fn test_entries_with_extension() {
        let package = Package::from_bytes("memory", sample_builder().to_bytes().unwrap()).unwrap();
        let names: Vec<_> = package
            .entries_with_extension("TXT")
            .map(|e| e.full_path())
            .collect();
        assert_eq!(names, vec!["empty.txt", "readme.txt"]);
    }

    #[test]
    fn test_empty_entry_reads_as_empty() {
        let package = Package::from_bytes("memory", sample_builder().to_bytes().unwrap()).unwrap();
        let entry = package.find_entry("empty.txt").unwrap();
        assert!(package.read_entry(entry).unwrap().is_empty());
    }

    #[test]
    fn test_preload_bytes_are_prefixed() {
        let mut builder = PackageBuilder::new().with_preload_limit(4);
        builder.add_file("a.bin", b"0123456789".to_vec());
        let package = Package::from_bytes("memory", builder.to_bytes().unwrap()).unwrap();

        let entry = package.find_entry("a.bin").unwrap();
        assert_eq!(entry.small_data, b"0123");
        assert_eq!(entry.length, 6);
        assert_eq!(&package.read_entry(entry).unwrap()[..], b"0123456789");
    }

    #[test]
    fn test_split_package_maps_volume_range() {
        let dir = tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let dir_path = root.join("pak01_dir.vpk");
        sample_builder().write_split(&dir_path).unwrap();
        assert!(root.join("pak01_000.vpk").exists());

        let package = Package::open(&dir_path).unwrap();
        assert!(package.is_split());
        assert_eq!(package.volume_path(3).unwrap(), root.join("pak01_003.vpk"));

        let entry = package.find_entry("models/hero.vmdl_c").unwrap();
        assert_eq!(entry.archive_index, 0);
        let data = package.read_entry(entry).unwrap();
        assert!(data.is_mapped());
        assert_eq!(data.len(), 4096);
        assert!(data.iter().all(|b| *b == 7));
    }

    #[test]
    fn test_split_package_missing_volume() {
        let dir = tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let dir_path = root.join("pak01_dir.vpk");
        sample_builder().write_split(&dir_path).unwrap();
        std::fs::remove_file(root.join("pak01_000.vpk")).unwrap();

        let package = Package::open(&dir_path).unwrap();
        let entry = package.find_entry("readme.txt").unwrap();
        let err = package.read_entry(entry).unwrap_err();
        assert!(matches!(err, VpkError::MissingVolume { .. }));
    }

    #[test]
    fn test_external_volume_in_memory_package() {
        let dir = tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let dir_path = root.join("pak01_dir.vpk");
        sample_builder().write_split(&dir_path).unwrap();

        let bytes = std::fs::read(dir_path.as_std_path()).unwrap();
        let package = Package::from_bytes("nested", bytes).unwrap();
        let entry = package.find_entry("readme.txt").unwrap();
        let err = package.read_entry(entry).unwrap_err();
        assert!(matches!(err, VpkError::NotSplit { index: 0, .. }));
    }

    #[test]
    fn test_single_file_on_disk() {
        let dir = tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let path = root.join("single.vpk");
        std::fs::write(path.as_std_path(), sample_builder().to_bytes().unwrap()).unwrap();

        let package = Package::open(&path).unwrap();
        assert!(!package.is_split());
        assert_eq!(package.name(), "single");
        let entry = package.find_entry("readme.txt").unwrap();
        assert_eq!(&package.read_entry(entry).unwrap()[..], b"hello");
    }

    #[test]
    fn test_tree_size_past_end_of_file() {
        let mut bytes = crate::SIGNATURE.to_le_bytes().to_vec();
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&0xFFFF_FFF0u32.to_le_bytes());
        bytes.extend_from_slice(b"vmat_c\0");

        let err = Package::from_bytes("corrupt", bytes).unwrap_err();
        assert!(matches!(
            err,
            VpkError::TruncatedTree {
                expected: 0xFFFF_FFF0,
                found: 7
            }
        ));
    }

    #[test]
    fn test_not_a_vpk() {
        let err = Package::from_bytes("junk", b"definitely not a package".to_vec()).unwrap_err();
        assert!(matches!(err, VpkError::InvalidSignature(_)));
    }
}
