/// Archive index marking data stored in the `_dir.vpk` itself, after the tree.
pub const DIR_ARCHIVE_INDEX: u16 = 0x7FFF;

/// One file record from the directory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    /// Directory without leading or trailing slash; empty for the package root.
    pub directory: String,
    /// File name without extension.
    pub file_name: String,
    /// Extension without the dot; empty when the file has none.
    pub type_name: String,
    pub crc32: u32,
    /// Preload bytes stored inline in the tree.
    pub small_data: Vec<u8>,
    pub archive_index: u16,
    pub offset: u32,
    /// Length of the part stored outside the tree.
    pub length: u32,
}

impl PackageEntry {
    /// `directory/file_name.type_name`, as used for lookups.
    pub fn full_path(&self) -> String {
        let mut path = String::with_capacity(
            self.directory.len() + self.file_name.len() + self.type_name.len() + 2,
        );
        if !self.directory.is_empty() {
            path.push_str(&self.directory);
            path.push('/');
        }
        path.push_str(&self.file_name);
        if !self.type_name.is_empty() {
            path.push('.');
            path.push_str(&self.type_name);
        }
        path
    }

    pub fn total_length(&self) -> u64 {
        self.small_data.len() as u64 + self.length as u64
    }

    /// All bytes are in the tree; no further reads needed.
    pub fn is_inline(&self) -> bool {
        self.length == 0
    }

    pub fn is_in_directory_file(&self) -> bool {
        self.archive_index == DIR_ARCHIVE_INDEX
    }
}

/// Normalize an entry path for case-insensitive lookup.
///
/// Backslashes become forward slashes, leading slashes are dropped and ASCII letters
/// are lowercased.
pub fn normalize_entry_name(name: &str) -> String {
    name.replace('\\', "/")
        .trim_start_matches('/')
        .to_ascii_lowercase()
}

/// Split `dir/name.ext` into its three tree components.
pub(crate) fn split_entry_path(path: &str) -> (String, String, String) {
    let path = path.replace('\\', "/");
    let path = path.trim_start_matches('/');

    let (directory, file) = match path.rfind('/') {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    };
    let (file_name, type_name) = match file.rfind('.') {
        Some(idx) if idx > 0 => (&file[..idx], &file[idx + 1..]),
        _ => (file, ""),
    };

    (
        directory.to_string(),
        file_name.to_string(),
        type_name.to_string(),
    )
}
