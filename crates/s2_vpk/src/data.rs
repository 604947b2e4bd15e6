use memmap2::Mmap;
use std::io::Cursor;
use std::ops::Deref;

/// Bytes of one entry.
///
/// Large entries from split volumes are handed out as a memory-mapped view of just
/// their byte range; everything else is read into an owned buffer.
#[derive(Debug)]
pub enum EntryData {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl EntryData {
    pub fn is_mapped(&self) -> bool {
        matches!(self, EntryData::Mapped(_))
    }

    pub fn reader(&self) -> Cursor<&[u8]> {
        Cursor::new(self.as_ref())
    }

    pub fn into_vec(self) -> Vec<u8> {
        match self {
            EntryData::Owned(bytes) => bytes,
            EntryData::Mapped(map) => map.to_vec(),
        }
    }
}

impl Deref for EntryData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            EntryData::Owned(bytes) => bytes,
            EntryData::Mapped(map) => map,
        }
    }
}

impl AsRef<[u8]> for EntryData {
    fn as_ref(&self) -> &[u8] {
        self
    }
}

impl From<Vec<u8>> for EntryData {
    fn from(bytes: Vec<u8>) -> Self {
        EntryData::Owned(bytes)
    }
}
