use crate::error::{Result, VpkError};
use binrw::{binrw, BinRead};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Read, Seek, SeekFrom};

/// Magic number at the start of every `_dir.vpk`.
pub const SIGNATURE: u32 = 0x55AA_1234;

/// Extra section sizes present in version 2 headers.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderV2 {
    pub file_data_section_size: u32,
    pub archive_md5_section_size: u32,
    pub other_md5_section_size: u32,
    pub signature_section_size: u32,
}

#[binrw]
#[brw(little, magic = 0x55AA_1234u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u32,
    pub tree_size: u32,
    #[br(if(version == 2))]
    pub v2: Option<HeaderV2>,
}

impl Header {
    pub fn new_v2(tree_size: u32, file_data_section_size: u32) -> Self {
        Self {
            version: 2,
            tree_size,
            v2: Some(HeaderV2 {
                file_data_section_size,
                ..Default::default()
            }),
        }
    }

    /// Size of the header on disk; the tree starts right after it.
    pub fn size(&self) -> u64 {
        match self.v2 {
            Some(_) => 28,
            None => 12,
        }
    }

    /// Offset of the embedded data section (entries with [`DIR_ARCHIVE_INDEX`](crate::DIR_ARCHIVE_INDEX)).
    pub fn data_offset(&self) -> u64 {
        self.size() + self.tree_size as u64
    }

    /// Read and validate a header from the start of `reader`.
    pub fn read_validated<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let start = reader.stream_position()?;
        let signature = reader.read_u32::<LittleEndian>()?;
        if signature != SIGNATURE {
            return Err(VpkError::InvalidSignature(signature));
        }
        reader.seek(SeekFrom::Start(start))?;

        let header = Header::read(reader)?;
        if header.version != 1 && header.version != 2 {
            return Err(VpkError::UnsupportedVersion(header.version));
        }
        Ok(header)
    }
}
