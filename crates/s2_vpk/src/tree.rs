//! Directory tree encoding.
//!
//! ```text
//! extension\0
//!   directory\0
//!     file\0 crc:u32 preload_len:u16 archive_index:u16 offset:u32 length:u32 0xFFFF preload[..]
//!     ...
//!   \0
//! \0
//! ```
//!
//! A single space stands for "no extension" or "root directory".

use crate::entry::PackageEntry;
use crate::error::{Result, VpkError};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{BufRead, Write};

const ENTRY_TERMINATOR: u16 = 0xFFFF;
const EMPTY_MARKER: &str = " ";

fn read_cstring<R: BufRead>(reader: &mut R) -> Result<String> {
    let mut buf = Vec::new();
    reader.read_until(0, &mut buf)?;
    if buf.pop() != Some(0) {
        return Err(VpkError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "directory tree ended inside a string",
        )));
    }
    Ok(String::from_utf8(buf)?)
}

fn write_cstring<W: Write>(writer: &mut W, value: &str) -> Result<()> {
    writer.write_all(value.as_bytes())?;
    writer.write_u8(0)?;
    Ok(())
}

fn unmark(value: String) -> String {
    if value == EMPTY_MARKER {
        String::new()
    } else {
        value
    }
}

fn mark(value: &str) -> &str {
    if value.is_empty() {
        EMPTY_MARKER
    } else {
        value
    }
}

/// Read every entry of a directory tree.
pub(crate) fn read_tree<R: BufRead>(reader: &mut R) -> Result<Vec<PackageEntry>> {
    let mut entries = Vec::new();

    loop {
        let type_name = read_cstring(reader)?;
        if type_name.is_empty() {
            break;
        }
        let type_name = unmark(type_name);

        loop {
            let directory = read_cstring(reader)?;
            if directory.is_empty() {
                break;
            }
            let directory = unmark(directory);

            loop {
                let file_name = read_cstring(reader)?;
                if file_name.is_empty() {
                    break;
                }

                let crc32 = reader.read_u32::<LittleEndian>()?;
                let preload_len = reader.read_u16::<LittleEndian>()?;
                let archive_index = reader.read_u16::<LittleEndian>()?;
                let offset = reader.read_u32::<LittleEndian>()?;
                let length = reader.read_u32::<LittleEndian>()?;
                let terminator = reader.read_u16::<LittleEndian>()?;

                let mut entry = PackageEntry {
                    directory: directory.clone(),
                    file_name: unmark(file_name),
                    type_name: type_name.clone(),
                    crc32,
                    small_data: Vec::new(),
                    archive_index,
                    offset,
                    length,
                };

                if terminator != ENTRY_TERMINATOR {
                    return Err(VpkError::InvalidTerminator {
                        path: entry.full_path(),
                        found: terminator,
                    });
                }

                if preload_len > 0 {
                    let mut small_data = vec![0; preload_len as usize];
                    reader.read_exact(&mut small_data)?;
                    entry.small_data = small_data;
                }

                entries.push(entry);
            }
        }
    }

    Ok(entries)
}

/// Write entries as a directory tree. Entries must already be grouped so that all
/// entries with the same extension, and within it the same directory, are adjacent.
pub(crate) fn write_tree<W: Write>(writer: &mut W, entries: &[PackageEntry]) -> Result<()> {
    let mut idx = 0;
    while idx < entries.len() {
        let type_name = &entries[idx].type_name;
        write_cstring(writer, mark(type_name))?;

        while idx < entries.len() && &entries[idx].type_name == type_name {
            let directory = &entries[idx].directory;
            write_cstring(writer, mark(directory))?;

            while idx < entries.len()
                && &entries[idx].type_name == type_name
                && &entries[idx].directory == directory
            {
                let entry = &entries[idx];
                let preload_len = u16::try_from(entry.small_data.len())
                    .map_err(|_| VpkError::EntryTooLarge(entry.full_path()))?;

                write_cstring(writer, &entry.file_name)?;
                writer.write_u32::<LittleEndian>(entry.crc32)?;
                writer.write_u16::<LittleEndian>(preload_len)?;
                writer.write_u16::<LittleEndian>(entry.archive_index)?;
                writer.write_u32::<LittleEndian>(entry.offset)?;
                writer.write_u32::<LittleEndian>(entry.length)?;
                writer.write_u16::<LittleEndian>(ENTRY_TERMINATOR)?;
                writer.write_all(&entry.small_data)?;
                idx += 1;
            }
            writer.write_u8(0)?;
        }
        writer.write_u8(0)?;
    }
    writer.write_u8(0)?;
    Ok(())
}
