use camino::Utf8PathBuf;
use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, VpkError>;

#[derive(Error, Debug)]
pub enum VpkError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Binary format error: {0}")]
    Binrw(#[from] binrw::Error),

    #[error("Invalid VPK signature: {0:#010x}")]
    InvalidSignature(u32),

    #[error("Unsupported VPK version: {0}")]
    UnsupportedVersion(u32),

    /// The header claims a longer directory tree than the file holds.
    #[error("Directory tree truncated: header claims {expected} bytes, file has {found}")]
    TruncatedTree { expected: u32, found: usize },

    #[error("Invalid entry terminator {found:#06x} after '{path}'")]
    InvalidTerminator { path: String, found: u16 },

    #[error("Invalid UTF-8 string in directory tree")]
    InvalidString(#[from] std::string::FromUtf8Error),

    /// A split volume referenced by an entry could not be opened.
    #[error("Missing archive volume {path}")]
    MissingVolume {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Entry '{path}' extends past the end of its volume")]
    EntryOutOfBounds { path: String },

    /// The entry lives in an external volume, but this package has no volumes on disk.
    #[error("Entry '{path}' references volume {index} but the package is not split on disk")]
    NotSplit { path: String, index: u16 },

    #[error("Invalid entry path: '{0}'")]
    InvalidEntryPath(String),

    #[error("Entry is too large for the VPK format: '{0}'")]
    EntryTooLarge(String),
}
