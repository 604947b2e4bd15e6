//! Error types for file resolution.
//!
//! Absence is not an error here: a file that cannot be found resolves to
//! [`Resolved::NotFound`](crate::Resolved::NotFound), and a shader that cannot be found
//! yields an empty [`ShaderCollection`](crate::ShaderCollection). The variants below
//! cover real failures, such as an archive the caller asked for that cannot be opened.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem I/O failed (reading a loose file, probing a folder).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from the `s2_vpk` crate while reading a package entry.
    #[error("VPK error: {0}")]
    Vpk(#[from] s2_vpk::VpkError),

    /// A game-info descriptor or app manifest could not be decoded.
    #[error("KeyValues error: {0}")]
    KeyValues(#[from] s2_keyvalues::DecodeError),

    /// An archive could not be opened or indexed.
    #[error("Failed to open archive '{path}': {source}")]
    ArchiveOpen {
        path: Utf8PathBuf,
        #[source]
        source: s2_vpk::VpkError,
    },

    /// A compiled shader file was found but is not a valid VCS file.
    #[error("Invalid shader file: {0}")]
    InvalidShader(String),

    /// Catch-all for errors from custom archive backends and parsers.
    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}
