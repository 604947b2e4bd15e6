//! Valve VPK packages.
//!
//! A package is a directory tree (the `_dir.vpk` file) that maps entry paths to data
//! stored either inline in the tree, after the tree in the same file, or in numbered
//! volume files next to it (`pak01_000.vpk`, `pak01_001.vpk`, ...).
//!
//! ```no_run
//! use camino::Utf8Path;
//! use s2_vpk::Package;
//!
//! # fn main() -> Result<(), s2_vpk::VpkError> {
//! let package = Package::open(Utf8Path::new("game/citadel/pak01_dir.vpk"))?;
//! if let Some(entry) = package.find_entry("materials/dev/dev_floor.vmat_c") {
//!     let data = package.read_entry(entry)?;
//!     println!("{} bytes", data.len());
//! }
//! # Ok(())
//! # }
//! ```

mod builder;
mod data;
mod entry;
mod error;
mod header;
mod package;
mod tree;

pub use builder::PackageBuilder;
pub use data::EntryData;
pub use entry::{normalize_entry_name, PackageEntry, DIR_ARCHIVE_INDEX};
pub use error::{Result, VpkError};
pub use header::{Header, HeaderV2, SIGNATURE};
pub use package::{checksum, Package};
