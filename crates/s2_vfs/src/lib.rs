//! Layered file resolution for Source 2 content.
//!
//! A [`GameFileLoader`] answers "which bytes does `materials/foo.vmat_c` refer to?"
//! for one opened file. It searches, in a fixed order, the package the file came
//! from, explicitly configured roots, the game and add-on folders found by walking
//! up from the file, and packages nested inside the current package. Packages are
//! opened through a process-wide [`ArchiveCache`] so each one is indexed only once.
//!
//! ```no_run
//! use s2_vfs::{ArchiveCache, GameFileLoader, Resolved};
//! use std::sync::Arc;
//!
//! # fn main() -> s2_vfs::Result<()> {
//! let cache = Arc::new(ArchiveCache::new());
//! let loader = GameFileLoader::new(cache)
//!     .with_current_archive("game/citadel/maps/street_test.vpk")?;
//!
//! match loader.resolve("materials/dev/dev_floor.vmat_c") {
//!     Resolved::InArchive { archive, entry } => {
//!         println!("{} in {}", entry.full_path(), archive.path())
//!     }
//!     Resolved::OnDisk(path) => println!("{}", path),
//!     Resolved::NotFound => println!("not found"),
//! }
//!
//! let shader = loader.load_shader("complex.vfx");
//! println!("{} shader stages", shader.len());
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod cache;
pub mod discovery;
pub mod error;
pub mod loader;
pub mod location;
pub mod paths;
pub mod shader;

pub use archive::{Archive, ArchiveOpener, VpkArchive, VpkOpener};
pub use cache::ArchiveCache;
pub use discovery::{
    read_app_manifest, read_gameinfo, DiscoveryRequest, GameDiscovery, ModContext,
    SearchPathDiscovery, MAX_ASCENT_LEVELS, MAX_PAK_INDEX, WORKSHOP_SCAN_DEPTH,
};
pub use error::{Error, Result};
pub use loader::GameFileLoader;
pub use location::{LoadedFile, Resolved, ResourceParser, SearchRoot};
pub use shader::{Model, Platform, ProgramType, ShaderCollection, ShaderFile};

pub use s2_vpk::{EntryData, PackageEntry};
