//! KeyValues1 text documents as used by Source 2 game-info descriptors (`gameinfo.gi`)
//! and Steam app manifests (`appmanifest_<id>.acf`).
//!
//! The crate has two layers:
//!
//! 1. [`parse`] turns text into a [`Document`]: an ordered tree of [`Value`]s where a key
//!    may appear more than once. Lookups are ASCII case-insensitive, like the engine.
//! 2. Typed decoders ([`GameInfo`], [`AppManifest`]) pull out the handful of fields the
//!    file resolver needs. They run once, at the parsing boundary, so callers never poke
//!    at loosely typed values.
//!
//! # Example
//!
//! ```
//! use s2_keyvalues::GameInfo;
//!
//! let text = r#"
//! "GameInfo"
//! {
//!     FileSystem
//!     {
//!         SearchPaths
//!         {
//!             Game    citadel
//!             Game    core
//!             Mod     citadel
//!         }
//!     }
//! }
//! "#;
//!
//! let info = GameInfo::parse(text).unwrap();
//! let games: Vec<_> = info.game_search_paths().collect();
//! assert_eq!(games, vec!["citadel", "core"]);
//! ```

mod error;
mod gameinfo;
mod manifest;
mod parser;
mod value;

pub use error::{DecodeError, ParseError, ParseErrorKind, Result};
pub use gameinfo::{GameInfo, SearchPath, SearchPathBase};
pub use manifest::AppManifest;
pub use parser::{parse, MAX_DEPTH};
pub use value::{Document, KeyValues, Value};
