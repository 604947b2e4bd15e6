//! Mod and game discovery.
//!
//! Starting from the file being viewed, walk up the directory tree looking for a mod
//! marker (`gameinfo.gi`, `addoninfo.txt`, `.addon`) or a Steam workshop layout, and
//! turn what is found into a [`ModContext`]: the loose folders and `pakNN_dir.vpk`
//! packages of the game the file belongs to.

use crate::archive::Archive;
use crate::cache::ArchiveCache;
use crate::error::Result;
use crate::location::SearchRoot;
use crate::paths::{lexical_normalize, normalize_path, same_path};
use camino::{Utf8Path, Utf8PathBuf};
use s2_keyvalues::{AppManifest, GameInfo, SearchPathBase};
use std::fs;
use std::sync::Arc;
use walkdir::WalkDir;

pub const GAMEINFO_FILE_NAME: &str = "gameinfo.gi";

/// Files whose presence marks a directory as a mod or add-on root, in priority order.
pub const MOD_MARKERS: [&str; 3] = [GAMEINFO_FILE_NAME, "addoninfo.txt", ".addon"];

/// Suffix of the folder that holds a game's add-ons, e.g. `citadel_addons`.
pub const ADDONS_SUFFIX: &str = "_addons";

/// How many parent directories are inspected before giving up.
pub const MAX_ASCENT_LEVELS: usize = 10;

/// Depth limit when looking for `gameinfo.gi` inside a Steam install.
pub const WORKSHOP_SCAN_DEPTH: usize = 5;

/// Highest `pakNN_dir.vpk` index probed in each folder.
pub const MAX_PAK_INDEX: u32 = 99;

const WORKSHOP_CONTENT_MARKER: &str = "steamapps/workshop/content/";

/// Roots contributed by discovery.
#[derive(Debug, Clone, Default)]
pub struct ModContext {
    folders: Vec<Utf8PathBuf>,
    archives: Vec<Arc<dyn Archive>>,
}

impl ModContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn folders(&self) -> &[Utf8PathBuf] {
        &self.folders
    }

    pub fn archives(&self) -> &[Arc<dyn Archive>] {
        &self.archives
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.archives.is_empty()
    }

    /// Add a folder unless an equal path is already present.
    pub fn add_folder(&mut self, folder: impl Into<Utf8PathBuf>) -> bool {
        let folder = folder.into();
        if self.folders.iter().any(|f| same_path(f, &folder)) {
            return false;
        }
        self.folders.push(folder);
        true
    }

    /// Add an archive unless one with the same path is already present.
    pub fn add_archive(&mut self, archive: Arc<dyn Archive>) -> bool {
        if self.archives.iter().any(|a| a.path() == archive.path()) {
            return false;
        }
        self.archives.push(archive);
        true
    }

    /// Archives first, then folders.
    pub fn roots(&self) -> impl Iterator<Item = SearchRoot> + '_ {
        self.archives
            .iter()
            .cloned()
            .map(SearchRoot::ArchiveHandle)
            .chain(self.folders.iter().cloned().map(SearchRoot::LooseFolder))
    }
}

/// Everything a discovery implementation may need from the loader.
pub struct DiscoveryRequest<'a> {
    pub current_file: &'a Utf8Path,
    /// The archive the current file lives in, if any. Never re-added by discovery.
    pub current_archive: Option<&'a Utf8Path>,
    /// Roots the caller supplied explicitly. Never re-added by discovery.
    pub explicit_roots: &'a [SearchRoot],
    pub cache: &'a ArchiveCache,
}

impl DiscoveryRequest<'_> {
    fn is_known_archive(&self, path: &Utf8Path) -> bool {
        self.current_archive.is_some_and(|current| same_path(current, path))
            || self.explicit_roots.iter().any(|root| root.is_archive(path))
    }

    fn is_explicit_folder(&self, path: &Utf8Path) -> bool {
        self.explicit_roots.iter().any(|root| root.is_folder(path))
    }
}

/// Finds the game context of a file. Runs at most once per loader.
pub trait SearchPathDiscovery: Send + Sync {
    fn discover(&self, request: &DiscoveryRequest<'_>) -> ModContext;
}

/// Filesystem-based discovery of Source 2 games, add-ons and workshop items.
#[derive(Debug, Clone)]
pub struct GameDiscovery {
    max_ascent: usize,
    workshop_depth: usize,
}

impl Default for GameDiscovery {
    fn default() -> Self {
        Self {
            max_ascent: MAX_ASCENT_LEVELS,
            workshop_depth: WORKSHOP_SCAN_DEPTH,
        }
    }
}

impl SearchPathDiscovery for GameDiscovery {
    fn discover(&self, request: &DiscoveryRequest<'_>) -> ModContext {
        let folders = self.find_folders(request.current_file);
        tracing::debug!(
            "Discovery for {} found {} candidate folders",
            request.current_file,
            folders.len()
        );

        let mut context = ModContext::new();
        for folder in &folders {
            load_folder(&mut context, folder, request);
        }
        context
    }
}

impl GameDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_ascent(mut self, levels: usize) -> Self {
        self.max_ascent = levels;
        self
    }

    /// Candidate game folders for `current_file`, highest priority first.
    pub fn find_folders(&self, current_file: &Utf8Path) -> Vec<Utf8PathBuf> {
        let current_file = normalize_path(current_file);
        let mut folders = Vec::new();
        let mut previous_name: Option<&str> = None;
        let mut directory = current_file.parent();

        for _ in 0..self.max_ascent {
            let Some(dir) = directory else {
                break;
            };
            let name = dir.file_name();

            let is_workshop = name.is_some_and(|n| n.eq_ignore_ascii_case("steamapps"))
                && previous_name.is_some_and(|n| n.eq_ignore_ascii_case("workshop"));
            if is_workshop {
                self.workshop_folders(&current_file, dir, &mut folders);
                break;
            }

            if let Some(marker) = find_marker(dir) {
                if marker == GAMEINFO_FILE_NAME {
                    gameinfo_folders(&dir.join(marker), &mut folders);
                } else {
                    addon_folders(dir, &mut folders);
                }
                break;
            }

            previous_name = name;
            directory = dir.parent();
        }

        folders
    }

    /// Workshop content lives outside the game install. Find the install through the
    /// app manifest and use every `gameinfo.gi` inside it.
    fn workshop_folders(
        &self,
        current_file: &Utf8Path,
        steamapps: &Utf8Path,
        folders: &mut Vec<Utf8PathBuf>,
    ) {
        let Some(app_id) = workshop_app_id(current_file.as_str()) else {
            tracing::debug!("No workshop app id in {}", current_file);
            return;
        };

        let manifest_path = steamapps.join(format!("appmanifest_{}.acf", app_id));
        let manifest = match read_app_manifest(&manifest_path) {
            Ok(manifest) => manifest,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", manifest_path, e);
                return;
            }
        };

        let install_dir = steamapps.join("common").join(&manifest.install_dir);
        tracing::info!("Workshop item for app {} installed at {}", app_id, install_dir);

        let gameinfos = WalkDir::new(&install_dir)
            .max_depth(self.workshop_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|n| n.eq_ignore_ascii_case(GAMEINFO_FILE_NAME))
            })
            .filter_map(|entry| Utf8PathBuf::from_path_buf(entry.into_path()).ok());

        for gameinfo in gameinfos {
            gameinfo_folders(&gameinfo, folders);
        }
    }
}

fn find_marker(dir: &Utf8Path) -> Option<&'static str> {
    MOD_MARKERS
        .into_iter()
        .find(|marker| dir.join(marker).is_file())
}

fn push_unique(folders: &mut Vec<Utf8PathBuf>, folder: Utf8PathBuf) {
    if !folders.iter().any(|f| same_path(f, &folder)) {
        folders.push(folder);
    }
}

/// Read and decode a `gameinfo.gi`.
pub fn read_gameinfo(path: &Utf8Path) -> Result<GameInfo> {
    let text = fs::read_to_string(path)?;
    Ok(GameInfo::parse(&text)?)
}

/// Read and decode a Steam `appmanifest_{id}.acf`.
pub fn read_app_manifest(path: &Utf8Path) -> Result<AppManifest> {
    let text = fs::read_to_string(path)?;
    Ok(AppManifest::parse(&text)?)
}

/// Folders named by the `Game` search paths of a `gameinfo.gi`.
fn gameinfo_folders(gameinfo_path: &Utf8Path, folders: &mut Vec<Utf8PathBuf>) {
    let info = match read_gameinfo(gameinfo_path) {
        Ok(info) => info,
        Err(e) => {
            tracing::warn!("Skipping {}: {}", gameinfo_path, e);
            return;
        }
    };

    let Some(mod_dir) = gameinfo_path.parent() else {
        return;
    };
    let game_root = mod_dir.parent().unwrap_or(mod_dir);

    for (base, relative) in info.game_folders() {
        let base_dir = match base {
            SearchPathBase::GameRoot => game_root,
            SearchPathBase::GameInfoDir => mod_dir,
        };
        push_unique(folders, lexical_normalize(&base_dir.join(relative)));
    }
}

/// An add-on folder, plus the game it extends when it sits in `{game}_addons/`.
fn addon_folders(addon_dir: &Utf8Path, folders: &mut Vec<Utf8PathBuf>) {
    push_unique(folders, addon_dir.to_path_buf());

    let Some(addons_dir) = addon_dir.parent() else {
        return;
    };
    let Some(game_name) = addons_dir
        .file_name()
        .and_then(|name| strip_suffix_ignore_case(name, ADDONS_SUFFIX))
    else {
        return;
    };
    let Some(parent) = addons_dir.parent() else {
        return;
    };

    let game_dir = parent.join(game_name);
    if game_dir.is_dir() {
        push_unique(folders, game_dir);
    }
}

fn strip_suffix_ignore_case<'a>(value: &'a str, suffix: &str) -> Option<&'a str> {
    let split = value.len().checked_sub(suffix.len())?;
    let tail = value.get(split..)?;
    (split > 0 && tail.eq_ignore_ascii_case(suffix)).then(|| &value[..split])
}

/// Numeric app id following `steamapps/workshop/content/` in `path`.
pub fn workshop_app_id(path: &str) -> Option<String> {
    let normalized = path.replace('\\', "/").to_ascii_lowercase();
    let start = normalized.find(WORKSHOP_CONTENT_MARKER)? + WORKSHOP_CONTENT_MARKER.len();
    let app_id: String = normalized[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    (!app_id.is_empty()).then_some(app_id)
}

/// Path of the `pak{NN}_dir.vpk` package in `folder`.
pub fn pak_path(folder: &Utf8Path, index: u32) -> Utf8PathBuf {
    folder.join(format!("pak{:02}_dir.vpk", index))
}

/// Add `folder` and its numbered packages to `context`.
///
/// Packages are probed from `pak01` upwards and the scan stops at the first missing
/// index. Packages that fail to open are logged and skipped.
fn load_folder(context: &mut ModContext, folder: &Utf8Path, request: &DiscoveryRequest<'_>) {
    if !folder.is_dir() {
        tracing::debug!("Skipping missing game folder {}", folder);
        return;
    }

    for index in 1..=MAX_PAK_INDEX {
        let path = pak_path(folder, index);
        if !path.is_file() {
            break;
        }
        if request.is_known_archive(&path) {
            tracing::debug!("Skipping {}: already a search root", path);
            continue;
        }

        match request.cache.get_or_open(&path) {
            Ok(archive) => {
                context.add_archive(archive);
            }
            Err(e) => tracing::warn!("Failed to preload {}: {}", path, e),
        }
    }

    if !request.is_explicit_folder(folder) {
        context.add_folder(folder);
    }
}
