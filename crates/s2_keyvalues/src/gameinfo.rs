use crate::error::{DecodeError, Result};
use crate::parser::parse;
use crate::value::{Document, Value};
use serde::Serialize;

const GAMEINFO_PATH_TOKEN: &str = "|gameinfo_path|";
const ALL_SOURCE_ENGINE_PATHS_TOKEN: &str = "|all_source_engine_paths|";

/// One `FileSystem.SearchPaths` entry, e.g. `Game citadel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchPath {
    pub key: String,
    pub value: String,
}

/// What a search path value is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SearchPathBase {
    /// The folder above the mod folder, i.e. the `game/` directory.
    GameRoot,
    /// The folder that holds the `gameinfo.gi` file itself.
    GameInfoDir,
}

impl SearchPath {
    pub fn is_game(&self) -> bool {
        self.key.eq_ignore_ascii_case("Game")
    }

    /// Split the value into its base and relative part.
    ///
    /// Returns `None` for values starting with a `|token|` we don't understand.
    pub fn relative(&self) -> Option<(SearchPathBase, &str)> {
        let value = self.value.as_str();
        if let Some(rest) = strip_prefix_ignore_case(value, GAMEINFO_PATH_TOKEN) {
            return Some((SearchPathBase::GameInfoDir, rest));
        }
        if let Some(rest) = strip_prefix_ignore_case(value, ALL_SOURCE_ENGINE_PATHS_TOKEN) {
            return Some((SearchPathBase::GameRoot, rest));
        }
        if value.starts_with('|') {
            return None;
        }
        Some((SearchPathBase::GameRoot, value))
    }
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &value[prefix.len()..])
}

/// The parts of a `gameinfo.gi` descriptor the file resolver cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameInfo {
    /// `GameInfo.game`, the display name, when present.
    pub game: Option<String>,
    /// Every `FileSystem.SearchPaths` entry in declaration order.
    pub search_paths: Vec<SearchPath>,
}

impl GameInfo {
    pub fn parse(text: &str) -> Result<Self> {
        Self::from_document(&parse(text)?)
    }

    pub fn from_document(doc: &Document) -> Result<Self> {
        if !doc.root_key.eq_ignore_ascii_case("GameInfo") {
            return Err(DecodeError::UnexpectedRoot {
                expected: "GameInfo",
                found: doc.root_key.clone(),
            });
        }

        let search_paths = doc
            .root
            .path(&["FileSystem", "SearchPaths"])
            .ok_or_else(|| DecodeError::MissingKey("FileSystem.SearchPaths".to_string()))?
            .iter()
            .filter_map(|(key, value)| match value {
                Value::String(value) => Some(SearchPath {
                    key: key.to_string(),
                    value: value.clone(),
                }),
                Value::Object(_) => None,
            })
            .collect();

        Ok(Self {
            game: doc.root.get_str("game").map(str::to_string),
            search_paths,
        })
    }

    /// Raw values of the `Game` search paths, in order.
    pub fn game_search_paths(&self) -> impl Iterator<Item = &str> {
        self.search_paths
            .iter()
            .filter(|p| p.is_game())
            .map(|p| p.value.as_str())
    }

    /// `Game` search paths split into base and relative part. Unknown tokens are skipped.
    pub fn game_folders(&self) -> impl Iterator<Item = (SearchPathBase, &str)> {
        self.search_paths
            .iter()
            .filter(|p| p.is_game())
            .filter_map(|p| {
                let relative = p.relative();
                if relative.is_none() {
                    tracing::debug!("Skipping search path with unknown token: {}", p.value);
                }
                relative
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEADLOCK_GAMEINFO: &str = r#"
"GameInfo"
{
    game        "Citadel"
    title       "Citadel"
    FileSystem
    {
        SearchPaths
        {
            Game_Language   citadel_*LANGUAGE*
            Game            citadel
            Mod             citadel
            Write           citadel
            Game            core
            Game            |gameinfo_path|extra
            Game            |all_source_engine_paths|shared
            Game            |weird_token|nope
        }
    }
}
"#;

    #[test]
    fn test_parse_search_paths_in_order() {
        let info = GameInfo::parse(DEADLOCK_GAMEINFO).unwrap();
        assert_eq!(info.game.as_deref(), Some("Citadel"));
        assert_eq!(info.search_paths.len(), 8);
        assert_eq!(info.search_paths[0].key, "Game_Language");
    }

    #[test]
    fn test_only_game_entries_are_reported() {
        let info = GameInfo::parse(DEADLOCK_GAMEINFO).unwrap();
        let games: Vec<_> = info.game_search_paths().collect();
        assert_eq!(
            games,
            vec![
                "citadel",
                "core",
                "|gameinfo_path|extra",
                "|all_source_engine_paths|shared",
                "|weird_token|nope",
            ]
        );
    }

    #[test]
    fn test_game_folders_resolve_tokens() {
        let info = GameInfo::parse(DEADLOCK_GAMEINFO).unwrap();
        let folders: Vec<_> = info.game_folders().collect();
        assert_eq!(
            folders,
            vec![
                (SearchPathBase::GameRoot, "citadel"),
                (SearchPathBase::GameRoot, "core"),
                (SearchPathBase::GameInfoDir, "extra"),
                (SearchPathBase::GameRoot, "shared"),
            ]
        );
    }

    #[test]
    fn test_wrong_root_key() {
        let err = GameInfo::parse("AppState { appid 1 }").unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedRoot { .. }));
    }

    #[test]
    fn test_missing_search_paths() {
        let err = GameInfo::parse("GameInfo { FileSystem { } }").unwrap_err();
        assert_eq!(
            err,
            DecodeError::MissingKey("FileSystem.SearchPaths".to_string())
        );
    }

    #[test]
    fn test_malformed_text_is_a_parse_error() {
        let err = GameInfo::parse("GameInfo { FileSystem { SearchPaths {").unwrap_err();
        assert!(matches!(err, DecodeError::Parse(_)));
    }

    #[test]
    fn test_serializes_to_json() {
        let info = GameInfo::parse("GameInfo { FileSystem { SearchPaths { Game core } } }").unwrap();
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("\"search_paths\""));
        assert!(json.contains("\"core\""));
    }
}
