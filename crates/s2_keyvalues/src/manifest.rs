use crate::error::{DecodeError, Result};
use crate::parser::parse;
use crate::value::Document;
use serde::Serialize;

/// A Steam `appmanifest_<appid>.acf` file.
///
/// ```text
/// "AppState"
/// {
///     "appid"       "1422450"
///     "name"        "Deadlock"
///     "installdir"  "Deadlock"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppManifest {
    pub app_id: Option<String>,
    pub name: Option<String>,
    /// Folder name under `steamapps/common/`.
    pub install_dir: String,
}

impl AppManifest {
    pub fn parse(text: &str) -> Result<Self> {
        Self::from_document(&parse(text)?)
    }

    pub fn from_document(doc: &Document) -> Result<Self> {
        if !doc.root_key.eq_ignore_ascii_case("AppState") {
            return Err(DecodeError::UnexpectedRoot {
                expected: "AppState",
                found: doc.root_key.clone(),
            });
        }

        let install_dir = doc
            .root
            .get_str("installdir")
            .filter(|dir| !dir.is_empty())
            .ok_or_else(|| DecodeError::MissingKey("installdir".to_string()))?;

        Ok(Self {
            app_id: doc.root.get_str("appid").map(str::to_string),
            name: doc.root.get_str("name").map(str::to_string),
            install_dir: install_dir.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest() {
        let manifest = AppManifest::parse(
            r#"
"AppState"
{
    "appid"         "1422450"
    "Universe"      "1"
    "name"          "Deadlock"
    "installdir"    "Deadlock"
    "UserConfig"
    {
        "language"  "english"
    }
}
"#,
        )
        .unwrap();

        assert_eq!(manifest.app_id.as_deref(), Some("1422450"));
        assert_eq!(manifest.name.as_deref(), Some("Deadlock"));
        assert_eq!(manifest.install_dir, "Deadlock");
    }

    #[test]
    fn test_missing_install_dir() {
        let err = AppManifest::parse(r#""AppState" { "appid" "570" }"#).unwrap_err();
        assert_eq!(err, DecodeError::MissingKey("installdir".to_string()));
    }

    #[test]
    fn test_empty_install_dir_is_rejected() {
        let err = AppManifest::parse(r#""AppState" { "installdir" "" }"#).unwrap_err();
        assert_eq!(err, DecodeError::MissingKey("installdir".to_string()));
    }
}
