//! Conversion of written XML forecast files into JSON twins.

pub mod cleanup;
pub mod error;
pub mod xml_tree;

use crate::convert::cleanup::clean_json;
use crate::convert::error::ConvertError;
use crate::convert::xml_tree::xml_to_json;
use std::path::{Path, PathBuf};
use tokio::{fs, task};

/// `63_Weekday_EN.xml` -> `63_Weekday_EN.json`. Only a trailing `.xml`
/// (any case) is replaced; anything else is refused.
pub fn json_path_for(xml_path: &Path) -> Result<PathBuf, ConvertError> {
    match xml_path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("xml") => Ok(xml_path.with_extension("json")),
        _ => Err(ConvertError::NotXml(xml_path.to_path_buf())),
    }
}

/// Converts an XML document to compact, cleaned JSON text.
pub fn convert_str(xml: &str) -> Result<String, ConvertError> {
    let value = xml_to_json(xml)?;
    let json = serde_json::to_string(&value)?;
    Ok(clean_json(&json))
}

/// Reads `xml_path` fully, converts it and writes the JSON next to it,
/// overwriting any existing file. Returns the JSON path.
pub async fn convert_file(xml_path: &Path) -> Result<PathBuf, ConvertError> {
    let json_path = json_path_for(xml_path)?;
    let xml = fs::read_to_string(xml_path)
        .await
        .map_err(|e| ConvertError::Read(xml_path.to_path_buf(), e))?;

    let json = task::spawn_blocking(move || convert_str(&xml)).await??;

    fs::write(&json_path, json)
        .await
        .map_err(|e| ConvertError::Write(json_path.clone(), e))?;
    Ok(json_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_path_replaces_only_the_extension() {
        assert_eq!(
            json_path_for(Path::new("out/63_Weekday_EN.xml")).unwrap(),
            PathBuf::from("out/63_Weekday_EN.json")
        );
        assert_eq!(
            json_path_for(Path::new("out/x.xml_63_Weekday_EN.XML")).unwrap(),
            PathBuf::from("out/x.xml_63_Weekday_EN.json")
        );
    }

    #[test]
    fn json_path_requires_xml_extension() {
        for path in ["out/63_Weekday_EN.json", "out/README", "out/data.xml.bak"] {
            assert!(matches!(
                json_path_for(Path::new(path)),
                Err(ConvertError::NotXml(_))
            ));
        }
    }

    #[test]
    fn converts_and_cleans() {
        assert_eq!(
            convert_str("<root><a>  1  </a></root>").unwrap(),
            r#"{"root":[{"a":["1"]}]}"#
        );
    }

    #[tokio::test]
    async fn convert_file_writes_json_twin() {
        let dir = tempfile::tempdir().unwrap();
        let xml_path = dir.path().join("63_Weekday_EN.xml");
        fs::write(&xml_path, "<root>\n  <a>  1  </a>\n</root>\n").await.unwrap();
        // stale content must be overwritten
        fs::write(dir.path().join("63_Weekday_EN.json"), "old").await.unwrap();

        let json_path = convert_file(&xml_path).await.unwrap();

        assert_eq!(json_path, dir.path().join("63_Weekday_EN.json"));
        let json = fs::read_to_string(&json_path).await.unwrap();
        assert_eq!(json, r#"{"root":[{"a":["1"]}]}"#);
    }

    #[tokio::test]
    async fn convert_file_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let xml_path = dir.path().join("bad.xml");
        fs::write(&xml_path, "<root><a></root>").await.unwrap();

        assert!(convert_file(&xml_path).await.is_err());
        assert!(!dir.path().join("bad.json").exists());
    }

    #[tokio::test]
    async fn convert_file_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = convert_file(&dir.path().join("missing.xml")).await.unwrap_err();
        assert!(matches!(err, ConvertError::Read(..)));
    }
}
