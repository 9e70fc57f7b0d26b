use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("'{0}' does not have an .xml extension")]
    NotXml(PathBuf),

    #[error("Failed to read XML file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse XML")]
    Xml(#[from] quick_xml::Error),

    #[error("Unexpected closing tag </{0}>")]
    UnexpectedEnd(String),

    #[error("Element <{0}> is never closed")]
    Unclosed(String),

    #[error("Document has no root element")]
    EmptyDocument,

    #[error("Failed to serialize JSON")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write JSON file '{0}'")]
    Write(PathBuf, #[source] std::io::Error),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
