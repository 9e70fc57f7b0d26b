use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Failed to create output directory '{0}'")]
    OutputDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Output path '{0}' exists but is not a directory")]
    OutputNotDirectory(PathBuf),

    #[error("Malformed or truncated archive: {0}")]
    Decode(String),

    #[error("Unsupported archive entry '{entry}': {reason}")]
    Unsupported { entry: String, reason: String },

    #[error("Failed to read archive stream")]
    Read(#[source] std::io::Error),

    // Entry data could not be read: corrupt compression, bad checksum or a broken download stream
    #[error("Failed to read archive entry '{entry}'")]
    EntryData {
        entry: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// Failure persisting one archive entry. Never aborts sibling entries.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to create file '{0}'")]
    Open(PathBuf, #[source] std::io::Error),

    #[error("Failed to write file '{0}'")]
    Write(PathBuf, #[source] std::io::Error),

    #[error("Archive stream ended while writing '{0}'")]
    Source(PathBuf, #[source] std::io::Error),

    #[error("Write task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl WriteError {
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            WriteError::Open(path, _) | WriteError::Write(path, _) | WriteError::Source(path, _) => {
                Some(path)
            }
            WriteError::TaskJoin(_) => None,
        }
    }
}
