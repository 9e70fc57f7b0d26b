use crate::archive::entry::ArchiveEntry;
use crate::archive::error::WriteError;
use crate::convert::convert_file;
use crate::observer::{PipelineEvent, PipelineObserver};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Result of persisting one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenEntry {
    pub path: PathBuf,
    pub bytes: u64,
    /// Set when a JSON twin was requested and produced.
    pub json: Option<PathBuf>,
}

/// Persists matching entries as `<output_dir>/<prefix><file name>`.
#[derive(Clone)]
pub struct EntryWriter {
    output_dir: PathBuf,
    prefix: String,
    emit_json: bool,
    observer: Arc<dyn PipelineObserver>,
}

impl EntryWriter {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        emit_json: bool,
        observer: Arc<dyn PipelineObserver>,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            prefix: prefix.into(),
            emit_json,
            observer,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn target_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(format!("{}{}", self.prefix, file_name))
    }

    /// Writes the entry, replacing any existing file. Bytes are only pulled
    /// from the entry once the destination file is open.
    ///
    /// When JSON output is enabled the written file is converted afterwards;
    /// a failed conversion is reported to the observer and leaves
    /// [`WrittenEntry::json`] empty, it never fails the write.
    pub async fn write(&self, entry: ArchiveEntry) -> Result<WrittenEntry, WriteError> {
        let target = self.target_path(entry.file_name());
        match self.write_to(entry, &target).await {
            Ok(bytes) => {
                self.observer.on_event(PipelineEvent::EntryWritten {
                    path: target.clone(),
                    bytes,
                });
                let json = if self.emit_json {
                    self.convert(&target).await
                } else {
                    None
                };
                Ok(WrittenEntry {
                    path: target,
                    bytes,
                    json,
                })
            }
            Err(e) => {
                self.observer.on_event(PipelineEvent::WriteFailed {
                    path: target,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn write_to(&self, mut entry: ArchiveEntry, target: &Path) -> Result<u64, WriteError> {
        let mut file = File::create(target)
            .await
            .map_err(|e| WriteError::Open(target.to_path_buf(), e))?;

        let mut bytes = 0u64;
        loop {
            let chunk = match entry.next_chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => return Err(WriteError::Source(target.to_path_buf(), e)),
            };
            file.write_all(&chunk)
                .await
                .map_err(|e| WriteError::Write(target.to_path_buf(), e))?;
            bytes += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| WriteError::Write(target.to_path_buf(), e))?;
        Ok(bytes)
    }

    async fn convert(&self, xml_path: &Path) -> Option<PathBuf> {
        match convert_file(xml_path).await {
            Ok(json_path) => {
                self.observer
                    .on_event(PipelineEvent::JsonWritten(json_path.clone()));
                Some(json_path)
            }
            Err(e) => {
                self.observer.on_event(PipelineEvent::ConversionFailed {
                    path: xml_path.to_path_buf(),
                    error: e.to_string(),
                });
                None
            }
        }
    }
}
