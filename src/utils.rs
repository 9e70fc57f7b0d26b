use crate::archive::error::ArchiveError;
use crate::observer::{PipelineEvent, PipelineObserver};
use std::io;
use std::path::Path;

/// Creates the output directory if it does not exist yet. Only the last
/// path component is created; a missing parent is an error.
pub async fn ensure_output_dir_exists(
    path: &Path,
    observer: &dyn PipelineObserver,
) -> Result<(), ArchiveError> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(ArchiveError::OutputNotDirectory(path.to_path_buf()));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            observer.on_event(PipelineEvent::CreatingOutputDir(path.to_path_buf()));
            match tokio::fs::create_dir(path).await {
                Ok(()) => Ok(()),
                // created concurrently by someone else
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
                Err(e) => Err(ArchiveError::OutputDirCreation(path.to_path_buf(), e)),
            }
        }
        Err(e) => Err(ArchiveError::OutputDirCreation(path.to_path_buf(), e)),
    }
}
