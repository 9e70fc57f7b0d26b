//! Progress and diagnostics reporting.
//!
//! Components never log on their own; they report [`PipelineEvent`]s to the
//! [`PipelineObserver`] they were constructed with. [`LogObserver`] forwards
//! everything to the `log` facade and is what [`crate::TaiwanWeather`] uses
//! unless told otherwise.

use log::{debug, error, info, warn};
use std::path::PathBuf;

/// Stages of a single download run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Fetching,
    Decoding,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Stage(PipelineStage),
    /// The request is sent without an API key; the server will answer with a soft failure.
    MissingApiKey,
    /// `url` has the API key redacted.
    Requesting { url: String },
    RemoteApiFailure { code: String, message: String },
    CreatingOutputDir(PathBuf),
    EntryDrained(String),
    /// A matching entry whose output file is already claimed by an earlier entry.
    DuplicateEntry { entry: String, path: PathBuf },
    EntryWritten { path: PathBuf, bytes: u64 },
    WriteFailed { path: PathBuf, error: String },
    JsonWritten(PathBuf),
    ConversionFailed { path: PathBuf, error: String },
    /// Writes left running after a [`crate::CompletionPolicy::DecoderEnd`] completion.
    WritesDetached(usize),
}

pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: PipelineEvent);
}

/// Forwards events to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl PipelineObserver for LogObserver {
    fn on_event(&self, event: PipelineEvent) {
        match event {
            PipelineEvent::Stage(stage) => info!("Pipeline stage: {:?}", stage),
            PipelineEvent::MissingApiKey => warn!("No API key provided"),
            PipelineEvent::Requesting { url } => info!("Requesting {}", url),
            PipelineEvent::RemoteApiFailure { code, message } => {
                error!("API answered with an error: {} ({})", message, code)
            }
            PipelineEvent::CreatingOutputDir(path) => {
                info!("Creating output directory: {}", path.display())
            }
            PipelineEvent::EntryDrained(name) => debug!("Skipping archive entry {}", name),
            PipelineEvent::DuplicateEntry { entry, path } => warn!(
                "Skipping archive entry {}: {} is already written by an earlier entry",
                entry,
                path.display()
            ),
            PipelineEvent::EntryWritten { path, bytes } => {
                info!("Wrote XML file {} ({} bytes)", path.display(), bytes)
            }
            PipelineEvent::WriteFailed { path, error } => {
                warn!("Writing file {} failed: {}", path.display(), error)
            }
            PipelineEvent::JsonWritten(path) => info!("Wrote JSON file {}", path.display()),
            PipelineEvent::ConversionFailed { path, error } => {
                error!("Converting {} to JSON failed: {}", path.display(), error)
            }
            PipelineEvent::WritesDetached(count) => {
                warn!("{} file writes still running after the archive ended", count)
            }
        }
    }
}
