use crate::archive::decoder::spawn_decoder;
use crate::archive::error::{ArchiveError, WriteError};
use crate::archive::matcher::FileMatcher;
use crate::archive::writer::{EntryWriter, WrittenEntry};
use crate::observer::{PipelineEvent, PipelineObserver, PipelineStage};
use crate::types::options::CompletionPolicy;
use crate::utils::ensure_output_dir_exists;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::task::JoinSet;

/// What a pipeline run did.
#[derive(Debug)]
pub struct PipelineReport {
    /// Files written, in the order their writes finished.
    pub written: Vec<PathBuf>,
    pub converted: Vec<PathBuf>,
    /// Entries discarded unwritten: non-matching ones, and later entries
    /// whose file name was already taken by an earlier one.
    pub drained: usize,
    /// Per-entry failures; they do not fail the run.
    pub write_failures: Vec<WriteError>,
    /// Writes left running by [`CompletionPolicy::DecoderEnd`].
    pub detached: usize,
    pub completion: CompletionPolicy,
}

impl PipelineReport {
    fn new(completion: CompletionPolicy) -> Self {
        Self {
            written: Vec::new(),
            converted: Vec::new(),
            drained: 0,
            write_failures: Vec::new(),
            detached: 0,
            completion,
        }
    }

    fn record(&mut self, outcome: Result<Result<WrittenEntry, WriteError>, tokio::task::JoinError>) {
        match outcome {
            Ok(Ok(written)) => {
                self.written.push(written.path);
                self.converted.extend(written.json);
            }
            Ok(Err(e)) => self.write_failures.push(e),
            Err(e) => self.write_failures.push(WriteError::TaskJoin(e)),
        }
    }
}

/// Unzips an archive stream, keeping the entries accepted by the matcher.
pub struct ArchivePipeline {
    matcher: FileMatcher,
    writer: EntryWriter,
    completion: CompletionPolicy,
    observer: Arc<dyn PipelineObserver>,
}

impl ArchivePipeline {
    pub fn new(
        matcher: FileMatcher,
        writer: EntryWriter,
        completion: CompletionPolicy,
        observer: Arc<dyn PipelineObserver>,
    ) -> Self {
        Self {
            matcher,
            writer,
            completion,
            observer,
        }
    }

    /// Runs the archive through the decoder, writing every matching entry
    /// and draining the rest.
    ///
    /// The output directory is created first (non-recursively) if missing.
    /// Archive paths are flattened to their file name; when two matching
    /// entries share a file name (ignoring case) only the first is written.
    /// Matching entries are written concurrently with further decoding.
    /// With [`CompletionPolicy::JoinWrites`] all writes (and their JSON
    /// conversions) have finished when this returns, even on a decode error.
    ///
    /// A decode error is returned as the run's error; files written before
    /// it stay on disk. Write failures are collected in the report.
    pub async fn run<R>(&self, reader: R) -> Result<PipelineReport, ArchiveError>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let created =
            ensure_output_dir_exists(self.writer.output_dir(), self.observer.as_ref()).await;
        if let Err(e) = created {
            self.observer
                .on_event(PipelineEvent::Stage(PipelineStage::Failed));
            return Err(e);
        }
        self.observer
            .on_event(PipelineEvent::Stage(PipelineStage::Decoding));

        let mut report = PipelineReport::new(self.completion);
        let mut writes = JoinSet::new();
        // lower-cased file names already being written
        let mut claimed = HashSet::new();
        let (mut entries, decoder) = spawn_decoder(reader);

        while let Some(entry) = entries.recv().await {
            let wanted = !entry.is_dir() && self.matcher.is_match(entry.file_name());
            if wanted && !claimed.insert(entry.file_name().to_lowercase()) {
                self.observer.on_event(PipelineEvent::DuplicateEntry {
                    entry: entry.path().to_string(),
                    path: self.writer.target_path(entry.file_name()),
                });
                report.drained += 1;
                let _ = entry.drain().await;
            } else if wanted {
                let writer = self.writer.clone();
                writes.spawn(async move { writer.write(entry).await });
            } else {
                self.observer
                    .on_event(PipelineEvent::EntryDrained(entry.path().to_string()));
                report.drained += 1;
                // a read error here resurfaces from the decoder
                let _ = entry.drain().await;
            }
        }

        let decoded = decoder.await;

        match self.completion {
            CompletionPolicy::JoinWrites => {
                while let Some(outcome) = writes.join_next().await {
                    report.record(outcome);
                }
            }
            CompletionPolicy::DecoderEnd => {
                report.detached = writes.len();
                if report.detached > 0 {
                    self.observer
                        .on_event(PipelineEvent::WritesDetached(report.detached));
                }
                writes.detach_all();
            }
        }

        match decoded.map_err(ArchiveError::from).and_then(|result| result) {
            Ok(_) => {
                self.observer
                    .on_event(PipelineEvent::Stage(PipelineStage::Completed));
                Ok(report)
            }
            Err(e) => {
                self.observer
                    .on_event(PipelineEvent::Stage(PipelineStage::Failed));
                Err(e)
            }
        }
    }
}
