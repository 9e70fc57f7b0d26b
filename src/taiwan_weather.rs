//! This module provides the main entry point of the crate: a client that
//! downloads the forecast archive and extracts the files you ask for.

use crate::archive::matcher::FileMatcher;
use crate::archive::pipeline::{ArchivePipeline, PipelineReport};
use crate::archive::writer::EntryWriter;
use crate::error::TaiwanWeatherError;
use crate::fetch::endpoint::Endpoint;
use crate::fetch::error::FetchError;
use crate::fetch::fetcher::{ArchiveFetcher, FetchedArchive};
use crate::observer::{LogObserver, PipelineEvent, PipelineObserver, PipelineStage};
use crate::types::codes::DEFAULT_DATA_ID;
use crate::types::options::DownloadOptions;
use bon::bon;
use reqwest::Client;
use std::sync::Arc;

/// Client for the Central Weather Administration open data archive.
///
/// # Examples
///
/// ```no_run
/// # use taiwan_weather::{TaiwanWeather, TaiwanWeatherError, DownloadOptions, Location, Frequency, Language};
/// # #[tokio::main]
/// # async fn main() -> Result<(), TaiwanWeatherError> {
/// let client = TaiwanWeather::builder().api_key("CWB-YOUR-KEY").build();
///
/// let report = client
///     .download(
///         DownloadOptions::builder()
///             .locations(Location::HsinchuCity)
///             .frequencies(Frequency::Weekday)
///             .languages(Language::English)
///             .output_dir("data")
///             .emit_json(true)
///             .build(),
///     )
///     .await?;
/// println!("Wrote {} files", report.written.len());
/// # Ok(())
/// # }
/// ```
pub struct TaiwanWeather {
    fetcher: ArchiveFetcher,
    observer: Arc<dyn PipelineObserver>,
}

#[bon]
impl TaiwanWeather {
    /// Creates a client.
    ///
    /// # Arguments
    ///
    /// * `.api_key(String)`: Optional. Without one the API answers with an
    ///   authentication error, which surfaces as [`FetchError::RemoteApi`].
    /// * `.endpoint(Endpoint)`: Optional. Defaults to [`Endpoint::legacy()`].
    /// * `.data_id(String)`: Optional. Defaults to [`DEFAULT_DATA_ID`].
    /// * `.client(reqwest::Client)`: Optional HTTP client to reuse.
    /// * `.observer(Arc<dyn PipelineObserver>)`: Optional. Defaults to [`LogObserver`].
    #[builder]
    pub fn new(
        #[builder(into)] api_key: Option<String>,
        endpoint: Option<Endpoint>,
        #[builder(into)] data_id: Option<String>,
        client: Option<Client>,
        observer: Option<Arc<dyn PipelineObserver>>,
    ) -> Self {
        let observer = observer.unwrap_or_else(|| Arc::new(LogObserver));
        let fetcher = ArchiveFetcher::new(
            client.unwrap_or_default(),
            endpoint.unwrap_or_default(),
            data_id.unwrap_or_else(|| DEFAULT_DATA_ID.to_string()),
            api_key,
            observer.clone(),
        );
        Self { fetcher, observer }
    }

    /// Requests the archive and returns its body as an open stream, without
    /// extracting anything.
    pub async fn fetch(&self) -> Result<FetchedArchive, FetchError> {
        self.fetcher.fetch().await
    }

    /// Downloads the archive and extracts the files selected by `options`.
    ///
    /// Options are validated before any request is made. Transport and API
    /// errors abort before anything is written. Once the archive is being
    /// decoded, failures of individual files are collected in the returned
    /// [`PipelineReport`] instead of failing the call.
    pub async fn download(
        &self,
        options: DownloadOptions,
    ) -> Result<PipelineReport, TaiwanWeatherError> {
        options.validate()?;
        let matcher = FileMatcher::new(&options.locations, &options.frequencies, &options.languages)?;
        let writer = EntryWriter::new(
            options.output_dir,
            options.prefix,
            options.emit_json,
            self.observer.clone(),
        );
        let pipeline =
            ArchivePipeline::new(matcher, writer, options.completion, self.observer.clone());

        self.observer
            .on_event(PipelineEvent::Stage(PipelineStage::Fetching));
        let archive = match self.fetcher.fetch().await {
            Ok(archive) => archive,
            Err(e) => {
                self.observer
                    .on_event(PipelineEvent::Stage(PipelineStage::Failed));
                return Err(e.into());
            }
        };

        Ok(pipeline.run(archive.into_reader()).await?)
    }
}
