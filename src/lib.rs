mod archive;
mod convert;
mod error;
mod fetch;
mod observer;
mod taiwan_weather;
mod types;
mod utils;

pub use error::TaiwanWeatherError;
pub use taiwan_weather::*;

pub use types::codes::{Category, Code, Frequency, Language, Location, DEFAULT_DATA_ID};
pub use types::options::{CompletionPolicy, DownloadOptions};
pub use types::selector::Selector;

pub use fetch::endpoint::{Endpoint, FetchRequest, FILE_API_BASE_URL, LEGACY_BASE_URL};
pub use fetch::fetcher::{ArchiveFetcher, FetchedArchive};

pub use archive::entry::ArchiveEntry;
pub use archive::matcher::FileMatcher;
pub use archive::pipeline::{ArchivePipeline, PipelineReport};
pub use archive::writer::{EntryWriter, WrittenEntry};

pub use convert::{convert_file, convert_str, json_path_for};

pub use observer::{LogObserver, PipelineEvent, PipelineObserver, PipelineStage};

pub use archive::error::{ArchiveError, WriteError};
pub use convert::error::ConvertError;
pub use fetch::error::FetchError;
pub use types::error::{ConfigError, ParseCodeError};
