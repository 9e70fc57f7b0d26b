//! taiwan-weather CLI - download forecast files from the CWA open data archive

use chrono::Utc;
use clap::{Parser, ValueEnum};
use log::{error, info, warn};
use std::path::PathBuf;
use std::process;
use taiwan_weather::{
    Code, CompletionPolicy, DownloadOptions, Endpoint, Frequency, Language, Location, Selector,
    TaiwanWeather, TaiwanWeatherError,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EndpointKind {
    /// <base>?dataid=<id>&authorizationkey=<key>
    Legacy,
    /// <base>/<id>?format=ZIP&Authorization=<key>
    FileApi,
}

#[derive(Debug, Parser)]
#[command(
    name = "taiwan-weather",
    version,
    about = "Download Taiwan weather forecast files (XML, optionally JSON)"
)]
struct Cli {
    /// API key of the open data platform
    #[arg(long, env = "CWB_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Location code or name (e.g. 63, taipei-city). Repeatable; all locations when omitted
    #[arg(short, long = "location", value_name = "LOCATION")]
    locations: Vec<Location>,

    /// Frequency: weekday or 72hr. Repeatable; both when omitted
    #[arg(short, long = "frequency", value_name = "FREQUENCY")]
    frequencies: Vec<Frequency>,

    /// Language: en or zh. Repeatable; both when omitted
    #[arg(short = 'g', long = "language", value_name = "LANGUAGE")]
    languages: Vec<Language>,

    /// Output directory, created if missing
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Prefix for every written file name
    #[arg(short, long, default_value = "")]
    prefix: String,

    /// Use "<unix millis>_" as the file name prefix
    #[arg(long, conflicts_with = "prefix")]
    timestamp_prefix: bool,

    /// Also write a JSON file next to every XML file
    #[arg(long)]
    json: bool,

    #[arg(long, value_enum, default_value_t = EndpointKind::Legacy)]
    endpoint: EndpointKind,

    /// Override the endpoint base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn endpoint(&self) -> Endpoint {
        match (self.endpoint, self.base_url.clone()) {
            (EndpointKind::Legacy, None) => Endpoint::legacy(),
            (EndpointKind::FileApi, None) => Endpoint::file_api(),
            (EndpointKind::Legacy, Some(base)) => Endpoint::Legacy { base },
            (EndpointKind::FileApi, Some(base)) => Endpoint::FileApi { base },
        }
    }

    fn download_options(&self) -> DownloadOptions {
        let prefix = if self.timestamp_prefix {
            format!("{}_", Utc::now().timestamp_millis())
        } else {
            self.prefix.clone()
        };

        DownloadOptions::builder()
            .locations(selector(&self.locations))
            .frequencies(selector(&self.frequencies))
            .languages(selector(&self.languages))
            .output_dir(self.output.clone())
            .prefix(prefix)
            .emit_json(self.json)
            .completion(CompletionPolicy::JoinWrites)
            .build()
    }
}

/// Nothing given on the command line means every code.
fn selector<T: Code>(values: &[T]) -> Selector {
    if values.is_empty() {
        Selector::all::<T>()
    } else {
        Selector::only(values.iter().copied())
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // Also captures records from the `log` facade.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

async fn execute(cli: &Cli) -> Result<(), TaiwanWeatherError> {
    let client = TaiwanWeather::builder()
        .maybe_api_key(cli.api_key.clone())
        .endpoint(cli.endpoint())
        .build();

    let report = client.download(cli.download_options()).await?;

    for failure in &report.write_failures {
        warn!("{}", failure);
    }
    info!(
        "Done: {} written, {} converted to JSON, {} skipped, {} failed",
        report.written.len(),
        report.converted.len(),
        report.drained,
        report.write_failures.len()
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = execute(&cli).await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
