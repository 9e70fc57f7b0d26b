use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid request URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Network request failed for {0}")]
    Transport(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    // The API answers 200 with a plain-text JSON body instead of the archive.
    #[error("API error: {message} ({code})")]
    RemoteApi {
        code: String,
        message: String,
        status: String,
    },

    #[error("Unreadable API error response: {body}")]
    MalformedErrorBody {
        body: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// The remote host could not be reached or the response could not be read.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FetchError::Transport(..) | FetchError::HttpStatus { .. }
        )
    }

    /// The API was reached and answered with an error payload.
    pub fn is_remote_api(&self) -> bool {
        matches!(
            self,
            FetchError::RemoteApi { .. } | FetchError::MalformedErrorBody { .. }
        )
    }
}
