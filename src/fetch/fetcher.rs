use crate::fetch::endpoint::{Endpoint, FetchRequest};
use crate::fetch::error::FetchError;
use crate::observer::{PipelineEvent, PipelineObserver};
use futures_util::TryStreamExt;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::io;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;

// Body of a soft failure, e.g. {"code":"A-0001","message":"Invalid authentication information","status":"Fail"}
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: String,
    message: String,
    #[serde(default)]
    status: String,
}

/// Issues the archive request and separates real archives from soft failures.
pub struct ArchiveFetcher {
    client: Client,
    endpoint: Endpoint,
    data_id: String,
    api_key: Option<String>,
    observer: Arc<dyn PipelineObserver>,
}

impl ArchiveFetcher {
    pub fn new(
        client: Client,
        endpoint: Endpoint,
        data_id: String,
        api_key: Option<String>,
        observer: Arc<dyn PipelineObserver>,
    ) -> Self {
        Self {
            client,
            endpoint,
            data_id,
            api_key,
            observer,
        }
    }

    pub fn request(&self) -> Result<FetchRequest, FetchError> {
        FetchRequest::new(&self.endpoint, &self.data_id, self.api_key.as_deref())
    }

    /// Sends a single GET request. No retries.
    ///
    /// The API answers `200 OK` even for invalid requests; those responses
    /// carry a `text/plain` content type and a small JSON body, which is
    /// buffered and turned into [`FetchError::RemoteApi`].
    pub async fn fetch(&self) -> Result<FetchedArchive, FetchError> {
        let request = self.request()?;
        if !request.has_api_key() {
            self.observer.on_event(PipelineEvent::MissingApiKey);
        }
        self.observer.on_event(PipelineEvent::Requesting {
            url: request.redacted_url().to_string(),
        });

        let response = self
            .client
            .get(request.url().clone())
            .send()
            .await
            .map_err(|e| FetchError::Transport(request.redacted_url().to_string(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                let url = request.redacted_url().to_string();
                return Err(if let Some(status) = e.status() {
                    FetchError::HttpStatus {
                        url,
                        status,
                        source: e,
                    }
                } else {
                    FetchError::Transport(url, e)
                });
            }
        };

        if is_soft_failure(response.headers()) {
            let err = self.read_soft_failure(response, &request).await;
            if let FetchError::RemoteApi { code, message, .. } = &err {
                self.observer.on_event(PipelineEvent::RemoteApiFailure {
                    code: code.clone(),
                    message: message.clone(),
                });
            }
            return Err(err);
        }

        Ok(FetchedArchive { response })
    }

    async fn read_soft_failure(&self, response: Response, request: &FetchRequest) -> FetchError {
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => return FetchError::Transport(request.redacted_url().to_string(), e),
        };
        match serde_json::from_slice::<ApiErrorBody>(&body) {
            Ok(parsed) => FetchError::RemoteApi {
                code: parsed.code,
                message: parsed.message,
                status: parsed.status,
            },
            Err(source) => FetchError::MalformedErrorBody {
                body: String::from_utf8_lossy(&body).into_owned(),
                source,
            },
        }
    }
}

/// Soft failures are the only responses with a plain-text content type.
fn is_soft_failure(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|media_type| media_type.trim().eq_ignore_ascii_case("text/plain"))
        .unwrap_or(false)
}

/// A successful response whose body is the ZIP archive.
#[derive(Debug)]
pub struct FetchedArchive {
    response: Response,
}

impl FetchedArchive {
    pub fn content_length(&self) -> Option<u64> {
        self.response.content_length()
    }

    /// The response body as an async byte stream. Nothing is buffered up front.
    pub fn into_reader(self) -> impl AsyncRead + Send + Unpin + 'static {
        let stream = self
            .response
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
        StreamReader::new(Box::pin(stream))
    }
}
