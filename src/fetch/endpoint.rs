//! Request URL construction for the open data API.

use crate::fetch::error::FetchError;
use reqwest::Url;

pub const LEGACY_BASE_URL: &str = "http://opendata.cwb.gov.tw/opendataapi";
pub const FILE_API_BASE_URL: &str = "https://opendata.cwa.gov.tw/fileapi/v1/opendataapi";

const REDACTED: &str = "REDACTED";

/// The two URL layouts the API has been deployed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `GET <base>?dataid=<type>&authorizationkey=<key>`
    Legacy { base: String },
    /// `GET <base>/<type>?format=ZIP&Authorization=<key>`
    FileApi { base: String },
}

impl Default for Endpoint {
    fn default() -> Self {
        Endpoint::legacy()
    }
}

impl Endpoint {
    pub fn legacy() -> Self {
        Endpoint::Legacy {
            base: LEGACY_BASE_URL.to_string(),
        }
    }

    pub fn file_api() -> Self {
        Endpoint::FileApi {
            base: FILE_API_BASE_URL.to_string(),
        }
    }

    fn build(&self, data_id: &str, api_key: &str) -> Result<Url, FetchError> {
        let result = match self {
            Endpoint::Legacy { base } => Url::parse_with_params(
                base,
                &[("dataid", data_id), ("authorizationkey", api_key)],
            )
            .map_err(|e| (base.clone(), e)),
            Endpoint::FileApi { base } => {
                let raw = format!("{}/{}", base.trim_end_matches('/'), data_id);
                Url::parse_with_params(&raw, &[("format", "ZIP"), ("Authorization", api_key)])
                    .map_err(|e| (raw, e))
            }
        };
        result.map_err(|(url, e)| FetchError::InvalidUrl {
            url,
            reason: e.to_string(),
        })
    }
}

/// A fully formed request for one dataset.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    url: Url,
    redacted_url: Url,
    has_api_key: bool,
}

impl FetchRequest {
    /// A missing or blank `api_key` is sent as an empty value.
    pub fn new(endpoint: &Endpoint, data_id: &str, api_key: Option<&str>) -> Result<Self, FetchError> {
        let api_key = api_key.map(str::trim).unwrap_or_default();
        let url = endpoint.build(data_id, api_key)?;
        let redacted_url = if api_key.is_empty() {
            url.clone()
        } else {
            endpoint.build(data_id, REDACTED)?
        };
        Ok(Self {
            url,
            redacted_url,
            has_api_key: !api_key.is_empty(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The URL with the API key replaced, safe to log.
    pub fn redacted_url(&self) -> &Url {
        &self.redacted_url
    }

    pub fn has_api_key(&self) -> bool {
        self.has_api_key
    }
}
