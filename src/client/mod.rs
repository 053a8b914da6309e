//! HTTP downloads for plugin installs and repository sync.

use std::time::Duration;

use crate::plugins::{PluginError, PluginResult};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("mem-hub/", env!("CARGO_PKG_VERSION"));

/// A fetched resource.
#[derive(Debug, Clone)]
pub struct Download {
    pub bytes: Vec<u8>,
    /// URL after redirects.
    pub final_url: String,
}

/// Thin wrapper over a shared `reqwest::Client` with a finite timeout.
#[derive(Clone, Debug)]
pub struct Downloader {
    http: reqwest::Client,
    timeout: Duration,
}

impl Downloader {
    pub fn new(timeout: Duration) -> PluginResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| PluginError::download("<client>", e))?;
        Ok(Self { http, timeout })
    }

    pub fn with_http(http: reqwest::Client, timeout: Duration) -> Self {
        Self { http, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET `url`; any non-success status, transport failure or timeout is a
    /// [`PluginError::Download`].
    pub async fn fetch(&self, url: &str) -> PluginResult<Download> {
        tracing::debug!(%url, "downloading");
        let response = self.http.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                PluginError::download(
                    url,
                    format!("request timed out after {}s", self.timeout.as_secs()),
                )
            } else {
                PluginError::download(url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PluginError::download(url, format!("HTTP {status}")));
        }

        let final_url = response.url().to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PluginError::download(url, e))?;

        Ok(Download {
            bytes: bytes.to_vec(),
            final_url,
        })
    }
}

/// True for sources that should be fetched rather than read from disk.
pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Last non-empty path segment of a URL, used as the installed file name.
pub fn file_name_from_url(raw: &str) -> Option<String> {
    let parsed = url::Url::parse(raw).ok()?;
    parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .next_back()
        .map(ToOwned::to_owned)
}
