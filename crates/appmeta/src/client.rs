//! steamcmd.net app-info client.
//!
//! Async HTTP client using `reqwest`. The API is unauthenticated; the
//! only request this plugin makes is `GET /v1/info/<appid>`.

use std::future::Future;
use std::pin::Pin;

use steampad_steam::MetadataLookup;
use tracing::{debug, warn};

use crate::types::{AppMetadata, InfoResponse};

const DEFAULT_BASE_URL: &str = "https://api.steamcmd.net/v1";

/// Errors from the app-info client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// steamcmd.net API client.
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    pub fn new() -> Result<Self, Error> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Sets a custom base URL (for testing).
    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Fetches the metadata record for one app.
    ///
    /// `Ok(None)` means the catalog answered but has no usable record for
    /// this app; transport and decode failures are errors.
    pub async fn app_info(&self, app_id: u32) -> Result<Option<AppMetadata>, Error> {
        let url = format!("{}/info/{app_id}", self.base_url);
        debug!(app_id, %url, "fetching app metadata");

        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.bytes().await?;
        let info: InfoResponse = serde_json::from_slice(&body)?;

        if info.status != "success" {
            warn!(app_id, status = %info.status, "catalog reported failure");
            return Ok(None);
        }

        let common = info
            .data
            .get(&app_id.to_string())
            .and_then(|entry| entry.common.as_ref());
        Ok(common.map(|common| AppMetadata {
            app_id,
            name: common.name.clone(),
            icon_hash: common.clienticon.clone(),
        }))
    }
}

impl MetadataLookup for Client {
    fn icon_hash(&self, app_id: u32) -> Pin<Box<dyn Future<Output = Option<String>> + Send + '_>> {
        Box::pin(async move {
            match self.app_info(app_id).await {
                Ok(meta) => meta.and_then(|m| m.icon_hash),
                Err(e) => {
                    warn!(app_id, "metadata lookup failed: {e}");
                    None
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Starts a mock HTTP server that responds once with the given status
    /// and JSON body.
    async fn mock_server(status: u16, body: &str) -> (String, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}");
        let body = body.to_string();

        let handle = tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = vec![0u8; 8192];
                let _ = stream.read(&mut buf).await;

                let resp = format!(
                    "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(resp.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        (url, handle)
    }

    #[tokio::test]
    async fn app_info_returns_metadata() {
        let json = r#"{"status":"success","data":{"440":{"common":{
            "name":"Team Fortress 2","clienticon":"abc123"}}}}"#;
        let (url, handle) = mock_server(200, json).await;

        let client = Client::new().unwrap().with_base_url(url);
        let meta = client.app_info(440).await.unwrap().unwrap();

        assert_eq!(meta.name, "Team Fortress 2");
        assert_eq!(meta.icon_hash.as_deref(), Some("abc123"));

        handle.abort();
    }

    #[tokio::test]
    async fn catalog_failure_status_is_none() {
        let (url, handle) = mock_server(200, r#"{"status":"error","data":{}}"#).await;

        let client = Client::new().unwrap().with_base_url(url);
        assert!(client.app_info(440).await.unwrap().is_none());

        handle.abort();
    }

    #[tokio::test]
    async fn record_without_common_is_none() {
        let (url, handle) = mock_server(200, r#"{"status":"success","data":{"440":{}}}"#).await;

        let client = Client::new().unwrap().with_base_url(url);
        assert!(client.app_info(440).await.unwrap().is_none());

        handle.abort();
    }

    #[tokio::test]
    async fn http_error_status_is_an_error() {
        let (url, handle) = mock_server(500, "oops").await;

        let client = Client::new().unwrap().with_base_url(url);
        let err = client.app_info(440).await.unwrap_err();
        assert!(err.to_string().contains("500"), "{err}");

        handle.abort();
    }

    #[tokio::test]
    async fn lookup_trait_swallows_errors() {
        let (url, handle) = mock_server(500, "oops").await;

        let client = Client::new().unwrap().with_base_url(url);
        assert!(client.icon_hash(440).await.is_none());

        handle.abort();
    }

    #[tokio::test]
    async fn lookup_trait_yields_hash() {
        let json = r#"{"status":"success","data":{"70":{"common":{
            "name":"Half-Life","clienticon":"deadbeef"}}}}"#;
        let (url, handle) = mock_server(200, json).await;

        let client = Client::new().unwrap().with_base_url(url);
        assert_eq!(client.icon_hash(70).await.as_deref(), Some("deadbeef"));

        handle.abort();
    }
}
