//! Implements the `Backend` trait over HTTP using `reqwest`.

use crate::api::{
    Backend, Health, ProgressFn, CHAT_PATH, DASHBOARD_PATH, HEALTH_PATH, UPLOAD_PATH,
};
use crate::error::{Error, ErrorType, IntoResult};
use crate::model::{AnalyticsSnapshot, ChatReply, ChatRequest, FileHandle, Period, UploadReceipt};
use crate::Result;
use anyhow::Context;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

/// Upload bodies are handed to the transport in pieces of this size so that progress can be
/// reported while the transfer is running.
const UPLOAD_CHUNK: usize = 64 * 1024;

/// Talks to a finance coach server rooted at `base_url`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    /// Creates a backend with a default `reqwest::Client`. No timeout is configured.
    pub fn new(base_url: Url) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("fincoach/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Unable to create the HTTP client")
            .pub_result(ErrorType::Config)?;
        Ok(Self::with_client(base_url, client))
    }

    /// Creates a backend that uses `client` for all requests.
    pub fn with_client(base_url: Url, client: Client) -> Self {
        Self { client, base_url }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Unable to build the URL for '{path}'"))
            .pub_result(ErrorType::Config)
    }
}

#[async_trait::async_trait]
impl Backend for HttpBackend {
    async fn upload(&self, file: FileHandle, progress: ProgressFn) -> Result<UploadReceipt> {
        let url = self.endpoint(UPLOAD_PATH)?;
        let total = file.len();
        debug!("Uploading {} ({total} bytes) to {url}", file.name());

        let chunks: Vec<std::io::Result<Vec<u8>>> = file
            .bytes()
            .chunks(UPLOAD_CHUNK)
            .map(|chunk| Ok(chunk.to_vec()))
            .collect();
        let progress = std::sync::Arc::new(progress);
        let stream_progress = progress.clone();
        let mut sent = 0u64;
        let stream = futures::stream::iter(chunks).map(move |chunk| {
            if let Ok(bytes) = &chunk {
                sent += bytes.len() as u64;
                stream_progress(sent, total);
            }
            chunk
        });

        let part = Part::stream_with_length(Body::wrap_stream(stream), total)
            .file_name(file.name().to_string())
            .mime_str(file.kind().content_type())
            .context("Invalid content type")
            .pub_result(ErrorType::Protocol)?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .context("Failed to send the upload request")
            .pub_result(ErrorType::Transport)?;

        // A response means the whole body went out.
        progress(total, total);
        read_json(response, "upload").await
    }

    async fn dashboard(&self, period: Period) -> Result<AnalyticsSnapshot> {
        let mut url = self.endpoint(DASHBOARD_PATH)?;
        url.query_pairs_mut().append_pair("period", period.as_str());
        trace!("GET {url}");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send the dashboard request")
            .pub_result(ErrorType::Transport)?;

        let mut snapshot: AnalyticsSnapshot = read_json(response, "dashboard").await?;
        snapshot.period = period;
        Ok(snapshot)
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatReply> {
        let url = self.endpoint(CHAT_PATH)?;
        trace!(
            "POST {url} with {} messages of history",
            request.conversation_history.len()
        );

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .context("Failed to send the chat request")
            .pub_result(ErrorType::Transport)?;

        read_json(response, "chat").await
    }

    async fn health(&self) -> Result<Health> {
        let url = self.endpoint(HEALTH_PATH)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send the health request")
            .pub_result(ErrorType::Transport)?;

        read_json(response, "health").await
    }
}

/// Checks the status and parses the body of `response` as `T`.
///
/// A non-2xx status or an unreadable body is a `Transport` error. A body that is not the expected
/// JSON is a `Protocol` error.
async fn read_json<T>(response: Response, operation: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());
        return Err(Error::transport(format!(
            "The {operation} request failed with status {status}: {body}"
        )));
    }

    let body = response
        .text()
        .await
        .with_context(|| format!("Failed to read the {operation} response"))
        .pub_result(ErrorType::Transport)?;
    trace!("{operation} response: {body}");

    serde_json::from_str(&body)
        .with_context(|| format!("Unexpected {operation} response: {body}"))
        .pub_result(ErrorType::Protocol)
}
