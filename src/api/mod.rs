//! The client side of the finance coach HTTP contract.
//!
//! The `Backend` trait is the seam between the controllers and the network. `HttpBackend` talks to
//! a real server, `TestBackend` keeps everything in memory so that the whole app can be run and
//! tested without one.

mod http;
mod test_backend;

use crate::model::{AnalyticsSnapshot, ChatReply, ChatRequest, FileHandle, Period, UploadReceipt};
use crate::{Config, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use http::HttpBackend;
pub use test_backend::{TestBackend, TestBackendState};

pub(crate) const UPLOAD_PATH: &str = "api/transactions/upload";
pub(crate) const DASHBOARD_PATH: &str = "api/analytics/dashboard";
pub(crate) const CHAT_PATH: &str = "api/chat";
pub(crate) const HEALTH_PATH: &str = "health";

/// The environment variable that, when set and non-empty, selects `Mode::Testing`.
const TEST_MODE_ENV: &str = "FINCOACH_IN_TEST_MODE";

/// Called with `(bytes_sent, bytes_total)` as an upload body is handed to the transport.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send + Sync>;

/// The operations the finance coach server offers. Every failure is reported as either a
/// `Transport` error (network, non-2xx) or a `Protocol` error (unexpected body).
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// `POST /api/transactions/upload` with the file as the multipart field `file`.
    async fn upload(&self, file: FileHandle, progress: ProgressFn) -> Result<UploadReceipt>;

    /// `GET /api/analytics/dashboard?period={period}`.
    async fn dashboard(&self, period: Period) -> Result<AnalyticsSnapshot>;

    /// `POST /api/chat`.
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply>;

    /// `GET /health`.
    async fn health(&self) -> Result<Health>;
}

/// The body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Whether we talk to a real server or to the in-memory `TestBackend`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Http,
    Testing,
}

impl Mode {
    /// `Mode::Testing` when `FINCOACH_IN_TEST_MODE` is set and non-empty, otherwise `Mode::Http`.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(s) if !s.is_empty() => Mode::Testing,
            _ => Mode::Http,
        }
    }
}

/// Creates the backend for `mode`.
pub fn backend(config: &Config, mode: Mode) -> Result<Arc<dyn Backend>> {
    Ok(match mode {
        Mode::Http => Arc::new(HttpBackend::new(config.base_url().clone())?),
        Mode::Testing => Arc::new(TestBackend::default()),
    })
}
