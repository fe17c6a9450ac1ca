//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::model::{AnalyticsSnapshot, Amount, CategorySlice, FileHandle, Period, TrendPoint};
use crate::Config;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use url::Url;

/// Test environment that sets up a fincoach home directory with a Config.
/// Holds TempDir to keep the directory alive for the duration of the test.
pub struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    /// Creates a test environment whose config points at `base_url`.
    pub async fn new(base_url: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("fincoach");
        let config = Config::create(&root, base_url).await.unwrap();
        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    /// Returns a clone of the Config.
    pub fn config(&self) -> Config {
        self.config.clone()
    }
}

/// A small CSV export to upload.
pub fn sample_file() -> FileHandle {
    FileHandle::from_bytes(
        "transactions.csv",
        "Date,Description,Amount\n2025-10-20,Whole Foods Market,-87.43\n".as_bytes(),
    )
    .unwrap()
}

/// A snapshot whose balance encodes the period so tests can tell snapshots apart.
pub fn sample_snapshot(period: Period) -> AnalyticsSnapshot {
    let balance = match period {
        Period::Week => 700.0,
        Period::Month => 3000.0,
        Period::Quarter => 9000.0,
        Period::Year => 36500.0,
    };
    AnalyticsSnapshot {
        period,
        total_balance: Amount::from_f64(balance).unwrap(),
        monthly_income: Amount::from_f64(5200.0).unwrap(),
        monthly_expenses: Amount::from_f64(3679.25).unwrap(),
        savings_rate: 29.24,
        spending_trend: vec![TrendPoint {
            date: "2025-10-20".into(),
            amount: Amount::from_f64(87.43).unwrap(),
        }],
        category_breakdown: vec![
            CategorySlice::new("Groceries", 365.02),
            CategorySlice::new("Utilities", 353.54),
        ],
        total_transactions: Some(20),
    }
}

/// A request as seen by the stub server.
#[derive(Debug, Clone)]
pub struct StubRequest {
    pub method: String,
    pub path_and_query: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// The status and JSON body the stub server answers with.
#[derive(Debug, Clone)]
pub struct StubReply {
    status: u16,
    body: String,
}

impl StubReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }
}

/// Starts an HTTP server on `127.0.0.1` that answers every request with `handler`. Returns the
/// server's root URL and the list of requests it has received.
pub async fn stub_server<F>(handler: F) -> (Url, Arc<Mutex<Vec<StubRequest>>>)
where
    F: Fn(&StubRequest) -> StubReply + Send + Sync + 'static,
{
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let server_seen = seen.clone();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let handler = handler.clone();
            let seen = server_seen.clone();
            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let handler = handler.clone();
                    let seen = seen.clone();
                    async move {
                        let method = req.method().to_string();
                        let path_and_query = req
                            .uri()
                            .path_and_query()
                            .map(|p| p.to_string())
                            .unwrap_or_default();
                        let content_type = req
                            .headers()
                            .get(hyper::header::CONTENT_TYPE)
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        let body = req.into_body().collect().await?.to_bytes().to_vec();
                        let request = StubRequest {
                            method,
                            path_and_query,
                            content_type,
                            body,
                        };
                        let reply = handler(&request);
                        seen.lock().unwrap().push(request);
                        let response = Response::builder()
                            .status(reply.status)
                            .header(hyper::header::CONTENT_TYPE, "application/json")
                            .body(Full::new(Bytes::from(reply.body)))
                            .unwrap();
                        Ok::<_, hyper::Error>(response)
                    }
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });

    (Url::parse(&format!("http://{addr}/")).unwrap(), seen)
}
