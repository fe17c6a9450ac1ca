//! Implements the `Backend` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without a finance coach server.

use crate::api::{Backend, Health, ProgressFn};
use crate::error::Error;
use crate::model::{
    AnalyticsSnapshot, Amount, CategorySlice, ChatReply, ChatRequest, FileHandle, Period,
    TrendPoint, UploadReceipt,
};
use crate::Result;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;

/// Number of progress events emitted per upload.
const PROGRESS_STEPS: u64 = 4;

/// Everything the `TestBackend` has been asked to do, and how it should answer.
#[derive(Debug, Default)]
pub struct TestBackendState {
    /// Names of the files that were uploaded.
    pub uploads: Vec<String>,
    /// Periods for which a dashboard snapshot was requested, in request order.
    pub dashboard_requests: Vec<Period>,
    /// Every chat request received.
    pub chat_requests: Vec<ChatRequest>,
    /// When set, uploads fail with a transport error.
    pub fail_uploads: bool,
    /// When set, dashboard requests fail with a transport error.
    pub fail_dashboard: bool,
    /// When set, chat requests fail with a transport error.
    pub fail_chat: bool,
    /// Snapshots to answer with. Missing periods fall back to the seed data.
    pub snapshots: HashMap<Period, AnalyticsSnapshot>,
    /// The upload payload to answer with.
    pub receipt: Option<UploadReceipt>,
    /// Dashboard requests for these periods wait until the matching sender fires or is dropped.
    gates: HashMap<Period, oneshot::Receiver<()>>,
}

/// An implementation of the `Backend` trait that does not use the network. Clones share state, so
/// a test can keep one clone to inspect what the app did with another.
#[derive(Debug, Clone, Default)]
pub struct TestBackend {
    state: Arc<Mutex<TestBackendState>>,
}

impl TestBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks and returns the shared state.
    pub fn state(&self) -> MutexGuard<'_, TestBackendState> {
        // A poisoned lock only means another test thread panicked; the data is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Holds back the response to the next dashboard request for `period` until the returned
    /// sender is used (or dropped).
    pub fn gate_dashboard(&self, period: Period) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state().gates.insert(period, rx);
        tx
    }
}

#[async_trait::async_trait]
impl Backend for TestBackend {
    async fn upload(&self, file: FileHandle, progress: ProgressFn) -> Result<UploadReceipt> {
        let total = file.len();
        for step in 1..=PROGRESS_STEPS {
            progress(total * step / PROGRESS_STEPS, total);
            tokio::task::yield_now().await;
        }

        let mut state = self.state();
        state.uploads.push(file.name().to_string());
        if state.fail_uploads {
            return Err(Error::transport("Test backend refused the upload"));
        }
        Ok(state.receipt.clone().unwrap_or_else(default_receipt))
    }

    async fn dashboard(&self, period: Period) -> Result<AnalyticsSnapshot> {
        let gate = {
            let mut state = self.state();
            state.dashboard_requests.push(period);
            state.gates.remove(&period)
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let state = self.state();
        if state.fail_dashboard {
            return Err(Error::transport("Test backend dashboard is unavailable"));
        }
        Ok(state
            .snapshots
            .get(&period)
            .cloned()
            .unwrap_or_else(|| seed_snapshot(period)))
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatReply> {
        let mut state = self.state();
        let reply = ChatReply {
            response: format!("You said: {}", request.message.trim()),
            recommendations: Some(vec![
                "Track your coffee spending".to_string(),
                "Move 10% of income to savings on payday".to_string(),
            ]),
            follow_up_questions: None,
        };
        state.chat_requests.push(request);
        if state.fail_chat {
            return Err(Error::transport("Test backend chat is unavailable"));
        }
        Ok(reply)
    }

    async fn health(&self) -> Result<Health> {
        Ok(Health {
            status: "healthy".to_string(),
            timestamp: None,
        })
    }
}

fn default_receipt() -> UploadReceipt {
    let value = json!({
        "message": "Transactions uploaded successfully",
        "total_transactions": SEED_CATEGORIES.len(),
        "processed_transactions": SEED_CATEGORIES.len(),
        "skipped_duplicates": 0
    });
    match value {
        Value::Object(map) => UploadReceipt::new(map),
        _ => UploadReceipt::new(Map::new()),
    }
}

/// Seed spending per category, scaled by period length in `seed_snapshot`.
const SEED_CATEGORIES: &[(&str, f64)] = &[
    ("Groceries", 365.02),
    ("Utilities", 353.54),
    ("Gas & Fuel", 217.85),
    ("Restaurants", 79.30),
    ("Coffee Shops", 28.45),
];

/// Seed daily spending for the most recent days.
const SEED_TREND: &[(&str, f64)] = &[
    ("2025-10-16", 142.67),
    ("2025-10-17", 14.85),
    ("2025-10-18", 52.30),
    ("2025-10-19", 6.75),
    ("2025-10-20", 87.43),
];

/// Provides the seed data from this module.
fn seed_snapshot(period: Period) -> AnalyticsSnapshot {
    let scale = match period {
        Period::Week => 0.25,
        Period::Month => 1.0,
        Period::Quarter => 3.0,
        Period::Year => 12.0,
    };
    let expenses: f64 = SEED_CATEGORIES.iter().map(|(_, v)| v * scale).sum();
    let income = 5200.0 * scale;
    let amount = |v: f64| Amount::from_f64(v).unwrap_or_default();
    AnalyticsSnapshot {
        period,
        total_balance: amount(income - expenses),
        monthly_income: amount(5200.0),
        monthly_expenses: amount(expenses / scale),
        savings_rate: (income - expenses) / income * 100.0,
        spending_trend: SEED_TREND
            .iter()
            .map(|(date, v)| TrendPoint {
                date: date.to_string(),
                amount: amount(*v),
            })
            .collect(),
        category_breakdown: SEED_CATEGORIES
            .iter()
            .map(|(name, v)| CategorySlice::new(*name, v * scale))
            .collect(),
        total_transactions: Some((20.0 * scale).ceil() as u64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[tokio::test]
    async fn test_seed_snapshot_per_period() {
        let backend = TestBackend::new();
        let week = backend.dashboard(Period::Week).await.unwrap();
        let year = backend.dashboard(Period::Year).await.unwrap();
        assert_eq!(Period::Week, week.period);
        assert_eq!(Period::Year, year.period);
        assert!(week.total_balance < year.total_balance);
        assert_eq!(
            vec![Period::Week, Period::Year],
            backend.state().dashboard_requests
        );
    }

    #[tokio::test]
    async fn test_upload_reports_progress_to_completion() {
        let backend = TestBackend::new();
        let last = Arc::new(AtomicU64::new(0));
        let sink = last.clone();
        let file = FileHandle::from_bytes("a.csv", vec![0u8; 100]).unwrap();
        let receipt = backend
            .upload(
                file,
                Box::new(move |sent, _| sink.store(sent, Ordering::SeqCst)),
            )
            .await
            .unwrap();
        assert_eq!(100, last.load(Ordering::SeqCst));
        assert_eq!(Some("Transactions uploaded successfully"), receipt.message());
        assert_eq!(vec!["a.csv".to_string()], backend.state().uploads);
    }

    #[tokio::test]
    async fn test_failures_are_transport_errors() {
        let backend = TestBackend::new();
        backend.state().fail_chat = true;
        let err = backend
            .chat(ChatRequest {
                message: "hi".into(),
                conversation_history: Vec::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(crate::ErrorType::Transport, err.error_type());
        assert_eq!(1, backend.state().chat_requests.len());
    }

    #[tokio::test]
    async fn test_gated_dashboard_waits() {
        let backend = TestBackend::new();
        let gate = backend.gate_dashboard(Period::Month);
        let pending = tokio::spawn({
            let backend = backend.clone();
            async move { backend.dashboard(Period::Month).await }
        });
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());
        gate.send(()).unwrap();
        let snapshot = pending.await.unwrap().unwrap();
        assert_eq!(Period::Month, snapshot.period);
    }
}
