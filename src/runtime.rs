//! Executes `Effect`s against a `Backend` and hands the results back as `Outcome`s.
//!
//! All requests are polled from the task that owns the `Runtime`, so the `SessionShell` is only
//! ever touched from one place. Nothing is spawned onto other tasks and nothing is cancelled: a
//! superseded dashboard fetch still runs to completion and its result is discarded by the
//! controller.

use crate::api::{Backend, ProgressFn};
use crate::session::{Effect, Notice, Outcome, SessionShell};
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::trace;

pub struct Runtime {
    backend: Arc<dyn Backend>,
    in_flight: FuturesUnordered<BoxFuture<'static, Outcome>>,
    /// Completed requests held back until the progress events sent before them are delivered.
    completed: VecDeque<Outcome>,
    progress_tx: mpsc::UnboundedSender<Outcome>,
    progress_rx: mpsc::UnboundedReceiver<Outcome>,
}

impl Runtime {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            in_flight: FuturesUnordered::new(),
            completed: VecDeque::new(),
            progress_tx,
            progress_rx,
        }
    }

    /// Starts the request described by `effect`. It makes progress whenever `next_outcome` is
    /// awaited.
    pub fn submit(&mut self, effect: Effect) {
        let backend = self.backend.clone();
        let request = match effect {
            Effect::Upload(ticket) => {
                let attempt = ticket.attempt;
                let tx = self.progress_tx.clone();
                let progress: ProgressFn = Box::new(move |sent, total| {
                    // Only fails once the runtime has been dropped.
                    let _ = tx.send(Outcome::UploadProgress {
                        attempt,
                        sent,
                        total,
                    });
                });
                async move {
                    let result = backend.upload(ticket.file, progress).await;
                    Outcome::UploadFinished { attempt, result }
                }
                .boxed()
            }
            Effect::FetchDashboard(ticket) => async move {
                let result = backend.dashboard(ticket.period).await;
                Outcome::DashboardFetched { ticket, result }
            }
            .boxed(),
            Effect::SendChat(request) => async move {
                Outcome::ChatReplied(backend.chat(request).await)
            }
            .boxed(),
        };
        self.in_flight.push(request);
        trace!("{} requests in flight", self.in_flight.len());
    }

    /// Whether there is nothing left to deliver.
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty() && self.completed.is_empty()
    }

    /// Waits for the next progress event or completed request. Progress events of a request are
    /// always delivered before its completion. Returns `None` once idle.
    pub async fn next_outcome(&mut self) -> Option<Outcome> {
        if let Ok(event) = self.progress_rx.try_recv() {
            return Some(event);
        }
        if let Some(outcome) = self.completed.pop_front() {
            return Some(outcome);
        }
        if self.in_flight.is_empty() {
            return None;
        }
        tokio::select! {
            biased;
            Some(event) = self.progress_rx.recv() => Some(event),
            Some(outcome) = self.in_flight.next() => match self.progress_rx.try_recv() {
                Ok(event) => {
                    self.completed.push_back(outcome);
                    Some(event)
                }
                Err(_) => Some(outcome),
            },
        }
    }

    /// Feeds outcomes into `shell` until nothing is in flight, returning the notices produced.
    pub async fn run_until_idle(&mut self, shell: &mut SessionShell) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Some(outcome) = self.next_outcome().await {
            if let Some(notice) = shell.handle(outcome) {
                notices.push(notice);
            }
        }
        notices
    }
}
