//! The dashboard controller: fetches and holds the analytics snapshot for the selected period.
//!
//! Several fetches may be outstanding at once. A result is only applied if it is for the period
//! that is selected when it arrives and is newer than the result on display; anything else is
//! discarded, whatever order the responses come back in.

use crate::error::log_failure;
use crate::model::{AnalyticsSnapshot, Period};
use crate::Result;
use serde::Serialize;
use tracing::debug;

/// Shown while the first snapshot is loading.
pub const LOADING: &str = "Loading dashboard...";

/// Shown when a fetch failed and there is no earlier snapshot to fall back to.
pub const LOAD_FAILED: &str = "Failed to load dashboard data";

/// Shown before anything has been fetched.
pub const NOT_LOADED: &str = "No dashboard loaded yet. Pick a period.";

/// What the dashboard is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardStatus {
    /// Nothing has been fetched yet.
    Empty,
    /// The newest fetch for the selected period is outstanding.
    Loading,
    /// A snapshot is displayed.
    Ready,
    /// The last applied fetch failed. An earlier snapshot may still be displayed.
    Error,
}

/// What `DashboardController::apply` did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Applied {
    /// The snapshot replaced the displayed one.
    Replaced,
    /// The fetch failed; the displayed snapshot, if any, was kept.
    Failed,
    /// The result was for a period that is no longer selected, or older than the one displayed.
    Discarded,
}

/// A request for the snapshot of `period`. `seq` orders requests so that a slow, older response
/// never overwrites a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DashboardTicket {
    pub period: Period,
    pub seq: u64,
}

#[derive(Debug, Default)]
pub struct DashboardController {
    period: Period,
    snapshot: Option<AnalyticsSnapshot>,
    error: Option<String>,
    /// The `seq` of the newest request issued.
    requested: u64,
    /// The `seq` of the newest result applied.
    applied: u64,
}

impl DashboardController {
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently selected period.
    pub fn period(&self) -> Period {
        self.period
    }

    /// The displayed snapshot. It may belong to an earlier period while a new one loads.
    pub fn snapshot(&self) -> Option<&AnalyticsSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the newest request has yet to be answered.
    pub fn is_loading(&self) -> bool {
        self.applied < self.requested
    }

    pub fn status(&self) -> DashboardStatus {
        if self.is_loading() {
            DashboardStatus::Loading
        } else if self.error.is_some() {
            DashboardStatus::Error
        } else if self.snapshot.is_some() {
            DashboardStatus::Ready
        } else {
            DashboardStatus::Empty
        }
    }

    /// Selects `period` and returns the request to fetch it. Fetches still outstanding for other
    /// periods are superseded.
    pub fn set_period(&mut self, period: Period) -> DashboardTicket {
        if period != self.period {
            debug!("Dashboard period changed from {} to {period}", self.period);
        }
        self.period = period;
        self.fetch()
    }

    /// Returns the request to fetch the currently selected period again.
    pub fn fetch(&mut self) -> DashboardTicket {
        self.requested += 1;
        DashboardTicket {
            period: self.period,
            seq: self.requested,
        }
    }

    /// Applies the result of the fetch described by `ticket`.
    pub fn apply(&mut self, ticket: DashboardTicket, result: Result<AnalyticsSnapshot>) -> Applied {
        let DashboardTicket { period, seq } = ticket;
        if period != self.period {
            debug!(
                "Discarding the {period} dashboard result, {} is selected",
                self.period
            );
            return Applied::Discarded;
        }
        if seq <= self.applied {
            debug!("Discarding dashboard result {seq}, {} is newer", self.applied);
            return Applied::Discarded;
        }
        // Anything requested before `seq` can no longer be applied, so it stops counting as
        // outstanding once `seq` is in.
        self.applied = seq;
        match result {
            Ok(mut snapshot) => {
                snapshot.period = period;
                debug!("Dashboard snapshot for {period} loaded");
                self.snapshot = Some(snapshot);
                self.error = None;
                Applied::Replaced
            }
            Err(e) => {
                log_failure("Dashboard fetch", &e);
                self.error = Some(LOAD_FAILED.to_string());
                Applied::Failed
            }
        }
    }
}
