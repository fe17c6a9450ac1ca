//! The session shell: which view is active, whether any data has been ingested, and the routing of
//! user actions and request outcomes to the three controllers.
//!
//! Nothing in here performs I/O. Actions that need the network return an `Effect`, which the
//! `Runtime` executes; the result comes back as an `Outcome` passed to `SessionShell::handle`.

use crate::conversation::ConversationController;
use crate::dashboard::{Applied, DashboardController, DashboardTicket, LOAD_FAILED};
use crate::error::Error;
use crate::model::{
    AnalyticsSnapshot, ChatReply, ChatRequest, FileHandle, Period, UploadReceipt,
};
use crate::upload::{UploadController, UploadTicket, UPLOAD_FAILED};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use tracing::{debug, info};

/// The three top-level views.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    Upload,
    Dashboard,
    Chat,
}

serde_plain::derive_display_from_serialize!(View);
serde_plain::derive_fromstr_from_deserialize!(View);

impl View {
    pub const ALL: [View; 3] = [View::Upload, View::Dashboard, View::Chat];

    /// Whether the view can only be entered once transaction data has been ingested.
    pub fn requires_data(&self) -> bool {
        !matches!(self, View::Upload)
    }
}

/// The state shared by all views. Only `SessionShell` writes it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Session {
    active_view: View,
    has_ingested_data: bool,
}

impl Session {
    pub fn active_view(&self) -> View {
        self.active_view
    }

    pub fn has_ingested_data(&self) -> bool {
        self.has_ingested_data
    }

    /// Whether `view` can be entered right now.
    pub fn is_enabled(&self, view: View) -> bool {
        !view.requires_data() || self.has_ingested_data
    }

    fn select_view(&mut self, view: View) -> Result<()> {
        if !self.is_enabled(view) {
            return Err(Error::validation(format!(
                "Upload transaction data before opening the {view} view"
            )));
        }
        debug!("Active view: {view}");
        self.active_view = view;
        Ok(())
    }

    fn on_ingestion_succeeded(&mut self, receipt: &UploadReceipt) {
        if !self.has_ingested_data {
            info!("Transaction data is available");
        }
        debug!("Ingestion payload: {receipt:?}");
        self.has_ingested_data = true;
        self.active_view = View::Dashboard;
    }
}

/// A request that a controller wants performed.
#[derive(Debug, Clone)]
pub enum Effect {
    Upload(UploadTicket),
    FetchDashboard(DashboardTicket),
    SendChat(ChatRequest),
}

/// The result of an `Effect`, or a progress event while one is running.
#[derive(Debug)]
pub enum Outcome {
    UploadProgress {
        attempt: u64,
        sent: u64,
        total: u64,
    },
    UploadFinished {
        attempt: u64,
        result: Result<UploadReceipt>,
    },
    DashboardFetched {
        ticket: DashboardTicket,
        result: Result<AnalyticsSnapshot>,
    },
    ChatReplied(Result<ChatReply>),
}

/// Something the user should be told about after an `Outcome` was handled.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// An upload succeeded and the dashboard is now active.
    Ingested(UploadReceipt),
    UploadFailed,
    /// A new snapshot for the period is displayed.
    DashboardUpdated(Period),
    DashboardFailed,
    /// The assistant's answer (or the apology) was appended to the conversation.
    Replied,
}

impl Notice {
    pub fn is_error(&self) -> bool {
        matches!(self, Notice::UploadFailed | Notice::DashboardFailed)
    }
}

impl Display for Notice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::Ingested(receipt) => write!(f, "{receipt}"),
            Notice::UploadFailed => f.write_str(UPLOAD_FAILED),
            Notice::DashboardUpdated(period) => write!(f, "Dashboard updated: {}", period.label()),
            Notice::DashboardFailed => f.write_str(LOAD_FAILED),
            Notice::Replied => f.write_str("The coach replied"),
        }
    }
}

/// Owns the `Session` and the three controllers.
#[derive(Debug, Default)]
pub struct SessionShell {
    session: Session,
    upload: UploadController,
    dashboard: DashboardController,
    conversation: ConversationController,
}

impl SessionShell {
    /// A shell with an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// A shell whose conversation opens with the coach's greeting.
    pub fn with_greeting() -> Self {
        Self {
            conversation: ConversationController::with_greeting(),
            ..Self::default()
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn upload(&self) -> &UploadController {
        &self.upload
    }

    pub fn dashboard(&self) -> &DashboardController {
        &self.dashboard
    }

    pub fn conversation(&self) -> &ConversationController {
        &self.conversation
    }

    /// Switches to `view`.
    ///
    /// # Errors
    /// A `Validation` error, leaving the active view unchanged, if `view` needs data and none has
    /// been ingested.
    pub fn select_view(&mut self, view: View) -> Result<()> {
        self.session.select_view(view)
    }

    pub fn select_file(&mut self, file: FileHandle) -> Result<()> {
        self.upload.select_file(file)
    }

    pub fn start_upload(&mut self) -> Result<Effect> {
        self.upload.start_upload().map(Effect::Upload)
    }

    /// Selects `period` and asks for its snapshot.
    pub fn set_period(&mut self, period: Period) -> Result<Effect> {
        self.require_data("the dashboard")?;
        Ok(Effect::FetchDashboard(self.dashboard.set_period(period)))
    }

    /// Asks for the snapshot of the selected period again.
    pub fn refresh(&mut self) -> Result<Effect> {
        self.require_data("the dashboard")?;
        Ok(Effect::FetchDashboard(self.dashboard.fetch()))
    }

    pub fn send_message(&mut self, text: &str) -> Result<Effect> {
        self.require_data("the chat")?;
        self.conversation.send_message(text).map(Effect::SendChat)
    }

    /// Routes `outcome` to the controller it belongs to.
    pub fn handle(&mut self, outcome: Outcome) -> Option<Notice> {
        match outcome {
            Outcome::UploadProgress {
                attempt,
                sent,
                total,
            } => {
                self.upload.on_progress(attempt, sent, total);
                None
            }
            Outcome::UploadFinished { attempt, result } => match result {
                Ok(receipt) => {
                    let receipt = self.upload.on_success(attempt, receipt)?;
                    self.session.on_ingestion_succeeded(&receipt);
                    Some(Notice::Ingested(receipt))
                }
                Err(e) => self
                    .upload
                    .on_failure(attempt, &e)
                    .then_some(Notice::UploadFailed),
            },
            Outcome::DashboardFetched { ticket, result } => {
                match self.dashboard.apply(ticket, result) {
                    Applied::Replaced => Some(Notice::DashboardUpdated(ticket.period)),
                    Applied::Failed => Some(Notice::DashboardFailed),
                    Applied::Discarded => None,
                }
            }
            Outcome::ChatReplied(result) => {
                self.conversation.on_reply(result).map(|_| Notice::Replied)
            }
        }
    }

    fn require_data(&self, what: &str) -> Result<()> {
        if self.session.has_ingested_data() {
            Ok(())
        } else {
            Err(Error::validation(format!(
                "Upload transaction data before using {what}"
            )))
        }
    }
}
