//! Plain-text presentation of the shell state.
//!
//! These functions only format what the controllers hold. Numbers come from the server as they
//! are; the only derived figures are the category percentages.

use crate::conversation::ConversationController;
use crate::dashboard::{DashboardController, DashboardStatus, LOADING, LOAD_FAILED, NOT_LOADED};
use crate::model::{AnalyticsSnapshot, CategorySlice, Message, Role};
use crate::session::{SessionShell, View};
use crate::upload::{UploadController, UploadStatus};
use chrono::{DateTime, Local, Utc};
use std::fmt::{self, Display, Formatter};

/// Shown in place of the dashboard and the chat until data has been uploaded.
pub const PLACEHOLDER: &str = "Please upload your transaction data to get started.";

/// Shown while the assistant's answer is outstanding.
pub const THINKING: &str = "Coach is thinking...";

/// Each slice's share of the total, `value / sum * 100` rounded to the nearest integer. All zero
/// when the values sum to zero.
pub fn category_percentages(slices: &[CategorySlice]) -> Vec<i64> {
    let sum: f64 = slices.iter().map(|s| s.value).sum();
    slices
        .iter()
        .map(|s| {
            if sum == 0.0 {
                0
            } else {
                (s.value / sum * 100.0).round() as i64
            }
        })
        .collect()
}

/// A savings rate to one decimal place, e.g. `29.2%`.
pub fn savings_rate(rate: f64) -> String {
    format!("{rate:.1}%")
}

/// The whole shell: the view tabs followed by the active view.
pub fn shell(shell: &SessionShell) -> String {
    ShellText(shell).to_string()
}

/// The body of `view`. Views that need data show the placeholder until some has been ingested.
pub fn view(shell: &SessionShell, view: View) -> String {
    match view {
        View::Upload => upload(shell.upload()),
        _ if !shell.session().has_ingested_data() => format!("{PLACEHOLDER}\n"),
        View::Dashboard => dashboard(shell.dashboard()),
        View::Chat => conversation(shell.conversation()),
    }
}

pub fn upload(controller: &UploadController) -> String {
    UploadText(controller).to_string()
}

pub fn dashboard(controller: &DashboardController) -> String {
    DashboardText(controller).to_string()
}

pub fn snapshot(snapshot: &AnalyticsSnapshot) -> String {
    SnapshotText(snapshot).to_string()
}

/// One message, prefixed with the local time it was written.
pub fn message(message: &Message) -> String {
    MessageText(message).to_string()
}

pub fn conversation(controller: &ConversationController) -> String {
    ConversationText(controller).to_string()
}

/// `HH:MM` in local time.
fn clock(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M").to_string()
}

struct ShellText<'a>(&'a SessionShell);

impl Display for ShellText<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let session = self.0.session();
        let tabs: Vec<String> = View::ALL
            .iter()
            .map(|view| {
                if *view == session.active_view() {
                    format!("[{view}]")
                } else if session.is_enabled(*view) {
                    view.to_string()
                } else {
                    format!("{view} (locked)")
                }
            })
            .collect();
        writeln!(f, "{}", tabs.join("  "))?;
        writeln!(f)?;
        write!(f, "{}", view(self.0, session.active_view()))
    }
}

struct UploadText<'a>(&'a UploadController);

impl Display for UploadText<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let controller = self.0;
        match controller.file() {
            Some(file) => writeln!(f, "File: {} ({} bytes)", file.name(), file.len())?,
            None => writeln!(f, "File: none selected (.csv, .xlsx or .json)")?,
        }
        writeln!(f, "{}", controller.label())?;
        if controller.status() == UploadStatus::Succeeded {
            writeln!(f, "Upload complete.")?;
        }
        if let Some(error) = controller.last_error() {
            writeln!(f, "{error}")?;
        }
        Ok(())
    }
}

struct DashboardText<'a>(&'a DashboardController);

impl Display for DashboardText<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let controller = self.0;
        match controller.status() {
            DashboardStatus::Empty => return writeln!(f, "{NOT_LOADED}"),
            DashboardStatus::Loading => writeln!(f, "{LOADING}")?,
            DashboardStatus::Error => writeln!(f, "{}", controller.error().unwrap_or(LOAD_FAILED))?,
            DashboardStatus::Ready => {}
        }
        // The previous snapshot stays visible while loading or after a failure.
        match controller.snapshot() {
            Some(snapshot) => write!(f, "{}", SnapshotText(snapshot)),
            None => Ok(()),
        }
    }
}

struct SnapshotText<'a>(&'a AnalyticsSnapshot);

impl Display for SnapshotText<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let snapshot = self.0;
        writeln!(f, "{}", snapshot.period.label())?;
        writeln!(f, "  Total balance     {}", snapshot.total_balance)?;
        writeln!(f, "  Monthly income    {}", snapshot.monthly_income)?;
        writeln!(f, "  Monthly expenses  {}", snapshot.monthly_expenses)?;
        writeln!(
            f,
            "  Savings rate      {}",
            savings_rate(snapshot.savings_rate)
        )?;
        if let Some(count) = snapshot.total_transactions {
            writeln!(f, "  Transactions      {count}")?;
        }

        if !snapshot.category_breakdown.is_empty() {
            writeln!(f, "Spending by category")?;
            let percentages = category_percentages(&snapshot.category_breakdown);
            for (slice, percent) in snapshot.category_breakdown.iter().zip(percentages) {
                writeln!(f, "  {:<20} {percent:>3}%", slice.name)?;
            }
        }

        if !snapshot.spending_trend.is_empty() {
            writeln!(f, "Spending trend")?;
            for point in &snapshot.spending_trend {
                writeln!(f, "  {:<12} {:>12}", point.date, point.amount.to_string())?;
            }
        }
        Ok(())
    }
}

struct MessageText<'a>(&'a Message);

impl Display for MessageText<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let message = self.0;
        let speaker = match message.role {
            Role::User => "You",
            Role::Assistant => "Coach",
        };
        writeln!(
            f,
            "[{}] {speaker}: {}",
            clock(message.timestamp),
            message.content
        )?;
        if let Some(recommendations) = &message.recommendations {
            writeln!(f, "  Recommendations:")?;
            for r in recommendations {
                writeln!(f, "    - {r}")?;
            }
        }
        if let Some(questions) = &message.follow_up_questions {
            writeln!(f, "  You could also ask:")?;
            for q in questions {
                writeln!(f, "    - {q}")?;
            }
        }
        Ok(())
    }
}

struct ConversationText<'a>(&'a ConversationController);

impl Display for ConversationText<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for message in self.0.history() {
            write!(f, "{}", MessageText(message))?;
        }
        if self.0.is_pending() {
            writeln!(f, "{THINKING}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::{ChatReply, Period, UploadReceipt};
    use crate::session::{Effect, Outcome};
    use crate::test::{sample_file, sample_snapshot};
    use chrono::TimeZone;

    fn ingested_shell() -> SessionShell {
        let mut shell_state = SessionShell::new();
        shell_state.select_file(sample_file()).unwrap();
        let Effect::Upload(ticket) = shell_state.start_upload().unwrap() else {
            panic!("expected an upload effect");
        };
        shell_state.handle(Outcome::UploadFinished {
            attempt: ticket.attempt,
            result: Ok(UploadReceipt::default()),
        });
        shell_state
    }

    #[test]
    fn test_category_percentages() {
        let slices = vec![
            CategorySlice::new("Groceries", 50.0),
            CategorySlice::new("Rent", 25.0),
            CategorySlice::new("Fun", 25.0),
        ];
        assert_eq!(vec![50, 25, 25], category_percentages(&slices));

        let thirds = vec![
            CategorySlice::new("a", 1.0),
            CategorySlice::new("b", 1.0),
            CategorySlice::new("c", 1.0),
        ];
        assert_eq!(vec![33, 33, 33], category_percentages(&thirds));

        let zero = vec![CategorySlice::new("a", 0.0)];
        assert_eq!(vec![0], category_percentages(&zero));
        assert!(category_percentages(&[]).is_empty());
    }

    #[test]
    fn test_savings_rate() {
        assert_eq!("29.2%", savings_rate(29.24));
        assert_eq!("0.0%", savings_rate(0.0));
        assert_eq!("-5.5%", savings_rate(-5.46));
    }

    #[test]
    fn test_snapshot() {
        let text = snapshot(&sample_snapshot(Period::Year));
        assert!(text.starts_with("Last year\n"), "{text}");
        assert!(text.contains("$36,500.00"), "{text}");
        assert!(text.contains("$5,200.00"), "{text}");
        assert!(text.contains("29.2%"), "{text}");
        assert!(text.contains("Transactions      20"), "{text}");
        assert!(text.contains("Groceries"), "{text}");
        assert!(text.contains("51%"), "{text}");
        assert!(text.contains("2025-10-20"), "{text}");
    }

    #[test]
    fn test_placeholder_until_ingestion() {
        let shell_state = SessionShell::new();
        let text = shell(&shell_state);
        assert!(text.starts_with("[upload]  dashboard (locked)  chat (locked)"), "{text}");
        assert!(!text.contains(PLACEHOLDER));
        assert_eq!(
            format!("{PLACEHOLDER}\n"),
            view(&shell_state, View::Dashboard)
        );
        assert_eq!(format!("{PLACEHOLDER}\n"), view(&shell_state, View::Chat));
    }

    #[test]
    fn test_upload_progress_label() {
        let mut shell_state = SessionShell::new();
        shell_state.select_file(sample_file()).unwrap();
        let Effect::Upload(ticket) = shell_state.start_upload().unwrap() else {
            panic!("expected an upload effect");
        };
        shell_state.handle(Outcome::UploadProgress {
            attempt: ticket.attempt,
            sent: 1,
            total: 4,
        });
        let text = upload(shell_state.upload());
        assert!(text.contains("File: transactions.csv"), "{text}");
        assert!(text.contains("Uploading... 25%"), "{text}");
    }

    #[test]
    fn test_dashboard_states() {
        let mut shell_state = ingested_shell();
        let text = shell(&shell_state);
        assert!(text.starts_with("upload  [dashboard]  chat"), "{text}");

        let Effect::FetchDashboard(ticket) = shell_state.refresh().unwrap() else {
            panic!("expected a dashboard effect");
        };
        assert_eq!(format!("{LOADING}\n"), dashboard(shell_state.dashboard()));

        shell_state.handle(Outcome::DashboardFetched {
            ticket,
            result: Err(Error::transport("down")),
        });
        assert_eq!(format!("{LOAD_FAILED}\n"), dashboard(shell_state.dashboard()));

        let Effect::FetchDashboard(ticket) = shell_state.refresh().unwrap() else {
            panic!("expected a dashboard effect");
        };
        shell_state.handle(Outcome::DashboardFetched {
            ticket,
            result: Ok(sample_snapshot(Period::Month)),
        });
        let text = dashboard(shell_state.dashboard());
        assert!(text.starts_with("Last 30 days\n"), "{text}");

        // A refresh keeps the snapshot on screen under the loading line.
        shell_state.refresh().unwrap();
        let text = dashboard(shell_state.dashboard());
        assert!(text.starts_with(&format!("{LOADING}\nLast 30 days\n")), "{text}");
    }

    #[test]
    fn test_dashboard_before_first_fetch_is_not_a_failure() {
        let shell_state = ingested_shell();
        assert_eq!(DashboardStatus::Empty, shell_state.dashboard().status());

        let text = view(&shell_state, View::Dashboard);
        assert_eq!(format!("{NOT_LOADED}\n"), text);
        assert!(!text.contains(LOAD_FAILED), "{text}");
    }

    #[test]
    fn test_message_shows_local_time() {
        let mut message = Message::user("Am I on track?");
        message.timestamp = Utc.with_ymd_and_hms(2025, 10, 20, 14, 5, 0).unwrap();
        let expected = message.timestamp.with_timezone(&Local).format("%H:%M");
        assert_eq!(format!("[{expected}] You: Am I on track?\n"), super::message(&message));
    }

    #[test]
    fn test_conversation() {
        let mut controller = ConversationController::new();
        controller.send_message("How do I save more?").unwrap();
        assert!(conversation(&controller).ends_with(&format!("{THINKING}\n")));

        controller.on_reply(Ok(ChatReply {
            response: "Start with a budget.".into(),
            recommendations: Some(vec!["Cancel unused subscriptions".into()]),
            follow_up_questions: Some(vec!["What is a 50/30/20 budget?".into()]),
        }));
        let text = conversation(&controller);
        let history = controller.history();
        assert_eq!(
            format!(
                "[{}] You: How do I save more?\n\
                 [{}] Coach: Start with a budget.\n  \
                 Recommendations:\n    \
                 - Cancel unused subscriptions\n  \
                 You could also ask:\n    \
                 - What is a 50/30/20 budget?\n",
                clock(history[0].timestamp),
                clock(history[1].timestamp)
            ),
            text
        );
    }
}
