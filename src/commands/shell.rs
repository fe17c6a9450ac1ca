//! The interactive session: reads commands from stdin while requests run, and prints what changed.

use crate::api::{self, Backend, Mode};
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::model::{FileHandle, Period};
use crate::runtime::Runtime;
use crate::session::{Effect, Notice, Outcome, SessionShell, View};
use crate::{render, Config, Result};
use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

const HELP: &str = "\
Commands:
  view <upload|dashboard|chat>   switch views
  file <path>                    select a .csv, .xlsx or .json file
  upload                         upload the selected file
  period <7d|30d|90d|1y>         show the dashboard for a period
  refresh                        reload the dashboard
  say <message>                  ask the coach
  show                           print the active view
  help                           print this help
  quit                           leave the session";

/// One line of input.
#[derive(Debug, Clone, PartialEq)]
enum Input {
    View(View),
    File(PathBuf),
    Upload,
    Period(Period),
    Refresh,
    Say(String),
    Show,
    Help,
    Quit,
    Empty,
}

impl Input {
    fn parse(line: &str) -> std::result::Result<Self, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let input = match word {
            "" => Input::Empty,
            "view" => Input::View(
                rest.parse()
                    .map_err(|_| format!("Unknown view '{rest}', expected upload, dashboard or chat"))?,
            ),
            "file" if !rest.is_empty() => Input::File(PathBuf::from(rest)),
            "file" => return Err("Usage: file <path>".to_string()),
            "upload" => Input::Upload,
            "period" => Input::Period(
                rest.parse()
                    .map_err(|_| format!("Unknown period '{rest}', expected 7d, 30d, 90d or 1y"))?,
            ),
            "refresh" => Input::Refresh,
            "say" => Input::Say(rest.to_string()),
            "show" | "status" => Input::Show,
            "help" | "?" => Input::Help,
            "quit" | "exit" => Input::Quit,
            other => return Err(format!("Unknown command '{other}', try 'help'")),
        };
        Ok(input)
    }
}

/// Runs the interactive session until `quit` or the end of input.
pub async fn shell(config: Config, mode: Mode) -> Result<Out<()>> {
    let backend = api::backend(&config, mode)?;
    println!("Finance coach at {}. Type 'help' for commands.", config.base_url());
    run(backend).await?;
    Ok("Goodbye".into())
}

async fn run(backend: Arc<dyn Backend>) -> Result<()> {
    let mut shell = SessionShell::with_greeting();
    let mut runtime = Runtime::new(backend);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print!("{}", render::shell(&shell));

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = line
                    .context("Unable to read from stdin")
                    .pub_result(ErrorType::Io)?;
                let Some(line) = line else {
                    break;
                };
                let input = match Input::parse(&line) {
                    Ok(input) => input,
                    Err(message) => {
                        println!("{message}");
                        continue;
                    }
                };
                if input == Input::Quit {
                    break;
                }
                apply(&mut shell, &mut runtime, input).await;
            }
            Some(outcome) = runtime.next_outcome(), if !runtime.is_idle() => {
                on_outcome(&mut shell, &mut runtime, outcome);
            }
        }
    }
    if !runtime.is_idle() {
        debug!("Leaving with requests still in flight");
    }
    Ok(())
}

/// Performs one user action.
async fn apply(shell: &mut SessionShell, runtime: &mut Runtime, input: Input) {
    let effect = match input {
        Input::View(view) => match shell.select_view(view) {
            Ok(()) => {
                print!("{}", render::shell(shell));
                None
            }
            Err(e) => {
                println!("{e}");
                print!("{}", render::view(shell, view));
                None
            }
        },
        Input::File(path) => {
            match FileHandle::open(&path).await.and_then(|f| shell.select_file(f)) {
                Ok(()) => print!("{}", render::upload(shell.upload())),
                Err(e) => println!("{e:#}"),
            }
            None
        }
        Input::Upload => Some(shell.start_upload()),
        Input::Period(period) => Some(shell.set_period(period)),
        Input::Refresh => Some(shell.refresh()),
        Input::Say(text) => Some(shell.send_message(&text)),
        Input::Show => {
            print!("{}", render::shell(shell));
            None
        }
        Input::Help => {
            println!("{HELP}");
            None
        }
        Input::Quit | Input::Empty => None,
    };

    match effect {
        Some(Ok(effect)) => {
            match &effect {
                Effect::Upload(_) => println!("{}", shell.upload().label()),
                Effect::FetchDashboard(ticket) => println!("Loading {}...", ticket.period.label()),
                Effect::SendChat(_) => println!("{}", render::THINKING),
            }
            runtime.submit(effect);
        }
        Some(Err(e)) => println!("{e}"),
        None => {}
    }
}

/// Applies a finished request or progress event and prints what the user needs to see.
fn on_outcome(shell: &mut SessionShell, runtime: &mut Runtime, outcome: Outcome) {
    let before = shell.upload().progress();
    let is_progress = matches!(outcome, Outcome::UploadProgress { .. });
    let notice = shell.handle(outcome);
    if is_progress {
        let after = shell.upload().progress();
        if after / 10 > before / 10 {
            println!("{}", shell.upload().label());
        }
        return;
    }

    let Some(notice) = notice else {
        return;
    };
    println!("{notice}");
    match notice {
        Notice::Ingested(_) => {
            // Opening the dashboard loads it.
            match shell.refresh() {
                Ok(effect) => runtime.submit(effect),
                Err(e) => println!("{e}"),
            }
        }
        Notice::DashboardUpdated(_) => print!("{}", render::dashboard(shell.dashboard())),
        Notice::Replied => {
            if let Some(message) = shell.conversation().history().last() {
                print!("{}", render::message(message));
            }
        }
        Notice::UploadFailed | Notice::DashboardFailed => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TestBackend;
    use crate::test::sample_file;

    #[test]
    fn test_parse() {
        assert_eq!(Ok(Input::View(View::Chat)), Input::parse("view chat"));
        assert_eq!(Ok(Input::Period(Period::Year)), Input::parse("  period 1y "));
        assert_eq!(
            Ok(Input::File(PathBuf::from("my exports/oct.csv"))),
            Input::parse("file my exports/oct.csv")
        );
        assert_eq!(
            Ok(Input::Say("am I saving enough?".to_string())),
            Input::parse("say am I saving enough?")
        );
        assert_eq!(Ok(Input::Empty), Input::parse("   "));
        assert_eq!(Ok(Input::Quit), Input::parse("exit"));
        assert!(Input::parse("period 2w").is_err());
        assert!(Input::parse("view settings").is_err());
        assert!(Input::parse("file").is_err());
        assert!(Input::parse("dance").is_err());
    }

    #[tokio::test]
    async fn test_ingestion_loads_the_dashboard() {
        let backend = TestBackend::new();
        let mut runtime = Runtime::new(Arc::new(backend.clone()));
        let mut shell = SessionShell::with_greeting();
        shell.select_file(sample_file()).unwrap();
        apply(&mut shell, &mut runtime, Input::Upload).await;
        while let Some(outcome) = runtime.next_outcome().await {
            on_outcome(&mut shell, &mut runtime, outcome);
        }
        assert_eq!(View::Dashboard, shell.session().active_view());
        assert_eq!(vec![Period::Month], backend.state().dashboard_requests);
        assert!(shell.dashboard().snapshot().is_some());
    }

    #[tokio::test]
    async fn test_gated_actions_are_reported_not_sent() {
        let backend = TestBackend::new();
        let mut runtime = Runtime::new(Arc::new(backend.clone()));
        let mut shell = SessionShell::new();
        apply(&mut shell, &mut runtime, Input::Period(Period::Week)).await;
        apply(&mut shell, &mut runtime, Input::Say("hi".into())).await;
        apply(&mut shell, &mut runtime, Input::View(View::Chat)).await;
        assert!(runtime.is_idle());
        assert_eq!(View::Upload, shell.session().active_view());
        assert!(backend.state().dashboard_requests.is_empty());
        assert!(backend.state().chat_requests.is_empty());
    }
}
