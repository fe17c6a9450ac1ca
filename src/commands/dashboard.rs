use crate::api::{self, Backend, Mode};
use crate::commands::Out;
use crate::dashboard::{Applied, DashboardController, LOAD_FAILED};
use crate::error::Error;
use crate::model::{AnalyticsSnapshot, Period};
use crate::{render, Config, Result};

/// Fetches and renders the dashboard for `period`.
///
/// The server only has data after an upload, but that is for the server to say; this command does
/// not track whether anything was uploaded before.
pub async fn dashboard(
    config: Config,
    mode: Mode,
    period: Period,
) -> Result<Out<AnalyticsSnapshot>> {
    let backend = api::backend(&config, mode)?;
    dashboard_with(backend.as_ref(), period).await
}

async fn dashboard_with(backend: &dyn Backend, period: Period) -> Result<Out<AnalyticsSnapshot>> {
    let mut controller = DashboardController::new();
    let ticket = controller.set_period(period);
    let result = backend.dashboard(ticket.period).await;
    match (controller.apply(ticket, result), controller.snapshot()) {
        (Applied::Replaced, Some(snapshot)) => {
            Ok(Out::new(render::snapshot(snapshot), snapshot.clone()))
        }
        _ => Err(Error::transport(LOAD_FAILED)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TestBackend;

    #[tokio::test]
    async fn test_dashboard() {
        let backend = TestBackend::new();
        let out = dashboard_with(&backend, Period::Quarter).await.unwrap();
        assert!(out.message().starts_with("Last 90 days\n"), "{}", out.message());
        assert_eq!(Period::Quarter, out.structure().unwrap().period);
        assert_eq!(vec![Period::Quarter], backend.state().dashboard_requests);
    }

    #[tokio::test]
    async fn test_dashboard_failure() {
        let backend = TestBackend::new();
        backend.state().fail_dashboard = true;
        let err = dashboard_with(&backend, Period::Month).await.unwrap_err();
        assert_eq!(LOAD_FAILED, err.to_string());
    }
}
