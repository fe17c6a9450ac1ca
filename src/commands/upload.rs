use crate::api::{self, Backend, Mode};
use crate::commands::Out;
use crate::error::Error;
use crate::model::{FileHandle, UploadReceipt};
use crate::runtime::Runtime;
use crate::session::{Notice, Outcome, SessionShell};
use crate::upload::UPLOAD_FAILED;
use crate::{Config, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Uploads the transaction file at `path`, logging progress as it goes.
pub async fn upload(config: Config, mode: Mode, path: &Path) -> Result<Out<UploadReceipt>> {
    let backend = api::backend(&config, mode)?;
    upload_with(backend, path).await
}

async fn upload_with(backend: Arc<dyn Backend>, path: &Path) -> Result<Out<UploadReceipt>> {
    let file = FileHandle::open(path).await?;
    let mut shell = SessionShell::new();
    let mut runtime = Runtime::new(backend);
    shell.select_file(file)?;
    runtime.submit(shell.start_upload()?);

    let mut shown = 0;
    while let Some(outcome) = runtime.next_outcome().await {
        let is_progress = matches!(outcome, Outcome::UploadProgress { .. });
        let notice = shell.handle(outcome);
        let progress = shell.upload().progress();
        if is_progress && progress / 10 > shown / 10 {
            info!("{}", shell.upload().label());
            shown = progress;
        }
        match notice {
            Some(Notice::Ingested(receipt)) => return Ok(Out::new(receipt.to_string(), receipt)),
            Some(Notice::UploadFailed) => return Err(Error::transport(UPLOAD_FAILED)),
            _ => {}
        }
    }
    Err(Error::transport(UPLOAD_FAILED))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TestBackend;
    use crate::ErrorType;
    use tempfile::TempDir;

    async fn write_file(dir: &TempDir, name: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        tokio::fs::write(&path, "Date,Description,Amount\n2025-10-20,Coffee,-4.50\n")
            .await
            .unwrap();
        path
    }

    #[tokio::test]
    async fn test_upload_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "october.csv").await;
        let backend = TestBackend::new();
        let out = upload_with(Arc::new(backend.clone()), &path).await.unwrap();
        assert!(out.message().starts_with("Transactions uploaded successfully"));
        assert_eq!(vec!["october.csv".to_string()], backend.state().uploads);
    }

    #[tokio::test]
    async fn test_upload_failure() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "october.csv").await;
        let backend = TestBackend::new();
        backend.state().fail_uploads = true;
        let err = upload_with(Arc::new(backend), &path).await.unwrap_err();
        assert_eq!(ErrorType::Transport, err.error_type());
        assert_eq!(UPLOAD_FAILED, err.to_string());
    }

    #[tokio::test]
    async fn test_unsupported_extension_is_not_sent() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "october.txt").await;
        let backend = TestBackend::new();
        let err = upload_with(Arc::new(backend.clone()), &path)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(backend.state().uploads.is_empty());
    }
}
