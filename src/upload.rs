//! The upload controller: one transaction-file ingestion attempt at a time.
//!
//! The controller never touches the network itself. `start_upload` hands back an `UploadTicket`
//! that the runtime turns into a request, and the request's progress and result are fed back in
//! through `on_progress`, `on_success` and `on_failure`.

use crate::error::{log_failure, Error};
use crate::model::{FileHandle, UploadReceipt};
use crate::Result;
use serde::Serialize;
use tracing::{debug, info, trace};

/// The message shown when an upload fails, whatever the reason.
pub const UPLOAD_FAILED: &str = "Upload failed. Please try again.";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    /// Nothing has been selected yet.
    #[default]
    Idle,
    Selected,
    InFlight,
    Succeeded,
    /// The last upload failed. The file is still selected so it can be retried.
    Failed,
}

/// A request to transfer `file`. `attempt` identifies the attempt that progress and results belong
/// to.
#[derive(Debug, Clone)]
pub struct UploadTicket {
    pub attempt: u64,
    pub file: FileHandle,
}

#[derive(Debug, Default)]
pub struct UploadController {
    file: Option<FileHandle>,
    status: UploadStatus,
    progress: u8,
    attempt: u64,
    last_error: Option<String>,
}

impl UploadController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    /// Percent of the current attempt's body that has been sent, 0 to 100.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn file(&self) -> Option<&FileHandle> {
        self.file.as_ref()
    }

    /// The user-facing error of the last failed attempt, cleared when a new attempt starts.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Selects `file` for the next upload, replacing any previous selection.
    ///
    /// # Errors
    /// A `Validation` error, with nothing changed, if an upload is in flight.
    pub fn select_file(&mut self, file: FileHandle) -> Result<()> {
        if self.status == UploadStatus::InFlight {
            return Err(Error::validation(
                "Cannot select a new file while an upload is in progress",
            ));
        }
        debug!("Selected {} ({} bytes)", file.name(), file.len());
        self.file = Some(file);
        self.status = UploadStatus::Selected;
        self.progress = 0;
        self.last_error = None;
        Ok(())
    }

    /// Starts a new attempt with the selected file. Allowed after selecting a file and after a
    /// failed attempt, which retries the same file.
    ///
    /// # Errors
    /// A `Validation` error, with nothing changed, if no file is selected or an upload is already
    /// in flight. The in-flight upload is not affected.
    pub fn start_upload(&mut self) -> Result<UploadTicket> {
        if self.status == UploadStatus::InFlight {
            return Err(Error::validation("An upload is already in progress"));
        }
        let file = match &self.file {
            Some(file) => file.clone(),
            None => return Err(Error::validation("No file selected")),
        };
        self.attempt += 1;
        self.status = UploadStatus::InFlight;
        self.progress = 0;
        self.last_error = None;
        info!("Uploading {} (attempt {})", file.name(), self.attempt);
        Ok(UploadTicket {
            attempt: self.attempt,
            file,
        })
    }

    /// Records a transfer progress event. Ignored unless `attempt` is in flight, and ignored when
    /// it would move progress backwards. Returns whether the progress changed.
    pub fn on_progress(&mut self, attempt: u64, sent: u64, total: u64) -> bool {
        if !self.is_current(attempt) {
            return false;
        }
        let percent = percent(sent, total);
        if percent <= self.progress {
            return false;
        }
        trace!("Upload progress {percent}%");
        self.progress = percent;
        true
    }

    /// Completes `attempt` successfully. Returns the receipt to pass on to the session, or `None`
    /// if `attempt` is not the one in flight.
    pub fn on_success(&mut self, attempt: u64, receipt: UploadReceipt) -> Option<UploadReceipt> {
        if !self.is_current(attempt) {
            debug!("Ignoring the result of stale upload attempt {attempt}");
            return None;
        }
        info!("Upload succeeded: {receipt}");
        self.status = UploadStatus::Succeeded;
        self.file = None;
        self.progress = 0;
        Some(receipt)
    }

    /// Completes `attempt` with a failure. The file stays selected. Returns whether the failure
    /// was applied.
    pub fn on_failure(&mut self, attempt: u64, error: &Error) -> bool {
        if !self.is_current(attempt) {
            return false;
        }
        log_failure("Upload", error);
        self.status = UploadStatus::Failed;
        self.last_error = Some(UPLOAD_FAILED.to_string());
        true
    }

    /// The label of the upload button.
    pub fn label(&self) -> String {
        match self.status {
            UploadStatus::InFlight => format!("Uploading... {}%", self.progress),
            _ => "Upload".to_string(),
        }
    }

    fn is_current(&self, attempt: u64) -> bool {
        self.status == UploadStatus::InFlight && attempt == self.attempt
    }
}

/// `round(sent / total * 100)` clamped to `[0, 100]`. An empty body counts as fully sent.
pub fn percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let ratio = sent as f64 / total as f64 * 100.0;
    ratio.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::sample_file;

    #[test]
    fn test_percent() {
        assert_eq!(0, percent(0, 200));
        assert_eq!(50, percent(100, 200));
        assert_eq!(33, percent(1, 3));
        assert_eq!(67, percent(2, 3));
        assert_eq!(100, percent(300, 200));
        assert_eq!(100, percent(0, 0));
    }

    #[test]
    fn test_start_without_file_is_rejected() {
        let mut upload = UploadController::new();
        let err = upload.start_upload().unwrap_err();
        assert!(err.is_validation());
        assert_eq!(UploadStatus::Idle, upload.status());
    }

    #[test]
    fn test_successful_attempt() {
        let mut upload = UploadController::new();
        upload.select_file(sample_file()).unwrap();
        assert_eq!(UploadStatus::Selected, upload.status());

        let ticket = upload.start_upload().unwrap();
        assert_eq!(UploadStatus::InFlight, upload.status());
        assert_eq!("Uploading... 0%", upload.label());

        let mut observed = Vec::new();
        for (sent, total) in [(10, 100), (55, 100), (40, 100), (100, 100)] {
            upload.on_progress(ticket.attempt, sent, total);
            observed.push(upload.progress());
        }
        assert_eq!(vec![10, 55, 55, 100], observed);

        let receipt = upload.on_success(ticket.attempt, UploadReceipt::default());
        assert!(receipt.is_some());
        assert_eq!(UploadStatus::Succeeded, upload.status());
        assert!(upload.file().is_none());
        assert_eq!(0, upload.progress());
        assert_eq!("Upload", upload.label());
    }

    #[test]
    fn test_failure_keeps_file_for_retry() {
        let mut upload = UploadController::new();
        upload.select_file(sample_file()).unwrap();
        let ticket = upload.start_upload().unwrap();
        upload.on_progress(ticket.attempt, 30, 100);

        assert!(upload.on_failure(ticket.attempt, &Error::transport("connection reset")));
        assert_eq!(UploadStatus::Failed, upload.status());
        assert_eq!(Some(UPLOAD_FAILED), upload.last_error());
        assert_eq!(Some("transactions.csv"), upload.file().map(|f| f.name()));

        let retry = upload.start_upload().unwrap();
        assert_eq!(ticket.attempt + 1, retry.attempt);
        assert_eq!(0, upload.progress());
        assert_eq!(None, upload.last_error());
    }

    #[test]
    fn test_no_second_upload_while_in_flight() {
        let mut upload = UploadController::new();
        upload.select_file(sample_file()).unwrap();
        let ticket = upload.start_upload().unwrap();
        upload.on_progress(ticket.attempt, 20, 100);

        assert!(upload.start_upload().unwrap_err().is_validation());
        assert!(upload.select_file(sample_file()).unwrap_err().is_validation());
        assert_eq!(UploadStatus::InFlight, upload.status());
        assert_eq!(20, upload.progress());

        // The first attempt still completes normally.
        assert!(upload
            .on_success(ticket.attempt, UploadReceipt::default())
            .is_some());
    }

    #[test]
    fn test_stale_attempt_is_ignored() {
        let mut upload = UploadController::new();
        upload.select_file(sample_file()).unwrap();
        let first = upload.start_upload().unwrap();
        upload.on_failure(first.attempt, &Error::transport("timeout"));
        let second = upload.start_upload().unwrap();

        assert!(!upload.on_progress(first.attempt, 90, 100));
        assert!(upload
            .on_success(first.attempt, UploadReceipt::default())
            .is_none());
        assert_eq!(UploadStatus::InFlight, upload.status());
        assert!(upload.on_progress(second.attempt, 90, 100));
    }

    #[test]
    fn test_select_after_success_starts_over() {
        let mut upload = UploadController::new();
        upload.select_file(sample_file()).unwrap();
        let ticket = upload.start_upload().unwrap();
        upload.on_success(ticket.attempt, UploadReceipt::default());
        assert!(upload.start_upload().unwrap_err().is_validation());

        upload.select_file(sample_file()).unwrap();
        assert_eq!(UploadStatus::Selected, upload.status());
    }
}
