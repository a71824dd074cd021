use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Platform, RunStatus};

/// One uploaded package and the state of its analysis.
///
/// `analysis_relative_path` is present exactly when the run is complete and
/// `error_message` exactly when it failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    platform: Platform,
    original_file_name: String,
    status: RunStatus,
    #[serde(default)]
    error_message: Option<String>,
    uploaded_file_relative_path: String,
    #[serde(default)]
    analysis_relative_path: Option<String>,
}

/// Raised when a status change would skip or reverse the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("run {id} cannot move from {from} to {to}")]
pub struct TransitionError {
    /// Run the transition was attempted on.
    pub id: Uuid,
    /// Status the run was in.
    pub from: RunStatus,
    /// Status that was requested.
    pub to: RunStatus,
}

impl Run {
    /// Creates a queued run whose package is already stored at
    /// `uploaded_file_relative_path`.
    #[must_use]
    pub fn queued(
        id: Uuid,
        platform: Platform,
        original_file_name: impl Into<String>,
        uploaded_file_relative_path: impl Into<String>,
    ) -> Self {
        Self {
            id,
            created_at: OffsetDateTime::now_utc(),
            platform,
            original_file_name: original_file_name.into(),
            status: RunStatus::Queued,
            error_message: None,
            uploaded_file_relative_path: uploaded_file_relative_path.into(),
            analysis_relative_path: None,
        }
    }

    /// Run identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Upload timestamp (UTC).
    #[must_use]
    pub const fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    /// Package family.
    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// File name supplied by the client.
    #[must_use]
    pub fn original_file_name(&self) -> &str {
        &self.original_file_name
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// Failure message; set only for failed runs.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Package location relative to the content root.
    #[must_use]
    pub fn uploaded_file_relative_path(&self) -> &str {
        &self.uploaded_file_relative_path
    }

    /// Analysis location relative to the content root; set only for complete runs.
    #[must_use]
    pub fn analysis_relative_path(&self) -> Option<&str> {
        self.analysis_relative_path.as_deref()
    }

    /// Whether the run has a stored analysis.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Complete
    }

    /// Moves a queued run to `running`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] unless the run is queued.
    pub fn mark_running(&mut self) -> Result<(), TransitionError> {
        self.transition(RunStatus::Running)
    }

    /// Moves a running run to `complete` and records its analysis location.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] unless the run is running.
    pub fn mark_complete(
        &mut self,
        analysis_relative_path: impl Into<String>,
    ) -> Result<(), TransitionError> {
        self.transition(RunStatus::Complete)?;
        self.analysis_relative_path = Some(analysis_relative_path.into());
        Ok(())
    }

    /// Moves a running run to `failed` and records the message.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] unless the run is running.
    pub fn mark_failed(&mut self, message: impl Into<String>) -> Result<(), TransitionError> {
        self.transition(RunStatus::Failed)?;
        self.error_message = Some(message.into());
        Ok(())
    }

    fn transition(&mut self, next: RunStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                id: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn run() -> Run {
        Run::queued(
            Uuid::new_v4(),
            Platform::Ipa,
            "app.ipa",
            "uploads/app.ipa",
        )
    }

    #[rstest]
    fn new_run_is_queued(run: Run) {
        assert_eq!(run.status(), RunStatus::Queued);
        assert!(run.error_message().is_none());
        assert!(run.analysis_relative_path().is_none());
    }

    #[rstest]
    fn completes_after_running(mut run: Run) {
        run.mark_running().expect("queued to running");
        run.mark_complete("analyses/x.json").expect("running to complete");
        assert!(run.is_complete());
        assert_eq!(run.analysis_relative_path(), Some("analyses/x.json"));
        assert!(run.error_message().is_none());
    }

    #[rstest]
    fn failure_records_message(mut run: Run) {
        run.mark_running().expect("queued to running");
        run.mark_failed("boom").expect("running to failed");
        assert_eq!(run.status(), RunStatus::Failed);
        assert_eq!(run.error_message(), Some("boom"));
        assert!(run.analysis_relative_path().is_none());
    }

    #[rstest]
    fn cannot_skip_running(mut run: Run) {
        let error = run
            .mark_complete("analyses/x.json")
            .expect_err("queued cannot complete");
        assert_eq!(error.from, RunStatus::Queued);
        assert_eq!(error.to, RunStatus::Complete);
        assert!(run.analysis_relative_path().is_none());
    }

    #[rstest]
    fn terminal_runs_stay_put(mut run: Run) {
        run.mark_running().expect("queued to running");
        run.mark_failed("boom").expect("running to failed");
        assert!(run.mark_running().is_err());
        assert!(run.mark_complete("analyses/x.json").is_err());
        assert_eq!(run.error_message(), Some("boom"));
    }

    #[rstest]
    fn serializes_camel_case_fields(run: Run) {
        let value = serde_json::to_value(&run).expect("serialize run");
        assert_eq!(value["platform"], "ipa");
        assert_eq!(value["status"], "queued");
        assert_eq!(value["originalFileName"], "app.ipa");
        assert_eq!(value["uploadedFileRelativePath"], "uploads/app.ipa");
        assert!(value["analysisRelativePath"].is_null());
        assert!(value["errorMessage"].is_null());
        assert!(value["createdAt"].is_string());
    }

    #[rstest]
    fn json_round_trip_is_lossless(mut run: Run) {
        run.mark_running().expect("queued to running");
        run.mark_complete("analyses/x.json").expect("running to complete");
        let json = serde_json::to_string(&run).expect("serialize run");
        let restored: Run = serde_json::from_str(&json).expect("deserialize run");
        assert_eq!(restored, run);
    }
}
