//! Lifecycle events of the job server, reported to an observer.

use std::sync::Arc;

use frtm_config::Config;

use crate::bootstrap::BootstrapError;
use crate::store::RecoveryReport;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Receives bootstrap progress and startup recovery results.
pub trait HealthReporter: Send + Sync {
    /// Bootstrap is about to load configuration.
    fn bootstrap_starting(&self);

    /// The store is open and the server can be started with `config`.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Bootstrap stopped at `error`; no server will be started.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Runs left over by a previous process were failed or requeued.
    fn runs_recovered(&self, report: &RecoveryReport);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        T::bootstrap_starting(self);
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        T::bootstrap_succeeded(self, config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        T::bootstrap_failed(self, error);
    }

    fn runs_recovered(&self, report: &RecoveryReport) {
        T::runs_recovered(self, report);
    }
}

/// Writes each lifecycle event to the `frtmd::health` log target.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "bootstrapping job server"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            listen = %config.listen_address(),
            content_root = %config.content_root(),
            recover_interrupted_runs = config.recover_interrupted_runs(),
            log_format = %config.log_format(),
            "job server ready"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "job server bootstrap failed"
        );
    }

    fn runs_recovered(&self, report: &RecoveryReport) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "runs_recovered",
            interrupted = report.interrupted.len(),
            requeued = report.requeued.len(),
            "reconciled runs from previous process"
        );
    }
}
