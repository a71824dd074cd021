//! Daemon bootstrap orchestration.

use std::sync::Arc;

use frtm_config::Config;
use ortho_config::OrthoError;
use thiserror::Error;

use crate::collaborators::Collaborators;
use crate::health::HealthReporter;
use crate::jobs::{JobError, JobOrchestrator};
use crate::store::{RunStore, StoreError};
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the daemon configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that reads defaults, the config file, `FRTM_*` variables, and the
/// command line.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_env()
    }
}

/// Loader that returns a pre-resolved configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        #[source]
        source: TelemetryError,
    },
    /// The content root could not be opened.
    #[error("failed to open content root: {source}")]
    Store {
        #[source]
        source: StoreError,
    },
    /// Reconciling interrupted runs failed.
    #[error("failed to recover interrupted runs: {source}")]
    Recovery {
        #[source]
        source: JobError,
    },
}

/// Result of a successful bootstrap invocation.
pub struct Daemon {
    config: Config,
    jobs: Arc<JobOrchestrator>,
    telemetry: TelemetryHandle,
}

impl Daemon {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Orchestrator serving the content root.
    #[must_use]
    pub fn jobs(&self) -> &Arc<JobOrchestrator> {
        &self.jobs
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }
}

impl std::fmt::Debug for Daemon {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Daemon")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Bootstraps the daemon using the supplied collaborators.
///
/// Loads configuration, initialises telemetry, opens the run store, and,
/// when enabled, reconciles runs interrupted by a previous process.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    collaborators: Collaborators,
) -> Result<Daemon, BootstrapError> {
    reporter.bootstrap_starting();
    let fail = |error: BootstrapError| {
        reporter.bootstrap_failed(&error);
        error
    };

    let config = loader
        .load()
        .map_err(|source| fail(BootstrapError::Configuration { source }))?;

    let telemetry = telemetry::initialise(&config)
        .map_err(|source| fail(BootstrapError::Telemetry { source }))?;

    let store = RunStore::open(config.content_root().as_std_path())
        .map_err(|source| fail(BootstrapError::Store { source }))?;
    let jobs = Arc::new(JobOrchestrator::new(Arc::new(store), collaborators));

    if config.recover_interrupted_runs() {
        let report = jobs
            .recover_interrupted_runs()
            .map_err(|source| fail(BootstrapError::Recovery { source }))?;
        reporter.runs_recovered(&report);
    }

    reporter.bootstrap_succeeded(&config);
    Ok(Daemon {
        config,
        jobs,
        telemetry,
    })
}
