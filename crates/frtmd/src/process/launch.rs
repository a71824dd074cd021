//! Supervises daemon launch sequencing.

use std::sync::Arc;

use tracing::info;

use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::collaborators::Collaborators;
use crate::health::{HealthReporter, StructuredHealthReporter};

use super::server::RunningServer;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};
use super::{LaunchError, PROCESS_TARGET};

/// Collaborators required to launch the daemon.
pub(crate) struct LaunchPlan<L, S> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) collaborators: Collaborators,
    pub(crate) shutdown: S,
}

/// Runs the daemon with the production collaborators until a termination
/// signal arrives.
pub fn run_daemon() -> Result<(), LaunchError> {
    run_daemon_with(LaunchPlan {
        loader: SystemConfigLoader,
        reporter: Arc::new(StructuredHealthReporter::new()),
        collaborators: Collaborators::placeholder(),
        shutdown: SystemShutdownSignal::new(),
    })
}

/// Runs the daemon with injected collaborators.
pub(crate) fn run_daemon_with<L, S>(plan: LaunchPlan<L, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
{
    let LaunchPlan {
        loader,
        reporter,
        collaborators,
        shutdown,
    } = plan;

    info!(target: PROCESS_TARGET, "starting daemon runtime");
    let daemon = bootstrap_with(&loader, reporter, collaborators)?;
    let server = RunningServer::start(&daemon)?;
    shutdown.wait()?;
    server.stop()?;
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}
