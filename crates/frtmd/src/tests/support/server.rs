//! A bootstrapped daemon serving HTTP on an ephemeral port.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::bootstrap::{Daemon, bootstrap_with};
use crate::collaborators::Collaborators;
use crate::process::RunningServer;

use super::{RecordingHealthReporter, TestConfigLoader, get};

/// Daemon plus running server, stopped on drop.
pub struct TestServer {
    loader: TestConfigLoader,
    daemon: Daemon,
    server: Option<RunningServer>,
}

impl TestServer {
    /// Starts a server with the placeholder collaborators.
    pub fn start() -> Self {
        Self::start_with(TestConfigLoader::new(), Collaborators::placeholder())
    }

    pub fn start_with(loader: TestConfigLoader, collaborators: Collaborators) -> Self {
        let reporter = Arc::new(RecordingHealthReporter::default());
        let daemon = bootstrap_with(&loader, reporter, collaborators).expect("bootstrap daemon");
        let server = RunningServer::start(&daemon).expect("start server");
        Self {
            loader,
            daemon,
            server: Some(server),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.server
            .as_ref()
            .map(RunningServer::local_addr)
            .expect("server running")
    }

    pub fn loader(&self) -> &TestConfigLoader {
        &self.loader
    }

    pub fn daemon(&self) -> &Daemon {
        &self.daemon
    }

    /// Number of runs reported by the JSON API.
    pub fn run_count(&self) -> usize {
        get(self.addr(), "/api/runs")
            .json()
            .as_array()
            .map(Vec::len)
            .expect("run list is an array")
    }

    /// Polls the JSON API until the run reaches a terminal status, recording
    /// every status observed on the way.
    pub fn await_terminal(&self, id: &str) -> (Value, Vec<String>) {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut observed: Vec<String> = Vec::new();
        loop {
            let run = get(self.addr(), &format!("/api/runs/{id}")).json();
            let status = run["status"].as_str().expect("status string").to_owned();
            if observed.last() != Some(&status) {
                observed.push(status.clone());
            }
            if status == "complete" || status == "failed" {
                return (run, observed);
            }
            assert!(Instant::now() < deadline, "run {id} never finished: {observed:?}");
            std::thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(server) = self.server.take() {
            let _ = server.stop();
        }
    }
}
