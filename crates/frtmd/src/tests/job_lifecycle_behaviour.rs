//! Behavioural tests driving analysis runs through the HTTP API.

use std::cell::RefCell;
use std::path::Path;
use std::sync::Arc;

use frtm_runs::Platform;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;

use crate::collaborators::{Analysis, Analyzer, AnalyzerError, Collaborators, PlainHtmlRenderer};

use super::support::{HttpReply, TestConfigLoader, TestServer, get, post, upload};

const ANALYZER_FAILURE: &str = "package is not a zip archive";

struct RejectingAnalyzer;

impl Analyzer for RejectingAnalyzer {
    fn analyze(
        &self,
        _platform: Platform,
        _package: &Path,
    ) -> Result<Option<Analysis>, AnalyzerError> {
        Err(AnalyzerError::new(ANALYZER_FAILURE))
    }
}

#[derive(Default)]
struct LifecycleWorld {
    server: Option<TestServer>,
    reply: Option<HttpReply>,
    run_id: Option<String>,
    final_run: Option<Value>,
}

impl LifecycleWorld {
    fn server(&self) -> &TestServer {
        self.server.as_ref().expect("job server not started")
    }

    fn reply(&self) -> &HttpReply {
        self.reply.as_ref().expect("no request sent")
    }

    fn run_id(&self) -> &str {
        self.run_id.as_deref().expect("no run submitted")
    }

    fn submit(&mut self, file_name: &str) {
        let reply = upload(self.server().addr(), file_name, b"package bytes");
        if reply.status == 202 {
            self.run_id = reply.json()["id"].as_str().map(str::to_owned);
        }
        self.reply = Some(reply);
    }

    fn delete(&self) -> HttpReply {
        post(
            self.server().addr(),
            &format!("/api/runs/{}/delete", self.run_id()),
            None,
            b"",
        )
    }
}

#[fixture]
fn world() -> RefCell<LifecycleWorld> {
    RefCell::new(LifecycleWorld::default())
}

#[given("a running job server")]
fn given_server(world: &RefCell<LifecycleWorld>) {
    world.borrow_mut().server = Some(TestServer::start());
}

#[given("a running job server whose analyzer fails")]
fn given_failing_server(world: &RefCell<LifecycleWorld>) {
    let collaborators =
        Collaborators::new(Arc::new(RejectingAnalyzer), Arc::new(PlainHtmlRenderer));
    let server = TestServer::start_with(TestConfigLoader::new(), collaborators);
    world.borrow_mut().server = Some(server);
}

#[given("a completed run for {file_name}")]
fn given_completed_run(world: &RefCell<LifecycleWorld>, file_name: String) {
    let mut world = world.borrow_mut();
    world.submit(&file_name);
    let (run, _) = world.server().await_terminal(world.run_id());
    assert_eq!(run["status"], "complete");
}

#[when("a package named {file_name} is uploaded")]
fn when_package_uploaded(world: &RefCell<LifecycleWorld>, file_name: String) {
    world.borrow_mut().submit(&file_name);
}

#[when("the run is deleted")]
fn when_run_deleted(world: &RefCell<LifecycleWorld>) {
    let mut world = world.borrow_mut();
    let reply = world.delete();
    world.reply = Some(reply);
}

#[then("the upload is accepted")]
fn then_upload_accepted(world: &RefCell<LifecycleWorld>) {
    let world = world.borrow();
    assert_eq!(world.reply().status, 202, "{}", world.reply().text());
    assert!(world.run_id.is_some(), "accepted upload carried no id");
}

#[then("the upload is rejected with status {status}")]
fn then_upload_rejected(world: &RefCell<LifecycleWorld>, status: u16) {
    assert_eq!(world.borrow().reply().status, status);
}

#[then("the run eventually reaches {status}")]
fn then_run_reaches(world: &RefCell<LifecycleWorld>, status: String) {
    let mut world = world.borrow_mut();
    let (run, _) = world.server().await_terminal(world.run_id());
    assert_eq!(run["status"], status.as_str(), "{run}");
    world.final_run = Some(run);
}

#[then("the run page shows the analysis report")]
fn then_report_page(world: &RefCell<LifecycleWorld>) {
    let world = world.borrow();
    let page = get(world.server().addr(), &format!("/runs/{}", world.run_id()));
    assert_eq!(page.status, 200);
    assert!(page.text().contains("sha256"), "report missing analysis");
}

#[then("the run records the analyzer error")]
fn then_run_records_error(world: &RefCell<LifecycleWorld>) {
    let world = world.borrow();
    let run = world.final_run.as_ref().expect("run not finished");
    assert_eq!(run["errorMessage"], ANALYZER_FAILURE);
    assert_eq!(run["analysisRelativePath"], Value::Null);
}

#[then("no runs are stored")]
fn then_no_runs(world: &RefCell<LifecycleWorld>) {
    assert_eq!(world.borrow().server().run_count(), 0);
}

#[then("the run is no longer found")]
fn then_run_gone(world: &RefCell<LifecycleWorld>) {
    let world = world.borrow();
    assert_eq!(world.reply().status, 200);
    let lookup = get(world.server().addr(), &format!("/api/runs/{}", world.run_id()));
    assert_eq!(lookup.status, 404);
}

#[then("deleting the run again is not found")]
fn then_second_delete_not_found(world: &RefCell<LifecycleWorld>) {
    assert_eq!(world.borrow().delete().status, 404);
}

#[scenario(
    path = "tests/features/job_lifecycle.feature",
    name = "An uploaded package is analysed"
)]
fn package_is_analysed(world: RefCell<LifecycleWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/job_lifecycle.feature",
    name = "A failing analyzer marks the run failed"
)]
fn failing_analyzer_fails_run(world: RefCell<LifecycleWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/job_lifecycle.feature",
    name = "An unsupported package creates no run"
)]
fn unsupported_package_is_rejected(world: RefCell<LifecycleWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/job_lifecycle.feature",
    name = "Deleting a run removes it"
)]
fn deleted_run_is_gone(world: RefCell<LifecycleWorld>) {
    let _ = world;
}
