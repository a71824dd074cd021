//! Route resolution and request handling.

use std::sync::Arc;

use frtm_runs::RunId;
use serde_json::json;
use tracing::debug;

use super::DispatchError;
use crate::jobs::{JobOrchestrator, PendingUpload};
use crate::transport::{Body, BodyPolicy, Method, Request, Response, StatusCode};

/// Tracing target for routing and dispatch events.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// A resolved endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Route {
    /// `GET /`
    Index,
    /// `GET /runs/{id}`
    RunPage(RunId),
    /// `GET /compare?before&after`
    Compare,
    /// `GET /api/runs`
    ListRuns,
    /// `POST /api/runs`, with the upload's name and type already accepted.
    SubmitRun(PendingUpload),
    /// `GET /api/runs/{id}`
    GetRun(RunId),
    /// `POST /api/runs/{id}/delete`
    DeleteRun(RunId),
}

impl Route {
    /// Resolves the request head to a route.
    ///
    /// Unknown paths are `NotFound`; known paths with another method are
    /// `MethodNotAllowed`. Ids and uploads are checked only once the method
    /// matched, so a rejected upload is never spooled.
    pub(crate) fn resolve(request: &Request) -> Result<Self, DispatchError> {
        let method = request.method();
        let path = request.path();
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        let route = match (segments.as_slice(), method) {
            ([""], Method::Get) => Self::Index,
            (["runs", id], Method::Get) => Self::RunPage(parse_id(id)?),
            (["compare"], Method::Get) => Self::Compare,
            (["api", "runs"], Method::Get) => Self::ListRuns,
            (["api", "runs"], Method::Post) => Self::SubmitRun(PendingUpload::validate(
                request.query_param("filename"),
                request.headers().media_type().as_deref(),
            )?),
            (["api", "runs", id], Method::Get) => Self::GetRun(parse_id(id)?),
            (["api", "runs", id, "delete"], Method::Post) => Self::DeleteRun(parse_id(id)?),
            (
                [""]
                | ["runs", _]
                | ["compare"]
                | ["api", "runs"]
                | ["api", "runs", _]
                | ["api", "runs", _, "delete"],
                _,
            ) => {
                return Err(DispatchError::MethodNotAllowed {
                    method: method.to_string(),
                    path: path.to_owned(),
                });
            }
            _ => {
                return Err(DispatchError::NotFound {
                    path: path.to_owned(),
                });
            }
        };
        Ok(route)
    }
}

fn parse_id(value: &str) -> Result<RunId, DispatchError> {
    RunId::parse_str(value).map_err(|_| DispatchError::InvalidRunId {
        value: value.to_owned(),
    })
}

/// A route whose pre-body checks passed, with the body policy it needs.
#[derive(Debug)]
pub(crate) struct PreparedRoute {
    route: Route,
    policy: BodyPolicy,
}

impl PreparedRoute {
    pub(crate) fn policy(&self) -> &BodyPolicy {
        &self.policy
    }
}

/// Stateless mapping from requests to orchestrator calls.
#[derive(Debug, Clone)]
pub(crate) struct RequestRouter {
    jobs: Arc<JobOrchestrator>,
}

impl RequestRouter {
    pub(crate) fn new(jobs: Arc<JobOrchestrator>) -> Self {
        Self { jobs }
    }

    /// Resolves the route and picks how its body is read. Uploads are
    /// spooled next to their final location; everything else is buffered.
    pub(crate) fn prepare(&self, request: &Request) -> Result<PreparedRoute, DispatchError> {
        let route = Route::resolve(request)?;
        let policy = match route {
            Route::SubmitRun(_) => BodyPolicy::Stream {
                staging_dir: self.jobs.upload_staging_dir(),
            },
            _ => BodyPolicy::Buffer,
        };
        Ok(PreparedRoute { route, policy })
    }

    /// Runs the prepared route and renders its response.
    pub(crate) fn dispatch(
        &self,
        prepared: PreparedRoute,
        request: &Request,
        body: Body,
    ) -> Result<Response, DispatchError> {
        debug!(
            target: DISPATCH_TARGET,
            route = ?prepared.route,
            body_bytes = body.len(),
            "dispatching request"
        );
        match prepared.route {
            Route::Index => Ok(Response::html(StatusCode::Ok, self.jobs.index_page()?)),
            Route::RunPage(id) => Ok(Response::html(StatusCode::Ok, self.jobs.run_page(id)?)),
            Route::Compare => {
                let before = required_id(request, "before")?;
                let after = required_id(request, "after")?;
                Ok(Response::html(
                    StatusCode::Ok,
                    self.jobs.comparison_page(before, after)?,
                ))
            }
            Route::ListRuns => Ok(Response::json(StatusCode::Ok, &self.jobs.list_runs()?)),
            Route::GetRun(id) => Ok(Response::json(StatusCode::Ok, &self.jobs.run(id)?)),
            Route::SubmitRun(upload) => {
                let run = self.jobs.submit_upload(upload, body)?;
                Ok(Response::json(
                    StatusCode::Accepted,
                    &json!({ "id": run.id() }),
                ))
            }
            Route::DeleteRun(id) => {
                self.jobs.delete_run(id)?;
                Ok(Response::json(StatusCode::Ok, &json!({ "ok": true })))
            }
        }
    }
}

fn required_id(request: &Request, name: &'static str) -> Result<RunId, DispatchError> {
    let value = request
        .query_param(name)
        .filter(|value| !value.is_empty())
        .ok_or(DispatchError::MissingQuery { name })?;
    parse_id(value)
}
