//! HTTP request dispatch.
//!
//! Requests arrive from the transport layer through
//! [`HttpConnectionHandler`], which implements the transport's
//! `ConnectionHandler` trait. Routing is a pure function of method and path;
//! every route delegates to the [`JobOrchestrator`](crate::jobs::JobOrchestrator).
//!
//! ## Endpoints
//!
//! | Method | Path | Success |
//! |---|---|---|
//! | GET | `/` | HTML run list |
//! | GET | `/runs/{id}` | HTML status or report |
//! | GET | `/compare?before={id}&after={id}` | HTML comparison |
//! | GET | `/api/runs` | JSON array of runs |
//! | POST | `/api/runs?filename={name}` | `202 {"id": ...}` |
//! | GET | `/api/runs/{id}` | JSON run |
//! | POST | `/api/runs/{id}/delete` | `{"ok": true}` |
//!
//! Failures are answered with `{"error": {"code": ..., "message": ...}}`.

mod errors;
mod handler;
mod router;

pub use self::errors::DispatchError;
pub(crate) use self::handler::HttpConnectionHandler;
pub(crate) use self::router::{DISPATCH_TARGET, RequestRouter};
