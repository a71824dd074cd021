//! Run records shared by the job server and its clients.
//!
//! A [`Run`] tracks one uploaded package through analysis. Its status only
//! moves forward along `queued → running → (complete | failed)`; the
//! transition methods on [`Run`] are the only way to change it, and they keep
//! the optional fields consistent with the status.

mod platform;
mod run;
mod status;

pub use platform::{Platform, package_extension};
pub use run::{Run, TransitionError};
pub use status::RunStatus;

/// Run identifiers are random UUIDs assigned at upload time.
pub use uuid::Uuid as RunId;
