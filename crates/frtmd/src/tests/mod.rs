//! Test suites for the job server daemon.

mod job_lifecycle_behaviour;
mod support;
