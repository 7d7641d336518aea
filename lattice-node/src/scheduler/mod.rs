//! Scheduler layer for the node
//!
//! Drives the polling clock: initializes randomness once, then on every
//! tick fetches, executes and reports at most one job at a time.

pub mod orchestrator;
pub mod state;

pub use orchestrator::Orchestrator;
