//! Core domain types
//!
//! These types are shared between the node (which executes jobs and emits
//! logs) and the client (which moves them over the wire).

pub mod job;
pub mod log;
