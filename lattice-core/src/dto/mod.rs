//! Data Transfer Objects for node/server communication
//!
//! Small request and response shapes that only exist on the wire.

pub mod job;
pub mod result;
