//! Log pipeline
//!
//! Every component of the node emits structured [`LogRecord`]s through one
//! shared [`LogBus`]. The console renderer is just one subscriber; tests and
//! monitoring tools attach their own receivers to the same stream.
//!
//! [`LogRecord`]: lattice_core::domain::log::LogRecord

mod bus;
mod console;

pub use bus::{LogBus, Logger};
pub use console::{ConsoleRenderer, spawn_console};

#[cfg(test)]
pub(crate) use console::{spawn_sink, tests::Captured};
