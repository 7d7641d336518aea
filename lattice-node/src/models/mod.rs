//! Built-in computation models
//!
//! Other engines plug in by implementing [`crate::service::Model`].

mod sampling;

pub use sampling::SamplingModel;
