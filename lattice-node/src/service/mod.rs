//! Service layer
//!
//! Services hold the node's business logic: the retry policy applied to
//! network steps, the one-shot randomness initializer, and job dispatch to
//! registered computation models.
//!
//! Collaborators are trait-based to enable testing and dependency injection.

mod dispatcher;
mod model;
mod randomness;
mod retry;

pub use dispatcher::JobDispatcher;
pub use model::Model;
pub use randomness::{InitError, RandomnessInitializer};
pub use retry::RetryPolicy;
