//! Repository layer
//!
//! Repositories are thin adapters over the job server client. They give the
//! services small, focused interfaces for the three server operations and no
//! business logic of their own.
//!
//! All repositories are trait-based to enable testing and mocking.

mod jobs;
mod results;
mod seeds;

// Re-export traits
pub use jobs::JobRepository;
pub use results::ResultRepository;
pub use seeds::SeedRepository;

// Re-export implementations
pub use jobs::HttpJobRepository;
pub use results::HttpResultRepository;
pub use seeds::HttpSeedRepository;
