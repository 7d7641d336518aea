//! Lattice grid client
//!
//! The job server exposes exactly three calls to a node, and each lives in
//! its own module as an `impl GridClient` block:
//! - `seeds`: `GET /seeds`, the shared randomness seeds
//! - `jobs`: `GET /jobs/next?nodeId=..`, the next queued job for a node
//! - `results`: `POST /results`, a finished job result
//!
//! "Nothing there yet" is not an error on this API: a `204`, an empty body
//! and a JSON `null` all come back as `Ok(None)`.
//!
//! ```no_run
//! use lattice_client::GridClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let grid = GridClient::new("http://localhost:8080/api");
//!
//!     match grid.next_job("worker-1:123456").await? {
//!         Some(job) => println!("next job: {:?}", job.id),
//!         None => println!("queue empty"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;
mod results;
mod seeds;

pub use error::{ClientError, Result};
pub use lattice_core::dto::result::Acknowledgement;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

/// Handle on one job server
///
/// Cheap to clone; the node shares a single instance between its seed, job
/// and result repositories.
#[derive(Debug, Clone)]
pub struct GridClient {
    /// Scheme, host, port and base path; never ends with `/`
    base_url: String,
    client: Client,
}

impl GridClient {
    /// Client with reqwest's defaults (no request timeout)
    ///
    /// ```
    /// let grid = lattice_client::GridClient::new("http://grid.local:8080/");
    /// assert_eq!(grid.base_url(), "http://grid.local:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Client over a preconfigured reqwest client
    ///
    /// The node uses this to apply its request timeout, so a hung server
    /// costs one failed attempt instead of a stuck tick.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Reads a grid answer whose body may be absent
    async fn read_optional<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<Option<T>> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::api_error(status.as_u16(), body));
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        parse_optional_body(&response.text().await?)
    }
}

/// Parses a response body that may be empty or `null`
pub(crate) fn parse_optional_body<T: DeserializeOwned>(body: &str) -> Result<Option<T>> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(None);
    }

    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| ClientError::ParseError(e.to_string()))
}
