//! Result DTOs for node/server communication

use serde::{Deserialize, Serialize};

/// Server acknowledgement of a posted job result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acknowledgement {
    pub accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Acknowledgement {
    /// Acknowledgement assumed when the server answers with an empty body
    pub fn implicit() -> Self {
        Self {
            accepted: true,
            message: None,
        }
    }
}
