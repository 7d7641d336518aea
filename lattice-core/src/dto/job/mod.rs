//! Job DTOs for node/server communication

use serde::{Deserialize, Serialize};

/// Query string for the next-job endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextJobQuery {
    pub node_id: String,
}
