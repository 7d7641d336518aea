//! Node lifecycle states
//!
//! ```text
//! Uninitialized ─► Initializing ─► Idle ─► Fetching ─► Executing ─► Reporting ─┐
//!                       │            ▲         │            │                    │
//!                       ▼            └─────────┴────────────┴────────────────────┘
//!                     Failed
//! ```
//!
//! There is no terminal success state; the loop runs until cancelled.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Uninitialized,
    Initializing,
    /// Randomness never became available; the node must stop
    Failed,
    Idle,
    Fetching,
    Executing,
    Reporting,
}

impl NodeState {
    /// Whether a job is being processed
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            NodeState::Fetching | NodeState::Executing | NodeState::Reporting
        )
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeState::Uninitialized => "uninitialized",
            NodeState::Initializing => "initializing",
            NodeState::Failed => "failed",
            NodeState::Idle => "idle",
            NodeState::Fetching => "fetching",
            NodeState::Executing => "executing",
            NodeState::Reporting => "reporting",
        };
        f.write_str(name)
    }
}
