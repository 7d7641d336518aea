//! Node identity
//!
//! A node is identified by `machineId:instanceId`. The machine part is
//! stable across restarts (configured or host-derived); the instance part is
//! drawn fresh for every process so a restarted node never reuses an id.

use rand::Rng;
use std::fmt;

const UNKNOWN_HOST: &str = "unknown-host";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    machine_id: String,
    instance_id: String,
    node_id: String,
}

impl NodeIdentity {
    pub fn new(machine_id: impl Into<String>, instance_id: impl Into<String>) -> Self {
        let machine_id = machine_id.into();
        let instance_id = instance_id.into();
        let node_id = format!("{}:{}", machine_id, instance_id);
        Self {
            machine_id,
            instance_id,
            node_id,
        }
    }

    /// Builds the identity for this process
    ///
    /// # Arguments
    /// * `configured` - Machine id override; blank values fall back to the host name
    pub fn generate(configured: Option<&str>) -> Self {
        let machine_id = configured
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(host_machine_id);

        Self::new(machine_id, random_instance_id())
    }

    pub fn machine_id(&self) -> &str {
        &self.machine_id
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Composite id sent with every request
    pub fn node_id(&self) -> &str {
        &self.node_id
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.node_id)
    }
}

fn host_machine_id() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_HOST.to_string())
}

fn random_instance_id() -> String {
    rand::thread_rng().gen_range(100_000..=999_999u32).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_is_composite() {
        let identity = NodeIdentity::new("worker-7", "123456");
        assert_eq!(identity.node_id(), "worker-7:123456");
        assert_eq!(identity.to_string(), "worker-7:123456");
    }

    #[test]
    fn test_configured_machine_id_wins() {
        let identity = NodeIdentity::generate(Some("rack-3"));
        assert_eq!(identity.machine_id(), "rack-3");
        assert!(identity.node_id().starts_with("rack-3:"));
    }

    #[test]
    fn test_blank_override_falls_back_to_host() {
        let identity = NodeIdentity::generate(Some("   "));
        assert!(!identity.machine_id().is_empty());
        assert_ne!(identity.machine_id().trim(), "");
    }

    #[test]
    fn test_instance_id_is_six_digits() {
        let identity = NodeIdentity::generate(Some("m"));
        assert_eq!(identity.instance_id().len(), 6);
        assert!(identity.instance_id().chars().all(|c| c.is_ascii_digit()));
    }
}
