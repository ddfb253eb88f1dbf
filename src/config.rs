//! Configuration surface recognised by the reservoir and voting machine,
//! matching the keys enumerated in spec.md §6.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Client,
    Servant,
    Server,
}

/// Networking/identity configuration. Out of this crate's implemented
/// scope (wire framing and transport are external collaborators) but kept
/// here so the full configuration surface named in spec.md §6 is
/// representable end to end.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    pub node_type: NodeType,
    pub port: u16,
    #[serde(default)]
    pub listen: Vec<String>,
    #[serde(default)]
    pub announce: Vec<String>,
    pub private_key: String,
    #[serde(default)]
    pub connect: Vec<ConnectPeer>,
    #[serde(default)]
    pub dynamic_connections: bool,
    #[serde(default)]
    pub prefer_ipv6: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectPeer {
    pub public_key: String,
    pub address: String,
}

/// Reservoir tunables, per spec.md §3/§6.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservoirConfig {
    pub maximum_pending_free_issues: usize,
    pub maximum_pending_paid_issues: usize,
    pub maximum_issues_per_request: usize,
    #[serde(with = "duration_secs")]
    pub reservoir_timeout: Duration,
    pub auto_verify: bool,
}

impl Default for ReservoirConfig {
    fn default() -> Self {
        Self {
            maximum_pending_free_issues: 10_000,
            maximum_pending_paid_issues: 10_000,
            maximum_issues_per_request: 100,
            reservoir_timeout: Duration::from_secs(60 * 60),
            auto_verify: false,
        }
    }
}

/// Voting machine tunables, per spec.md §4.6.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VotingConfig {
    #[serde(with = "duration_secs")]
    pub voting_cycle_interval: Duration,
    #[serde(with = "duration_secs")]
    pub voting_query_timeout: Duration,
    #[serde(with = "duration_secs")]
    pub register_expire_time: Duration,
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            voting_cycle_interval: Duration::from_secs(10),
            voting_query_timeout: Duration::from_secs(5),
            register_expire_time: Duration::from_secs(60 * 60),
        }
    }
}

/// Proof-of-work window constants, per spec.md §4.3.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PowWindowConfig {
    pub pay_nonce_height_delta: u64,
    pub window_steps: u32,
}

impl Default for PowWindowConfig {
    fn default() -> Self {
        Self {
            pay_nonce_height_delta: 128,
            window_steps: 5,
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reservoir_config_round_trips_through_json() {
        let cfg = ReservoirConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ReservoirConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
