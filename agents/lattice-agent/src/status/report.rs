//! Host Status Report
//!
//! The report payload sent to the controller: host environment facts plus
//! the current mount table. Reports are compared against the previously
//! sent one so unchanged status is never retransmitted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A point-in-time snapshot of host facts and mounts.
///
/// `reported_at` is stamped just before sending and is deliberately not
/// part of equality: two reports with identical content but different
/// timestamps compare equal, which is what suppresses redundant sends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Host environment facts, name to value.
    #[serde(rename = "agentEnv")]
    pub agent_env: BTreeMap<String, serde_json::Value>,

    /// Mount descriptors, passed through from the snapshot source unmodified.
    pub mounts: Vec<serde_json::Value>,

    /// Millisecond timestamp set at send time. Volatile; excluded from
    /// equality.
    #[serde(
        rename = "agentTimeStampAtReporting",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub reported_at: Option<i64>,
}

impl Report {
    pub fn new(agent_env: BTreeMap<String, serde_json::Value>, mounts: Vec<serde_json::Value>) -> Self {
        Self {
            agent_env,
            mounts,
            reported_at: None,
        }
    }
}

impl PartialEq for Report {
    fn eq(&self, other: &Self) -> bool {
        self.agent_env == other.agent_env && self.mounts == other.mounts
    }
}

impl Eq for Report {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report(os: &str, mounts: Vec<serde_json::Value>) -> Report {
        let mut env = BTreeMap::new();
        env.insert("os".to_string(), json!(os));
        Report::new(env, mounts)
    }

    #[test]
    fn test_equality_ignores_timestamp() {
        let a = report("linux", vec![json!({"/": "100G"})]);
        let mut b = report("linux", vec![json!({"/": "100G"})]);
        b.reported_at = Some(1_700_000_000_000);

        assert_eq!(a, b);
    }

    #[test]
    fn test_equality_detects_content_change() {
        let a = report("linux", vec![json!({"/": "100G"})]);
        let b = report("linux", vec![json!({"/": "100G"}), json!({"/data": "1T"})]);
        let c = report("freebsd", vec![json!({"/": "100G"})]);

        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_wire_field_names() {
        let mut a = report("linux", vec![json!({"/": "100G"})]);
        a.reported_at = Some(42);

        let value = serde_json::to_value(&a).unwrap();
        assert!(value.get("agentEnv").is_some());
        assert!(value.get("mounts").is_some());
        assert_eq!(value.get("agentTimeStampAtReporting"), Some(&json!(42)));
    }

    #[test]
    fn test_timestamp_omitted_when_unset() {
        let a = report("linux", vec![]);
        let value = serde_json::to_value(&a).unwrap();
        assert!(value.get("agentTimeStampAtReporting").is_none());
    }
}
