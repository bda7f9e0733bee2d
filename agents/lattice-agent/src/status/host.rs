//! Host Snapshot Source
//!
//! Produces the facts and mount list that go into a status report. The
//! trait seam exists so the reporter can be tested with a fake source; the
//! default implementation keeps collection thin and side-effect free.

use anyhow::Result;
use serde_json::json;
use std::collections::BTreeMap;

use crate::status::report::Report;

/// Produces a fresh host snapshot on demand. Pure read, no side effects.
pub trait SnapshotSource: Send + Sync {
    fn snapshot(&self) -> Result<Report>;
}

/// Default snapshot source backed by the local host.
#[derive(Debug, Clone, Default)]
pub struct HostSnapshotSource;

impl HostSnapshotSource {
    pub fn new() -> Self {
        Self
    }
}

impl SnapshotSource for HostSnapshotSource {
    fn snapshot(&self) -> Result<Report> {
        let mut agent_env = BTreeMap::new();
        agent_env.insert(
            "hostname".to_string(),
            json!(hostname::get()
                .map(|h| h.to_string_lossy().to_string())
                .unwrap_or_else(|_| "unknown".to_string())),
        );
        agent_env.insert("os".to_string(), json!(std::env::consts::OS));
        agent_env.insert("arch".to_string(), json!(std::env::consts::ARCH));
        agent_env.insert(
            "agentVersion".to_string(),
            json!(env!("CARGO_PKG_VERSION")),
        );

        Ok(Report::new(agent_env, read_mounts()))
    }
}

/// Read the current mount table. Returns an empty list on platforms without
/// /proc/mounts or when it cannot be read.
fn read_mounts() -> Vec<serde_json::Value> {
    let Ok(contents) = std::fs::read_to_string("/proc/mounts") else {
        return Vec::new();
    };
    parse_mounts(&contents)
}

fn parse_mounts(contents: &str) -> Vec<serde_json::Value> {
    contents
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let device = fields.next()?;
            let mount_point = fields.next()?;
            let fs_type = fields.next()?;
            Some(json!({
                "device": device,
                "mountPoint": mount_point,
                "type": fs_type,
            }))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_contains_base_facts() {
        let report = HostSnapshotSource::new().snapshot().unwrap();

        assert!(report.agent_env.contains_key("hostname"));
        assert!(report.agent_env.contains_key("os"));
        assert!(report.agent_env.contains_key("agentVersion"));
        assert!(report.reported_at.is_none());
    }

    #[test]
    fn test_parse_mounts() {
        let mounts = parse_mounts(
            "/dev/sda1 / ext4 rw,relatime 0 0\n\
             tmpfs /tmp tmpfs rw,nosuid 0 0\n",
        );

        assert_eq!(mounts.len(), 2);
        assert_eq!(mounts[0]["mountPoint"], "/");
        assert_eq!(mounts[1]["type"], "tmpfs");
    }

    #[test]
    fn test_parse_mounts_skips_malformed_lines() {
        let mounts = parse_mounts("garbage\n/dev/sda1 / ext4 rw 0 0\n");
        assert_eq!(mounts.len(), 1);
    }
}
