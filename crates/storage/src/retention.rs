use crate::{Result, StateStore};
use celes_types::BlockNum;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Retention policy describing how many snapshots to keep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionPolicy {
    /// Number of most-recent snapshots to preserve. `None` disables count based retention.
    pub retain_latest_snapshots: Option<u64>,
    /// Keep snapshots taken within this many blocks of the newest one. `None` disables block based retention.
    pub retain_blocks: Option<BlockNum>,
}

impl RetentionPolicy {
    pub fn keep_latest(count: u64) -> Self {
        Self {
            retain_latest_snapshots: Some(count),
            retain_blocks: None,
        }
    }

    /// Determine whether a snapshot should be pruned.
    ///
    /// `rank` is 0 for the newest snapshot, 1 for the one before, and so on.
    /// The newest snapshot is never pruned.
    pub fn should_prune(&self, rank: u64, head_block: BlockNum, latest_head: BlockNum) -> bool {
        if rank == 0 {
            return false;
        }
        let prune_due_to_count = self
            .retain_latest_snapshots
            .map(|retain| rank >= retain.max(1))
            .unwrap_or(false);

        let prune_due_to_age = self
            .retain_blocks
            .map(|blocks| (head_block as u64) + (blocks as u64) < latest_head as u64)
            .unwrap_or(false);

        prune_due_to_count || prune_due_to_age
    }

    /// Check if the policy is entirely disabled.
    pub fn is_disabled(&self) -> bool {
        self.retain_latest_snapshots.is_none() && self.retain_blocks.is_none()
    }
}

/// Outcome of a retention pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub pruned_entries: u64,
    pub retained_entries: u64,
}

/// Delete every snapshot the policy no longer covers.
pub fn prune_snapshots<S: StateStore + ?Sized>(store: &S, policy: &RetentionPolicy) -> Result<PruneReport> {
    let mut report = PruneReport::default();
    let snapshots = store.list_snapshots()?;
    if policy.is_disabled() {
        report.retained_entries = snapshots.len() as u64;
        return Ok(report);
    }
    let latest_head = snapshots.last().map_or(0, |meta| meta.head_block);

    for (rank, meta) in snapshots.iter().rev().enumerate() {
        if policy.should_prune(rank as u64, meta.head_block, latest_head) {
            store.delete_snapshot(meta.sequence)?;
            report.pruned_entries += 1;
        } else {
            report.retained_entries += 1;
        }
    }
    if report.pruned_entries > 0 {
        debug!(
            target: "storage",
            "pruned {} snapshots, {} retained",
            report.pruned_entries, report.retained_entries
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_retention() {
        let policy = RetentionPolicy::keep_latest(3);
        assert!(!policy.should_prune(0, 0, 100));
        assert!(!policy.should_prune(2, 0, 100));
        assert!(policy.should_prune(3, 0, 100));
    }

    #[test]
    fn test_block_retention() {
        let policy = RetentionPolicy {
            retain_latest_snapshots: None,
            retain_blocks: Some(50),
        };
        assert!(!policy.should_prune(5, 50, 100));
        assert!(policy.should_prune(5, 49, 100));
        // newest snapshot survives regardless
        assert!(!policy.should_prune(0, 0, 1_000));
    }

    #[test]
    fn test_disabled_policy_keeps_everything() {
        let policy = RetentionPolicy::default();
        assert!(policy.is_disabled());
        assert!(!policy.should_prune(100, 0, 1_000));
    }
}
