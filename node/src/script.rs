//! Action scripts replayed by `celes-node apply`
//!
//! A script is a JSON array of steps:
//!
//! ```json
//! [
//!   {"step": "apply", "signer": "alice",
//!    "action": {"action": "stake", "owner": "alice", "quantity": "5.0000 CELES"}},
//!   {"step": "advance_time", "secs": 60},
//!   {"step": "blocks", "producer": "bpa", "count": 10}
//! ]
//! ```

use anyhow::{Context, Result};
use celes_system::Action;
use celes_types::Name;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScriptStep {
    /// Submit one signed action.
    Apply { signer: Name, action: Action },
    /// Produce `count` blocks, each one slot later than the previous.
    Blocks {
        producer: Name,
        #[serde(default = "one_block")]
        count: u32,
    },
    /// Move the chain clock without producing blocks.
    AdvanceTime { secs: u64 },
}

fn one_block() -> u32 {
    1
}

impl ScriptStep {
    pub fn label(&self) -> String {
        match self {
            ScriptStep::Apply { signer, action } => format!("{} by {}", action.label(), signer),
            ScriptStep::Blocks { producer, count } => format!("{} block(s) by {}", count, producer),
            ScriptStep::AdvanceTime { secs } => format!("advance {}s", secs),
        }
    }
}

pub fn parse_script(text: &str) -> Result<Vec<ScriptStep>> {
    serde_json::from_str(text).context("malformed action script")
}

pub fn load_script(path: &Path) -> Result<Vec<ScriptStep>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;
    parse_script(&text).with_context(|| format!("in {}", path.display()))
}
