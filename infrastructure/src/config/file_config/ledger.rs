//! Usage ledger settings from TOML (`[ledger]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLedgerConfig {
    /// JSONL file receiving one usage report per completed job
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}
