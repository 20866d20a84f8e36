//! Logging infrastructure: the usage ledger.
//!
//! Provides [`JsonlUsageLedger`], a JSONL file writer that implements
//! the [`UsageLedger`](consensus_application::UsageLedger) port.

mod jsonl_ledger;

pub use jsonl_ledger::JsonlUsageLedger;
