//! Port definitions
//!
//! Interfaces the application layer needs from the outside world.
//! Implementations (adapters) live in the infrastructure and presentation
//! layers.

pub mod progress;
pub mod provider_gateway;
pub mod usage_ledger;
