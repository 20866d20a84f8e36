//! Job bookkeeping: the shared job store and the progress bridge.

mod error;
pub mod store;
pub mod tracker;

pub use error::JobError;
pub use store::JobStore;
pub use tracker::JobProgressTracker;
