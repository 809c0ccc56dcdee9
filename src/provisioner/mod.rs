pub mod teardown;
pub mod tracker;
pub mod warehouse;

pub use teardown::{teardown, TeardownReport};
pub use tracker::{MemoryTracker, ResourceTracker, SessionId};
pub use warehouse::{select_transport, Provisioner};
