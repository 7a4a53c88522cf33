//! Grievance portal core: complaint lifecycle, priority classification,
//! persistence, and the chat assistant bridge.

pub mod assistant;
pub mod classifier;
pub mod clock;
pub mod complaint;
pub mod config;
pub mod error;
pub mod event;
pub mod lifecycle;
pub mod oracle;
pub mod seed;
pub mod store;
pub mod tracking;
pub mod types;
