//! Crate includes reusable utils for the binaries of this workspace.
//! Such as initializing the tracing framework.

pub mod logging;

// Re-export tracing crate for convenience.
pub use tracing;
