//! Shared identity and export types for the belief spread simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! It is a dependency for all other crates in the workspace.

pub mod export;
pub mod identity;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

/// Discrete time step index. Step 0 is the initial snapshot.
pub type Step = u64;

// Re-export identity types
pub use identity::{
    AgentId, BehaviourId, BeliefId, IdentityProvider, RandomIdentity, SequentialIdentity,
};

// Re-export export types
pub use export::{ActivationRecord, HistoryExport, Label, PerformanceRecord, StepExport};
