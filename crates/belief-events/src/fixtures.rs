//! Deterministic identifiers for testing.
//!
//! Enable the `test-fixtures` feature to access these helpers.
//!
//! # Example
//!
//! ```ignore
//! // In your Cargo.toml:
//! // [dev-dependencies]
//! // belief-events = { path = "../belief-events", features = ["test-fixtures"] }
//!
//! use belief_events::fixtures;
//!
//! let alice = fixtures::agent(1);
//! let x = fixtures::belief(1);
//! ```

use crate::{AgentId, BehaviourId, BeliefId};

// Each kind gets its own high bits so an agent never equals a belief numerically.
const AGENT_BASE: u128 = 0xA_u128 << 64;
const BELIEF_BASE: u128 = 0xB_u128 << 64;
const BEHAVIOUR_BASE: u128 = 0xC_u128 << 64;

/// Agent identifier number `n`. Ordering follows `n`.
pub fn agent(n: u64) -> AgentId {
    AgentId::from_u128(AGENT_BASE | n as u128)
}

/// Belief identifier number `n`.
pub fn belief(n: u64) -> BeliefId {
    BeliefId::from_u128(BELIEF_BASE | n as u128)
}

/// Behaviour identifier number `n`.
pub fn behaviour(n: u64) -> BehaviourId {
    BehaviourId::from_u128(BEHAVIOUR_BASE | n as u128)
}

/// `count` agent identifiers in increasing order.
pub fn agents(count: u64) -> Vec<AgentId> {
    (0..count).map(agent).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_ids_ordered_and_distinct() {
        let ids = agents(5);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_ne!(agent(1).as_u128(), belief(1).as_u128());
        assert_ne!(belief(1).as_u128(), behaviour(1).as_u128());
    }
}
