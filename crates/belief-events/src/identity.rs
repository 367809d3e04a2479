//! Identity Types
//!
//! Opaque identifiers for agents, beliefs and behaviours, plus the providers
//! that hand them out.
//!
//! # Example
//!
//! ```
//! use belief_events::{AgentId, IdentityProvider, SequentialIdentity};
//!
//! let mut ids = SequentialIdentity::new();
//! let a: AgentId = ids.new_identity().into();
//! let b: AgentId = ids.new_identity().into();
//! assert!(a < b);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates an identifier with a fresh random UUID.
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from a raw 128-bit value.
            pub const fn from_u128(value: u128) -> Self {
                Self(Uuid::from_u128(value))
            }

            /// Returns the identifier as a raw 128-bit value.
            pub fn as_u128(&self) -> u128 {
                self.0.as_u128()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Unique identifier for an agent
    AgentId
);

define_id!(
    /// Unique identifier for a belief
    BeliefId
);

define_id!(
    /// Unique identifier for a behaviour
    BehaviourId
);

/// Supplies unique opaque identifiers.
///
/// The simulation never inspects the token beyond equality and ordering.
pub trait IdentityProvider {
    fn new_identity(&mut self) -> Uuid;
}

/// Hands out random version 4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdentity;

impl IdentityProvider for RandomIdentity {
    fn new_identity(&mut self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Hands out UUIDs built from an increasing counter.
///
/// Identifiers are reproducible across runs and sort in creation order,
/// which keeps scenario files and their exports stable.
#[derive(Debug, Clone, Default)]
pub struct SequentialIdentity {
    next: u128,
}

impl SequentialIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the counter at `start` instead of zero.
    pub fn starting_at(start: u128) -> Self {
        Self { next: start }
    }
}

impl IdentityProvider for SequentialIdentity {
    fn new_identity(&mut self) -> Uuid {
        let id = Uuid::from_u128(self.next);
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_identity_unique() {
        let mut provider = RandomIdentity;
        let a = provider.new_identity();
        let b = provider.new_identity();
        assert_ne!(a, b);
    }

    #[test]
    fn test_sequential_identity_ordered() {
        let mut provider = SequentialIdentity::starting_at(10);
        let a = AgentId::from(provider.new_identity());
        let b = AgentId::from(provider.new_identity());
        assert_eq!(a.as_u128(), 10);
        assert_eq!(b.as_u128(), 11);
        assert!(a < b);
    }

    #[test]
    fn test_id_serializes_as_plain_uuid() {
        let id = BeliefId::from_u128(1);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""00000000-0000-0000-0000-000000000001""#);
        let parsed: BeliefId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_id_display_matches_uuid() {
        let uuid = Uuid::new_v4();
        assert_eq!(BehaviourId::from(uuid).to_string(), uuid.to_string());
    }
}
