//! Per-step engines.
//!
//! Both engines are pure functions of a [`StepContext`] and a snapshot.
//! They fan out over (agent, belief) and (agent, behaviour) pairs with rayon
//! and collect into ordered maps, so the committed result does not depend
//! on scheduling.

use std::collections::BTreeMap;

use belief_events::{BehaviourId, BeliefId, Step};

use crate::components::{Behaviour, Belief, Parameters, SocialNetwork};

pub mod activation;
pub mod interaction;
pub mod performance;
pub mod rng;

pub use activation::{next_activation, next_activations};
pub use interaction::interaction_term;
pub use performance::{evaluate_performances, validate_behaviours};

/// Read-only inputs shared by every unit of work in a step
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub network: &'a SocialNetwork,
    pub beliefs: &'a BTreeMap<BeliefId, Belief>,
    pub behaviours: &'a BTreeMap<BehaviourId, Behaviour>,
    pub parameters: &'a Parameters,
    pub seed: u64,
    /// Step being computed
    pub next_step: Step,
}
