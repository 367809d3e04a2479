//! Behaviour Performance Engine
//!
//! An agent performs a behaviour when the effect-weighted sum of its
//! activations is strictly greater than the behaviour's threshold. A sum
//! equal to the threshold means not performed.

use std::collections::BTreeMap;

use belief_events::{AgentId, BehaviourId, BeliefId};
use rayon::prelude::*;

use crate::components::{Behaviour, Belief};
use crate::error::SimError;
use crate::history::{ActivationMap, PerformanceMap};

/// Fails with `UnknownBelief` for the first effect naming a belief outside `beliefs`.
pub fn validate_behaviours(
    behaviours: &BTreeMap<BehaviourId, Behaviour>,
    beliefs: &BTreeMap<BeliefId, Belief>,
) -> Result<(), SimError> {
    for behaviour in behaviours.values() {
        if let Some((belief, _)) = behaviour
            .effects()
            .find(|(belief, _)| !beliefs.contains_key(belief))
        {
            return Err(SimError::UnknownBelief(belief));
        }
    }
    Ok(())
}

/// Performance of every behaviour by every agent, from freshly computed activations.
///
/// Activations missing for a referenced belief count as 0.
pub fn evaluate_performances(
    agents: &[AgentId],
    beliefs: &BTreeMap<BeliefId, Belief>,
    behaviours: &BTreeMap<BehaviourId, Behaviour>,
    activations: &ActivationMap,
) -> Result<PerformanceMap, SimError> {
    validate_behaviours(behaviours, beliefs)?;

    let pairs: Vec<(AgentId, &Behaviour)> = agents
        .iter()
        .flat_map(|&agent| behaviours.values().map(move |b| (agent, b)))
        .collect();

    Ok(pairs
        .into_par_iter()
        .map(|(agent, behaviour)| {
            let sum = behaviour.weighted_sum(|belief| {
                activations.get(&(agent, belief)).copied().unwrap_or(0.0)
            });
            ((agent, behaviour.id()), behaviour.is_performed(sum))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(n: u128) -> AgentId {
        AgentId::from_u128(n)
    }

    fn x() -> BeliefId {
        BeliefId::from_u128(100)
    }

    fn y() -> BehaviourId {
        BehaviourId::from_u128(200)
    }

    fn definitions(
        effect_on: BeliefId,
    ) -> (BTreeMap<BeliefId, Belief>, BTreeMap<BehaviourId, Behaviour>) {
        let mut beliefs = BTreeMap::new();
        beliefs.insert(x(), Belief::new(x()));
        let mut behaviours = BTreeMap::new();
        behaviours.insert(
            y(),
            Behaviour::new(y(), 0.5)
                .unwrap()
                .with_effect(effect_on, 1.0)
                .unwrap(),
        );
        (beliefs, behaviours)
    }

    #[test]
    fn test_threshold_rule() {
        let (beliefs, behaviours) = definitions(x());
        let mut activations = ActivationMap::new();
        activations.insert((agent(0), x()), 0.5);
        activations.insert((agent(1), x()), 0.51);
        activations.insert((agent(2), x()), -1.0);

        let performed = evaluate_performances(
            &[agent(0), agent(1), agent(2)],
            &beliefs,
            &behaviours,
            &activations,
        )
        .unwrap();

        assert!(!performed[&(agent(0), y())]);
        assert!(performed[&(agent(1), y())]);
        assert!(!performed[&(agent(2), y())]);
    }

    #[test]
    fn test_unknown_belief_rejected() {
        let (beliefs, behaviours) = definitions(BeliefId::from_u128(999));
        let result =
            evaluate_performances(&[agent(0)], &beliefs, &behaviours, &ActivationMap::new());
        assert_eq!(
            result,
            Err(SimError::UnknownBelief(BeliefId::from_u128(999)))
        );
    }

    #[test]
    fn test_missing_activation_counts_as_zero() {
        let mut beliefs = BTreeMap::new();
        beliefs.insert(x(), Belief::new(x()));
        let mut behaviours = BTreeMap::new();
        behaviours.insert(
            y(),
            Behaviour::new(y(), -0.1).unwrap().with_effect(x(), 1.0).unwrap(),
        );

        let performed =
            evaluate_performances(&[agent(0)], &beliefs, &behaviours, &ActivationMap::new())
                .unwrap();
        // 0 > -0.1
        assert!(performed[&(agent(0), y())]);
    }

    #[test]
    fn test_every_agent_behaviour_pair_present() {
        let (beliefs, mut behaviours) = definitions(x());
        let other = BehaviourId::from_u128(201);
        behaviours.insert(other, Behaviour::new(other, 0.0).unwrap());

        let performed = evaluate_performances(
            &[agent(0), agent(1)],
            &beliefs,
            &behaviours,
            &ActivationMap::new(),
        )
        .unwrap();
        assert_eq!(performed.len(), 4);
        // No effects: sum 0 is not above threshold 0
        assert!(!performed[&(agent(1), other)]);
    }
}
