//! Belief Interaction Term
//!
//! Optional pull that an agent's other beliefs exert on a belief, through
//! the belief-to-belief relationship weights. The activation engine adds it
//! scaled by `interaction_strength`, which defaults to 0 (off).

use std::collections::BTreeMap;

use belief_events::{AgentId, BeliefId};

use crate::components::Belief;
use crate::history::StepState;

/// Mean of `relationship(belief, other) * activation(agent, other)` over the
/// other beliefs `agent` holds in `snapshot`.
///
/// Missing relationships count as 0. The result lies in [-1, 1]; it is 0
/// when the agent holds no other belief or `belief` is not in `beliefs`.
pub fn interaction_term(
    beliefs: &BTreeMap<BeliefId, Belief>,
    snapshot: &StepState,
    agent: AgentId,
    belief: BeliefId,
) -> f64 {
    let Some(definition) = beliefs.get(&belief) else {
        return 0.0;
    };

    let (sum, count) = snapshot
        .beliefs_of(agent)
        .filter(|&(other, _)| other != belief)
        .fold((0.0, 0usize), |(sum, count), (other, activation)| {
            let weight = definition.relationship(other).unwrap_or(0.0);
            (sum + weight * activation, count + 1)
        });

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
