//! Activation Update Engine
//!
//! Next activation of one (agent, belief) pair:
//!
//! ```text
//! raw  = s * own + (1 - s) * peer + deviation + interaction
//! next = clamp(raw, -1, 1)
//! ```
//!
//! where `peer` is the trust-weighted mean of the neighbours' activations,
//! `s` the agent's stubbornness and `deviation` a keyed random draw.

use belief_events::{AgentId, BeliefId};
use rayon::prelude::*;

use crate::error::SimError;
use crate::history::{ActivationMap, StepState};
use crate::systems::{interaction_term, rng, StepContext};

/// Trust-weighted mean of the neighbours' activations for `belief`.
///
/// Neighbours holding no activation for the belief are left out of both
/// sums. Returns 0 when nothing remains to average.
pub fn peer_term(
    ctx: &StepContext<'_>,
    snapshot: &StepState,
    agent: AgentId,
    belief: BeliefId,
) -> Result<f64, SimError> {
    let (weighted, total) = ctx.network.neighbours(agent)?.fold(
        (0.0, 0.0),
        |(weighted, total), (neighbour, weight)| match snapshot.activation(neighbour, belief) {
            Some(activation) => (weighted + weight * activation, total + weight),
            None => (weighted, total),
        },
    );
    if total > 0.0 {
        Ok(weighted / total)
    } else {
        Ok(0.0)
    }
}

/// Saturating clamp into [-1, 1]
pub fn clamp_activation(raw: f64) -> f64 {
    raw.clamp(-1.0, 1.0)
}

/// Activation of `(agent, belief)` at `ctx.next_step`.
pub fn next_activation(
    ctx: &StepContext<'_>,
    snapshot: &StepState,
    agent: AgentId,
    belief: BeliefId,
) -> Result<f64, SimError> {
    let params = ctx.parameters.require(agent)?;
    let own = snapshot.activation(agent, belief).unwrap_or(0.0);
    let peer = peer_term(ctx, snapshot, agent, belief)?;
    let deviation = rng::deviation(
        ctx.seed,
        agent,
        belief.as_u128(),
        ctx.next_step,
        params.deviation,
    );

    let mut raw =
        params.stubbornness * own + (1.0 - params.stubbornness) * peer + deviation;

    let strength = ctx.parameters.interaction_strength();
    if strength > 0.0 {
        raw += strength * interaction_term(ctx.beliefs, snapshot, agent, belief);
    }

    Ok(clamp_activation(raw))
}

/// Computes every activation present in `snapshot` for the next step.
///
/// Fails with `MissingParameter` if any registered agent lacks a
/// stubbornness or deviation, whether or not it holds a belief. Nothing is
/// returned unless every pair succeeds.
pub fn next_activations(
    ctx: &StepContext<'_>,
    snapshot: &StepState,
) -> Result<ActivationMap, SimError> {
    if let Some((agent, parameter)) = ctx.parameters.first_missing(&ctx.network.agent_ids()) {
        return Err(SimError::MissingParameter { agent, parameter });
    }

    snapshot
        .activations
        .par_iter()
        .map(|(&(agent, belief), _)| {
            next_activation(ctx, snapshot, agent, belief).map(|value| ((agent, belief), value))
        })
        .collect()
}
