//! Simulation error type.

use std::fmt;

use belief_events::{AgentId, BehaviourId, BeliefId};
use thiserror::Error;

use crate::scheduler::SchedulerState;

/// Per-agent parameter the update formula needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    Stubbornness,
    Deviation,
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::Stubbornness => write!(f, "stubbornness"),
            Parameter::Deviation => write!(f, "deviation"),
        }
    }
}

/// Errors raised by the network, the engines and the scheduler.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("invalid trust weight {weight} on {from} -> {to}, expected a value in [0, 1]")]
    InvalidWeight {
        from: AgentId,
        to: AgentId,
        weight: f64,
    },

    #[error("agent {0} cannot be its own friend")]
    SelfEdge(AgentId),

    #[error("unknown agent {0}")]
    UnknownAgent(AgentId),

    #[error("agent {0} is already registered")]
    DuplicateAgent(AgentId),

    #[error("agent {agent} has no {parameter} configured")]
    MissingParameter { agent: AgentId, parameter: Parameter },

    #[error("unknown belief {0}")]
    UnknownBelief(BeliefId),

    #[error("configuration incomplete: agent {agent} has no {parameter}")]
    IncompleteConfiguration { agent: AgentId, parameter: Parameter },

    #[error("invalid stubbornness {value} for agent {agent}, expected a value in [0, 1]")]
    InvalidStubbornness { agent: AgentId, value: f64 },

    #[error("invalid deviation {value} for agent {agent}, expected a value in [0, 1]")]
    InvalidDeviation { agent: AgentId, value: f64 },

    #[error("activation {value} of agent {agent} on belief {belief} is outside [-1, 1]")]
    InvalidActivation {
        agent: AgentId,
        belief: BeliefId,
        value: f64,
    },

    #[error("effect {value} of belief {belief} on behaviour {behaviour} is outside [-1, 1]")]
    InvalidEffect {
        behaviour: BehaviourId,
        belief: BeliefId,
        value: f64,
    },

    #[error("invalid threshold {value} for behaviour {behaviour}")]
    InvalidThreshold { behaviour: BehaviourId, value: f64 },

    #[error("relationship {value} between beliefs {belief} and {other} is outside [-1, 1]")]
    InvalidRelationship {
        belief: BeliefId,
        other: BeliefId,
        value: f64,
    },

    #[error("invalid interaction strength {0}, expected a value in [0, 1]")]
    InvalidInteractionStrength(f64),

    #[error("cannot {operation} while the scheduler is {state}")]
    InvalidState {
        operation: &'static str,
        state: SchedulerState,
    },

    #[error("failed to start worker pool: {0}")]
    WorkerPool(String),
}

impl From<rayon::ThreadPoolBuildError> for SimError {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        SimError::WorkerPool(e.to_string())
    }
}

/// True for finite values inside `[lo, hi]`. NaN and infinities fail.
pub(crate) fn within(value: f64, lo: f64, hi: f64) -> bool {
    value.is_finite() && (lo..=hi).contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_offender() {
        let agent = AgentId::from_u128(3);
        let err = SimError::MissingParameter {
            agent,
            parameter: Parameter::Deviation,
        };
        let message = err.to_string();
        assert!(message.contains(&agent.to_string()));
        assert!(message.contains("deviation"));
    }

    #[test]
    fn test_within_rejects_non_finite() {
        assert!(within(0.0, -1.0, 1.0));
        assert!(within(1.0, -1.0, 1.0));
        assert!(!within(1.0001, -1.0, 1.0));
        assert!(!within(f64::NAN, -1.0, 1.0));
        assert!(!within(f64::INFINITY, 0.0, 1.0));
    }
}
