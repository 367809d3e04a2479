//! History export
//!
//! Converts a scheduler's committed history into the serializable
//! [`HistoryExport`] consumed by outside tooling. Labels are left empty for
//! the caller to fill in.

use belief_events::{ActivationRecord, HistoryExport, PerformanceRecord, StepExport};

use crate::history::StepState;
use crate::scheduler::Scheduler;

/// One exported step, records in (agent, belief/behaviour) order
pub fn export_step(state: &StepState) -> StepExport {
    StepExport {
        step: state.step,
        activations: state
            .activations
            .iter()
            .map(|(&(agent, belief), &activation)| ActivationRecord {
                agent,
                belief,
                activation,
            })
            .collect(),
        performances: state
            .performances
            .iter()
            .map(|(&(agent, behaviour), &performed)| PerformanceRecord {
                agent,
                behaviour,
                performed,
            })
            .collect(),
    }
}

/// Everything the scheduler has committed so far.
pub fn export_history(scheduler: &Scheduler) -> HistoryExport {
    HistoryExport {
        seed: scheduler.seed(),
        status: scheduler.state().to_string(),
        failure: scheduler.failure().map(ToString::to_string),
        agents: Vec::new(),
        beliefs: Vec::new(),
        behaviours: Vec::new(),
        steps: scheduler
            .history()
            .steps()
            .map(|state| export_step(state))
            .collect(),
    }
}
