//! Scenario runner for the belief spread engine
//!
//! Loads a TOML scenario, drives the scheduler for the configured number of
//! steps and produces a labelled [`HistoryExport`].

pub mod config;

use std::sync::atomic::AtomicBool;

use belief_core::{export_history, RunOutcome, Scheduler, SchedulerState};
use belief_events::HistoryExport;
use tracing::info;

pub use config::{ConfigError, PreparedScenario, Scenario, ScenarioError, SimulationConfig};

/// Runs a scenario to completion and exports what was committed.
///
/// Setup problems are returned as errors. A step failure is not: the export
/// then carries `status = "failed"`, the failure message and every step
/// committed before it.
pub fn run_scenario(scenario: &Scenario) -> Result<HistoryExport, ScenarioError> {
    run_scenario_until(scenario, &AtomicBool::new(false))
}

/// Like [`run_scenario`], stopping early once `cancel` is set.
pub fn run_scenario_until(
    scenario: &Scenario,
    cancel: &AtomicBool,
) -> Result<HistoryExport, ScenarioError> {
    let prepared = scenario.prepare()?;
    let simulation = &scenario.simulation;

    let mut scheduler = Scheduler::with_worker_threads(simulation.worker_threads);
    scheduler.initialize(prepared.setup)?;

    match scheduler.run_until_cancelled(simulation.steps, cancel) {
        Ok(RunOutcome::Finished { .. }) => scheduler.stop()?,
        Ok(RunOutcome::Cancelled { last_step }) => {
            info!(last_step, "scenario cancelled");
        }
        // The scheduler has already moved to Failed and recorded the error
        Err(_) => {}
    }

    let mut export = export_history(&scheduler);
    export.agents = prepared.agents;
    export.beliefs = prepared.beliefs;
    export.behaviours = prepared.behaviours;
    Ok(export)
}

/// True if the export describes a run that ended without failure.
pub fn succeeded(export: &HistoryExport) -> bool {
    export.status == SchedulerState::Completed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_default_scenario_runs() {
        let export = run_scenario(&Scenario::default()).unwrap();

        assert!(succeeded(&export));
        assert_eq!(export.steps.len(), 11);
        assert!(export.is_contiguous());
        assert_eq!(export.agents.len(), 2);
        assert_eq!(export.agent_name(export.agents[1].id), Some("listener"));
    }

    #[test]
    fn test_listener_moves_towards_teller() {
        let export = run_scenario(&Scenario::default()).unwrap();
        let listener = export.agents[1].id;
        let rumour = export.beliefs[0].id;

        let series = export.activation_series(listener, rumour);
        assert_eq!(series[0], (0, -1.0));
        assert!(series.last().unwrap().1 > 0.5);
    }

    #[test]
    fn test_cancelled_before_first_step() {
        let cancel = AtomicBool::new(false);
        cancel.store(true, Ordering::SeqCst);

        let export = run_scenario_until(&Scenario::default(), &cancel).unwrap();
        assert!(succeeded(&export));
        assert_eq!(export.steps.len(), 1);
    }

    #[test]
    fn test_incomplete_configuration_is_error() {
        let mut scenario = Scenario::default();
        scenario.agents[0].stubbornness = None;

        let err = run_scenario(&scenario).unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::Simulation(belief_core::SimError::IncompleteConfiguration { .. })
        ));
    }
}
