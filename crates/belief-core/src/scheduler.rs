//! Simulation Scheduler
//!
//! Drives discrete time steps. Each step reads the latest committed
//! snapshot, runs the activation engine and then the behaviour engine, and
//! commits both results as one new step. A failing step commits nothing.
//!
//! ```text
//! Configuring --initialize--> Running --stop/cancel--> Completed
//!                                |                         |
//!                                +--engine error--> Failed |
//!                                                    |     |
//! Configuring <-------------reset---------------------+-----+
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use belief_events::{AgentId, BehaviourId, BeliefId, Step};
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::components::{Agent, Behaviour, Belief, Parameters, SocialNetwork};
use crate::error::{within, SimError};
use crate::history::{ActivationMap, History, Series, StepState};
use crate::systems::{evaluate_performances, next_activations, validate_behaviours, StepContext};

/// Lifecycle of a scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    /// No run in progress; configuration is assembled in a [`Setup`]
    Configuring,
    /// Steps are being advanced
    Running,
    /// Stopped or cancelled; history retained
    Completed,
    /// An engine failed; history up to the last committed step retained
    Failed,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerState::Configuring => write!(f, "configuring"),
            SchedulerState::Running => write!(f, "running"),
            SchedulerState::Completed => write!(f, "completed"),
            SchedulerState::Failed => write!(f, "failed"),
        }
    }
}

/// A friendship weight that changes just before `at_step` is computed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightChange {
    pub at_step: Step,
    pub from: AgentId,
    pub to: AgentId,
    pub weight: f64,
}

/// Everything needed to start a run
#[derive(Debug, Clone, Default)]
pub struct Setup {
    pub network: SocialNetwork,
    pub beliefs: Vec<Belief>,
    pub behaviours: Vec<Behaviour>,
    pub parameters: Parameters,
    /// Step 0 activations. Pairs left out are never simulated.
    pub initial_activations: ActivationMap,
    pub weight_changes: Vec<WeightChange>,
    pub seed: u64,
}

impl Setup {
    pub fn new(network: SocialNetwork, seed: u64) -> Self {
        Self {
            network,
            seed,
            ..Self::default()
        }
    }

    pub fn with_belief(mut self, belief: Belief) -> Self {
        self.beliefs.push(belief);
        self
    }

    pub fn with_behaviour(mut self, behaviour: Behaviour) -> Self {
        self.behaviours.push(behaviour);
        self
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_activation(
        mut self,
        agent: AgentId,
        belief: BeliefId,
        value: f64,
    ) -> Result<Self, SimError> {
        if !within(value, -1.0, 1.0) {
            return Err(SimError::InvalidActivation {
                agent,
                belief,
                value,
            });
        }
        self.initial_activations.insert((agent, belief), value);
        Ok(self)
    }

    pub fn with_weight_change(mut self, change: WeightChange) -> Self {
        self.weight_changes.push(change);
        self
    }
}

/// How a cancellable run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// All requested steps were committed
    Finished { last_step: Step },
    /// The cancel flag was seen between steps
    Cancelled { last_step: Step },
}

/// Owns the network, definitions and history of one run.
#[derive(Debug)]
pub struct Scheduler {
    state: SchedulerState,
    network: SocialNetwork,
    beliefs: BTreeMap<BeliefId, Belief>,
    behaviours: BTreeMap<BehaviourId, Behaviour>,
    parameters: Parameters,
    seed: u64,
    history: History,
    /// Weight changes keyed by the step they precede
    pending: BTreeMap<Step, Vec<WeightChange>>,
    failure: Option<SimError>,
    /// 0 = rayon's global pool
    worker_threads: usize,
    pool: Option<Arc<ThreadPool>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Scheduler that runs engines on rayon's global pool.
    pub fn new() -> Self {
        Self::with_worker_threads(0)
    }

    /// Scheduler with a dedicated pool of `threads` workers (0 = global pool).
    pub fn with_worker_threads(threads: usize) -> Self {
        Self {
            state: SchedulerState::Configuring,
            network: SocialNetwork::new(),
            beliefs: BTreeMap::new(),
            behaviours: BTreeMap::new(),
            parameters: Parameters::new(),
            seed: 0,
            history: History::new(),
            pending: BTreeMap::new(),
            failure: None,
            worker_threads: threads,
            pool: None,
        }
    }

    fn expect_state(
        &self,
        expected: SchedulerState,
        operation: &'static str,
    ) -> Result<(), SimError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SimError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    /// Between-step edits need an active or finished run to edit.
    fn expect_configured(&self, operation: &'static str) -> Result<(), SimError> {
        if self.state == SchedulerState::Configuring {
            Err(SimError::InvalidState {
                operation,
                state: self.state,
            })
        } else {
            Ok(())
        }
    }

    fn install<R, F>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        match &self.pool {
            Some(pool) => pool.install(f),
            None => f(),
        }
    }

    fn fail(&mut self, error: SimError) -> SimError {
        warn!(
            error = %error,
            last_step = ?self.current_step(),
            "simulation failed"
        );
        self.state = SchedulerState::Failed;
        self.failure = Some(error.clone());
        error
    }

    /// Validates `setup`, commits step 0 and moves to `Running`.
    ///
    /// On error the scheduler is left untouched in `Configuring`.
    pub fn initialize(&mut self, setup: Setup) -> Result<(), SimError> {
        self.expect_state(SchedulerState::Configuring, "initialize")?;

        let Setup {
            network,
            beliefs,
            behaviours,
            parameters,
            initial_activations,
            weight_changes,
            seed,
        } = setup;

        let agent_ids = network.agent_ids();
        if let Some((agent, parameter)) = parameters.first_missing(&agent_ids) {
            return Err(SimError::IncompleteConfiguration { agent, parameter });
        }

        let beliefs: BTreeMap<BeliefId, Belief> =
            beliefs.into_iter().map(|b| (b.id(), b)).collect();
        let behaviours: BTreeMap<BehaviourId, Behaviour> =
            behaviours.into_iter().map(|b| (b.id(), b)).collect();
        validate_behaviours(&behaviours, &beliefs)?;

        for (&(agent, belief), &value) in &initial_activations {
            if !network.contains(agent) {
                return Err(SimError::UnknownAgent(agent));
            }
            if !beliefs.contains_key(&belief) {
                return Err(SimError::UnknownBelief(belief));
            }
            if !within(value, -1.0, 1.0) {
                return Err(SimError::InvalidActivation {
                    agent,
                    belief,
                    value,
                });
            }
        }

        let mut pending: BTreeMap<Step, Vec<WeightChange>> = BTreeMap::new();
        for change in weight_changes {
            if change.at_step == 0 {
                return Err(SimError::InvalidState {
                    operation: "schedule a weight change for step 0",
                    state: self.state,
                });
            }
            check_weight_change(&network, &change)?;
            pending.entry(change.at_step).or_default().push(change);
        }

        if self.worker_threads > 0 && self.pool.is_none() {
            let pool = ThreadPoolBuilder::new()
                .num_threads(self.worker_threads)
                .build()?;
            self.pool = Some(Arc::new(pool));
        }

        let performances = self.install(|| {
            evaluate_performances(&agent_ids, &beliefs, &behaviours, &initial_activations)
        })?;

        info!(
            agents = network.len(),
            friendships = network.edge_count(),
            beliefs = beliefs.len(),
            behaviours = behaviours.len(),
            seed,
            "simulation initialized"
        );

        self.network = network;
        self.beliefs = beliefs;
        self.behaviours = behaviours;
        self.parameters = parameters;
        self.seed = seed;
        self.pending = pending;
        self.failure = None;
        self.history.clear();
        self.history.push(StepState {
            step: 0,
            activations: initial_activations,
            performances,
        });
        self.state = SchedulerState::Running;
        Ok(())
    }

    /// Computes and commits the next step. Returns its index.
    pub fn step(&mut self) -> Result<Step, SimError> {
        self.expect_state(SchedulerState::Running, "step")?;

        let current = match self.history.latest() {
            Some(state) => Arc::clone(state),
            None => {
                return Err(SimError::InvalidState {
                    operation: "step without a committed snapshot",
                    state: self.state,
                })
            }
        };
        let next_step = current.step + 1;

        // Scheduled changes land on a copy, committed together with the step
        let changed = match self.pending.get(&next_step) {
            Some(changes) => {
                let mut network = self.network.clone();
                let applied = changes
                    .iter()
                    .try_for_each(|c| network.set_weight(c.from, c.to, c.weight));
                match applied {
                    Ok(()) => Some(network),
                    Err(e) => return Err(self.fail(e)),
                }
            }
            None => None,
        };

        let result = {
            let ctx = StepContext {
                network: changed.as_ref().unwrap_or(&self.network),
                beliefs: &self.beliefs,
                behaviours: &self.behaviours,
                parameters: &self.parameters,
                seed: self.seed,
                next_step,
            };
            self.install(|| compute_step(&ctx, &current))
        };

        match result {
            Ok(state) => {
                debug!(
                    step = next_step,
                    activations = state.activations.len(),
                    performed = state.performances.values().filter(|&&p| p).count(),
                    "step committed"
                );
                if let Some(network) = changed {
                    self.network = network;
                    self.pending.remove(&next_step);
                }
                self.history.push(state);
                Ok(next_step)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Advances `steps` times, stopping at the first failure.
    ///
    /// Returns the last committed step.
    pub fn run(&mut self, steps: u64) -> Result<Step, SimError> {
        self.expect_state(SchedulerState::Running, "run")?;
        let mut last = self.current_step().unwrap_or(0);
        for _ in 0..steps {
            last = self.step()?;
        }
        Ok(last)
    }

    /// Like [`Scheduler::run`], but checks `cancel` before every step.
    ///
    /// A cancelled run moves to `Completed` with its history intact.
    pub fn run_until_cancelled(
        &mut self,
        steps: u64,
        cancel: &AtomicBool,
    ) -> Result<RunOutcome, SimError> {
        self.expect_state(SchedulerState::Running, "run")?;
        let mut last = self.current_step().unwrap_or(0);
        for _ in 0..steps {
            if cancel.load(Ordering::SeqCst) {
                info!(last_step = last, "run cancelled");
                self.stop()?;
                return Ok(RunOutcome::Cancelled { last_step: last });
            }
            last = self.step()?;
        }
        Ok(RunOutcome::Finished { last_step: last })
    }

    /// Ends the run. History stays readable.
    pub fn stop(&mut self) -> Result<(), SimError> {
        self.expect_state(SchedulerState::Running, "stop")?;
        self.state = SchedulerState::Completed;
        info!(steps = self.history.len(), "simulation completed");
        Ok(())
    }

    /// Returns to `Configuring` after a finished or failed run.
    ///
    /// Hands back a [`Setup`] holding the current network, definitions,
    /// parameters, seed, step 0 activations and the weight changes not yet
    /// applied, ready to be edited and passed to [`Scheduler::initialize`].
    /// History is dropped.
    pub fn reset(&mut self) -> Result<Setup, SimError> {
        if !matches!(
            self.state,
            SchedulerState::Completed | SchedulerState::Failed
        ) {
            return Err(SimError::InvalidState {
                operation: "reset",
                state: self.state,
            });
        }

        let initial_activations = self
            .history
            .get(0)
            .map(|s| s.activations.clone())
            .unwrap_or_default();

        let setup = Setup {
            network: std::mem::take(&mut self.network),
            beliefs: std::mem::take(&mut self.beliefs).into_values().collect(),
            behaviours: std::mem::take(&mut self.behaviours).into_values().collect(),
            parameters: std::mem::take(&mut self.parameters),
            initial_activations,
            weight_changes: std::mem::take(&mut self.pending)
                .into_values()
                .flatten()
                .collect(),
            seed: self.seed,
        };

        self.history.clear();
        self.pending.clear();
        self.failure = None;
        self.state = SchedulerState::Configuring;
        Ok(setup)
    }

    /// Registers an agent between steps. It holds no beliefs and needs
    /// parameters before the next step.
    pub fn add_agent(&mut self, agent: impl Into<Agent>) -> Result<(), SimError> {
        self.expect_configured("add an agent")?;
        self.network.add_agent(agent)
    }

    /// Changes a friendship weight between steps.
    pub fn set_weight(&mut self, from: AgentId, to: AgentId, weight: f64) -> Result<(), SimError> {
        self.expect_configured("set a weight")?;
        self.network.set_weight(from, to, weight)
    }

    pub fn remove_edge(&mut self, from: AgentId, to: AgentId) -> Result<bool, SimError> {
        self.expect_configured("remove an edge")?;
        self.network.remove_edge(from, to)
    }

    /// Sets stubbornness and deviation for an agent between steps.
    pub fn set_parameters(
        &mut self,
        agent: AgentId,
        stubbornness: f64,
        deviation: f64,
    ) -> Result<(), SimError> {
        self.expect_configured("set parameters")?;
        if !self.network.contains(agent) {
            return Err(SimError::UnknownAgent(agent));
        }
        self.parameters.set_agent(agent, stubbornness, deviation)
    }

    /// Queues a weight change for a step that has not been computed yet.
    pub fn schedule_weight(&mut self, change: WeightChange) -> Result<(), SimError> {
        self.expect_state(SchedulerState::Running, "schedule a weight change")?;
        if self.current_step().is_some_and(|step| change.at_step <= step) {
            return Err(SimError::InvalidState {
                operation: "schedule a weight change for a committed step",
                state: self.state,
            });
        }
        check_weight_change(&self.network, &change)?;
        self.pending.entry(change.at_step).or_default().push(change);
        Ok(())
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Index of the last committed step
    pub fn current_step(&self) -> Option<Step> {
        self.history.latest().map(|s| s.step)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn network(&self) -> &SocialNetwork {
        &self.network
    }

    pub fn beliefs(&self) -> impl Iterator<Item = &Belief> {
        self.beliefs.values()
    }

    pub fn behaviours(&self) -> impl Iterator<Item = &Behaviour> {
        self.behaviours.values()
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Why the scheduler is `Failed`, if it is
    pub fn failure(&self) -> Option<&SimError> {
        self.failure.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn latest(&self) -> Option<Arc<StepState>> {
        self.history.latest().cloned()
    }

    pub fn snapshot(&self, step: Step) -> Option<Arc<StepState>> {
        self.history.get(step).cloned()
    }

    /// Activation of `belief` held by `agent`, step by step
    pub fn activation_history(
        &self,
        agent: AgentId,
        belief: BeliefId,
    ) -> Series<'_, (AgentId, BeliefId)> {
        self.history.activations(agent, belief)
    }

    /// Whether `agent` performed `behaviour`, step by step
    pub fn performance_history(
        &self,
        agent: AgentId,
        behaviour: BehaviourId,
    ) -> Series<'_, (AgentId, BehaviourId)> {
        self.history.performances(agent, behaviour)
    }
}

fn check_weight_change(network: &SocialNetwork, change: &WeightChange) -> Result<(), SimError> {
    if !within(change.weight, 0.0, 1.0) {
        return Err(SimError::InvalidWeight {
            from: change.from,
            to: change.to,
            weight: change.weight,
        });
    }
    for agent in [change.from, change.to] {
        if !network.contains(agent) {
            return Err(SimError::UnknownAgent(agent));
        }
    }
    if change.from == change.to {
        return Err(SimError::SelfEdge(change.from));
    }
    Ok(())
}

/// Both engines over one snapshot. Nothing partial escapes on error.
fn compute_step(ctx: &StepContext<'_>, snapshot: &StepState) -> Result<StepState, SimError> {
    let activations = next_activations(ctx, snapshot)?;
    let performances = evaluate_performances(
        &ctx.network.agent_ids(),
        ctx.beliefs,
        ctx.behaviours,
        &activations,
    )?;
    Ok(StepState {
        step: ctx.next_step,
        activations,
        performances,
    })
}
