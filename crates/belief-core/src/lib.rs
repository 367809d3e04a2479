//! Belief Spread Simulation Engine
//!
//! Agents connected by directed trust weights hold beliefs with an
//! activation in [-1, 1]. Each step, every activation is recomputed from the
//! previous step's snapshot (peer pressure, stubbornness, random deviation)
//! and behaviours are performed when their belief-weighted sum clears a
//! threshold.
//!
//! # Modules
//!
//! - [`components`]: agents, beliefs, behaviours, the social network
//! - [`systems`]: activation and behaviour engines, keyed random substreams
//! - [`scheduler`]: step lifecycle and run control
//! - [`history`]: append-only per-step records
//! - [`output`]: conversion to the shared export format
//!
//! # Example
//!
//! ```
//! use belief_core::{Belief, Parameters, Scheduler, Setup, SocialNetwork};
//! use belief_events::{AgentId, BeliefId};
//!
//! let (a, b) = (AgentId::from_u128(1), AgentId::from_u128(2));
//! let x = BeliefId::from_u128(10);
//!
//! let mut network = SocialNetwork::new();
//! network.add_agent(a)?;
//! network.add_agent(b)?;
//! network.set_weight(a, b, 1.0)?;
//!
//! let parameters = Parameters::new()
//!     .with_agent(a, 1.0, 0.0)?
//!     .with_agent(b, 0.0, 0.0)?;
//!
//! let setup = Setup::new(network, 42)
//!     .with_belief(Belief::new(x))
//!     .with_parameters(parameters)
//!     .with_activation(a, x, 1.0)?
//!     .with_activation(b, x, -1.0)?;
//!
//! let mut scheduler = Scheduler::new();
//! scheduler.initialize(setup)?;
//! scheduler.step()?;
//!
//! assert_eq!(scheduler.activation_history(b, x).values(), vec![-1.0, 1.0]);
//! # Ok::<(), belief_core::SimError>(())
//! ```

pub mod components;
pub mod error;
pub mod history;
pub mod output;
pub mod scheduler;
pub mod systems;

pub use components::*;
pub use error::{Parameter, SimError};
pub use history::{ActivationMap, History, PerformanceMap, Series, StepState};
pub use output::{export_history, export_step};
pub use scheduler::{RunOutcome, Scheduler, SchedulerState, Setup, WeightChange};
pub use systems::StepContext;
