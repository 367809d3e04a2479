//! Scenario Configuration
//!
//! Loads a scenario from a TOML file. Agents, beliefs and behaviours are
//! referred to by name in the file and get identifiers when the scenario is
//! prepared for a run.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use belief_core::{Behaviour, Belief, Parameters, Setup, SimError, SocialNetwork, WeightChange};
use belief_events::{
    AgentId, BehaviourId, BeliefId, IdentityProvider, Label, SequentialIdentity, Step,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Default scenario file path
pub const DEFAULT_SCENARIO_PATH: &str = "scenario.toml";

/// Errors reading or parsing a scenario file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Errors turning a parsed scenario into a runnable setup
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("{kind} name {name:?} is declared twice")]
    DuplicateName { kind: &'static str, name: String },
    #[error("unknown {kind} {name:?}")]
    UnknownName { kind: &'static str, name: String },
    #[error(transparent)]
    Simulation(#[from] SimError),
}

/// Top-level scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub beliefs: Vec<BeliefConfig>,
    #[serde(default)]
    pub behaviours: Vec<BehaviourConfig>,
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
    #[serde(default)]
    pub friendships: Vec<FriendshipConfig>,
    #[serde(default)]
    pub weight_changes: Vec<WeightChangeConfig>,
}

/// Run parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u64,
    pub steps: u64,
    /// 0 = rayon's global pool
    pub worker_threads: usize,
    pub interaction_strength: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            steps: 10,
            worker_threads: 1,
            interaction_strength: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeliefConfig {
    pub name: String,
    /// Other belief name -> relationship in [-1, 1]
    #[serde(default)]
    pub relationships: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviourConfig {
    pub name: String,
    pub threshold: f64,
    /// Belief name -> effect in [-1, 1]
    #[serde(default)]
    pub effects: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    pub stubbornness: Option<f64>,
    pub deviation: Option<f64>,
    /// Belief name -> initial activation in [-1, 1]
    #[serde(default)]
    pub activations: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendshipConfig {
    pub source: String,
    pub target: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightChangeConfig {
    pub at_step: Step,
    pub source: String,
    pub target: String,
    pub weight: f64,
}

impl Default for Scenario {
    /// A rumour passed from a convinced, stubborn teller to an open listener.
    fn default() -> Self {
        let rumour = "rumour".to_string();
        Self {
            simulation: SimulationConfig::default(),
            beliefs: vec![BeliefConfig {
                name: rumour.clone(),
                relationships: BTreeMap::new(),
            }],
            behaviours: vec![BehaviourConfig {
                name: "repeat".to_string(),
                threshold: 0.5,
                effects: BTreeMap::from([(rumour.clone(), 1.0)]),
            }],
            agents: vec![
                AgentConfig {
                    name: "teller".to_string(),
                    stubbornness: Some(1.0),
                    deviation: Some(0.0),
                    activations: BTreeMap::from([(rumour.clone(), 1.0)]),
                },
                AgentConfig {
                    name: "listener".to_string(),
                    stubbornness: Some(0.2),
                    deviation: Some(0.05),
                    activations: BTreeMap::from([(rumour, -1.0)]),
                },
            ],
            friendships: vec![FriendshipConfig {
                source: "teller".to_string(),
                target: "listener".to_string(),
                weight: 1.0,
            }],
            weight_changes: Vec::new(),
        }
    }
}

/// A scenario with identifiers assigned, ready for the scheduler
#[derive(Debug, Clone)]
pub struct PreparedScenario {
    pub setup: Setup,
    pub agents: Vec<Label<AgentId>>,
    pub beliefs: Vec<Label<BeliefId>>,
    pub behaviours: Vec<Label<BehaviourId>>,
}

impl Scenario {
    /// Load a scenario from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    /// Load from the given path, falling back to the built-in scenario if
    /// the file doesn't exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Assigns sequential identifiers from 1 in declaration order (beliefs,
    /// then behaviours, then agents) and builds the scheduler setup.
    pub fn prepare(&self) -> Result<PreparedScenario, ScenarioError> {
        let mut ids = SequentialIdentity::starting_at(1);

        let beliefs = name_all(&mut ids, "belief", self.beliefs.iter().map(|b| &b.name))?;
        let behaviours =
            name_all(&mut ids, "behaviour", self.behaviours.iter().map(|b| &b.name))?;
        let agents = name_all(&mut ids, "agent", self.agents.iter().map(|a| &a.name))?;

        let belief_ids = index(&beliefs);
        let agent_ids = index(&agents);

        let mut network = SocialNetwork::new();
        for label in &agents {
            network.add_agent(label.id)?;
        }
        for friendship in &self.friendships {
            network.set_weight(
                lookup(&agent_ids, "agent", &friendship.source)?,
                lookup(&agent_ids, "agent", &friendship.target)?,
                friendship.weight,
            )?;
        }

        let mut parameters =
            Parameters::new().with_interaction_strength(self.simulation.interaction_strength)?;
        for (config, label) in self.agents.iter().zip(&agents) {
            if let Some(value) = config.stubbornness {
                parameters.set_stubbornness(label.id, value)?;
            }
            if let Some(value) = config.deviation {
                parameters.set_deviation(label.id, value)?;
            }
        }

        let mut setup = Setup::new(network, self.simulation.seed).with_parameters(parameters);

        for (config, label) in self.beliefs.iter().zip(&beliefs) {
            let mut belief = Belief::new(label.id);
            for (other, &value) in &config.relationships {
                belief.set_relationship(lookup(&belief_ids, "belief", other)?, value)?;
            }
            setup = setup.with_belief(belief);
        }

        for (config, label) in self.behaviours.iter().zip(&behaviours) {
            let mut behaviour = Behaviour::new(label.id, config.threshold)?;
            for (belief, &value) in &config.effects {
                behaviour.set_effect(lookup(&belief_ids, "belief", belief)?, value)?;
            }
            setup = setup.with_behaviour(behaviour);
        }

        for (config, label) in self.agents.iter().zip(&agents) {
            for (belief, &value) in &config.activations {
                setup =
                    setup.with_activation(label.id, lookup(&belief_ids, "belief", belief)?, value)?;
            }
        }

        for change in &self.weight_changes {
            setup = setup.with_weight_change(WeightChange {
                at_step: change.at_step,
                from: lookup(&agent_ids, "agent", &change.source)?,
                to: lookup(&agent_ids, "agent", &change.target)?,
                weight: change.weight,
            });
        }

        Ok(PreparedScenario {
            setup,
            agents,
            beliefs,
            behaviours,
        })
    }
}

fn name_all<'a, I>(
    ids: &mut impl IdentityProvider,
    kind: &'static str,
    names: impl Iterator<Item = &'a String>,
) -> Result<Vec<Label<I>>, ScenarioError>
where
    I: From<Uuid>,
{
    let mut seen = HashSet::new();
    let mut labels = Vec::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(ScenarioError::DuplicateName {
                kind,
                name: name.clone(),
            });
        }
        labels.push(Label::new(I::from(ids.new_identity()), name.clone()));
    }
    Ok(labels)
}

fn index<I: Copy>(labels: &[Label<I>]) -> HashMap<&str, I> {
    labels.iter().map(|l| (l.name.as_str(), l.id)).collect()
}

fn lookup<I: Copy>(
    index: &HashMap<&str, I>,
    kind: &'static str,
    name: &str,
) -> Result<I, ScenarioError> {
    index
        .get(name)
        .copied()
        .ok_or_else(|| ScenarioError::UnknownName {
            kind,
            name: name.to_string(),
        })
}
