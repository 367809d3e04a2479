//! Social Network
//!
//! Agent arena plus a directed, weighted trust graph. Edges are stored on
//! the receiving end so that "who influences me" is a single lookup.

use std::collections::{BTreeMap, HashMap};

use belief_events::AgentId;
use serde::{Deserialize, Serialize};

use crate::components::agent::Agent;
use crate::error::{within, SimError};

/// A directed trust relationship: `from` influences `to` with `weight`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Friendship {
    pub from: AgentId,
    pub to: AgentId,
    /// 0.0 to 1.0
    pub weight: f64,
}

/// The set of agents and the friendship graph between them.
#[derive(Debug, Clone, Default)]
pub struct SocialNetwork {
    /// Agents in registration order
    agents: Vec<Agent>,
    /// Agent id -> slot in `agents` and `incoming`
    index: HashMap<AgentId, usize>,
    /// Per slot: source agent -> trust weight, ordered by source id
    incoming: Vec<BTreeMap<AgentId, f64>>,
}

impl SocialNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an agent with no friendships.
    pub fn add_agent(&mut self, agent: impl Into<Agent>) -> Result<(), SimError> {
        let agent = agent.into();
        if self.index.contains_key(&agent.id()) {
            return Err(SimError::DuplicateAgent(agent.id()));
        }
        self.index.insert(agent.id(), self.agents.len());
        self.agents.push(agent);
        self.incoming.push(BTreeMap::new());
        Ok(())
    }

    pub fn contains(&self, agent: AgentId) -> bool {
        self.index.contains_key(&agent)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Agents in registration order
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Agent identifiers sorted ascending
    pub fn agent_ids(&self) -> Vec<AgentId> {
        let mut ids: Vec<AgentId> = self.agents.iter().map(Agent::id).collect();
        ids.sort_unstable();
        ids
    }

    fn slot(&self, agent: AgentId) -> Result<usize, SimError> {
        self.index
            .get(&agent)
            .copied()
            .ok_or(SimError::UnknownAgent(agent))
    }

    /// Sets how strongly `from` influences `to`.
    ///
    /// Replaces any existing weight on the same ordered pair. Self-retention
    /// is the agent's stubbornness, so `from == to` is rejected.
    pub fn set_weight(&mut self, from: AgentId, to: AgentId, weight: f64) -> Result<(), SimError> {
        if !within(weight, 0.0, 1.0) {
            return Err(SimError::InvalidWeight { from, to, weight });
        }
        self.slot(from)?;
        if from == to {
            return Err(SimError::SelfEdge(from));
        }
        let slot = self.slot(to)?;
        self.incoming[slot].insert(from, weight);
        Ok(())
    }

    pub fn add_friendship(&mut self, friendship: Friendship) -> Result<(), SimError> {
        self.set_weight(friendship.from, friendship.to, friendship.weight)
    }

    /// Removes the edge `from -> to`. Returns whether one existed.
    pub fn remove_edge(&mut self, from: AgentId, to: AgentId) -> Result<bool, SimError> {
        self.slot(from)?;
        let slot = self.slot(to)?;
        Ok(self.incoming[slot].remove(&from).is_some())
    }

    pub fn weight(&self, from: AgentId, to: AgentId) -> Option<f64> {
        let slot = self.index.get(&to)?;
        self.incoming[*slot].get(&from).copied()
    }

    /// Agents with an edge into `agent`, with their weights, ordered by identifier.
    pub fn neighbours(
        &self,
        agent: AgentId,
    ) -> Result<impl Iterator<Item = (AgentId, f64)> + '_, SimError> {
        let slot = self.slot(agent)?;
        Ok(self.incoming[slot].iter().map(|(&id, &w)| (id, w)))
    }

    /// Every edge, ordered by target then source
    pub fn friendships(&self) -> Vec<Friendship> {
        let mut edges: Vec<Friendship> = self
            .agents
            .iter()
            .zip(&self.incoming)
            .flat_map(|(target, sources)| {
                sources.iter().map(move |(&from, &weight)| Friendship {
                    from,
                    to: target.id(),
                    weight,
                })
            })
            .collect();
        edges.sort_by(|a, b| (a.to, a.from).cmp(&(b.to, b.from)));
        edges
    }

    pub fn edge_count(&self) -> usize {
        self.incoming.iter().map(BTreeMap::len).sum()
    }
}
