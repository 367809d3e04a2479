//! Agent Components
//!
//! Agents are pure identities. Everything that changes over time lives in the
//! scheduler's history, and per-agent tuning lives in [`Parameters`].

use std::collections::BTreeMap;

use belief_events::{AgentId, IdentityProvider};
use serde::{Deserialize, Serialize};

use crate::error::{within, Parameter, SimError};

/// A simulated individual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Agent {
    id: AgentId,
}

impl Agent {
    pub fn new(id: AgentId) -> Self {
        Self { id }
    }

    /// Creates an agent with an identifier drawn from `provider`.
    pub fn from_provider(provider: &mut impl IdentityProvider) -> Self {
        Self::new(provider.new_identity().into())
    }

    pub fn id(&self) -> AgentId {
        self.id
    }
}

impl From<AgentId> for Agent {
    fn from(id: AgentId) -> Self {
        Self::new(id)
    }
}

/// Stubbornness and deviation of one agent, both in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentParameters {
    /// 0 = fully open to peers, 1 = ignores peers entirely
    pub stubbornness: f64,
    /// Scale of the random perturbation
    pub deviation: f64,
}

/// Per-agent update parameters plus the global belief interaction strength.
///
/// Stubbornness and deviation are tracked separately so a half-configured
/// agent reports exactly which value is missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    stubbornness: BTreeMap<AgentId, f64>,
    deviation: BTreeMap<AgentId, f64>,
    interaction_strength: f64,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_stubbornness(&mut self, agent: AgentId, value: f64) -> Result<(), SimError> {
        if !within(value, 0.0, 1.0) {
            return Err(SimError::InvalidStubbornness { agent, value });
        }
        self.stubbornness.insert(agent, value);
        Ok(())
    }

    pub fn set_deviation(&mut self, agent: AgentId, value: f64) -> Result<(), SimError> {
        if !within(value, 0.0, 1.0) {
            return Err(SimError::InvalidDeviation { agent, value });
        }
        self.deviation.insert(agent, value);
        Ok(())
    }

    /// Sets both values for an agent. Nothing is stored if either is invalid.
    pub fn set_agent(
        &mut self,
        agent: AgentId,
        stubbornness: f64,
        deviation: f64,
    ) -> Result<(), SimError> {
        if !within(deviation, 0.0, 1.0) {
            return Err(SimError::InvalidDeviation {
                agent,
                value: deviation,
            });
        }
        self.set_stubbornness(agent, stubbornness)?;
        self.deviation.insert(agent, deviation);
        Ok(())
    }

    /// Builder form of [`Parameters::set_agent`].
    pub fn with_agent(
        mut self,
        agent: AgentId,
        stubbornness: f64,
        deviation: f64,
    ) -> Result<Self, SimError> {
        self.set_agent(agent, stubbornness, deviation)?;
        Ok(self)
    }

    pub fn set_interaction_strength(&mut self, value: f64) -> Result<(), SimError> {
        if !within(value, 0.0, 1.0) {
            return Err(SimError::InvalidInteractionStrength(value));
        }
        self.interaction_strength = value;
        Ok(())
    }

    pub fn with_interaction_strength(mut self, value: f64) -> Result<Self, SimError> {
        self.set_interaction_strength(value)?;
        Ok(self)
    }

    pub fn stubbornness(&self, agent: AgentId) -> Option<f64> {
        self.stubbornness.get(&agent).copied()
    }

    pub fn deviation(&self, agent: AgentId) -> Option<f64> {
        self.deviation.get(&agent).copied()
    }

    pub fn interaction_strength(&self) -> f64 {
        self.interaction_strength
    }

    /// Both values for `agent`, or `MissingParameter` naming the first absent one.
    pub fn require(&self, agent: AgentId) -> Result<AgentParameters, SimError> {
        let stubbornness = self.stubbornness(agent).ok_or(SimError::MissingParameter {
            agent,
            parameter: Parameter::Stubbornness,
        })?;
        let deviation = self.deviation(agent).ok_or(SimError::MissingParameter {
            agent,
            parameter: Parameter::Deviation,
        })?;
        Ok(AgentParameters {
            stubbornness,
            deviation,
        })
    }

    /// First agent (in `agents` order) lacking a parameter.
    pub fn first_missing<'a>(
        &self,
        agents: impl IntoIterator<Item = &'a AgentId>,
    ) -> Option<(AgentId, Parameter)> {
        agents.into_iter().find_map(|&agent| match self.require(agent) {
            Err(SimError::MissingParameter { agent, parameter }) => Some((agent, parameter)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use belief_events::SequentialIdentity;

    #[test]
    fn test_agent_from_provider() {
        let mut ids = SequentialIdentity::new();
        let a = Agent::from_provider(&mut ids);
        let b = Agent::from_provider(&mut ids);
        assert_ne!(a.id(), b.id());
        assert!(a < b);
    }

    #[test]
    fn test_parameters_range_checked() {
        let agent = AgentId::from_u128(1);
        let mut params = Parameters::new();

        assert!(params.set_stubbornness(agent, 1.5).is_err());
        assert!(params.set_deviation(agent, -0.1).is_err());
        assert!(params.set_stubbornness(agent, f64::NAN).is_err());
        assert!(params.set_interaction_strength(2.0).is_err());

        params.set_agent(agent, 0.25, 0.5).unwrap();
        assert_eq!(
            params.require(agent).unwrap(),
            AgentParameters {
                stubbornness: 0.25,
                deviation: 0.5
            }
        );
    }

    #[test]
    fn test_set_agent_is_all_or_nothing() {
        let agent = AgentId::from_u128(1);
        let mut params = Parameters::new();

        assert!(params.set_agent(agent, 0.5, 7.0).is_err());
        assert_eq!(params.stubbornness(agent), None);
        assert_eq!(params.deviation(agent), None);
    }

    #[test]
    fn test_require_names_missing_parameter() {
        let agent = AgentId::from_u128(1);
        let mut params = Parameters::new();
        params.set_stubbornness(agent, 0.5).unwrap();

        assert_eq!(
            params.require(agent),
            Err(SimError::MissingParameter {
                agent,
                parameter: Parameter::Deviation
            })
        );

        let other = AgentId::from_u128(2);
        assert_eq!(
            params.first_missing(&[agent, other]),
            Some((agent, Parameter::Deviation))
        );
    }
}
