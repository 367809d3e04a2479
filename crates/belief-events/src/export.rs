//! History Export Types
//!
//! Serialization structs for a finished (or interrupted) run.
//!
//! An export holds one record per committed step, starting with step 0 (the
//! initial snapshot). Steps are contiguous and increasing.

use serde::{Deserialize, Serialize};

use crate::{AgentId, BehaviourId, BeliefId, Step};

/// Human-readable name attached to an identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label<I> {
    pub id: I,
    pub name: String,
}

impl<I> Label<I> {
    pub fn new(id: I, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Activation of one belief held by one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationRecord {
    pub agent: AgentId,
    pub belief: BeliefId,
    pub activation: f64,
}

/// Whether one agent performed one behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub agent: AgentId,
    pub behaviour: BehaviourId,
    pub performed: bool,
}

/// Everything committed for a single step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepExport {
    pub step: Step,
    #[serde(default)]
    pub activations: Vec<ActivationRecord>,
    #[serde(default)]
    pub performances: Vec<PerformanceRecord>,
}

/// Full history of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryExport {
    pub seed: u64,
    /// Final scheduler state, e.g. "completed" or "failed"
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    #[serde(default)]
    pub agents: Vec<Label<AgentId>>,
    #[serde(default)]
    pub beliefs: Vec<Label<BeliefId>>,
    #[serde(default)]
    pub behaviours: Vec<Label<BehaviourId>>,
    pub steps: Vec<StepExport>,
}

impl HistoryExport {
    /// Returns true if step indices run 0, 1, 2, ... with no gaps.
    pub fn is_contiguous(&self) -> bool {
        self.steps
            .iter()
            .enumerate()
            .all(|(i, s)| s.step == i as Step)
    }

    /// Looks up the name given to an agent.
    pub fn agent_name(&self, id: AgentId) -> Option<&str> {
        self.agents
            .iter()
            .find(|l| l.id == id)
            .map(|l| l.name.as_str())
    }

    /// Activation series of one (agent, belief) pair in step order.
    pub fn activation_series(&self, agent: AgentId, belief: BeliefId) -> Vec<(Step, f64)> {
        self.steps
            .iter()
            .filter_map(|s| {
                s.activations
                    .iter()
                    .find(|r| r.agent == agent && r.belief == belief)
                    .map(|r| (s.step, r.activation))
            })
            .collect()
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HistoryExport {
        let agent = AgentId::from_u128(1);
        let belief = BeliefId::from_u128(2);
        HistoryExport {
            seed: 7,
            status: "completed".to_string(),
            failure: None,
            agents: vec![Label::new(agent, "alice")],
            beliefs: vec![Label::new(belief, "x")],
            behaviours: vec![],
            steps: (0..3)
                .map(|step| StepExport {
                    step,
                    activations: vec![ActivationRecord {
                        agent,
                        belief,
                        activation: step as f64 * 0.25,
                    }],
                    performances: vec![],
                })
                .collect(),
        }
    }

    #[test]
    fn test_contiguous_steps() {
        let mut export = sample();
        assert!(export.is_contiguous());

        export.steps.remove(1);
        assert!(!export.is_contiguous());
    }

    #[test]
    fn test_activation_series() {
        let export = sample();
        let series = export.activation_series(AgentId::from_u128(1), BeliefId::from_u128(2));
        assert_eq!(series, vec![(0, 0.0), (1, 0.25), (2, 0.5)]);
        assert!(export
            .activation_series(AgentId::from_u128(9), BeliefId::from_u128(2))
            .is_empty());
    }

    #[test]
    fn test_agent_name_lookup() {
        let export = sample();
        assert_eq!(export.agent_name(AgentId::from_u128(1)), Some("alice"));
        assert_eq!(export.agent_name(AgentId::from_u128(5)), None);
    }

    #[test]
    fn test_failure_omitted_when_absent() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(!json.contains("failure"));

        let parsed = HistoryExport::from_json(&json).unwrap();
        assert_eq!(parsed, sample());
    }
}
