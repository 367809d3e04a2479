//! Belief and Behaviour Components

use std::collections::BTreeMap;

use belief_events::{BehaviourId, BeliefId};
use serde::{Deserialize, Serialize};

use crate::error::{within, SimError};

/// A tracked proposition.
///
/// Relationships to other beliefs are optional compatibility weights in
/// [-1, 1]; they only matter when the interaction term is enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Belief {
    id: BeliefId,
    #[serde(default)]
    relationships: BTreeMap<BeliefId, f64>,
}

impl Belief {
    pub fn new(id: BeliefId) -> Self {
        Self {
            id,
            relationships: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> BeliefId {
        self.id
    }

    /// Sets the compatibility of this belief with `other`, replacing any previous value.
    pub fn set_relationship(&mut self, other: BeliefId, value: f64) -> Result<(), SimError> {
        if !within(value, -1.0, 1.0) {
            return Err(SimError::InvalidRelationship {
                belief: self.id,
                other,
                value,
            });
        }
        self.relationships.insert(other, value);
        Ok(())
    }

    pub fn with_relationship(mut self, other: BeliefId, value: f64) -> Result<Self, SimError> {
        self.set_relationship(other, value)?;
        Ok(self)
    }

    pub fn relationship(&self, other: BeliefId) -> Option<f64> {
        self.relationships.get(&other).copied()
    }

    pub fn relationships(&self) -> impl Iterator<Item = (BeliefId, f64)> + '_ {
        self.relationships.iter().map(|(&id, &w)| (id, w))
    }
}

/// An observable action driven by belief activations.
///
/// Performed when the effect-weighted sum of activations is strictly above
/// the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Behaviour {
    id: BehaviourId,
    threshold: f64,
    #[serde(default)]
    effects: BTreeMap<BeliefId, f64>,
}

impl Behaviour {
    pub fn new(id: BehaviourId, threshold: f64) -> Result<Self, SimError> {
        if !threshold.is_finite() {
            return Err(SimError::InvalidThreshold {
                behaviour: id,
                value: threshold,
            });
        }
        Ok(Self {
            id,
            threshold,
            effects: BTreeMap::new(),
        })
    }

    pub fn id(&self) -> BehaviourId {
        self.id
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Sets how strongly `belief` drives this behaviour, replacing any previous value.
    pub fn set_effect(&mut self, belief: BeliefId, value: f64) -> Result<(), SimError> {
        if !within(value, -1.0, 1.0) {
            return Err(SimError::InvalidEffect {
                behaviour: self.id,
                belief,
                value,
            });
        }
        self.effects.insert(belief, value);
        Ok(())
    }

    pub fn with_effect(mut self, belief: BeliefId, value: f64) -> Result<Self, SimError> {
        self.set_effect(belief, value)?;
        Ok(self)
    }

    pub fn effect(&self, belief: BeliefId) -> Option<f64> {
        self.effects.get(&belief).copied()
    }

    pub fn effects(&self) -> impl Iterator<Item = (BeliefId, f64)> + '_ {
        self.effects.iter().map(|(&id, &e)| (id, e))
    }

    /// Sum of `effect * activation` over the effect mapping, in belief order.
    pub fn weighted_sum(&self, activation: impl Fn(BeliefId) -> f64) -> f64 {
        self.effects
            .iter()
            .map(|(&belief, &effect)| effect * activation(belief))
            .sum()
    }

    /// Ties resolve to not performed.
    pub fn is_performed(&self, weighted_sum: f64) -> bool {
        weighted_sum > self.threshold
    }
}
