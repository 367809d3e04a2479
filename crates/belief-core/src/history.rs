//! History Store
//!
//! Append-only, step-indexed record of every committed snapshot. Committed
//! steps are shared as `Arc<StepState>`, so readers can hold on to past
//! steps while the scheduler keeps appending.

use std::collections::BTreeMap;
use std::sync::Arc;

use belief_events::{AgentId, BehaviourId, BeliefId, Step};

/// Activation per (agent, belief)
pub type ActivationMap = BTreeMap<(AgentId, BeliefId), f64>;

/// Performance flag per (agent, behaviour)
pub type PerformanceMap = BTreeMap<(AgentId, BehaviourId), bool>;

/// Every record committed for a single step
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StepState {
    pub step: Step,
    pub activations: ActivationMap,
    pub performances: PerformanceMap,
}

impl StepState {
    pub fn activation(&self, agent: AgentId, belief: BeliefId) -> Option<f64> {
        self.activations.get(&(agent, belief)).copied()
    }

    pub fn performed(&self, agent: AgentId, behaviour: BehaviourId) -> Option<bool> {
        self.performances.get(&(agent, behaviour)).copied()
    }

    /// All beliefs held by `agent`, in belief order.
    pub fn beliefs_of(&self, agent: AgentId) -> impl Iterator<Item = (BeliefId, f64)> + '_ {
        let lo = (agent, BeliefId::from_u128(0));
        let hi = (agent, BeliefId::from_u128(u128::MAX));
        self.activations
            .range(lo..=hi)
            .map(|(&(_, belief), &value)| (belief, value))
    }
}

/// A key that selects one value out of a step
pub trait RecordKey: Copy {
    type Value: Copy;

    fn read(&self, state: &StepState) -> Option<Self::Value>;
}

impl RecordKey for (AgentId, BeliefId) {
    type Value = f64;

    fn read(&self, state: &StepState) -> Option<f64> {
        state.activations.get(self).copied()
    }
}

impl RecordKey for (AgentId, BehaviourId) {
    type Value = bool;

    fn read(&self, state: &StepState) -> Option<bool> {
        state.performances.get(self).copied()
    }
}

/// Append-only list of committed steps; index == step number.
#[derive(Debug, Clone, Default)]
pub struct History {
    steps: Vec<Arc<StepState>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the next step. The caller guarantees `state.step == self.len()`.
    pub(crate) fn push(&mut self, state: StepState) -> Arc<StepState> {
        debug_assert_eq!(state.step, self.steps.len() as Step);
        let state = Arc::new(state);
        self.steps.push(Arc::clone(&state));
        state
    }

    pub(crate) fn clear(&mut self) {
        self.steps.clear();
    }

    /// Number of committed steps, including step 0
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, step: Step) -> Option<&Arc<StepState>> {
        usize::try_from(step).ok().and_then(|i| self.steps.get(i))
    }

    pub fn latest(&self) -> Option<&Arc<StepState>> {
        self.steps.last()
    }

    pub fn steps(&self) -> impl Iterator<Item = &Arc<StepState>> {
        self.steps.iter()
    }

    /// Values of one record over time.
    pub fn series<K: RecordKey>(&self, key: K) -> Series<'_, K> {
        Series {
            steps: &self.steps,
            key,
        }
    }

    pub fn activations(&self, agent: AgentId, belief: BeliefId) -> Series<'_, (AgentId, BeliefId)> {
        self.series((agent, belief))
    }

    pub fn performances(
        &self,
        agent: AgentId,
        behaviour: BehaviourId,
    ) -> Series<'_, (AgentId, BehaviourId)> {
        self.series((agent, behaviour))
    }
}

/// Lazy, restartable, read-only view of one record across steps.
///
/// Every call to [`Series::iter`] starts again from step 0. Steps with no
/// record for the key are skipped.
#[derive(Debug, Clone, Copy)]
pub struct Series<'a, K> {
    steps: &'a [Arc<StepState>],
    key: K,
}

impl<'a, K: RecordKey> Series<'a, K> {
    pub fn iter(&self) -> SeriesIter<'a, K> {
        SeriesIter {
            inner: self.steps.iter(),
            key: self.key,
        }
    }

    /// Just the values, in step order
    pub fn values(&self) -> Vec<K::Value> {
        self.iter().map(|(_, v)| v).collect()
    }
}

impl<'a, K: RecordKey> IntoIterator for Series<'a, K> {
    type Item = (Step, K::Value);
    type IntoIter = SeriesIter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K: RecordKey> IntoIterator for &Series<'a, K> {
    type Item = (Step, K::Value);
    type IntoIter = SeriesIter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator returned by [`Series::iter`]
#[derive(Debug, Clone)]
pub struct SeriesIter<'a, K: RecordKey> {
    inner: std::slice::Iter<'a, Arc<StepState>>,
    key: K,
}

impl<'a, K: RecordKey> Iterator for SeriesIter<'a, K> {
    type Item = (Step, K::Value);

    fn next(&mut self) -> Option<Self::Item> {
        for state in self.inner.by_ref() {
            if let Some(value) = self.key.read(state) {
                return Some((state.step, value));
            }
        }
        None
    }
}
