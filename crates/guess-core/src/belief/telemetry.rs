use super::BeliefState;
use crate::info::entropy;

#[derive(Debug, Clone, PartialEq)]
pub struct BeliefMetrics {
    pub question_count: u32,
    pub remaining: usize,
    pub entropy_bits: f64,
    pub leader: Option<String>,
    pub leader_probability: f64,
}

impl BeliefMetrics {
    pub fn from_state(state: &BeliefState) -> Self {
        let leader = state.leader();
        Self {
            question_count: state.question_count(),
            remaining: state.remaining(),
            entropy_bits: entropy(state.probabilities().values().copied()),
            leader: leader.map(|(name, _)| name.to_string()),
            leader_probability: leader.map(|(_, p)| p).unwrap_or(0.0),
        }
    }
}
