use crate::belief::BeliefState;
use crate::catalog::Catalog;
use crate::error::GameError;
use crate::params::GameParams;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Verbatim copy of a game's belief state for session stores.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BeliefSnapshot {
    pub probabilities: BTreeMap<String, f64>,
    pub asked: BTreeSet<String>,
    pub question_count: u32,
}

impl BeliefSnapshot {
    pub fn capture(state: &BeliefState) -> Self {
        BeliefSnapshot {
            probabilities: state.probabilities().clone(),
            asked: state.asked().clone(),
            question_count: state.question_count(),
        }
    }

    /// Rebuilds the state, checking every stored name against `catalog`.
    pub fn restore(
        self,
        catalog: &Catalog,
        params: &GameParams,
    ) -> Result<BeliefState, GameError> {
        if let Some(name) = self
            .probabilities
            .keys()
            .find(|name| catalog.identity(name).is_none())
        {
            return Err(GameError::UnknownIdentity(name.clone()));
        }
        if let Some(attribute) = self
            .asked
            .iter()
            .find(|attribute| !catalog.contains_attribute(attribute))
        {
            return Err(GameError::InvalidAttribute(attribute.clone()));
        }

        Ok(BeliefState::from_parts(
            self.probabilities,
            self.asked,
            self.question_count,
            params.soft_elimination_threshold,
        ))
    }

    pub fn to_json(state: &BeliefState) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&Self::capture(state))
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::BeliefSnapshot;
    use crate::belief::{Answer, BeliefState, Regime};
    use crate::catalog::{Catalog, Identity};
    use crate::error::GameError;
    use crate::params::GameParams;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Identity::new("X", [("a", true), ("b", false)]),
            Identity::new("Y", [("a", false), ("b", true)]),
        ])
        .expect("catalog")
    }

    #[test]
    fn snapshot_roundtrip_restores_state_exactly() {
        let catalog = catalog();
        let params = GameParams::default();
        let mut state = BeliefState::new(&catalog);
        state.apply_answer(&catalog, &params, "a", Answer::Yes).unwrap();

        let json = BeliefSnapshot::to_json(&state).unwrap();
        assert!(json.contains("\"question_count\": 1"));
        let restored = BeliefSnapshot::from_json(&json)
            .unwrap()
            .restore(&catalog, &params)
            .unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn restore_recomputes_regime_from_count() {
        let catalog = catalog();
        let params = GameParams::default();
        let snapshot = BeliefSnapshot {
            probabilities: [("X".to_string(), 1.0), ("Y".to_string(), 0.0)].into(),
            asked: ["a".to_string()].into(),
            question_count: 4,
        };
        let state = snapshot.restore(&catalog, &params).unwrap();
        assert_eq!(state.regime(), Regime::Hard);
    }

    #[test]
    fn restore_rejects_foreign_names() {
        let catalog = catalog();
        let params = GameParams::default();
        let snapshot = BeliefSnapshot {
            probabilities: [("Q".to_string(), 1.0)].into(),
            asked: Default::default(),
            question_count: 0,
        };
        assert_eq!(
            snapshot.restore(&catalog, &params).unwrap_err(),
            GameError::UnknownIdentity("Q".into())
        );

        let snapshot = BeliefSnapshot {
            probabilities: [("X".to_string(), 1.0)].into(),
            asked: ["zzz".to_string()].into(),
            question_count: 1,
        };
        assert_eq!(
            snapshot.restore(&catalog, &params).unwrap_err(),
            GameError::InvalidAttribute("zzz".into())
        );
    }
}
