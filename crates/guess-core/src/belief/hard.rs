//! Hard elimination: later answers zero out every inconsistent identity.

use super::{Answer, BeliefState};
use crate::EPSILON;
use crate::catalog::Catalog;

/// Sets the probability of each live identity that disagrees with `answer` to exactly zero.
pub fn eliminate_mismatches(
    belief: &mut BeliefState,
    catalog: &Catalog,
    attribute: &str,
    answer: Answer,
) {
    for identity in catalog.identities() {
        if belief.probability(identity.name()) < EPSILON {
            continue;
        }
        if !answer.matches(identity.has(attribute)) {
            belief.eliminate(identity.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Identity;

    #[test]
    fn mismatching_identities_drop_to_zero() {
        let catalog = Catalog::new(vec![
            Identity::new("X", [("a", true)]),
            Identity::new("Y", [("a", false)]),
        ])
        .expect("catalog");
        let mut belief = BeliefState::new(&catalog);

        eliminate_mismatches(&mut belief, &catalog, "a", Answer::No);

        assert_eq!(belief.probability("X"), 0.0);
        assert_eq!(belief.probability("Y"), 0.5);
    }
}
