//! Fine <-> coarse signal state conversion

use contracts::{CoarseIndication, FineIndication, ReductionPolicy};

/// Fine indication a single coarse state expands to
pub fn fine_for(coarse: CoarseIndication) -> FineIndication {
    match coarse {
        CoarseIndication::Red => FineIndication::RED,
        CoarseIndication::Yellow => FineIndication::YELLOW,
        CoarseIndication::Green => FineIndication::GREEN,
        CoarseIndication::Off => FineIndication::OFF,
    }
}

/// Folds the fine states of one installation into a coarse state
///
/// The policy is fixed for the reducer's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateReducer {
    policy: ReductionPolicy,
}

impl StateReducer {
    pub fn new(policy: ReductionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ReductionPolicy {
        self.policy
    }

    /// `Off` when no state is recognised, including the empty list
    pub fn reduce(&self, states: &[FineIndication]) -> CoarseIndication {
        let has_red = states
            .iter()
            .any(|s| *s == FineIndication::RED || *s == FineIndication::RED_YELLOW);
        let has_yellow = states.contains(&FineIndication::YELLOW);
        let has_green = states.contains(&FineIndication::GREEN);

        let precedence = match self.policy {
            ReductionPolicy::Strict => [
                (has_red, CoarseIndication::Red),
                (has_yellow, CoarseIndication::Yellow),
                (has_green, CoarseIndication::Green),
            ],
            ReductionPolicy::Permissive => [
                (has_green, CoarseIndication::Green),
                (has_yellow, CoarseIndication::Yellow),
                (has_red, CoarseIndication::Red),
            ],
        };

        precedence
            .into_iter()
            .find_map(|(present, coarse)| present.then_some(coarse))
            .unwrap_or(CoarseIndication::Off)
    }

    /// Always exactly `count` entries
    pub fn expand(&self, coarse: CoarseIndication, count: usize) -> Vec<FineIndication> {
        vec![fine_for(coarse); count]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const ALL: [FineIndication; 5] = [
        FineIndication::RED,
        FineIndication::YELLOW,
        FineIndication::RED_YELLOW,
        FineIndication::GREEN,
        FineIndication::OFF,
    ];

    fn random_states(rng: &mut StdRng) -> Vec<FineIndication> {
        let len = rng.random_range(0..8);
        (0..len).map(|_| ALL[rng.random_range(0..ALL.len())]).collect()
    }

    #[test]
    fn test_strict_precedence() {
        let reducer = StateReducer::new(ReductionPolicy::Strict);
        assert_eq!(
            reducer.reduce(&[FineIndication::GREEN, FineIndication::RED_YELLOW]),
            CoarseIndication::Red
        );
        assert_eq!(
            reducer.reduce(&[FineIndication::GREEN, FineIndication::YELLOW]),
            CoarseIndication::Yellow
        );
        assert_eq!(
            reducer.reduce(&[FineIndication::GREEN, FineIndication::OFF]),
            CoarseIndication::Green
        );
    }

    #[test]
    fn test_permissive_precedence() {
        let reducer = StateReducer::new(ReductionPolicy::Permissive);
        assert_eq!(
            reducer.reduce(&[FineIndication::RED, FineIndication::GREEN]),
            CoarseIndication::Green
        );
        assert_eq!(
            reducer.reduce(&[FineIndication::RED, FineIndication::YELLOW]),
            CoarseIndication::Yellow
        );
        assert_eq!(
            reducer.reduce(&[FineIndication::RED_YELLOW, FineIndication::OFF]),
            CoarseIndication::Red
        );
    }

    #[test]
    fn test_no_recognised_state_is_off() {
        for policy in [ReductionPolicy::Strict, ReductionPolicy::Permissive] {
            let reducer = StateReducer::new(policy);
            assert_eq!(reducer.reduce(&[]), CoarseIndication::Off);
            assert_eq!(
                reducer.reduce(&[FineIndication::OFF, FineIndication::OFF]),
                CoarseIndication::Off
            );
        }
    }

    #[test]
    fn test_strict_red_always_wins() {
        let reducer = StateReducer::new(ReductionPolicy::Strict);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let mut states = random_states(&mut rng);
            let red = if rng.random_bool(0.5) {
                FineIndication::RED
            } else {
                FineIndication::RED_YELLOW
            };
            let at = rng.random_range(0..=states.len());
            states.insert(at, red);
            assert_eq!(reducer.reduce(&states), CoarseIndication::Red, "{states:?}");
        }
    }

    #[test]
    fn test_permissive_green_always_wins() {
        let reducer = StateReducer::new(ReductionPolicy::Permissive);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let mut states = random_states(&mut rng);
            let at = rng.random_range(0..=states.len());
            states.insert(at, FineIndication::GREEN);
            assert_eq!(reducer.reduce(&states), CoarseIndication::Green, "{states:?}");
        }
    }

    #[test]
    fn test_expand_returns_count_entries() {
        let mut rng = StdRng::seed_from_u64(3);
        for policy in [ReductionPolicy::Strict, ReductionPolicy::Permissive] {
            let reducer = StateReducer::new(policy);
            for _ in 0..200 {
                let states = random_states(&mut rng);
                let count = rng.random_range(0..12);
                let expanded = reducer.expand(reducer.reduce(&states), count);
                assert_eq!(expanded.len(), count);
            }
        }
    }

    #[test]
    fn test_expand_mapping() {
        let reducer = StateReducer::default();
        assert_eq!(
            reducer.expand(CoarseIndication::Yellow, 2),
            vec![FineIndication::YELLOW; 2]
        );
        assert_eq!(
            reducer.expand(CoarseIndication::Off, 1),
            vec![FineIndication::OFF]
        );
        assert!(reducer.expand(CoarseIndication::Red, 0).is_empty());
    }
}
