//! Power-weighted participant selection.
//!
//! Given the participants of one round and the minimum signature count and
//! power the chain demands, find which disputed data keys must be dropped so
//! that the remaining agreement satisfies both minimums. A purely count-based
//! quorum can be gamed by many low-power nodes; weighting by power and
//! excluding contested keys lets a round converge even when a minority of
//! high-power validators disagree on a subset of feeds.
//!
//! Selection rule: the smallest set of dropped keys whose induced agreement
//! satisfies both minimums; among equal-size sets, the one including the
//! most power. A round where even dropping every disputed key cannot satisfy
//! the minimums is unsolvable and reports every disputed key.

use super::participant::{ConsensusConstraints, ConsensusParticipant};
use shared_types::Address;
use std::collections::BTreeSet;
use tracing::debug;

/// Above this many distinct disputed keys the exhaustive subset search is
/// replaced by a greedy pass. Rounds dispute a handful of keys in practice.
const MAX_EXHAUSTIVE_KEYS: usize = 16;

/// Outcome of one optimization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptimizerSolution {
    /// Participants whose disagreements are fully covered by `dropped_keys`.
    pub included: Vec<Address>,
    /// Combined power of the included participants.
    pub total_power: u128,
    /// Keys that must be excluded from the round.
    pub dropped_keys: BTreeSet<String>,
    /// Whether the constraints were satisfiable at all.
    pub solved: bool,
}

/// Finds the best-fitting participant subset for a set of constraints.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsensusOptimizer;

impl ConsensusOptimizer {
    pub fn find(
        &self,
        participants: &[ConsensusParticipant],
        constraints: &ConsensusConstraints,
    ) -> OptimizerSolution {
        let keys: Vec<String> = participants
            .iter()
            .flat_map(|p| p.discrepancy_keys.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if keys.len() <= MAX_EXHAUSTIVE_KEYS {
            self.find_exhaustive(participants, constraints, &keys)
        } else {
            debug!(
                disputed_keys = keys.len(),
                "Too many disputed keys for exhaustive search, using greedy pass"
            );
            self.find_greedy(participants, constraints, &keys)
        }
    }

    /// Enumerate every subset of disputed keys; pick the smallest satisfying
    /// subset, breaking ties by included power.
    fn find_exhaustive(
        &self,
        participants: &[ConsensusParticipant],
        constraints: &ConsensusConstraints,
        keys: &[String],
    ) -> OptimizerSolution {
        let key_index = |key: &String| keys.iter().position(|k| k == key);
        let masks: Vec<u32> = participants
            .iter()
            .map(|p| {
                p.discrepancy_keys
                    .iter()
                    .filter_map(key_index)
                    .fold(0u32, |mask, i| mask | (1 << i))
            })
            .collect();

        // best[size] = (power, dropped_mask) for the best satisfying subset
        // of that size.
        let mut best: Vec<Option<(u128, u32)>> = vec![None; keys.len() + 1];

        for dropped in 0u32..(1u32 << keys.len()) {
            let mut power = 0u128;
            let mut count = 0usize;
            for (participant, mask) in participants.iter().zip(&masks) {
                if mask & !dropped == 0 {
                    power += participant.power;
                    count += 1;
                }
            }
            if !constraints.satisfied_by(count, power) {
                continue;
            }
            let size = dropped.count_ones() as usize;
            match best[size] {
                Some((existing, _)) if existing >= power => {}
                _ => best[size] = Some((power, dropped)),
            }
        }

        for entry in &best {
            if let Some((_, dropped)) = entry {
                return self.solution_for(participants, &masks, *dropped, keys);
            }
        }

        Self::unsolvable(keys)
    }

    /// Drop keys in order of descending disputing power until the
    /// constraints hold.
    fn find_greedy(
        &self,
        participants: &[ConsensusParticipant],
        constraints: &ConsensusConstraints,
        keys: &[String],
    ) -> OptimizerSolution {
        let mut ordered: Vec<(&String, u128)> = keys
            .iter()
            .map(|key| {
                let disputing: u128 = participants
                    .iter()
                    .filter(|p| p.discrepancy_keys.contains(key))
                    .map(|p| p.power)
                    .sum();
                (key, disputing)
            })
            .collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let mut dropped = BTreeSet::new();
        loop {
            let included: Vec<&ConsensusParticipant> = participants
                .iter()
                .filter(|p| p.agrees_given(&dropped))
                .collect();
            let power = included.iter().map(|p| p.power).sum();
            if constraints.satisfied_by(included.len(), power) {
                return OptimizerSolution {
                    included: included.iter().map(|p| p.address.clone()).collect(),
                    total_power: power,
                    dropped_keys: dropped,
                    solved: true,
                };
            }
            match ordered.get(dropped.len()) {
                Some((key, _)) => {
                    dropped.insert((*key).clone());
                }
                None => return Self::unsolvable(keys),
            }
        }
    }

    fn solution_for(
        &self,
        participants: &[ConsensusParticipant],
        masks: &[u32],
        dropped: u32,
        keys: &[String],
    ) -> OptimizerSolution {
        let mut included = Vec::new();
        let mut total_power = 0u128;
        for (participant, mask) in participants.iter().zip(masks) {
            if mask & !dropped == 0 {
                included.push(participant.address.clone());
                total_power += participant.power;
            }
        }
        let dropped_keys = keys
            .iter()
            .enumerate()
            .filter(|(i, _)| dropped & (1 << i) != 0)
            .map(|(_, k)| k.clone())
            .collect();
        OptimizerSolution {
            included,
            total_power,
            dropped_keys,
            solved: true,
        }
    }

    fn unsolvable(keys: &[String]) -> OptimizerSolution {
        OptimizerSolution {
            included: Vec::new(),
            total_power: 0,
            dropped_keys: keys.iter().cloned().collect(),
            solved: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::new(s).unwrap()
    }

    fn constraints(signatures: usize, power: u128) -> ConsensusConstraints {
        ConsensusConstraints {
            minimum_required_signatures: signatures,
            minimum_required_power: power,
        }
    }

    #[test]
    fn test_no_disputes_includes_everyone() {
        let participants = vec![
            ConsensusParticipant::new(addr("0xa"), 10),
            ConsensusParticipant::new(addr("0xb"), 20),
        ];
        let solution = ConsensusOptimizer.find(&participants, &constraints(2, 30));
        assert!(solution.solved);
        assert_eq!(solution.included.len(), 2);
        assert_eq!(solution.total_power, 30);
        assert!(solution.dropped_keys.is_empty());
    }

    #[test]
    fn test_minority_dissenter_excluded_key_kept() {
        // One low-power dissenter on BTC-USD: cheaper to exclude the
        // participant than to drop the key.
        let participants = vec![
            ConsensusParticipant::new(addr("0xa"), 40),
            ConsensusParticipant::new(addr("0xb"), 40),
            ConsensusParticipant::with_discrepancies(addr("0xc"), 5, ["BTC-USD"]),
        ];
        let solution = ConsensusOptimizer.find(&participants, &constraints(2, 50));
        assert!(solution.solved);
        assert!(solution.dropped_keys.is_empty());
        assert_eq!(solution.included.len(), 2);
        assert_eq!(solution.total_power, 80);
    }

    #[test]
    fn test_high_power_dissenter_forces_key_drop() {
        // Power [10,10,10,10,60], minimum power 50. Four low-power
        // validators agree on feed X; the 60-power validator disagrees.
        // Keeping X caps the agreement at power 40, so X must be dropped.
        let participants = vec![
            ConsensusParticipant::new(addr("0xa"), 10),
            ConsensusParticipant::new(addr("0xb"), 10),
            ConsensusParticipant::new(addr("0xc"), 10),
            ConsensusParticipant::new(addr("0xd"), 10),
            ConsensusParticipant::with_discrepancies(addr("0xe"), 60, ["X"]),
        ];
        let solution = ConsensusOptimizer.find(&participants, &constraints(1, 50));
        assert!(solution.solved);
        assert!(solution.dropped_keys.contains("X"));
        assert_eq!(solution.included.len(), 5);
        assert_eq!(solution.total_power, 100);
    }

    #[test]
    fn test_smallest_key_set_wins() {
        // Dropping Y alone satisfies the constraints; X stays contested by a
        // participant we can afford to lose.
        let participants = vec![
            ConsensusParticipant::new(addr("0xa"), 50),
            ConsensusParticipant::with_discrepancies(addr("0xb"), 40, ["Y"]),
            ConsensusParticipant::with_discrepancies(addr("0xc"), 5, ["X", "Y"]),
        ];
        let solution = ConsensusOptimizer.find(&participants, &constraints(2, 90));
        assert!(solution.solved);
        assert_eq!(
            solution.dropped_keys,
            BTreeSet::from(["Y".to_string()])
        );
        assert_eq!(solution.total_power, 90);
    }

    #[test]
    fn test_equal_size_tie_breaks_on_power() {
        // Either key alone satisfies the count constraint; dropping Y buys
        // more power.
        let participants = vec![
            ConsensusParticipant::new(addr("0xa"), 30),
            ConsensusParticipant::with_discrepancies(addr("0xb"), 10, ["X"]),
            ConsensusParticipant::with_discrepancies(addr("0xc"), 25, ["Y"]),
        ];
        let solution = ConsensusOptimizer.find(&participants, &constraints(2, 0));
        assert!(solution.solved);
        assert_eq!(
            solution.dropped_keys,
            BTreeSet::from(["Y".to_string()])
        );
        assert_eq!(solution.total_power, 55);
    }

    #[test]
    fn test_unsolvable_reports_all_disputed_keys() {
        let participants = vec![
            ConsensusParticipant::with_discrepancies(addr("0xa"), 10, ["X"]),
            ConsensusParticipant::with_discrepancies(addr("0xb"), 10, ["Y"]),
        ];
        let solution = ConsensusOptimizer.find(&participants, &constraints(2, 100));
        assert!(!solution.solved);
        assert!(solution.included.is_empty());
        assert_eq!(
            solution.dropped_keys,
            BTreeSet::from(["X".to_string(), "Y".to_string()])
        );
    }

    #[test]
    fn test_greedy_path_many_keys() {
        // 20 distinct keys forces the greedy pass.
        let mut participants = vec![ConsensusParticipant::new(addr("0xbase"), 100)];
        for i in 0..20 {
            participants.push(ConsensusParticipant::with_discrepancies(
                addr(&format!("0x{i:02x}")),
                (i as u128) + 1,
                [format!("KEY-{i}")],
            ));
        }
        let solution = ConsensusOptimizer.find(&participants, &constraints(2, 110));
        assert!(solution.solved);
        assert!(solution.total_power >= 110);
        assert!(solution.included.len() >= 2);
    }
}
