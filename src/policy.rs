use std::collections::HashMap;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::environment::{Grid, Movement, Pos};
use crate::rl::QTable;

/// Picks the next action from a Q-table row.
pub trait ExplorationStrategy {
    /// `candidates` is never empty.
    fn choose(&mut self, q_table: &QTable, state: Pos, candidates: &[Movement]) -> Movement;
}

pub struct EpsilonGreedy {
    epsilon: f64,
    rng: StdRng,
}

impl EpsilonGreedy {
    /// Seeded when `seed` is given, from OS entropy otherwise.
    pub fn new(epsilon: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        EpsilonGreedy { epsilon, rng }
    }
}

impl ExplorationStrategy for EpsilonGreedy {
    fn choose(&mut self, q_table: &QTable, state: Pos, candidates: &[Movement]) -> Movement {
        if self.rng.gen::<f64>() < self.epsilon {
            return candidates[self.rng.gen_range(0..candidates.len())];
        }
        q_table.best_among(state, candidates).0
    }
}

/// Always exploits.
#[derive(Debug, Default, Clone, Copy)]
pub struct Greedy;

impl ExplorationStrategy for Greedy {
    fn choose(&mut self, q_table: &QTable, state: Pos, candidates: &[Movement]) -> Movement {
        q_table.best_among(state, candidates).0
    }
}

/// Actions eligible at `pos`.
///
/// With `anti_reversal` the reverse of `last_action` is dropped. When none of
/// the remaining actions is a valid move the reverse is the only candidate, and
/// if that is blocked too every action stays eligible.
pub fn candidate_actions(
    grid: &Grid,
    pos: Pos,
    last_action: Option<Movement>,
    anti_reversal: bool,
) -> Vec<Movement> {
    let reverse = match last_action {
        Some(last) if anti_reversal => last.reverse(),
        _ => return Movement::ALL.to_vec(),
    };

    let filtered: Vec<Movement> = Movement::ALL
        .iter()
        .copied()
        .filter(|a| *a != reverse)
        .collect();
    if filtered.iter().any(|a| grid.is_valid_move(a.apply(pos))) {
        filtered
    } else if grid.is_valid_move(reverse.apply(pos)) {
        vec![reverse]
    } else {
        Movement::ALL.to_vec()
    }
}

// Represents deterministic policy
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetPolicy {
    pub policy: HashMap<Pos, Movement>,
}

impl DetPolicy {
    pub fn new() -> Self {
        Self {
            policy: HashMap::new(),
        }
    }

    pub fn action(&self, pos: Pos) -> Option<Movement> {
        self.policy.get(&pos).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_grid() -> Grid {
        "2 0 0\n0 0 0\n0 0 3".parse().unwrap()
    }

    #[test]
    fn test_zero_epsilon_is_greedy() {
        let mut q = QTable::new(3, 3);
        let pos = Pos::new(1, 1);
        q.set(pos, Movement::Down, 0.7);
        q.set(pos, Movement::Left, 0.2);

        let mut strategy = EpsilonGreedy::new(0.0, Some(1));
        for _ in 0..100 {
            assert_eq!(strategy.choose(&q, pos, &Movement::ALL), Movement::Down);
        }
    }

    #[test]
    fn test_zero_epsilon_ties_pick_lowest_index() {
        let mut q = QTable::new(3, 3);
        let pos = Pos::new(1, 1);
        q.set(pos, Movement::Right, 3.0);
        q.set(pos, Movement::Left, 3.0);

        let mut strategy = EpsilonGreedy::new(0.0, Some(1));
        assert_eq!(strategy.choose(&q, pos, &Movement::ALL), Movement::Right);
        assert_eq!(Greedy.choose(&q, pos, &Movement::ALL), Movement::Right);
    }

    #[test]
    fn test_full_epsilon_explores_candidates_only() {
        let q = QTable::new(3, 3);
        let candidates = [Movement::Down, Movement::Left];
        let mut strategy = EpsilonGreedy::new(1.0, Some(3));
        let mut seen_down = false;
        let mut seen_left = false;
        for _ in 0..200 {
            match strategy.choose(&q, Pos::new(0, 0), &candidates) {
                Movement::Down => seen_down = true,
                Movement::Left => seen_left = true,
                other => panic!("{:?} is not a candidate", other),
            }
        }
        assert!(seen_down && seen_left);
    }

    #[test]
    fn test_seeded_strategies_agree() {
        let q = QTable::new(3, 3);
        let mut a = EpsilonGreedy::new(0.5, Some(99));
        let mut b = EpsilonGreedy::new(0.5, Some(99));
        for _ in 0..50 {
            let pos = Pos::new(1, 1);
            assert_eq!(
                a.choose(&q, pos, &Movement::ALL),
                b.choose(&q, pos, &Movement::ALL)
            );
        }
    }

    #[test]
    fn test_candidates_without_rule() {
        let grid = open_grid();
        assert_eq!(
            candidate_actions(&grid, Pos::new(1, 1), Some(Movement::Up), false),
            Movement::ALL.to_vec()
        );
        assert_eq!(
            candidate_actions(&grid, Pos::new(1, 1), None, true),
            Movement::ALL.to_vec()
        );
    }

    #[test]
    fn test_anti_reversal_drops_reverse() {
        let grid = open_grid();
        let candidates = candidate_actions(&grid, Pos::new(1, 1), Some(Movement::Right), true);
        assert_eq!(
            candidates,
            vec![Movement::Up, Movement::Right, Movement::Down]
        );
    }

    #[test]
    fn test_anti_reversal_falls_back_to_reverse_in_dead_end() {
        // Dead end at (1,1): only the way back down is open.
        let grid: Grid = "1 1 1\n1 0 1\n1 2 3".parse().unwrap();
        let candidates = candidate_actions(&grid, Pos::new(1, 1), Some(Movement::Up), true);
        assert_eq!(candidates, vec![Movement::Down]);
    }

    #[test]
    fn test_anti_reversal_keeps_all_when_boxed_in() {
        // No open neighbour at all.
        let boxed: Grid = "2 1\n1 3".parse().unwrap();
        assert_eq!(
            candidate_actions(&boxed, Pos::new(0, 0), Some(Movement::Right), true),
            Movement::ALL.to_vec()
        );
    }

    #[test]
    fn test_anti_reversal_never_empty() {
        let grid: Grid = "1 1 1\n1 2 1\n1 3 1".parse().unwrap();
        for pos in grid.iter_all_coordinates() {
            for last in Movement::ALL {
                assert!(!candidate_actions(&grid, pos, Some(last), true).is_empty());
            }
        }
    }
}
