use std::cmp::Reverse;
use std::fs::File;
use std::path::Path;

use csv::Writer;
use ndarray::Array3;
use ordered_float::OrderedFloat;
use tracing::{debug, info};

use crate::agent::{Agent, EpisodeRecord, EpisodeStatus};
use crate::environment::{Grid, Movement, Pos, ACTION_COUNT};
use crate::error::{Error, Result};
use crate::policy::{DetPolicy, ExplorationStrategy};

/// Dense Q-table indexed by `(row, col, action)`.
///
/// Every cell of the grid has a row, zero-initialised at construction.
/// Asking for a position outside the grid is a programming error and panics.
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    q: Array3<f64>,
}

impl QTable {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            q: Array3::zeros((rows, cols, ACTION_COUNT)),
        }
    }

    pub fn for_grid(grid: &Grid) -> Self {
        let (rows, cols) = grid.size();
        Self::new(rows, cols)
    }

    fn slot(&self, pos: Pos) -> (usize, usize) {
        let (rows, cols, _) = self.q.dim();
        assert!(
            pos.row >= 0 && pos.col >= 0 && (pos.row as usize) < rows && (pos.col as usize) < cols,
            "position {} is outside the {}x{} Q-table",
            pos,
            rows,
            cols
        );
        (pos.row as usize, pos.col as usize)
    }

    pub fn value(&self, pos: Pos, movement: Movement) -> f64 {
        let (r, c) = self.slot(pos);
        self.q[[r, c, movement.index()]]
    }

    pub fn set(&mut self, pos: Pos, movement: Movement, value: f64) {
        let (r, c) = self.slot(pos);
        self.q[[r, c, movement.index()]] = value;
    }

    /// The action values of `pos`, in action index order.
    pub fn values(&self, pos: Pos) -> [f64; ACTION_COUNT] {
        let (r, c) = self.slot(pos);
        std::array::from_fn(|a| self.q[[r, c, a]])
    }

    pub fn max_value(&self, pos: Pos) -> f64 {
        self.best_action(pos).1
    }

    /// Greedy action over all actions. Ties go to the lowest action index.
    pub fn best_action(&self, pos: Pos) -> (Movement, f64) {
        self.best_among(pos, &Movement::ALL)
    }

    /// Greedy action restricted to `candidates`, which must not be empty.
    /// Ties go to the lowest action index regardless of candidate order.
    pub fn best_among(&self, pos: Pos, candidates: &[Movement]) -> (Movement, f64) {
        let values = self.values(pos);
        let key = |m: Movement| (OrderedFloat(values[m.index()]), Reverse(m.index()));

        let mut best = candidates[0];
        for &candidate in &candidates[1..] {
            if key(candidate) > key(best) {
                best = candidate;
            }
        }
        (best, values[best.index()])
    }

    /// Q-learning update:
    ///
    /// Q(s,a) ← Q(s,a) + α[r + γ max_a' Q(s',a') - Q(s,a)]
    ///
    /// Returns the temporal difference.
    pub fn update(
        &mut self,
        pos: Pos,
        movement: Movement,
        reward: f64,
        next_pos: Pos,
        learning_rate: f64,
        discount_factor: f64,
    ) -> f64 {
        let current_q = self.value(pos, movement);
        let t_d = reward + discount_factor * self.max_value(next_pos) - current_q;
        self.set(pos, movement, current_q + learning_rate * t_d);
        t_d
    }

    /// Argmax action for every open cell except the designated goal.
    pub fn greedy_policy(&self, grid: &Grid) -> DetPolicy {
        let mut policy = DetPolicy::new();
        for pos in grid.iter_all_coordinates() {
            if grid.at(pos).is_blocking() || grid.is_terminal(pos) {
                continue;
            }
            policy.policy.insert(pos, self.best_action(pos).0);
        }
        policy
    }
}

/// Per-episode results of a training run.
#[derive(Debug, Clone, Default)]
pub struct TrainingReport {
    pub records: Vec<EpisodeRecord>,
}

impl TrainingReport {
    pub fn episodes(&self) -> usize {
        self.records.len()
    }

    pub fn successes(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome == EpisodeStatus::EpisodeComplete)
            .count()
    }

    pub fn first(&self) -> Option<&EpisodeRecord> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&EpisodeRecord> {
        self.records.last()
    }

    pub fn last_success(&self) -> Option<&EpisodeRecord> {
        self.records
            .iter()
            .rev()
            .find(|r| r.outcome == EpisodeStatus::EpisodeComplete)
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create {}", path.display()),
            source,
        })?;
        let mut writer = Writer::from_writer(file);
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush().map_err(|source| Error::Io {
            operation: format!("flush {}", path.display()),
            source,
        })?;
        Ok(())
    }
}

/// Runs `amt_episodes` episodes. The Q-table carries over from one episode to
/// the next, only the agent state is reset.
pub fn train<S: ExplorationStrategy>(agent: &mut Agent<S>, amt_episodes: usize) -> TrainingReport {
    let mut report = TrainingReport::default();
    let log_every = (amt_episodes / 10).max(1);

    for episode_num in 0..amt_episodes {
        let record = agent.run_episode();
        debug!(
            episode = record.episode,
            steps = record.steps,
            reward = record.total_reward,
            outcome = ?record.outcome,
            "episode finished"
        );
        if (episode_num + 1) % log_every == 0 {
            info!(
                "Episode {}/{}: {:?} after {} steps",
                episode_num + 1,
                amt_episodes,
                record.outcome,
                record.steps
            );
        }
        report.records.push(record);
    }

    info!(
        episodes = report.episodes(),
        successes = report.successes(),
        "training finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qtable_initialization() {
        let qtable = QTable::new(3, 4);
        for row in 0..3 {
            for col in 0..4 {
                assert_eq!(qtable.values(Pos::new(row, col)), [0.0; ACTION_COUNT]);
            }
        }
    }

    #[test]
    fn test_qtable_set_get() {
        let mut qtable = QTable::new(2, 2);
        qtable.set(Pos::new(1, 0), Movement::Left, 1.5);
        assert_eq!(qtable.value(Pos::new(1, 0), Movement::Left), 1.5);
        assert_eq!(qtable.values(Pos::new(1, 0)), [0.0, 0.0, 0.0, 1.5]);
    }

    #[test]
    fn test_best_action() {
        let mut qtable = QTable::new(1, 1);
        let pos = Pos::new(0, 0);
        qtable.set(pos, Movement::Up, 0.5);
        qtable.set(pos, Movement::Right, 1.5);
        qtable.set(pos, Movement::Down, 0.8);
        qtable.set(pos, Movement::Left, -2.0);
        assert_eq!(qtable.best_action(pos), (Movement::Right, 1.5));
        assert_eq!(qtable.max_value(pos), 1.5);
    }

    #[test]
    fn test_best_action_ties_pick_lowest_index() {
        let mut qtable = QTable::new(1, 1);
        let pos = Pos::new(0, 0);
        assert_eq!(qtable.best_action(pos).0, Movement::Up);

        qtable.set(pos, Movement::Up, -1.0);
        qtable.set(pos, Movement::Down, 2.0);
        qtable.set(pos, Movement::Left, 2.0);
        assert_eq!(qtable.best_action(pos), (Movement::Down, 2.0));
    }

    #[test]
    fn test_best_among_ignores_candidate_order() {
        let mut qtable = QTable::new(1, 1);
        let pos = Pos::new(0, 0);
        qtable.set(pos, Movement::Right, 1.0);
        qtable.set(pos, Movement::Left, 1.0);
        let candidates = [Movement::Left, Movement::Down, Movement::Right];
        assert_eq!(qtable.best_among(pos, &candidates).0, Movement::Right);
        assert_eq!(qtable.best_among(pos, &[Movement::Down]).0, Movement::Down);
    }

    #[test]
    fn test_q_learning_update() {
        let mut qtable = QTable::new(1, 2);
        let state = Pos::new(0, 0);
        let next_state = Pos::new(0, 1);
        qtable.set(next_state, Movement::Right, 1.0);
        qtable.set(next_state, Movement::Down, 2.0);

        let t_d = qtable.update(state, Movement::Right, 0.0, next_state, 0.5, 0.99);

        // Q(s,Right) = 0.0 + 0.5 * (0.0 + 0.99 * 2.0 - 0.0) = 0.99
        assert!((qtable.value(state, Movement::Right) - 0.99).abs() < 1e-12);
        assert!((t_d - 1.98).abs() < 1e-12);
    }

    #[test]
    fn test_positive_reward_pushes_value_up() {
        let mut qtable = QTable::new(2, 2);
        qtable.update(Pos::new(0, 0), Movement::Down, 5.0, Pos::new(1, 0), 0.1, 0.9);
        assert!(qtable.value(Pos::new(0, 0), Movement::Down) > 0.0);
        assert_eq!(qtable.value(Pos::new(0, 0), Movement::Up), 0.0);
    }

    #[test]
    fn test_greedy_policy_skips_walls_and_goal() {
        let grid: Grid = "2 1\n0 3".parse().unwrap();
        let mut qtable = QTable::for_grid(&grid);
        qtable.set(Pos::new(0, 0), Movement::Down, 1.0);
        let policy = qtable.greedy_policy(&grid);
        assert_eq!(policy.action(Pos::new(0, 0)), Some(Movement::Down));
        assert_eq!(policy.action(Pos::new(1, 0)), Some(Movement::Up));
        assert_eq!(policy.action(Pos::new(0, 1)), None);
        assert_eq!(policy.action(Pos::new(1, 1)), None);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_out_of_table_query_panics() {
        let qtable = QTable::new(2, 2);
        qtable.value(Pos::new(2, 0), Movement::Up);
    }
}
