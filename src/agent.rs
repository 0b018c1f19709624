//! The learning loop: select, transition, reward, update, commit.

use std::collections::HashSet;

use serde::Serialize;

use crate::config::Config;
use crate::environment::{Grid, Movement, Pos, Transition};
use crate::error::ConfigError;
use crate::policy::{candidate_actions, EpsilonGreedy, ExplorationStrategy, Greedy};
use crate::reward::{effective_cell, reward};
use crate::rl::QTable;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum EpisodeStatus {
    Running,
    EpisodeComplete,
    StepLimitExceeded,
}

impl EpisodeStatus {
    pub fn is_terminal(self) -> bool {
        self != EpisodeStatus::Running
    }
}

/// Everything about the agent that changes from step to step. Only the
/// learning loop mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentState {
    pub pos: Pos,
    pub previous_pos: Pos,
    pub last_action: Option<Movement>,
    /// Steps taken in the current episode
    pub steps: usize,
    /// Finished episodes
    pub episode: usize,
    /// Reward accumulated in the current episode
    pub reward: i64,
    /// Steps in the current episode that actually moved the agent
    pub position_changes: usize,
    /// Pickups already collected in the current episode
    pub collected: HashSet<Pos>,
}

impl AgentState {
    pub fn new(start: Pos) -> Self {
        Self {
            pos: start,
            previous_pos: start,
            last_action: None,
            steps: 0,
            episode: 0,
            reward: 0,
            position_changes: 0,
            collected: HashSet::new(),
        }
    }

    fn reset(&mut self, start: Pos) {
        *self = AgentState {
            episode: self.episode,
            ..AgentState::new(start)
        };
    }
}

/// Summary of a finished episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EpisodeRecord {
    pub episode: usize,
    pub steps: usize,
    pub total_reward: i64,
    pub outcome: EpisodeStatus,
    pub position_changes: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub from: Pos,
    pub action: Movement,
    pub transition: Transition,
    pub reward: i32,
    pub td_error: f64,
    pub status: EpisodeStatus,
    /// Set when this step ended the episode.
    pub record: Option<EpisodeRecord>,
}

/// Greedy walk from the start that leaves the Q-table untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rollout {
    pub path: Vec<Pos>,
    pub actions: Vec<Movement>,
    pub reached_goal: bool,
}

impl Rollout {
    pub fn steps(&self) -> usize {
        self.actions.len()
    }
}

pub struct Agent<S: ExplorationStrategy = EpsilonGreedy> {
    grid: Grid,
    config: Config,
    q_table: QTable,
    state: AgentState,
    strategy: S,
}

impl Agent<EpsilonGreedy> {
    /// Epsilon-greedy agent using the configured exploration rate and seed.
    pub fn new(grid: Grid, config: Config) -> Result<Self, ConfigError> {
        let strategy = EpsilonGreedy::new(config.exploration_rate, config.seed);
        Agent::with_strategy(grid, config, strategy)
    }
}

impl<S: ExplorationStrategy> Agent<S> {
    pub fn with_strategy(grid: Grid, config: Config, strategy: S) -> Result<Self, ConfigError> {
        config.validate()?;
        let q_table = QTable::for_grid(&grid);
        let state = AgentState::new(grid.start_pos());
        Ok(Self {
            grid,
            config,
            q_table,
            state,
            strategy,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn current_position(&self) -> Pos {
        self.state.pos
    }

    /// Action the exploration strategy picks at the current position.
    pub fn choose_action(&mut self) -> Movement {
        let candidates = candidate_actions(
            &self.grid,
            self.state.pos,
            self.state.last_action,
            self.config.anti_reversal,
        );
        self.strategy
            .choose(&self.q_table, self.state.pos, &candidates)
    }

    /// Lets the exploration strategy pick an action and applies it.
    pub fn step(&mut self) -> StepOutcome {
        let action = self.choose_action();
        self.apply(action)
    }

    /// Runs one learning step with the given action.
    pub fn apply(&mut self, action: Movement) -> StepOutcome {
        let from = self.state.pos;
        let transition = self.grid.transition(from, action);
        let r = reward(
            &self.config.rewards,
            &self.grid,
            &self.state.collected,
            transition.attempted,
        );
        let td_error = self.q_table.update(
            from,
            action,
            f64::from(r),
            transition.resulting,
            self.config.learning_rate,
            self.config.discount_factor,
        );

        self.state.previous_pos = from;
        self.state.pos = transition.resulting;
        self.state.last_action = Some(action);
        self.state.steps += 1;
        self.state.reward += i64::from(r);
        if transition.resulting != from {
            self.state.position_changes += 1;
            let cell = effective_cell(&self.grid, &self.state.collected, transition.resulting);
            if cell.is_buff() || cell.is_debuff() {
                self.state.collected.insert(transition.resulting);
            }
        }

        let status = if self.grid.is_terminal(self.state.pos) {
            EpisodeStatus::EpisodeComplete
        } else if self.state.steps >= self.config.max_steps {
            EpisodeStatus::StepLimitExceeded
        } else {
            EpisodeStatus::Running
        };
        let record = if status.is_terminal() {
            Some(self.finish_episode(status))
        } else {
            None
        };

        StepOutcome {
            from,
            action,
            transition,
            reward: r,
            td_error,
            status,
            record,
        }
    }

    fn finish_episode(&mut self, outcome: EpisodeStatus) -> EpisodeRecord {
        self.state.episode += 1;
        let record = EpisodeRecord {
            episode: self.state.episode,
            steps: self.state.steps,
            total_reward: self.state.reward,
            outcome,
            position_changes: self.state.position_changes,
        };
        self.state.reset(self.grid.start_pos());
        record
    }

    /// Steps until the goal is reached or the step limit runs out.
    pub fn run_episode(&mut self) -> EpisodeRecord {
        loop {
            if let Some(record) = self.step().record {
                return record;
            }
        }
    }

    /// Follows the greedy policy from the start for at most `max_steps`
    /// steps without learning.
    pub fn demonstrate(&self) -> Rollout {
        let mut pos = self.grid.start_pos();
        let mut last_action = None;
        let mut path = vec![pos];
        let mut actions = Vec::new();

        while !self.grid.is_terminal(pos) && actions.len() < self.config.max_steps {
            let candidates =
                candidate_actions(&self.grid, pos, last_action, self.config.anti_reversal);
            let action = Greedy.choose(&self.q_table, pos, &candidates);
            pos = self.grid.transition(pos, action).resulting;
            last_action = Some(action);
            path.push(pos);
            actions.push(action);
        }

        Rollout {
            path,
            actions,
            reached_goal: self.grid.is_terminal(pos),
        }
    }
}
