//! Tabular Q-learning in a digit-grid maze.
//!
//! An [`Agent`] owns a static [`Grid`], a dense [`QTable`] and its
//! [`AgentState`]. Each step picks an action with an [`ExplorationStrategy`],
//! validates the move against the grid, rewards the attempted destination
//! and updates the Q-table. The Q-table survives from one episode to the next;
//! only the agent state is reset.

pub mod agent;
pub mod config;
pub mod environment;
pub mod error;
pub mod maze;
pub mod policy;
pub mod render;
pub mod reward;
pub mod rl;

pub use agent::{Agent, AgentState, EpisodeRecord, EpisodeStatus, Rollout, StepOutcome};
pub use config::{Config, Rewards};
pub use environment::{CellType, Grid, Movement, Pos, Transition};
pub use error::{ConfigError, Error, MazeLoadError, Result};
pub use policy::{candidate_actions, DetPolicy, EpsilonGreedy, ExplorationStrategy, Greedy};
pub use rl::{train, QTable, TrainingReport};
