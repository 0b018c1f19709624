use std::collections::HashSet;

use crate::config::Rewards;
use crate::environment::{CellType, Grid, Pos};

impl Rewards {
    /// Reward for attempting to enter a cell of the given type.
    pub fn for_cell(&self, cell: CellType) -> i32 {
        match cell {
            CellType::Wall | CellType::Invalid => self.wall,
            CellType::Goal => self.goal,
            CellType::Goggles | CellType::SpeedPotion => self.buff,
            CellType::Fog | CellType::SlowpokePotion => self.debuff,
            CellType::Empty | CellType::Start => self.step,
        }
    }
}

/// Cell type at `pos` as the agent experiences it: a pickup already collected
/// this episode counts as empty.
pub fn effective_cell(grid: &Grid, collected: &HashSet<Pos>, pos: Pos) -> CellType {
    let cell = grid.at(pos);
    if (cell.is_buff() || cell.is_debuff()) && collected.contains(&pos) {
        CellType::Empty
    } else {
        cell
    }
}

/// Reward for the attempted destination of a move, whether or not the move
/// was applied.
pub fn reward(rewards: &Rewards, grid: &Grid, collected: &HashSet<Pos>, attempted: Pos) -> i32 {
    rewards.for_cell(effective_cell(grid, collected, attempted))
}
