//! Text views of the maze for the console.

use crate::agent::AgentState;
use crate::environment::{CellType, Grid, Movement, Pos};
use crate::policy::DetPolicy;
use crate::reward::effective_cell;

pub fn direction_symbol(movement: Movement) -> char {
    match movement {
        Movement::Up => '^',
        Movement::Right => '>',
        Movement::Down => 'v',
        Movement::Left => '<',
    }
}

fn rows(grid: &Grid) -> impl Iterator<Item = Vec<Pos>> + '_ {
    let (rows, cols) = grid.size();
    (0..rows).map(move |row| {
        (0..cols)
            .map(|col| Pos::new(row as isize, col as isize))
            .collect()
    })
}

fn join_line(out: &mut String, symbols: impl Iterator<Item = char>) {
    let line: Vec<String> = symbols.map(String::from).collect();
    out.push_str(&line.join(" "));
    out.push('\n');
}

/// Cells as their maze digits, the agent as an arrow pointing the way it
/// last moved (`A` before its first move). Pickups collected this episode
/// show as empty.
pub fn render(grid: &Grid, state: &AgentState) -> String {
    let agent = state.last_action.map(direction_symbol).unwrap_or('A');
    let mut out = String::new();
    for row in rows(grid) {
        join_line(
            &mut out,
            row.into_iter().map(|pos| {
                if pos == state.pos {
                    agent
                } else {
                    effective_cell(grid, &state.collected, pos)
                        .digit()
                        .and_then(|d| char::from_digit(d, 10))
                        .unwrap_or('?')
                }
            }),
        );
    }
    out
}

/// Walls as `#`, goals as `G`, every other cell as the arrow of its policy
/// action (`.` when the policy has none).
pub fn render_policy(grid: &Grid, policy: &DetPolicy) -> String {
    let mut out = String::new();
    for row in rows(grid) {
        join_line(
            &mut out,
            row.into_iter().map(|pos| match grid.at(pos) {
                CellType::Wall => '#',
                CellType::Goal => 'G',
                _ => policy.action(pos).map(direction_symbol).unwrap_or('.'),
            }),
        );
    }
    out
}
