use std::fmt;

use rand::{
    distributions::{Distribution, Standard},
    Rng,
};

use crate::error::MazeLoadError;

/// Contents of a maze cell. The discriminants are the digits of the maze file
/// format; `Invalid` is only ever produced by out-of-bounds queries.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CellType {
    Empty,
    Wall,
    Start,
    Goal,
    Goggles,
    SpeedPotion,
    Fog,
    SlowpokePotion,
    Invalid,
}

impl CellType {
    pub fn from_digit(digit: u32) -> Option<CellType> {
        match digit {
            0 => Some(CellType::Empty),
            1 => Some(CellType::Wall),
            2 => Some(CellType::Start),
            3 => Some(CellType::Goal),
            4 => Some(CellType::Goggles),
            5 => Some(CellType::SpeedPotion),
            6 => Some(CellType::Fog),
            7 => Some(CellType::SlowpokePotion),
            _ => None,
        }
    }

    pub fn digit(self) -> Option<u32> {
        match self {
            CellType::Empty => Some(0),
            CellType::Wall => Some(1),
            CellType::Start => Some(2),
            CellType::Goal => Some(3),
            CellType::Goggles => Some(4),
            CellType::SpeedPotion => Some(5),
            CellType::Fog => Some(6),
            CellType::SlowpokePotion => Some(7),
            CellType::Invalid => None,
        }
    }

    pub fn is_buff(self) -> bool {
        matches!(self, CellType::Goggles | CellType::SpeedPotion)
    }

    pub fn is_debuff(self) -> bool {
        matches!(self, CellType::Fog | CellType::SlowpokePotion)
    }

    /// Cells the agent can never stand on.
    pub fn is_blocking(self) -> bool {
        matches!(self, CellType::Wall | CellType::Invalid)
    }
}

// Action
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Movement {
    Up,
    Right,
    Down,
    Left,
}

pub const ACTION_COUNT: usize = 4;

impl Movement {
    /// All actions in index order.
    pub const ALL: [Movement; ACTION_COUNT] =
        [Movement::Up, Movement::Right, Movement::Down, Movement::Left];

    pub fn into_vector(self) -> (isize, isize) {
        match self {
            Movement::Up => (-1, 0),
            Movement::Down => (1, 0),
            Movement::Left => (0, -1),
            Movement::Right => (0, 1),
        }
    }

    /// Slot of this action in a Q-table row.
    pub fn index(self) -> usize {
        match self {
            Movement::Up => 0,
            Movement::Right => 1,
            Movement::Down => 2,
            Movement::Left => 3,
        }
    }

    pub fn reverse(self) -> Movement {
        match self {
            Movement::Up => Movement::Down,
            Movement::Down => Movement::Up,
            Movement::Left => Movement::Right,
            Movement::Right => Movement::Left,
        }
    }

    /// Candidate position after taking this action from `pos`. Pure offset,
    /// the result may lie outside the grid.
    pub fn apply(self, pos: Pos) -> Pos {
        let (drow, dcol) = self.into_vector();
        Pos::new(pos.row + drow, pos.col + dcol)
    }
}

impl Distribution<Movement> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Movement {
        match rng.gen_range(0..ACTION_COUNT) {
            0 => Movement::Up,
            1 => Movement::Right,
            2 => Movement::Down,
            _ => Movement::Left,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Pos {
    pub row: isize,
    pub col: isize,
}

impl Pos {
    pub fn new(row: isize, col: isize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Result of attempting a move.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Position the action pointed at.
    pub attempted: Pos,
    /// Position the agent ends up in: `attempted` when the move is valid,
    /// the starting position otherwise.
    pub resulting: Pos,
    /// Cell type at `attempted`.
    pub cell: CellType,
}

impl Transition {
    pub fn is_rejected(&self) -> bool {
        self.attempted != self.resulting
    }
}

/// Static maze. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<CellType>,
    rows: usize,
    cols: usize,
    start: Pos,
    goal: Pos,
}

impl Grid {
    /// Builds a grid from rows of cells, checking the shape and that a start
    /// and a goal exist.
    pub fn new(rows: Vec<Vec<CellType>>) -> Result<Grid, MazeLoadError> {
        let cols = match rows.first() {
            Some(first) if !first.is_empty() => first.len(),
            _ => return Err(MazeLoadError::Empty),
        };

        let mut cells = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(MazeLoadError::RaggedRow {
                    line: i + 1,
                    expected: cols,
                    found: row.len(),
                });
            }
            for (j, cell) in row.iter().enumerate() {
                if *cell == CellType::Invalid {
                    return Err(MazeLoadError::InvalidCellType {
                        line: i + 1,
                        column: j + 1,
                    });
                }
            }
            cells.extend_from_slice(row);
        }

        let mut grid = Grid {
            cells,
            rows: rows.len(),
            cols,
            start: Pos::new(0, 0),
            goal: Pos::new(0, 0),
        };
        grid.start = grid
            .find_first(CellType::Start)
            .ok_or(MazeLoadError::MissingStart)?;
        grid.goal = grid
            .find_first(CellType::Goal)
            .ok_or(MazeLoadError::MissingGoal)?;
        Ok(grid)
    }

    fn index(&self, pos: Pos) -> Option<usize> {
        if pos.row < 0 || pos.col < 0 {
            return None;
        }
        let (row, col) = (pos.row as usize, pos.col as usize);
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(row * self.cols + col)
    }

    pub fn at(&self, pos: Pos) -> CellType {
        match self.index(pos) {
            Some(i) => self.cells[i],
            None => CellType::Invalid,
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn find_first(&self, cell: CellType) -> Option<Pos> {
        self.iter_all_coordinates().find(|pos| self.at(*pos) == cell)
    }

    pub fn start_pos(&self) -> Pos {
        self.start
    }

    pub fn goal_pos(&self) -> Pos {
        self.goal
    }

    /// Only the designated goal ends an episode; other Goal cells just pay
    /// the goal reward.
    pub fn is_terminal(&self, pos: Pos) -> bool {
        pos == self.goal
    }

    pub fn is_valid_move(&self, pos: Pos) -> bool {
        !self.at(pos).is_blocking()
    }

    pub fn transition(&self, pos: Pos, movement: Movement) -> Transition {
        let attempted = movement.apply(pos);
        let resulting = if self.is_valid_move(attempted) {
            attempted
        } else {
            pos
        };
        Transition {
            attempted,
            resulting,
            cell: self.at(attempted),
        }
    }

    pub fn iter_all_coordinates(&self) -> EnvIter {
        EnvIter::new(self.rows, self.cols)
    }
}

/// Row-major walk over every coordinate of a grid.
pub struct EnvIter {
    curr: usize,
    rows: usize,
    cols: usize,
}

impl EnvIter {
    fn new(rows: usize, cols: usize) -> EnvIter {
        EnvIter { curr: 0, rows, cols }
    }
}

impl Iterator for EnvIter {
    type Item = Pos;

    fn next(&mut self) -> Option<Pos> {
        if self.cols == 0 || self.curr >= self.rows * self.cols {
            return None;
        }
        let pos = Pos::new((self.curr / self.cols) as isize, (self.curr % self.cols) as isize);
        self.curr += 1;
        Some(pos)
    }
}
