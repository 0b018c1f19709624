//! Digit-grid maze files.
//!
//! Every non-whitespace character of a line is one cell, written as the digit
//! of its [`CellType`]:
//!
//! | digit | cell |
//! |-------|------|
//! | 0 | empty |
//! | 1 | wall |
//! | 2 | start |
//! | 3 | goal |
//! | 4 | goggles |
//! | 5 | speed potion |
//! | 6 | fog |
//! | 7 | slowpoke potion |
//!
//! Cells may be separated by spaces (`2 0 1`) or packed (`201`). Blank lines
//! are skipped.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::environment::{CellType, Grid};
use crate::error::MazeLoadError;

pub fn load<P: AsRef<Path>>(path: P) -> Result<Grid, MazeLoadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| MazeLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let grid = parse(&text)?;
    let (rows, cols) = grid.size();
    debug!(path = %path.display(), rows, cols, "loaded maze");
    Ok(grid)
}

pub fn parse(text: &str) -> Result<Grid, MazeLoadError> {
    let mut rows = Vec::new();
    let mut expected: Option<usize> = None;

    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut row = Vec::new();
        for (j, character) in line.chars().enumerate() {
            if character.is_whitespace() {
                continue;
            }
            let cell = character
                .to_digit(10)
                .and_then(CellType::from_digit)
                .ok_or(MazeLoadError::InvalidCell {
                    line: i + 1,
                    column: j + 1,
                    character,
                })?;
            row.push(cell);
        }
        // Report ragged rows against the file line, not the row index.
        match expected {
            None => expected = Some(row.len()),
            Some(cols) if cols != row.len() => {
                return Err(MazeLoadError::RaggedRow {
                    line: i + 1,
                    expected: cols,
                    found: row.len(),
                })
            }
            Some(_) => {}
        }
        rows.push(row);
    }

    Grid::new(rows)
}

impl FromStr for Grid {
    type Err = MazeLoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}
