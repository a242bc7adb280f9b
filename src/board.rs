//! The playfield grid and the geometry that only depends on it.

use crate::{
    config::{
        BOARD_HEIGHT,
        BOARD_WIDTH,
    },
    piece::{
        PieceKind,
        Shape,
    },
};

/// A board cell: empty, or the kind of the piece that was placed there.
pub type Cell = Option<PieceKind>;

/// Display tag of a cell, `0` for empty and `kind + 1` otherwise.
pub fn tag(cell: Cell) -> u8 {
    cell.map_or(0, PieceKind::tag)
}

/// `BOARD_HEIGHT` rows of `BOARD_WIDTH` cells, row 0 on top.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Board {
    rows: [[Cell; BOARD_WIDTH]; BOARD_HEIGHT],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub const fn new() -> Self {
        Self {
            rows: [[None; BOARD_WIDTH]; BOARD_HEIGHT],
        }
    }

    pub fn clear(&mut self) {
        self.rows = [[None; BOARD_WIDTH]; BOARD_HEIGHT];
    }

    /// Cell at `(x, y)`, `None` when the coordinate lies off the board.
    pub fn get(&self, x: i32, y: i32) -> Option<Cell> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        self.rows.get(y)?.get(x).copied()
    }

    /// Writes a cell; off-board coordinates are ignored.
    pub fn set(&mut self, x: i32, y: i32, cell: Cell) {
        let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
            return;
        };
        if let Some(slot) = self.rows.get_mut(y).and_then(|row| row.get_mut(x)) {
            *slot = cell;
        }
    }

    pub fn rows(&self) -> &[[Cell; BOARD_WIDTH]; BOARD_HEIGHT] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().flatten().all(Option::is_none)
    }

    pub fn occupied(&self) -> usize {
        self.rows.iter().flatten().filter(|c| c.is_some()).count()
    }

    pub fn is_row_full(&self, y: usize) -> bool {
        self.rows[y].iter().all(Option::is_some)
    }

    pub fn is_row_empty(&self, y: usize) -> bool {
        self.rows[y].iter().all(Option::is_none)
    }

    /// Drops every row above `y` by one and empties the top row.
    pub fn remove_row(&mut self, y: usize) {
        self.rows.copy_within(0..y, 1);
        self.rows[0] = [None; BOARD_WIDTH];
    }

    /// Sweeps bottom to top, removing full rows, and returns how many went.
    /// A removed row index is examined again since the row above moved in.
    pub fn clear_full_rows(&mut self) -> u8 {
        let mut cleared = 0;
        let mut y = BOARD_HEIGHT;
        while y > 0 {
            if self.is_row_full(y - 1) {
                self.remove_row(y - 1);
                cleared += 1;
            } else {
                y -= 1;
            }
        }
        cleared
    }

    /// Whether `shape` anchored at `(x, y)` lies on the board over empty
    /// cells. Bounds use the occupied bounding box, not the full 4×4 matrix.
    pub fn can_place(&self, shape: &Shape, x: i32, y: i32) -> bool {
        let Some(extent) = shape.extent() else {
            return true;
        };

        if x < -extent.left
            || x + extent.right >= BOARD_WIDTH as i32
            || y + extent.bottom >= BOARD_HEIGHT as i32
            || y < 0
        {
            return false;
        }

        shape.cells().all(|(r, c)| {
            matches!(self.get(x + c as i32, y + r as i32), Some(None))
        })
    }

    /// Stamps every occupied cell of `shape` at `(x, y)` with `kind`.
    pub fn stamp(&mut self, shape: &Shape, x: i32, y: i32, kind: PieceKind) {
        for (r, c) in shape.cells() {
            self.set(x + c as i32, y + r as i32, Some(kind));
        }
    }
}
