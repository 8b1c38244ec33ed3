use crate::{
    grid::Grid,
    piece_catalog::{PieceColor, Shape, ShapeKind},
};

pub type Offset = (isize, isize);

pub const LEFT: Offset = (0, -1);
pub const RIGHT: Offset = (0, 1);
pub const DOWN: Offset = (1, 0);

/// The falling piece: a copy of a catalog shape anchored by its top-left cell.
#[derive(Eq, PartialEq, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActivePiece {
    pub shape: Shape,
    pub row: usize,
    pub col: usize,
}

#[derive(Eq, PartialEq, Clone, Copy, Debug)]
pub enum SpawnResult {
    Spawned(ActivePiece),
    /// The spawn position is obstructed: the board has topped out.
    Blocked,
}

impl ActivePiece {
    /// Places `shape` horizontally centered on the top row, if it fits.
    pub fn spawn(shape: Shape, grid: &Grid) -> SpawnResult {
        let piece = ActivePiece {
            shape,
            row: 0,
            col: grid.width().saturating_sub(shape.width()) / 2,
        };
        if piece.fits(grid) {
            SpawnResult::Spawned(piece)
        } else {
            SpawnResult::Blocked
        }
    }

    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    pub fn color(&self) -> PieceColor {
        self.shape.color()
    }

    /// Absolute `(row, col)` grid coordinates of every occupied cell.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.shape
            .occupied_cells()
            .map(|(dr, dc)| (self.row + dr, self.col + dc))
    }

    pub fn fits(&self, grid: &Grid) -> bool {
        grid.is_placement_valid(&self.shape, self.row as isize, self.col as isize)
    }

    /// The piece moved by `offset`, if that placement is valid. `self` is never modified.
    pub fn fits_at(&self, grid: &Grid, (d_row, d_col): Offset) -> Option<ActivePiece> {
        let moved = ActivePiece {
            row: self.row.checked_add_signed(d_row)?,
            col: self.col.checked_add_signed(d_col)?,
            ..*self
        };
        moved.fits(grid).then_some(moved)
    }

    /// Commits the move if valid; otherwise leaves the piece untouched.
    pub fn try_move(&mut self, grid: &Grid, offset: Offset) -> bool {
        match self.fits_at(grid, offset) {
            Some(moved) => {
                *self = moved;
                true
            }
            None => false,
        }
    }

    /// Transfers the piece into the grid's permanent cells.
    pub fn lock_into(self, grid: &mut Grid) {
        grid.lock(&self.shape, self.row, self.col);
    }
}
