use std::fmt;

use crate::piece_catalog::Shape;

#[derive(Eq, PartialEq, Clone, Copy, Hash, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellState {
    #[default]
    Empty,
    Locked,
}

pub type Line = Vec<CellState>;

/// The board of locked cells. Row 0 is the top row.
///
/// Invariants:
/// * `lines.len() == height` and every line has `width` cells, for the lifetime of the grid.
/// * Cells only change through [`Grid::lock`] and [`Grid::clear_full_lines`].
#[derive(Eq, PartialEq, Clone, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "GridRepr")
)]
pub struct Grid {
    height: usize,
    width: usize,
    lines: Vec<Line>,
}

#[derive(Eq, PartialEq, Clone, Copy, Debug)]
pub enum GridError {
    RowCount { expected: usize, found: usize },
    RowWidth { row: usize, expected: usize, found: usize },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::RowCount { expected, found } => {
                write!(f, "grid has {found} rows, expected {expected}")
            }
            GridError::RowWidth {
                row,
                expected,
                found,
            } => write!(f, "grid row {row} has {found} cells, expected {expected}"),
        }
    }
}

impl std::error::Error for GridError {}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct GridRepr {
    height: usize,
    width: usize,
    lines: Vec<Line>,
}

#[cfg(feature = "serde")]
impl TryFrom<GridRepr> for Grid {
    type Error = GridError;

    fn try_from(repr: GridRepr) -> Result<Self, Self::Error> {
        Self::from_lines(repr.height, repr.width, repr.lines)
    }
}

impl Grid {
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            lines: vec![vec![CellState::Empty; width]; height],
        }
    }

    /// Adopts existing cell rows, checking them against the stated dimensions.
    pub fn from_lines(height: usize, width: usize, lines: Vec<Line>) -> Result<Self, GridError> {
        if lines.len() != height {
            return Err(GridError::RowCount {
                expected: height,
                found: lines.len(),
            });
        }
        if let Some((row, line)) = lines.iter().enumerate().find(|(_, line)| line.len() != width) {
            return Err(GridError::RowWidth {
                row,
                expected: width,
                found: line.len(),
            });
        }
        Ok(Self {
            height,
            width,
            lines,
        })
    }

    /// A grid with the given `(row, col)` cells already locked. Cells outside the grid are ignored.
    pub fn with_locked_cells(
        height: usize,
        width: usize,
        cells: impl IntoIterator<Item = (usize, usize)>,
    ) -> Self {
        let mut grid = Self::new(height, width);
        for (row, col) in cells {
            if let Some(cell) = grid.lines.get_mut(row).and_then(|line| line.get_mut(col)) {
                *cell = CellState::Locked;
            }
        }
        grid
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> &[Line] {
        &self.lines
    }

    /// Out-of-range coordinates read as `None`.
    pub fn cell(&self, row: usize, col: usize) -> Option<CellState> {
        self.lines.get(row)?.get(col).copied()
    }

    pub fn is_row_full(&self, row: usize) -> bool {
        self.lines
            .get(row)
            .is_some_and(|line| line.iter().all(|&cell| cell == CellState::Locked))
    }

    pub fn is_placement_valid(&self, shape: &Shape, row: isize, col: isize) -> bool {
        shape.occupied_cells().all(|(dr, dc)| {
            let (Some(r), Some(c)) = (
                row.checked_add_unsigned(dr),
                col.checked_add_unsigned(dc),
            ) else {
                return false;
            };
            match (usize::try_from(r), usize::try_from(c)) {
                (Ok(r), Ok(c)) => self.cell(r, c) == Some(CellState::Empty),
                _ => false,
            }
        })
    }

    /// Writes `shape` into the grid at the anchor `(row, col)`.
    ///
    /// The caller must have checked [`Grid::is_placement_valid`] first. Debug builds assert it;
    /// release builds still never write outside the grid.
    pub fn lock(&mut self, shape: &Shape, row: usize, col: usize) {
        debug_assert!(
            self.is_placement_valid(shape, row as isize, col as isize),
            "locking {:?} at ({row}, {col}) onto an obstructed or out-of-bounds placement",
            shape.kind()
        );
        for (dr, dc) in shape.occupied_cells() {
            if let Some(cell) = self
                .lines
                .get_mut(row + dr)
                .and_then(|line| line.get_mut(col + dc))
            {
                *cell = CellState::Locked;
            }
        }
    }

    /// Removes every full line and refills the top with empty lines. Returns the number removed.
    pub fn clear_full_lines(&mut self) -> usize {
        let width = self.width;
        self.lines
            .retain(|line| !line.iter().all(|&cell| cell == CellState::Locked));
        let n_cleared = self.height - self.lines.len();
        for _ in 0..n_cleared {
            self.lines.insert(0, vec![CellState::Empty; width]);
        }
        n_cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece_catalog::{PieceCatalog, ShapeKind};

    fn shape(kind: ShapeKind) -> Shape {
        *PieceCatalog::standard().get(kind).unwrap()
    }

    fn fill_row_except(grid: &mut Grid, row: usize, hole: Option<usize>) {
        for cell in 0..grid.width() {
            if Some(cell) != hole {
                grid.lines[row][cell] = CellState::Locked;
            }
        }
    }

    #[test]
    fn new_grid_is_empty() {
        let grid = Grid::new(20, 10);
        assert_eq!(grid.rows().len(), 20);
        assert!(grid
            .rows()
            .iter()
            .all(|line| line.len() == 10 && line.iter().all(|&c| c == CellState::Empty)));
    }

    #[test]
    fn placement_outside_bounds_is_invalid() {
        let grid = Grid::new(20, 10);
        let square = shape(ShapeKind::Square);
        assert!(grid.is_placement_valid(&square, 0, 0));
        assert!(grid.is_placement_valid(&square, 18, 8));
        assert!(!grid.is_placement_valid(&square, -1, 0));
        assert!(!grid.is_placement_valid(&square, 0, -1));
        assert!(!grid.is_placement_valid(&square, 19, 0));
        assert!(!grid.is_placement_valid(&square, 0, 9));
    }

    #[test]
    fn empty_bitmap_cells_may_overhang_locked_cells() {
        let mut grid = Grid::new(4, 4);
        grid.lines[0][0] = CellState::Locked;
        // T's top-left bitmap cell is empty.
        assert!(grid.is_placement_valid(&shape(ShapeKind::T), 0, 0));
        assert!(!grid.is_placement_valid(&shape(ShapeKind::Square), 0, 0));
    }

    #[test]
    fn lock_writes_only_occupied_cells() {
        let mut grid = Grid::new(20, 10);
        grid.lock(&shape(ShapeKind::S), 18, 0);
        assert_eq!(grid.cell(18, 0), Some(CellState::Empty));
        assert_eq!(grid.cell(18, 1), Some(CellState::Locked));
        assert_eq!(grid.cell(18, 2), Some(CellState::Locked));
        assert_eq!(grid.cell(19, 0), Some(CellState::Locked));
        assert_eq!(grid.cell(19, 1), Some(CellState::Locked));
        assert_eq!(grid.cell(19, 2), Some(CellState::Empty));
    }

    #[test]
    fn clearing_a_single_full_row_shifts_everything_above_down() {
        let mut grid = Grid::new(20, 10);
        fill_row_except(&mut grid, 19, Some(9));
        grid.lines[18][3] = CellState::Locked;
        let bar = Shape::from_rows(ShapeKind::Bar, &[&[1]]).unwrap();
        grid.lock(&bar, 19, 9);
        assert!(grid.is_row_full(19));

        assert_eq!(grid.clear_full_lines(), 1);
        assert_eq!(grid.rows().len(), 20);
        assert!(grid.rows()[0].iter().all(|&c| c == CellState::Empty));
        assert_eq!(grid.cell(19, 3), Some(CellState::Locked));
        assert_eq!(grid.rows()[19].iter().filter(|&&c| c == CellState::Locked).count(), 1);
    }

    #[test]
    fn clearing_non_adjacent_rows_keeps_row_count() {
        let mut grid = Grid::new(20, 10);
        fill_row_except(&mut grid, 19, None);
        fill_row_except(&mut grid, 17, None);
        fill_row_except(&mut grid, 18, Some(0));
        assert_eq!(grid.clear_full_lines(), 2);
        assert_eq!(grid.rows().len(), 20);
        assert!(!grid.is_row_full(19));
        assert_eq!(grid.cell(19, 0), Some(CellState::Empty));
        assert_eq!(grid.cell(19, 1), Some(CellState::Locked));
        assert!(grid.rows()[..19]
            .iter()
            .all(|line| line.iter().all(|&c| c == CellState::Empty)));
    }

    #[test]
    fn from_lines_checks_dimensions() {
        let line = vec![CellState::Empty; 3];
        assert_eq!(
            Grid::from_lines(1, 3, vec![line.clone(), line.clone()]),
            Err(GridError::RowCount {
                expected: 1,
                found: 2
            })
        );
        assert_eq!(
            Grid::from_lines(2, 3, vec![line.clone(), vec![CellState::Locked; 4]]),
            Err(GridError::RowWidth {
                row: 1,
                expected: 3,
                found: 4
            })
        );
        assert_eq!(Grid::from_lines(2, 3, vec![line.clone(), line]), Ok(Grid::new(2, 3)));
    }

    #[test]
    #[should_panic]
    #[cfg(debug_assertions)]
    fn locking_onto_a_locked_cell_panics_in_debug_builds() {
        let mut grid = Grid::with_locked_cells(20, 10, [(19, 4)]);
        grid.lock(&shape(ShapeKind::Square), 18, 4);
    }

    #[test]
    #[should_panic]
    #[cfg(debug_assertions)]
    fn locking_past_the_corner_panics_in_debug_builds() {
        let mut grid = Grid::new(20, 10);
        grid.lock(&shape(ShapeKind::Square), 19, 9);
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn out_of_range_lock_only_writes_inside_the_grid() {
        let mut grid = Grid::new(20, 10);
        grid.lock(&shape(ShapeKind::Square), 19, 9);
        assert_eq!(grid.rows().len(), 20);
        assert!(grid.rows().iter().all(|line| line.len() == 10));
        assert_eq!(grid, Grid::with_locked_cells(20, 10, [(19, 9)]));
    }

    #[test]
    fn clearing_without_full_rows_is_a_no_op() {
        let mut grid = Grid::new(20, 10);
        fill_row_except(&mut grid, 19, Some(4));
        let before = grid.clone();
        assert_eq!(grid.clear_full_lines(), 0);
        assert_eq!(grid, before);
    }
}
