use std::fmt;

/// Largest side length a catalog shape may have.
pub const MAX_SHAPE_SIDE: usize = 4;

type Bitmap = [[bool; MAX_SHAPE_SIDE]; MAX_SHAPE_SIDE];

#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShapeKind {
    Bar,
    T,
    S,
    Z,
    LLeft,
    LRight,
    Square,
}

#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PieceColor {
    Cyan,
    Purple,
    Green,
    Red,
    Blue,
    Orange,
    Yellow,
}

impl ShapeKind {
    pub const fn color(&self) -> PieceColor {
        match self {
            ShapeKind::Bar => PieceColor::Cyan,
            ShapeKind::T => PieceColor::Purple,
            ShapeKind::S => PieceColor::Green,
            ShapeKind::Z => PieceColor::Red,
            ShapeKind::LLeft => PieceColor::Blue,
            ShapeKind::LRight => PieceColor::Orange,
            ShapeKind::Square => PieceColor::Yellow,
        }
    }
}

#[rustfmt::skip]
const STANDARD_TEMPLATES: [(ShapeKind, &[&[u8]]); 7] = [
    (ShapeKind::Bar,    &[&[1, 1, 1, 1]]),              // ▄▄▄▄
    (ShapeKind::T,      &[&[0, 1, 0], &[1, 1, 1]]),    // ▄█▄
    (ShapeKind::S,      &[&[0, 1, 1], &[1, 1, 0]]),    // ▄█▀
    (ShapeKind::Z,      &[&[1, 1, 0], &[0, 1, 1]]),    // ▀█▄
    (ShapeKind::LLeft,  &[&[1, 0, 0], &[1, 1, 1]]),    // █▄▄
    (ShapeKind::LRight, &[&[0, 0, 1], &[1, 1, 1]]),    // ▄▄█
    (ShapeKind::Square, &[&[1, 1], &[1, 1]]),          // ██
];

/// An immutable piece bitmap. `Copy`, so every active piece owns its own copy.
#[derive(Eq, PartialEq, Clone, Copy, Hash, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "ShapeRepr")
)]
pub struct Shape {
    kind: ShapeKind,
    width: usize,
    height: usize,
    cells: Bitmap,
}

#[derive(Eq, PartialEq, Clone, Debug)]
pub enum CatalogError {
    EmptyCatalog,
    EmptyShape(ShapeKind),
    TooLarge(ShapeKind),
    Ragged(ShapeKind),
    InvalidCell(ShapeKind, u8),
    NoOccupiedCells(ShapeKind),
    StrayCell(ShapeKind),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::EmptyCatalog => write!(f, "catalog contains no shapes"),
            CatalogError::EmptyShape(kind) => write!(f, "shape {kind:?} has no rows"),
            CatalogError::TooLarge(kind) => {
                write!(f, "shape {kind:?} exceeds {MAX_SHAPE_SIDE}x{MAX_SHAPE_SIDE}")
            }
            CatalogError::Ragged(kind) => write!(f, "shape {kind:?} rows differ in length"),
            CatalogError::InvalidCell(kind, value) => {
                write!(f, "shape {kind:?} contains cell value {value}, expected 0 or 1")
            }
            CatalogError::NoOccupiedCells(kind) => write!(f, "shape {kind:?} occupies no cells"),
            CatalogError::StrayCell(kind) => {
                write!(f, "shape {kind:?} marks cells outside its width and height")
            }
        }
    }
}

impl std::error::Error for CatalogError {}

impl Shape {
    pub fn from_rows(kind: ShapeKind, rows: &[&[u8]]) -> Result<Self, CatalogError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.len());
        if height == 0 || width == 0 {
            return Err(CatalogError::EmptyShape(kind));
        }
        if height > MAX_SHAPE_SIDE || width > MAX_SHAPE_SIDE {
            return Err(CatalogError::TooLarge(kind));
        }
        let mut cells = Bitmap::default();
        for (r, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(CatalogError::Ragged(kind));
            }
            for (c, &value) in row.iter().enumerate() {
                cells[r][c] = match value {
                    0 => false,
                    1 => true,
                    other => return Err(CatalogError::InvalidCell(kind, other)),
                };
            }
        }
        if !cells.iter().flatten().any(|&occupied| occupied) {
            return Err(CatalogError::NoOccupiedCells(kind));
        }
        Ok(Self {
            kind,
            width,
            height,
            cells,
        })
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn color(&self) -> PieceColor {
        self.kind.color()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        row < self.height && col < self.width && self.cells[row][col]
    }

    /// Occupied cells as `(row, col)` offsets from the shape's top-left corner.
    pub fn occupied_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.height).flat_map(move |r| {
            (0..self.width).filter_map(move |c| self.cells[r][c].then_some((r, c)))
        })
    }
}

/// Unchecked wire form of [`Shape`]; deserialization goes through [`Shape::from_rows`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct ShapeRepr {
    kind: ShapeKind,
    width: usize,
    height: usize,
    cells: Bitmap,
}

#[cfg(feature = "serde")]
impl TryFrom<ShapeRepr> for Shape {
    type Error = CatalogError;

    fn try_from(repr: ShapeRepr) -> Result<Self, Self::Error> {
        if repr.height > MAX_SHAPE_SIDE || repr.width > MAX_SHAPE_SIDE {
            return Err(CatalogError::TooLarge(repr.kind));
        }
        let rows = repr.cells[..repr.height]
            .iter()
            .map(|row| row[..repr.width].iter().map(|&occupied| u8::from(occupied)).collect())
            .collect::<Vec<Vec<u8>>>();
        let rows = rows.iter().map(Vec::as_slice).collect::<Vec<_>>();
        let shape = Shape::from_rows(repr.kind, &rows)?;
        if shape.cells != repr.cells {
            return Err(CatalogError::StrayCell(repr.kind));
        }
        Ok(shape)
    }
}

/// The read-only set of shapes pieces are drawn from. Never empty.
#[derive(Eq, PartialEq, Clone, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "CatalogRepr")
)]
pub struct PieceCatalog {
    shapes: Vec<Shape>,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct CatalogRepr {
    shapes: Vec<Shape>,
}

#[cfg(feature = "serde")]
impl TryFrom<CatalogRepr> for PieceCatalog {
    type Error = CatalogError;

    fn try_from(repr: CatalogRepr) -> Result<Self, Self::Error> {
        Self::from_shapes(repr.shapes)
    }
}

impl PieceCatalog {
    pub fn new<'a>(
        templates: impl IntoIterator<Item = (ShapeKind, &'a [&'a [u8]])>,
    ) -> Result<Self, CatalogError> {
        let shapes = templates
            .into_iter()
            .map(|(kind, rows)| Shape::from_rows(kind, rows))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_shapes(shapes)
    }

    /// Builds a catalog from already validated shapes.
    pub fn from_shapes(shapes: Vec<Shape>) -> Result<Self, CatalogError> {
        if shapes.is_empty() {
            return Err(CatalogError::EmptyCatalog);
        }
        Ok(Self { shapes })
    }

    pub fn standard() -> Self {
        // SAFETY: The standard templates are constant and covered by tests.
        Self::new(STANDARD_TEMPLATES).expect("standard piece templates are well-formed")
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn get(&self, kind: ShapeKind) -> Option<&Shape> {
        self.shapes.iter().find(|shape| shape.kind == kind)
    }
}

impl Default for PieceCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
