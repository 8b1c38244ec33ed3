use std::collections::VecDeque;

use rand::{rngs::StdRng, Rng};

use crate::piece_catalog::{PieceCatalog, Shape, ShapeKind};

#[derive(Eq, PartialEq, Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PieceGenerator {
    /// Every catalog shape is equally likely.
    #[default]
    Uniform,
    /// Replays the given kinds in order, then falls back to `Uniform`.
    /// Kinds missing from the catalog are skipped.
    Sequence { upcoming: VecDeque<ShapeKind> },
}

impl PieceGenerator {
    pub fn uniform() -> Self {
        Self::Uniform
    }

    pub fn sequence(kinds: impl IntoIterator<Item = ShapeKind>) -> Self {
        Self::Sequence {
            upcoming: kinds.into_iter().collect(),
        }
    }

    pub fn next_shape(&mut self, catalog: &PieceCatalog, rng: &mut StdRng) -> Shape {
        if let Self::Sequence { upcoming } = self {
            while let Some(kind) = upcoming.pop_front() {
                if let Some(shape) = catalog.get(kind) {
                    return *shape;
                }
                log::warn!("skipping scripted piece {kind:?}: not in catalog");
            }
        }
        let shapes = catalog.shapes();
        // SAFETY: `PieceCatalog` construction rejects empty catalogs.
        shapes[rng.gen_range(0..shapes.len())]
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn sequence_replays_then_falls_back_to_uniform() {
        let catalog = PieceCatalog::standard();
        let mut rng = StdRng::seed_from_u64(7);
        let mut generator = PieceGenerator::sequence([ShapeKind::Square, ShapeKind::Bar]);
        assert_eq!(generator.next_shape(&catalog, &mut rng).kind(), ShapeKind::Square);
        assert_eq!(generator.next_shape(&catalog, &mut rng).kind(), ShapeKind::Bar);
        let fallback = generator.next_shape(&catalog, &mut rng);
        assert!(catalog.shapes().contains(&fallback));
    }

    #[test]
    fn uniform_eventually_draws_every_shape() {
        let catalog = PieceCatalog::standard();
        let mut rng = StdRng::seed_from_u64(2024);
        let mut generator = PieceGenerator::uniform();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            seen.insert(generator.next_shape(&catalog, &mut rng).kind());
        }
        assert_eq!(seen.len(), catalog.len());
    }

    #[test]
    fn same_seed_same_pieces() {
        let catalog = PieceCatalog::standard();
        let draw = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut generator = PieceGenerator::uniform();
            (0..32)
                .map(|_| generator.next_shape(&catalog, &mut rng).kind())
                .collect::<Vec<_>>()
        };
        assert_eq!(draw(99), draw(99));
    }
}
