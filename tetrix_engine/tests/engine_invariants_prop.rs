//! Property tests for grid placement, line clearing and scoring.

use std::{collections::HashSet, time::Duration};

use proptest::prelude::*;
use tetrix_engine::{
    CellState, Command, Feedback, Game, GameConfig, Grid, Lifecycle, PieceCatalog, Shape,
};

const HEIGHT: usize = 20;
const WIDTH: usize = 10;

fn locked_set() -> impl Strategy<Value = HashSet<(usize, usize)>> {
    prop::collection::hash_set((0..HEIGHT, 0..WIDTH), 0..80)
}

fn catalog_shape() -> impl Strategy<Value = Shape> {
    let shapes = PieceCatalog::standard().shapes().to_vec();
    prop::sample::select(shapes)
}

fn command() -> impl Strategy<Value = Command> {
    prop_oneof![
        Just(Command::MoveLeft),
        Just(Command::MoveRight),
        Just(Command::MoveDown),
        Just(Command::Rotate),
    ]
}

proptest! {
    #[test]
    fn placement_is_invalid_iff_a_cell_is_out_of_bounds_or_locked(
        locked in locked_set(),
        shape in catalog_shape(),
        row in -3isize..22,
        col in -3isize..12,
    ) {
        let grid = Grid::with_locked_cells(HEIGHT, WIDTH, locked.iter().copied());
        let collides = shape.occupied_cells().any(|(dr, dc)| {
            let (r, c) = (row + dr as isize, col + dc as isize);
            r < 0
                || c < 0
                || r >= HEIGHT as isize
                || c >= WIDTH as isize
                || locked.contains(&(r as usize, c as usize))
        });
        prop_assert_eq!(grid.is_placement_valid(&shape, row, col), !collides);
    }

    #[test]
    fn clearing_preserves_dimensions_and_removes_exactly_the_full_rows(
        locked in locked_set(),
        full_rows in prop::collection::hash_set(0..HEIGHT, 0..4),
    ) {
        let cells = locked
            .iter()
            .copied()
            .chain(full_rows.iter().flat_map(|&r| (0..WIDTH).map(move |c| (r, c))));
        let mut grid = Grid::with_locked_cells(HEIGHT, WIDTH, cells);
        let expected_full = (0..HEIGHT).filter(|&r| grid.is_row_full(r)).count();
        let kept: Vec<_> = grid
            .rows()
            .iter()
            .filter(|line| !line.iter().all(|&c| c == CellState::Locked))
            .cloned()
            .collect();

        let cleared = grid.clear_full_lines();

        prop_assert_eq!(cleared, expected_full);
        prop_assert_eq!(grid.rows().len(), HEIGHT);
        prop_assert!(grid.rows().iter().all(|line| line.len() == WIDTH));
        prop_assert!(grid.rows()[..cleared]
            .iter()
            .all(|line| line.iter().all(|&c| c == CellState::Empty)));
        prop_assert_eq!(&grid.rows()[cleared..], &kept[..]);
        prop_assert!((0..HEIGHT).all(|r| !grid.is_row_full(r)));
    }

    #[test]
    fn random_play_keeps_engine_invariants(
        seed in any::<u64>(),
        steps in prop::collection::vec((prop::collection::vec(command(), 0..3), 1u64..3000), 1..120),
    ) {
        let mut game = Game::seeded(GameConfig::default(), seed);
        game.start();
        let mut now = Duration::ZERO;
        for (commands, dt) in steps {
            now += Duration::from_millis(dt);
            let before = game.snapshot();
            let Ok(feedback) = game.update(&commands, now) else {
                prop_assert_eq!(game.lifecycle(), Lifecycle::GameOver);
                break;
            };
            let after = game.snapshot();
            let bonus: u32 = feedback
                .iter()
                .map(|(_, fb)| match fb {
                    Feedback::LinesCleared { lines, score_bonus } => {
                        assert_eq!(*score_bonus, 10 * *lines as u32);
                        *score_bonus
                    }
                    _ => 0,
                })
                .sum();
            prop_assert_eq!(after.score, before.score + bonus);
            prop_assert_eq!(after.grid.len(), HEIGHT);
            prop_assert!(after.grid.iter().all(|line| line.len() == WIDTH));
            match &after.active_piece {
                Some(piece) => {
                    prop_assert!(after.running);
                    for &(r, c) in &piece.cells {
                        prop_assert_eq!(after.grid[r][c], CellState::Empty);
                    }
                }
                None => prop_assert_eq!(after.lifecycle, Lifecycle::GameOver),
            }
            if after.lifecycle == Lifecycle::GameOver {
                prop_assert!(!game.state().scheduler.is_armed());
                break;
            }
        }
    }
}
