use rand::{rngs::StdRng, SeedableRng};
use tetrix_engine::{Game, GameConfig, Grid, PieceCatalog, Shape, ShapeKind};

#[test]
fn grid_with_extra_rows_is_rejected() {
    let json = r#"{"height":1,"width":1,"lines":[["Empty"],["Empty"]]}"#;
    assert!(serde_json::from_str::<Grid>(json).is_err());
}

#[test]
fn grid_with_ragged_rows_is_rejected() {
    let json = r#"{"height":2,"width":2,"lines":[["Empty","Locked"],["Empty"]]}"#;
    assert!(serde_json::from_str::<Grid>(json).is_err());
}

#[test]
fn serialized_grid_reads_back() {
    let grid = Grid::with_locked_cells(20, 10, [(19, 0), (18, 3)]);
    let json = serde_json::to_string(&grid).unwrap();
    assert_eq!(serde_json::from_str::<Grid>(&json).unwrap(), grid);
}

#[test]
fn empty_catalog_is_rejected() {
    assert!(serde_json::from_str::<PieceCatalog>(r#"{"shapes":[]}"#).is_err());
}

#[test]
fn deserialized_catalog_can_drive_a_game() {
    let json = serde_json::to_string(&PieceCatalog::standard()).unwrap();
    let catalog: PieceCatalog = serde_json::from_str(&json).unwrap();
    assert_eq!(catalog, PieceCatalog::standard());
    let mut game = Game::with_catalog(GameConfig::default(), catalog, StdRng::seed_from_u64(3));
    game.start();
    assert!(game.snapshot().active_piece.is_some());
}

fn square_json(width: usize, height: usize, cells: [[bool; 4]; 4]) -> String {
    serde_json::json!({
        "kind": "Square",
        "width": width,
        "height": height,
        "cells": cells,
    })
    .to_string()
}

#[test]
fn shape_without_occupied_cells_is_rejected() {
    let json = square_json(0, 0, [[false; 4]; 4]);
    assert!(serde_json::from_str::<Shape>(&json).is_err());
    let json = square_json(2, 2, [[false; 4]; 4]);
    assert!(serde_json::from_str::<Shape>(&json).is_err());
}

#[test]
fn shape_with_cells_outside_its_bounds_is_rejected() {
    let mut cells = [[false; 4]; 4];
    cells[0][0] = true;
    cells[3][3] = true;
    assert!(serde_json::from_str::<Shape>(&square_json(1, 1, cells)).is_err());
}

#[test]
fn oversized_shape_is_rejected() {
    let json = square_json(5, 1, [[true; 4]; 4]);
    assert!(serde_json::from_str::<Shape>(&json).is_err());
}

#[test]
fn catalog_shapes_read_back_unchanged() {
    let catalog = PieceCatalog::standard();
    let square = catalog.get(ShapeKind::Square).unwrap();
    let json = serde_json::to_string(square).unwrap();
    assert_eq!(&serde_json::from_str::<Shape>(&json).unwrap(), square);
}
