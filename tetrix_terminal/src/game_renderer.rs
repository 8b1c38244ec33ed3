use std::{
    collections::VecDeque,
    io::{self, Write},
};

use crossterm::{
    cursor::MoveTo,
    style::{self, Print, PrintStyledContent, Stylize},
    terminal, QueueableCommand,
};
use tetrix_engine::{CellState, Feedback, GameTime, Lifecycle, PieceColor, Snapshot};

use crate::terminal_tetrix::format_duration;

#[derive(Eq, PartialEq, Clone, Copy, Debug)]
enum Tile {
    Empty,
    Locked,
    Active(PieceColor),
}

/// Redraws the whole screen from a snapshot every frame.
#[derive(Clone, Default, Debug)]
pub struct GameRenderer {
    messages: VecDeque<String>,
}

impl GameRenderer {
    const MAX_MESSAGES: usize = 8;

    pub fn render(
        &mut self,
        term: &mut impl Write,
        (x_main, y_main): (u16, u16),
        snapshot: &Snapshot,
        new_feedback_events: Vec<(GameTime, Feedback)>,
    ) -> io::Result<()> {
        for (event_time, feedback) in new_feedback_events {
            if let Some(msg) = Self::describe(&feedback) {
                self.messages
                    .push_front(format!("{} {msg}", format_duration(event_time)));
                self.messages.truncate(Self::MAX_MESSAGES);
            }
        }
        let mut tiles: Vec<Vec<Tile>> = snapshot
            .grid
            .iter()
            .map(|line| {
                line.iter()
                    .map(|cell| match cell {
                        CellState::Empty => Tile::Empty,
                        CellState::Locked => Tile::Locked,
                    })
                    .collect()
            })
            .collect();
        if let Some(piece) = &snapshot.active_piece {
            for &(row, col) in &piece.cells {
                tiles[row][col] = Tile::Active(piece.color);
            }
        }
        let width = tiles.first().map_or(0, Vec::len);
        let border = format!("+{}+", "-".repeat(2 * width));
        term.queue(terminal::Clear(terminal::ClearType::All))?
            .queue(MoveTo(x_main, y_main))?
            .queue(Print(&border))?;
        for (idx, line) in tiles.iter().enumerate() {
            term.queue(MoveTo(x_main, y_main + 1 + idx as u16))?.queue(Print("|"))?;
            for tile in line {
                match tile {
                    Tile::Empty => term.queue(Print(" ."))?,
                    Tile::Locked => term.queue(PrintStyledContent("██".grey()))?,
                    Tile::Active(color) => {
                        term.queue(PrintStyledContent("██".with(tile_color(*color))))?
                    }
                };
            }
            term.queue(Print("|"))?;
        }
        let y_bottom = y_main + 1 + tiles.len() as u16;
        term.queue(MoveTo(x_main, y_bottom))?.queue(Print(&border))?;
        // Side panel.
        let x_panel = x_main + 2 * width as u16 + 5;
        let status = match snapshot.lifecycle {
            Lifecycle::Idle => "Idle",
            Lifecycle::Running => "Running",
            Lifecycle::GameOver => "Game Over",
        };
        let panel = [
            format!("Score: {}", snapshot.score),
            format!("Lines: {}", snapshot.lines_cleared),
            format!("Time:  {}", format_duration(snapshot.game_time)),
            format!("State: {status}"),
        ];
        for (i, line) in panel.iter().enumerate() {
            term.queue(MoveTo(x_panel, y_main + 1 + i as u16))?
                .queue(Print(line))?;
        }
        for (i, msg) in self.messages.iter().enumerate() {
            term.queue(MoveTo(x_panel, y_main + 6 + i as u16))?
                .queue(Print(msg))?;
        }
        term.queue(style::ResetColor)?;
        term.flush()?;
        Ok(())
    }

    fn describe(feedback: &Feedback) -> Option<String> {
        match feedback {
            Feedback::Spawned(_) | Feedback::PieceLocked(_) => None,
            Feedback::LinesCleared { lines, score_bonus } => Some(format!(
                "{} +{score_bonus}",
                match lines {
                    1 => "Single".to_string(),
                    2 => "Double".to_string(),
                    3 => "Triple".to_string(),
                    4 => "Quadruple".to_string(),
                    n => format!("{n} lines"),
                }
            )),
            Feedback::GameOver => Some("Topped out!".to_string()),
        }
    }
}

fn tile_color(color: PieceColor) -> style::Color {
    match color {
        PieceColor::Cyan => style::Color::Cyan,
        PieceColor::Purple => style::Color::Magenta,
        PieceColor::Green => style::Color::Green,
        PieceColor::Red => style::Color::Red,
        PieceColor::Blue => style::Color::Blue,
        PieceColor::Orange => style::Color::Rgb {
            r: 255,
            g: 140,
            b: 0,
        },
        PieceColor::Yellow => style::Color::Yellow,
    }
}
