mod active_piece;
mod grid;
mod piece_catalog;
mod piece_generators;
mod scheduler;

use std::{fmt, time::Duration};

use rand::{rngs::StdRng, SeedableRng};

pub use active_piece::{ActivePiece, Offset, SpawnResult, DOWN, LEFT, RIGHT};
pub use grid::{CellState, Grid, GridError, Line};
pub use piece_catalog::{CatalogError, PieceCatalog, PieceColor, Shape, ShapeKind, MAX_SHAPE_SIDE};
pub use piece_generators::PieceGenerator;
pub use scheduler::{GameTime, TickScheduler, TimerEvent};

pub type FeedbackEvents = Vec<(GameTime, Feedback)>;

#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Command {
    MoveLeft,
    MoveRight,
    MoveDown,
    Rotate,
}

#[derive(Eq, PartialEq, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommandResult {
    Moved,
    /// The board rejected the move; nothing changed.
    Blocked,
    /// The command is recognized but the engine does not implement it (rotation).
    NotSupported,
    NotRunning,
}

#[derive(Eq, PartialEq, Clone, Copy, Hash, Default, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Lifecycle {
    #[default]
    Idle,
    Running,
    GameOver,
}

#[derive(Eq, PartialEq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Feedback {
    Spawned(ShapeKind),
    PieceLocked(ActivePiece),
    LinesCleared { lines: usize, score_bonus: u32 },
    GameOver,
}

#[derive(Eq, PartialEq, Clone, Copy, Debug)]
pub enum GameUpdateError {
    DurationPassed,
    NotRunning,
}

impl fmt::Display for GameUpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameUpdateError::DurationPassed => write!(f, "update time lies before current game time"),
            GameUpdateError::NotRunning => write!(f, "game is not running"),
        }
    }
}

impl std::error::Error for GameUpdateError {}

#[derive(Eq, PartialEq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameConfig {
    pub height: usize,
    pub width: usize,
    pub gravity_period: Duration,
    pub spawn_period: Duration,
    pub line_clear_points: u32,
    pub piece_generator: PieceGenerator,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            height: Game::HEIGHT,
            width: Game::WIDTH,
            gravity_period: Duration::from_millis(1000),
            spawn_period: Duration::from_millis(20_000),
            line_clear_points: 10,
            piece_generator: PieceGenerator::Uniform,
        }
    }
}

#[derive(Eq, PartialEq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameState {
    pub game_time: GameTime,
    pub lifecycle: Lifecycle,
    pub grid: Grid,
    pub active_piece: Option<ActivePiece>,
    pub scheduler: TickScheduler,
    pub score: u32,
    pub lines_cleared: usize,
    pub pieces_locked: u32,
}

impl GameState {
    fn new(config: &GameConfig, grid: Grid) -> Self {
        Self {
            game_time: Duration::ZERO,
            lifecycle: Lifecycle::Idle,
            grid,
            active_piece: None,
            scheduler: TickScheduler::new(config.gravity_period, config.spawn_period),
            score: 0,
            lines_cleared: 0,
            pieces_locked: 0,
        }
    }

    pub fn running(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }

    /// Applies the reward for one lock's worth of cleared lines; returns the bonus.
    pub fn on_lines_cleared(&mut self, lines: usize, points_per_line: u32) -> u32 {
        let score_bonus = points_per_line.saturating_mul(u32::try_from(lines).unwrap_or(u32::MAX));
        self.score = self.score.saturating_add(score_bonus);
        self.lines_cleared += lines;
        score_bonus
    }
}

#[derive(Eq, PartialEq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActivePieceView {
    pub kind: ShapeKind,
    pub color: PieceColor,
    pub row: usize,
    pub col: usize,
    pub cells: Vec<(usize, usize)>,
}

impl From<&ActivePiece> for ActivePieceView {
    fn from(piece: &ActivePiece) -> Self {
        Self {
            kind: piece.kind(),
            color: piece.color(),
            row: piece.row,
            col: piece.col,
            cells: piece.cells().collect(),
        }
    }
}

/// What a presentation layer reads back after every command or update.
#[derive(Eq, PartialEq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    pub grid: Vec<Line>,
    pub active_piece: Option<ActivePieceView>,
    pub score: u32,
    pub running: bool,
    pub lifecycle: Lifecycle,
    pub lines_cleared: usize,
    pub game_time: GameTime,
}

pub struct Game {
    config: GameConfig,
    catalog: PieceCatalog,
    generator: PieceGenerator,
    state: GameState,
    rng: StdRng,
}

impl fmt::Debug for Game {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Game")
            .field("config", &self.config)
            .field("catalog", &self.catalog)
            .field("state", &self.state)
            .field("rng", &std::any::type_name_of_val(&self.rng))
            .finish()
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

impl Game {
    pub const HEIGHT: usize = 20;
    pub const WIDTH: usize = 10;

    pub fn new(config: GameConfig) -> Self {
        Self::with_catalog(config, PieceCatalog::standard(), StdRng::from_entropy())
    }

    pub fn seeded(config: GameConfig, seed: u64) -> Self {
        Self::with_catalog(config, PieceCatalog::standard(), StdRng::seed_from_u64(seed))
    }

    pub fn with_catalog(config: GameConfig, catalog: PieceCatalog, rng: StdRng) -> Self {
        let grid = Grid::new(config.height, config.width);
        Game {
            state: GameState::new(&config, grid),
            generator: config.piece_generator.clone(),
            config,
            catalog,
            rng,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn catalog(&self) -> &PieceCatalog {
        &self.catalog
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn running(&self) -> bool {
        self.state.running()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.state.lifecycle
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            grid: self.state.grid.rows().to_vec(),
            active_piece: self.state.active_piece.as_ref().map(ActivePieceView::from),
            score: self.state.score,
            running: self.state.running(),
            lifecycle: self.state.lifecycle,
            lines_cleared: self.state.lines_cleared,
            game_time: self.state.game_time,
        }
    }

    /// Begins a fresh run on an empty grid. The logical clock restarts at zero.
    pub fn start(&mut self) -> FeedbackEvents {
        let grid = Grid::new(self.config.height, self.config.width);
        self.start_with_grid(grid)
    }

    /// Begins a fresh run on a prepared board, e.g. a puzzle layout.
    ///
    /// The board must have the configured `height` and `width`; debug builds assert it.
    pub fn start_with_grid(&mut self, grid: Grid) -> FeedbackEvents {
        debug_assert_eq!(
            (grid.height(), grid.width()),
            (self.config.height, self.config.width),
            "prepared grid does not match the configured dimensions"
        );
        if self.state.running() {
            self.state.scheduler.cancel_all();
        }
        self.state = GameState::new(&self.config, grid);
        self.generator = self.config.piece_generator.clone();
        self.state.lifecycle = Lifecycle::Running;
        self.state.scheduler.arm(self.state.game_time);
        log::info!(
            "game started on a {}x{} grid",
            self.state.grid.height(),
            self.state.grid.width()
        );
        let mut feedback_events = Vec::new();
        self.spawn_next(&mut feedback_events);
        feedback_events
    }

    /// Cancels both triggers and returns to `Idle`. The last board and score stay readable.
    pub fn stop(&mut self) -> bool {
        if !self.state.running() {
            return false;
        }
        self.state.scheduler.cancel_all();
        self.state.active_piece = None;
        self.state.lifecycle = Lifecycle::Idle;
        log::info!("game stopped with score {}", self.state.score);
        true
    }

    pub fn move_left(&mut self) -> CommandResult {
        self.command(Command::MoveLeft)
    }

    pub fn move_right(&mut self) -> CommandResult {
        self.command(Command::MoveRight)
    }

    pub fn move_down(&mut self) -> CommandResult {
        self.command(Command::MoveDown)
    }

    pub fn rotate(&mut self) -> CommandResult {
        self.command(Command::Rotate)
    }

    /// Applies a player command at the current game time.
    ///
    /// A blocked manual `MoveDown` does not lock the piece; only gravity does.
    pub fn command(&mut self, command: Command) -> CommandResult {
        if !self.state.running() {
            return CommandResult::NotRunning;
        }
        let offset = match command {
            Command::MoveLeft => LEFT,
            Command::MoveRight => RIGHT,
            Command::MoveDown => DOWN,
            Command::Rotate => return CommandResult::NotSupported,
        };
        let Some(piece) = self.state.active_piece.as_mut() else {
            return CommandResult::Blocked;
        };
        if piece.try_move(&self.state.grid, offset) {
            log::trace!("{command:?} -> ({}, {})", piece.row, piece.col);
            CommandResult::Moved
        } else {
            CommandResult::Blocked
        }
    }

    /// Advances the logical clock to `update_time`.
    ///
    /// Triggers due strictly before `update_time` are handled first, in time order. At
    /// `update_time` itself the `commands` go first, then gravity, then the spawn safety net.
    pub fn update(
        &mut self,
        commands: &[Command],
        update_time: GameTime,
    ) -> Result<FeedbackEvents, GameUpdateError> {
        if !self.state.running() {
            return Err(GameUpdateError::NotRunning);
        }
        if update_time < self.state.game_time {
            return Err(GameUpdateError::DurationPassed);
        }
        let mut feedback_events = Vec::new();
        self.run_triggers(update_time, false, &mut feedback_events);
        if !self.state.running() {
            return Ok(feedback_events);
        }
        self.state.game_time = update_time;
        for &command in commands {
            self.command(command);
        }
        self.run_triggers(update_time, true, &mut feedback_events);
        Ok(feedback_events)
    }

    fn run_triggers(&mut self, until: GameTime, inclusive: bool, feedback_events: &mut FeedbackEvents) {
        // Checked before every dispatch: a game over cancels whatever else was due.
        while self.state.running() {
            let Some((event, event_time)) = self.state.scheduler.pop_due(until, inclusive) else {
                break;
            };
            self.state.game_time = event_time;
            self.handle_trigger(event, feedback_events);
        }
    }

    fn handle_trigger(&mut self, event: TimerEvent, feedback_events: &mut FeedbackEvents) {
        match event {
            TimerEvent::Gravity => {
                let Some(piece) = self.state.active_piece.as_mut() else {
                    return;
                };
                if !piece.try_move(&self.state.grid, DOWN) {
                    self.lock_and_advance(feedback_events);
                }
            }
            TimerEvent::SpawnCheck => {
                // Usually a no-op: locking already spawned the next piece.
                if self.state.active_piece.is_none() {
                    log::debug!("spawn safety net found no active piece");
                    self.spawn_next(feedback_events);
                }
            }
        }
    }

    fn lock_and_advance(&mut self, feedback_events: &mut FeedbackEvents) {
        let Some(piece) = self.state.active_piece.take() else {
            return;
        };
        let event_time = self.state.game_time;
        piece.lock_into(&mut self.state.grid);
        self.state.pieces_locked += 1;
        log::debug!("locked {:?} at ({}, {})", piece.kind(), piece.row, piece.col);
        feedback_events.push((event_time, Feedback::PieceLocked(piece)));
        let lines = self.state.grid.clear_full_lines();
        let score_bonus = self
            .state
            .on_lines_cleared(lines, self.config.line_clear_points);
        if lines > 0 {
            log::debug!("cleared {lines} line(s) for {score_bonus} points");
            feedback_events.push((event_time, Feedback::LinesCleared { lines, score_bonus }));
        }
        self.spawn_next(feedback_events);
    }

    fn spawn_next(&mut self, feedback_events: &mut FeedbackEvents) {
        let event_time = self.state.game_time;
        let shape = self.generator.next_shape(&self.catalog, &mut self.rng);
        match ActivePiece::spawn(shape, &self.state.grid) {
            SpawnResult::Spawned(piece) => {
                log::debug!("spawned {:?} at ({}, {})", piece.kind(), piece.row, piece.col);
                self.state.active_piece = Some(piece);
                feedback_events.push((event_time, Feedback::Spawned(piece.kind())));
            }
            SpawnResult::Blocked => {
                self.state.scheduler.cancel_all();
                self.state.active_piece = None;
                self.state.lifecycle = Lifecycle::GameOver;
                log::info!(
                    "game over: {:?} cannot spawn, final score {}",
                    shape.kind(),
                    self.state.score
                );
                feedback_events.push((event_time, Feedback::GameOver));
            }
        }
    }
}
