use std::{
    io::{self, Write},
    sync::mpsc,
    time::{Duration, Instant},
};

use crossterm::{
    cursor::{self, MoveTo},
    event::{
        self, Event, KeyCode, KeyEvent,
        KeyEventKind::{Press, Repeat},
        KeyModifiers,
    },
    style::{self, Print, PrintStyledContent, Stylize},
    terminal, ExecutableCommand, QueueableCommand,
};
use tetrix_engine::{Command, Game, GameUpdateError, Lifecycle};

use crate::{
    game_input_handler::{CommandSignal, CrosstermHandler},
    game_renderer::GameRenderer,
    settings::Settings,
};

#[derive(Debug)]
enum Menu {
    Title,
    NewGame,
    Game {
        game: Box<Game>,
        time_started: Instant,
        last_paused: Instant,
        total_duration_paused: Duration,
        game_renderer: GameRenderer,
    },
    GameOver,
    Pause,
    Controls,
    Quit(String),
}

impl std::fmt::Display for Menu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Menu::Title => "Title Screen",
            Menu::NewGame => "New Game",
            Menu::Game { .. } => "Game",
            Menu::GameOver => "Game Over",
            Menu::Pause => "Pause",
            Menu::Controls => "Controls",
            Menu::Quit(_) => "Quit",
        };
        write!(f, "{name}")
    }
}

enum MenuUpdate {
    Pop,
    Push(Menu),
}

#[derive(Debug)]
pub struct App<T: Write> {
    pub term: T,
    pub settings: Settings,
    seed: Option<u64>,
    last_score: Option<u32>,
}

impl<T: Write> Drop for App<T> {
    fn drop(&mut self) {
        // Console epilogue: de-initialization.
        let _ = terminal::disable_raw_mode();
        let _ = self.term.execute(style::ResetColor);
        let _ = self.term.execute(cursor::Show);
        let _ = self.term.execute(terminal::LeaveAlternateScreen);
    }
}

impl<T: Write> App<T> {
    pub const W_MAIN: u16 = 62;
    pub const H_MAIN: u16 = 23;

    pub fn new(mut terminal: T, settings: Settings, seed: Option<u64>) -> Self {
        // Console prologue: initialization.
        let _ = terminal.execute(terminal::EnterAlternateScreen);
        let _ = terminal.execute(terminal::SetTitle("Tetrix Terminal"));
        let _ = terminal.execute(cursor::Hide);
        let _ = terminal::enable_raw_mode();
        Self {
            term: terminal,
            settings,
            seed,
            last_score: None,
        }
    }

    pub fn run(&mut self) -> io::Result<String> {
        let mut menu_stack = vec![Menu::Title];
        let msg = loop {
            // Retrieve active menu, stop application if stack is empty.
            let Some(screen) = menu_stack.last_mut() else {
                break String::from("all menus exited");
            };
            let menu_update = match screen {
                Menu::Title => self.title(),
                Menu::NewGame => Ok(self.newgame()),
                Menu::Game {
                    game,
                    time_started,
                    last_paused,
                    total_duration_paused,
                    game_renderer,
                } => self.game(
                    game,
                    time_started,
                    last_paused,
                    total_duration_paused,
                    game_renderer,
                ),
                Menu::GameOver => self.gameover(),
                Menu::Pause => self.pause(),
                Menu::Controls => self.controls(),
                Menu::Quit(string) => break string.clone(),
            }?;
            match menu_update {
                MenuUpdate::Pop => {
                    if menu_stack.len() > 1 {
                        menu_stack.pop();
                    }
                }
                MenuUpdate::Push(menu) => {
                    if matches!(
                        menu,
                        Menu::Title | Menu::Game { .. } | Menu::GameOver | Menu::Quit(_)
                    ) {
                        // Abandoned sessions are stopped before being dropped.
                        for menu in menu_stack.iter_mut() {
                            if let Menu::Game { game, .. } = menu {
                                game.stop();
                            }
                        }
                    }
                    if matches!(menu, Menu::Title | Menu::Game { .. } | Menu::GameOver) {
                        menu_stack.clear();
                    }
                    menu_stack.push(menu);
                }
            }
        };
        Ok(msg)
    }

    pub(crate) fn fetch_main_xy() -> (u16, u16) {
        let (w_console, h_console) = terminal::size().unwrap_or((0, 0));
        (
            w_console.saturating_sub(Self::W_MAIN) / 2,
            h_console.saturating_sub(Self::H_MAIN) / 2,
        )
    }

    fn generic_menu_widget(
        &mut self,
        current_menu_name: &str,
        info_lines: &[String],
        selection: Vec<Menu>,
    ) -> io::Result<MenuUpdate> {
        let mut selected = 0usize;
        loop {
            let w_main = Self::W_MAIN.into();
            let (x_main, y_main) = Self::fetch_main_xy();
            let y_selection = Self::H_MAIN / 5;
            self.term
                .queue(terminal::Clear(terminal::ClearType::All))?
                .queue(MoveTo(x_main, y_main + y_selection))?;
            if current_menu_name.is_empty() {
                self.term
                    .queue(Print(format!("{:^w_main$}", "▀█▀ █▀▀ ▀█▀ █▀▄ █ ▀▄▀")))?
                    .queue(MoveTo(x_main, y_main + y_selection + 1))?
                    .queue(Print(format!("{:^w_main$}", " █  ██▄  █  █▀▄ █ █ █")))?;
            } else {
                self.term
                    .queue(Print(format!(
                        "{:^w_main$}",
                        format!("[ {} ]", current_menu_name.to_ascii_uppercase())
                    )))?
                    .queue(MoveTo(x_main, y_main + y_selection + 2))?
                    .queue(Print(format!("{:^w_main$}", "──────────────────────────")))?;
            }
            let mut y_line = y_main + y_selection + 4;
            for line in info_lines {
                self.term
                    .queue(MoveTo(x_main, y_line))?
                    .queue(Print(format!("{line:^w_main$}")))?;
                y_line += 1;
            }
            if !info_lines.is_empty() {
                y_line += 1;
            }
            for (i, menu) in selection.iter().enumerate() {
                let name = menu.to_string();
                self.term
                    .queue(MoveTo(x_main, y_line + i as u16))?
                    .queue(Print(format!(
                        "{:^w_main$}",
                        if i == selected {
                            format!(">>> {name} <<<")
                        } else {
                            name
                        }
                    )))?;
            }
            self.term
                .queue(MoveTo(x_main, y_line + selection.len() as u16 + 2))?
                .queue(PrintStyledContent(
                    format!("{:^w_main$}", "Use [↑] [↓] [Esc] [Enter].").italic(),
                ))?;
            self.term.flush()?;
            // Wait for new input.
            match event::read()? {
                Event::Key(KeyEvent {
                    code: KeyCode::Char('c'),
                    modifiers: KeyModifiers::CONTROL,
                    kind: Press | Repeat,
                    ..
                }) => break Ok(MenuUpdate::Push(Menu::Quit("exited with ctrl-c".to_string()))),
                Event::Key(KeyEvent {
                    code: KeyCode::Esc,
                    kind: Press,
                    ..
                }) => break Ok(MenuUpdate::Pop),
                Event::Key(KeyEvent {
                    code: KeyCode::Enter,
                    kind: Press,
                    ..
                }) => {
                    break Ok(selection
                        .into_iter()
                        .nth(selected)
                        .map_or(MenuUpdate::Pop, MenuUpdate::Push));
                }
                Event::Key(KeyEvent {
                    code: KeyCode::Up,
                    kind: Press | Repeat,
                    ..
                }) => {
                    if !selection.is_empty() {
                        selected += selection.len() - 1;
                    }
                }
                Event::Key(KeyEvent {
                    code: KeyCode::Down,
                    kind: Press | Repeat,
                    ..
                }) => {
                    if !selection.is_empty() {
                        selected += 1;
                    }
                }
                // Other event: don't care.
                _ => {}
            }
            if !selection.is_empty() {
                selected = selected.rem_euclid(selection.len());
            }
        }
    }

    fn title(&mut self) -> io::Result<MenuUpdate> {
        let selection = vec![
            Menu::NewGame,
            Menu::Controls,
            Menu::Quit("quit from title menu. Have a nice day!".to_string()),
        ];
        self.generic_menu_widget("", &[], selection)
    }

    fn newgame(&mut self) -> MenuUpdate {
        let config = self.settings.game_config.clone();
        let mut game = match self.seed {
            Some(seed) => Game::seeded(config, seed),
            None => Game::new(config),
        };
        game.start();
        let now = Instant::now();
        MenuUpdate::Push(Menu::Game {
            game: Box::new(game),
            time_started: now,
            last_paused: now,
            total_duration_paused: Duration::ZERO,
            game_renderer: GameRenderer::default(),
        })
    }

    fn game(
        &mut self,
        game: &mut Game,
        time_started: &mut Instant,
        last_paused: &mut Instant,
        total_duration_paused: &mut Duration,
        game_renderer: &mut GameRenderer,
    ) -> io::Result<MenuUpdate> {
        // Prepare channel with which to communicate `Command` inputs / game interrupt.
        let (tx, rx) = mpsc::channel::<CommandSignal>();
        let _input_handler = CrosstermHandler::new(&tx, &self.settings.keybinds);
        let session_resumed = Instant::now();
        *total_duration_paused += session_resumed.saturating_duration_since(*last_paused);
        let game_time_at = |instant: Instant, total_duration_paused: Duration| {
            instant
                .saturating_duration_since(*time_started)
                .saturating_sub(total_duration_paused)
        };
        let mut f = 0u32;
        let next_menu = 'render_loop: loop {
            if game.lifecycle() == Lifecycle::GameOver {
                self.last_score = Some(game.snapshot().score);
                break MenuUpdate::Push(Menu::GameOver);
            }
            // Start next frame.
            f += 1;
            let next_frame_at =
                session_resumed + Duration::from_secs_f64(f64::from(f) / self.settings.game_fps);
            let mut new_feedback_events = Vec::new();
            'idle_loop: loop {
                let frame_idle_remaining = next_frame_at.saturating_duration_since(Instant::now());
                let (commands, update_time): (Vec<Command>, _) =
                    match rx.recv_timeout(frame_idle_remaining) {
                        Ok(None) => {
                            break 'render_loop MenuUpdate::Push(Menu::Pause);
                        }
                        Ok(Some((instant, command))) => {
                            (vec![command], game_time_at(instant, *total_duration_paused))
                        }
                        Err(mpsc::RecvTimeoutError::Timeout) => {
                            (Vec::new(), game_time_at(Instant::now(), *total_duration_paused))
                        }
                        Err(mpsc::RecvTimeoutError::Disconnected) => {
                            break 'render_loop MenuUpdate::Push(Menu::Pause);
                        }
                    };
                // Inputs timestamped before the last processed tick are applied at the current game time.
                let update_time = std::cmp::max(update_time, game.state().game_time);
                match game.update(&commands, update_time) {
                    Ok(evts) => new_feedback_events.extend(evts),
                    Err(GameUpdateError::NotRunning) => break 'idle_loop,
                    Err(err) => log::warn!("dropped game update: {err}"),
                }
                if commands.is_empty() {
                    break 'idle_loop;
                }
            }
            let snapshot = game.snapshot();
            game_renderer.render(
                &mut self.term,
                Self::fetch_main_xy(),
                &snapshot,
                new_feedback_events,
            )?;
        };
        *last_paused = Instant::now();
        Ok(next_menu)
    }

    fn gameover(&mut self) -> io::Result<MenuUpdate> {
        let info = vec![format!("Final score: {}", self.last_score.unwrap_or(0))];
        let selection = vec![
            Menu::NewGame,
            Menu::Quit("quit after game over".to_string()),
        ];
        self.generic_menu_widget("Game Over", &info, selection)
    }

    fn pause(&mut self) -> io::Result<MenuUpdate> {
        let selection = vec![
            Menu::NewGame,
            Menu::Controls,
            Menu::Quit("quit from pause".to_string()),
        ];
        self.generic_menu_widget("Paused", &["[Esc] to resume.".to_string()], selection)
    }

    fn controls(&mut self) -> io::Result<MenuUpdate> {
        let info = [
            Command::MoveLeft,
            Command::MoveRight,
            Command::MoveDown,
            Command::Rotate,
        ]
        .into_iter()
        .map(|command| {
            format!(
                "{:<10} {}",
                format!("{command:?}"),
                format_keybinds(command, &self.settings)
            )
        })
        .chain(["Pause      [Esc]".to_string()])
        .collect::<Vec<_>>();
        self.generic_menu_widget("Controls", &info, vec![])
    }
}

pub fn format_duration(dur: Duration) -> String {
    format!(
        "{}:{:02}.{:02}",
        dur.as_secs() / 60,
        dur.as_secs() % 60,
        dur.as_millis() % 1000 / 10
    )
}

pub fn format_key(key: KeyCode) -> String {
    format!(
        "[{}]",
        match key {
            KeyCode::Backspace => "Back".to_string(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Left => "←".to_string(),
            KeyCode::Right => "→".to_string(),
            KeyCode::Up => "↑".to_string(),
            KeyCode::Down => "↓".to_string(),
            KeyCode::Tab => "Tab".to_string(),
            KeyCode::F(n) => format!("F{n}"),
            KeyCode::Char(' ') => "Space".to_string(),
            KeyCode::Char(c) => c.to_uppercase().to_string(),
            KeyCode::Esc => "Esc".to_string(),
            k => format!("{:?}", k),
        }
    )
}

pub fn format_keybinds(command: Command, settings: &Settings) -> String {
    let mut keys = settings
        .keybinds
        .iter()
        .filter_map(|(&k, &c)| (c == command).then_some(format_key(k)))
        .collect::<Vec<String>>();
    keys.sort();
    keys.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_format_as_minutes_seconds_centis() {
        assert_eq!(format_duration(Duration::from_millis(83_456)), "1:23.45");
        assert_eq!(format_duration(Duration::ZERO), "0:00.00");
    }

    #[test]
    fn keybinds_list_every_bound_key() {
        let settings = Settings::default();
        assert_eq!(format_keybinds(Command::MoveLeft, &settings), "[A] [←]");
        assert_eq!(format_keybinds(Command::Rotate, &settings), "[W] [↑]");
    }
}
