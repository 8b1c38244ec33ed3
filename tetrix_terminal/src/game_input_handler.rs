use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::Sender,
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use tetrix_engine::Command;

/// `None` asks the game screen to pause.
pub type CommandSignal = Option<(Instant, Command)>;

#[derive(Debug)]
pub struct CrosstermHandler {
    handles: Option<(JoinHandle<()>, Arc<AtomicBool>)>,
}

impl Drop for CrosstermHandler {
    fn drop(&mut self) {
        if let Some((handle, running_flag)) = self.handles.take() {
            running_flag.store(false, Ordering::Release);
            let _ = handle.join();
        }
    }
}

impl CrosstermHandler {
    /// How long the input thread blocks before re-checking its running flag.
    const POLL_INTERVAL: Duration = Duration::from_millis(50);

    pub fn new(sender: &Sender<CommandSignal>, keybinds: &HashMap<KeyCode, Command>) -> Self {
        let flag = Arc::new(AtomicBool::new(true));
        let handle = Self::spawn(sender.clone(), flag.clone(), keybinds.clone());
        CrosstermHandler {
            handles: Some((handle, flag)),
        }
    }

    fn spawn(
        sender: Sender<CommandSignal>,
        flag: Arc<AtomicBool>,
        keybinds: HashMap<KeyCode, Command>,
    ) -> JoinHandle<()> {
        thread::spawn(move || {
            while flag.load(Ordering::Acquire) {
                match event::poll(Self::POLL_INTERVAL) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    // Spurious io::Error: ignore.
                    Err(_) => continue,
                }
                let event = match event::read() {
                    Ok(event) => event,
                    Err(_) => continue,
                };
                let instant = Instant::now();
                let signal = match event {
                    // Escape or Ctrl+C pressed: send interrupt.
                    Event::Key(KeyEvent {
                        code: KeyCode::Esc,
                        kind: KeyEventKind::Press,
                        ..
                    })
                    | Event::Key(KeyEvent {
                        code: KeyCode::Char('c'),
                        modifiers: KeyModifiers::CONTROL,
                        kind: KeyEventKind::Press,
                        ..
                    }) => None,
                    // Candidate key pressed or held.
                    Event::Key(KeyEvent {
                        code: key,
                        kind: KeyEventKind::Press | KeyEventKind::Repeat,
                        ..
                    }) => match keybinds.get(&key) {
                        Some(&command) => Some((instant, command)),
                        // No binding: ignore.
                        None => continue,
                    },
                    // Don't care about other events: ignore.
                    _ => continue,
                };
                if sender.send(signal).is_err() {
                    break;
                }
            }
        })
    }
}
