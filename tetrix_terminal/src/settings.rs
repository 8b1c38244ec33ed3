use std::{collections::HashMap, fs, io, path::Path, time::Duration};

use crossterm::event::KeyCode;
use tetrix_engine::{Command, GameConfig};

#[derive(PartialEq, Clone, Debug)]
pub struct Settings {
    pub game_fps: f64,
    pub keybinds: HashMap<KeyCode, Command>,
    pub game_config: GameConfig,
}

/// On-disk form of [`Settings`]. Every field is optional and falls back to the default.
#[derive(serde::Serialize, serde::Deserialize, Default, Debug)]
#[serde(default, deny_unknown_fields)]
struct SettingsFile {
    fps: Option<f64>,
    gravity_period_ms: Option<u64>,
    spawn_period_ms: Option<u64>,
    keybinds: Option<Vec<(KeyCode, Command)>>,
}

impl Default for Settings {
    fn default() -> Self {
        let keybinds = HashMap::from([
            (KeyCode::Left, Command::MoveLeft),
            (KeyCode::Right, Command::MoveRight),
            (KeyCode::Down, Command::MoveDown),
            (KeyCode::Up, Command::Rotate),
            (KeyCode::Char('a'), Command::MoveLeft),
            (KeyCode::Char('d'), Command::MoveRight),
            (KeyCode::Char('s'), Command::MoveDown),
            (KeyCode::Char('w'), Command::Rotate),
        ]);
        Self {
            game_fps: 30.0,
            keybinds,
            game_config: GameConfig::default(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> io::Result<Self> {
        let save_str = fs::read_to_string(path)?;
        Self::from_json(&save_str)
    }

    pub fn from_json(json: &str) -> io::Result<Self> {
        let file: SettingsFile = serde_json::from_str(json)?;
        let mut settings = Self::default();
        if let Some(fps) = file.fps {
            if !(fps.is_finite() && fps > 0.0) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("fps must be positive, got {fps}"),
                ));
            }
            settings.game_fps = fps;
        }
        if let Some(millis) = file.gravity_period_ms {
            settings.game_config.gravity_period = Duration::from_millis(millis);
        }
        if let Some(millis) = file.spawn_period_ms {
            settings.game_config.spawn_period = Duration::from_millis(millis);
        }
        if let Some(keybinds) = file.keybinds {
            settings.keybinds = keybinds.into_iter().collect();
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Settings::from_json("{}").unwrap(), Settings::default());
    }

    #[test]
    fn overrides_are_applied() {
        let settings = Settings::from_json(
            r#"{
                "fps": 60.0,
                "gravity_period_ms": 250,
                "keybinds": [[{"Char": "h"}, "MoveLeft"], ["Enter", "MoveDown"]]
            }"#,
        )
        .unwrap();
        assert_eq!(settings.game_fps, 60.0);
        assert_eq!(settings.game_config.gravity_period, Duration::from_millis(250));
        assert_eq!(settings.game_config.spawn_period, Duration::from_millis(20_000));
        assert_eq!(
            settings.keybinds,
            HashMap::from([
                (KeyCode::Char('h'), Command::MoveLeft),
                (KeyCode::Enter, Command::MoveDown),
            ])
        );
    }

    #[test]
    fn invalid_files_are_rejected() {
        assert!(Settings::from_json(r#"{"fps": 0}"#).is_err());
        assert!(Settings::from_json(r#"{"tick": 3}"#).is_err());
        assert!(Settings::from_json("not json").is_err());
    }
}
