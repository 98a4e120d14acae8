//! Game settings
//!
//! Every tunable of a match lives here so the simulation never reads
//! module-level constants directly. Loaded from JSON; missing fields fall
//! back to the defaults in [`crate::consts`].

use std::fmt;
use std::ops::RangeInclusive;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::{PaddleInput, TickInput};

/// Errors produced while loading or validating settings
#[derive(Debug)]
pub enum SettingsError {
    /// Settings file could not be read
    Io(std::io::Error),
    /// JSON was malformed or had the wrong shape
    Parse(serde_json::Error),
    /// Values parsed but describe an unplayable game
    Invalid(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "failed to read settings: {}", e),
            SettingsError::Parse(e) => write!(f, "failed to parse settings: {}", e),
            SettingsError::Invalid(msg) => write!(f, "invalid settings: {}", msg),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io(e) => Some(e),
            SettingsError::Parse(e) => Some(e),
            SettingsError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        SettingsError::Io(e)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        SettingsError::Parse(e)
    }
}

/// Key bindings, stored as normalized `KeyboardEvent.key` names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Controls {
    pub left_up: String,
    pub left_down: String,
    pub right_up: String,
    pub right_down: String,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            left_up: "w".to_string(),
            left_down: "s".to_string(),
            right_up: "arrowup".to_string(),
            right_down: "arrowdown".to_string(),
        }
    }
}

/// Normalize a key name so "W", "w" and "ArrowUp"/"arrowup" compare equal
pub fn normalize_key(key: &str) -> String {
    key.to_lowercase()
}

impl Controls {
    /// Build the per-tick input snapshot from the set of held keys
    pub fn snapshot(&self, is_held: impl Fn(&str) -> bool, idle_mode: bool) -> TickInput {
        let held = |name: &str| is_held(&normalize_key(name));
        TickInput {
            left: PaddleInput {
                up: held(&self.left_up),
                down: held(&self.left_down),
            },
            right: PaddleInput {
                up: held(&self.right_up),
                down: held(&self.right_down),
            },
            idle_mode,
        }
    }
}

/// Match configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Arena ===
    pub width: i32,
    pub height: i32,
    /// Simulation ticks per second
    pub tick_rate: u32,

    // === Paddles ===
    pub paddle_width: i32,
    pub paddle_height: i32,
    /// Pixels moved per tick while a key is held
    pub paddle_speed: i32,
    /// Distance from the side wall to the paddle
    pub paddle_inset: i32,
    /// Floor for paddle height after repeated damage
    pub min_paddle_height: i32,
    pub starting_health: u8,
    /// Ticks of damage immunity after a hit
    pub immunity_ticks: u32,

    // === Balls ===
    pub ball_size: i32,
    /// Per-axis speed (pixels per tick)
    pub ball_speed: i32,
    pub ball_count: usize,
    /// Ticks between color toggles
    pub color_toggle_ticks: u32,

    pub controls: Controls,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            width: ARENA_WIDTH,
            height: ARENA_HEIGHT,
            tick_rate: TICK_RATE,

            paddle_width: PADDLE_WIDTH,
            paddle_height: PADDLE_HEIGHT,
            paddle_speed: PADDLE_SPEED,
            paddle_inset: PADDLE_INSET,
            min_paddle_height: MIN_PADDLE_HEIGHT,
            starting_health: STARTING_HEALTH,
            immunity_ticks: IMMUNITY_TICKS,

            ball_size: BALL_SIZE,
            ball_speed: BALL_SPEED,
            ball_count: BALL_COUNT,
            color_toggle_ticks: COLOR_TOGGLE_TICKS,

            controls: Controls::default(),
        }
    }
}

impl Settings {
    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read, parse and validate a settings file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Reject configurations the simulation cannot run
    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |msg: String| Err(SettingsError::Invalid(msg));

        let arena = 1..=MAX_ARENA_SIZE;
        if !arena.contains(&self.width) || !arena.contains(&self.height) {
            return invalid(format!(
                "arena must be within 1..={} on each side, got {}x{}",
                MAX_ARENA_SIZE, self.width, self.height
            ));
        }
        if self.tick_rate == 0 {
            return invalid("tick_rate must be non-zero".to_string());
        }
        if self.color_toggle_ticks == 0 {
            return invalid("color_toggle_ticks must be non-zero".to_string());
        }
        if self.starting_health == 0 {
            return invalid("starting_health must be non-zero".to_string());
        }
        if self.paddle_width <= 0 || self.paddle_speed <= 0 || self.paddle_inset < 0 {
            return invalid("paddle width and speed must be positive".to_string());
        }
        if self.paddle_width > self.width || self.paddle_inset > self.width {
            return invalid("paddle does not fit in the arena".to_string());
        }
        if self.paddle_speed > self.height {
            return invalid(format!(
                "paddle_speed {} exceeds arena height {}",
                self.paddle_speed, self.height
            ));
        }
        if self.min_paddle_height <= 0 || self.paddle_height < self.min_paddle_height {
            return invalid(format!(
                "paddle_height {} is below min_paddle_height {}",
                self.paddle_height, self.min_paddle_height
            ));
        }
        if self.paddle_height > self.height {
            return invalid("paddle does not fit in the arena".to_string());
        }
        if 2 * (self.paddle_inset + self.paddle_width) >= self.width {
            return invalid("paddles overlap each other".to_string());
        }
        if self.ball_size <= 0 || self.ball_speed <= 0 {
            return invalid("ball size and speed must be positive".to_string());
        }
        if self.ball_size > self.height || self.ball_speed > self.height {
            return invalid(format!(
                "ball size {} and speed {} must not exceed arena height {}",
                self.ball_size, self.ball_speed, self.height
            ));
        }
        if self.ball_count == 0 || self.ball_count > MAX_BALLS {
            return invalid(format!(
                "ball_count must be in 1..={}, got {}",
                MAX_BALLS, self.ball_count
            ));
        }
        let (xs, ys) = (self.spawn_x_range(), self.spawn_y_range());
        if xs.is_empty() || ys.is_empty() {
            return invalid("ball spawn region is empty".to_string());
        }
        Ok(())
    }

    /// Horizontal spawn range for a ball's left edge (middle half of the arena)
    pub fn spawn_x_range(&self) -> RangeInclusive<i32> {
        self.width / 4..=(self.width * 3 / 4).min(self.width - self.ball_size)
    }

    /// Vertical spawn range for a ball's top edge (middle two thirds)
    pub fn spawn_y_range(&self) -> RangeInclusive<i32> {
        self.height / 6..=(self.height * 5 / 6).min(self.height - self.ball_size)
    }

    /// Left edge of the paddle on a given side
    pub fn paddle_x(&self, side: crate::sim::Side) -> i32 {
        match side {
            crate::sim::Side::Left => self.paddle_inset,
            crate::sim::Side::Right => self.width - self.paddle_inset - self.paddle_width,
        }
    }

    /// Load settings from the page's inline `<script id="settings">` block (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let json = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("settings"))
            .and_then(|el| el.text_content());

        match json {
            Some(json) if !json.trim().is_empty() => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from page");
                    return settings;
                }
                Err(e) => log::warn!("Ignoring page settings: {}", e),
            },
            _ => {}
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Load settings from an optional file path (native)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: Option<&Path>) -> Self {
        if let Some(path) = path {
            match Self::from_path(path) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    return settings;
                }
                Err(e) => log::warn!("Ignoring {}: {}", path.display(), e),
            }
        }

        log::info!("Using default settings");
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Side;
    use std::collections::HashSet;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.paddle_x(Side::Left), 30);
        assert_eq!(settings.paddle_x(Side::Right), 750);
        assert_eq!(settings.spawn_x_range(), 200..=600);
        assert_eq!(settings.spawn_y_range(), 100..=500);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{ "ball_count": 4, "controls": { "left_up": "q" } }"#)
            .expect("valid settings");
        assert_eq!(settings.ball_count, 4);
        assert_eq!(settings.width, ARENA_WIDTH);
        assert_eq!(settings.controls.left_up, "q");
        assert_eq!(settings.controls.left_down, "s");
    }

    #[test]
    fn test_malformed_json() {
        let err = Settings::from_json("{ width: ").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Settings::from_json(r#"{ "ball_count": 0 }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));

        let err = Settings::from_json(r#"{ "paddle_height": 5 }"#).unwrap_err();
        assert!(err.to_string().contains("min_paddle_height"));

        let err = Settings::from_json(r#"{ "color_toggle_ticks": 0 }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
    }

    #[test]
    fn test_oversized_values_rejected() {
        for json in [
            r#"{ "width": 2147483647 }"#,
            r#"{ "height": 2147483647 }"#,
            r#"{ "paddle_inset": 2147483647 }"#,
            r#"{ "paddle_width": 2147483647 }"#,
            r#"{ "paddle_speed": 2147483647 }"#,
            r#"{ "ball_size": 2147483647 }"#,
            r#"{ "ball_speed": 2147483647 }"#,
        ] {
            let err = Settings::from_json(json).unwrap_err();
            assert!(matches!(err, SettingsError::Invalid(_)), "{}", json);
        }

        let largest = format!(r#"{{ "width": {0}, "height": {0} }}"#, MAX_ARENA_SIZE);
        assert!(Settings::from_json(&largest).is_ok());
    }

    #[test]
    fn test_fastest_paddle_stays_in_arena() {
        let settings = Settings::from_json(r#"{ "paddle_speed": 600 }"#).expect("valid settings");
        let mut state = crate::sim::GameState::new(1, &settings);
        let input = TickInput {
            left: PaddleInput { up: false, down: true },
            right: PaddleInput { up: true, down: false },
            idle_mode: false,
        };
        crate::sim::tick(&mut state, input, &settings);
        assert_eq!(state.paddle(Side::Left).rect.bottom(), settings.height);
        assert_eq!(state.paddle(Side::Right).rect.top(), 0);
    }

    #[test]
    fn test_missing_file() {
        let err = Settings::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, SettingsError::Io(_)));
    }

    #[test]
    fn test_controls_snapshot() {
        let controls = Controls::default();
        let held: HashSet<String> = ["w", "arrowdown"].iter().map(|k| k.to_string()).collect();
        let input = controls.snapshot(|k| held.contains(k), false);
        assert_eq!(input.left, PaddleInput { up: true, down: false });
        assert_eq!(input.right, PaddleInput { up: false, down: true });
        assert!(!input.idle_mode);
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("W"), "w");
        assert_eq!(normalize_key("ArrowUp"), "arrowup");
    }
}
