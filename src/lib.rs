//! Deadly Bounce - a two-player color-cycling dodge arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (paddles, balls, collisions, match state)
//! - `flow`: Menu / match / outcome screen state machine
//! - `renderer`: WebGPU rendering pipeline
//! - `settings`: Data-driven game configuration

pub mod flow;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use flow::{FlowAction, Screen, ScreenFlow};
pub use settings::{Controls, Settings, SettingsError};

/// Game configuration constants (defaults for [`Settings`])
pub mod consts {
    /// Play area dimensions (pixels)
    pub const ARENA_WIDTH: i32 = 800;
    pub const ARENA_HEIGHT: i32 = 600;
    /// Largest accepted arena side, keeps pixel arithmetic well inside i32
    pub const MAX_ARENA_SIZE: i32 = 16384;

    /// Fixed simulation rate (ticks per second)
    pub const TICK_RATE: u32 = 60;
    /// Maximum ticks per rendered frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Paddle defaults
    pub const PADDLE_WIDTH: i32 = 20;
    pub const PADDLE_HEIGHT: i32 = 100;
    pub const PADDLE_SPEED: i32 = 6; // pixels per tick
    pub const PADDLE_INSET: i32 = 30; // gap between paddle and side wall
    pub const MIN_PADDLE_HEIGHT: i32 = 10;

    /// Ball defaults
    pub const BALL_SIZE: i32 = 20;
    pub const BALL_SPEED: i32 = 3; // pixels per tick on each axis
    pub const BALL_COUNT: usize = 2;
    /// Most balls the renderer can draw
    pub const MAX_BALLS: usize = 8;

    /// Ticks between ball color toggles (5 seconds)
    pub const COLOR_TOGGLE_TICKS: u32 = 300;

    /// Player defaults
    pub const STARTING_HEALTH: u8 = 3;
    /// Damage immunity after a hit (1 second)
    pub const IMMUNITY_TICKS: u32 = TICK_RATE;
}
