//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (integer pixels per tick)
//! - Seeded RNG only, and only at match start
//! - Stable iteration order (balls by id, paddles left then right)
//! - No rendering or platform dependencies

pub mod collision;
pub mod rect;
pub mod state;
pub mod tick;

pub use collision::{ContactOutcome, bounce_off_side_walls, resolve_paddle_contact};
pub use rect::Rect;
pub use state::{Ball, BallColor, GameEvent, GamePhase, GameState, Paddle, Side};
pub use tick::{PaddleInput, TickInput, autopilot, tick};
