//! Ball/paddle contact resolution and side-wall bounce
//!
//! Paddle contact is edge-triggered: a ball that keeps overlapping a paddle
//! only counts once, and the per-side flag re-arms when the overlap ends.

use super::state::{Ball, BallColor, Paddle};
use crate::settings::Settings;

/// What a new contact did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    /// Damaging ball hit a vulnerable paddle
    Damaged,
    /// Damaging ball hit a paddle inside its immunity window
    Blocked,
    /// Safe ball bounced off
    Deflected,
}

/// Resolve one ball against one paddle for this tick
///
/// Returns `Some` only on the first tick of an overlap.
pub fn resolve_paddle_contact(
    ball: &mut Ball,
    paddle: &mut Paddle,
    settings: &Settings,
) -> Option<ContactOutcome> {
    let side = paddle.side;

    if !ball.rect.intersects(&paddle.rect) {
        ball.set_contact(side, false);
        return None;
    }
    if ball.in_contact(side) {
        return None;
    }
    ball.set_contact(side, true);

    let outcome = match ball.color {
        BallColor::Damaging => {
            if paddle.take_damage(settings) {
                ContactOutcome::Damaged
            } else {
                ContactOutcome::Blocked
            }
        }
        BallColor::Safe => {
            ball.vel.x = -ball.vel.x;
            ContactOutcome::Deflected
        }
    };
    Some(outcome)
}

/// Reflect off the left/right walls. Returns true if the ball bounced.
pub fn bounce_off_side_walls(ball: &mut Ball, settings: &Settings) -> bool {
    if ball.rect.left() <= 0 || ball.rect.right() >= settings.width {
        ball.vel.x = -ball.vel.x;
        ball.rect.clamp_x(settings.width);
        return true;
    }
    false
}
