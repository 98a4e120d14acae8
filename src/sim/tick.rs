//! Fixed timestep simulation tick
//!
//! Core game loop that advances a match deterministically, one tick at a time.

use super::collision::{ContactOutcome, bounce_off_side_walls, resolve_paddle_contact};
use super::state::{Ball, BallColor, GameEvent, GamePhase, GameState, Side};
use crate::settings::Settings;

/// Vertical movement request for one paddle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaddleInput {
    pub up: bool,
    pub down: bool,
}

/// Input snapshot for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Player 1
    pub left: PaddleInput,
    /// Player 2
    pub right: PaddleInput,
    /// Idle/demo mode - autopilot drives both paddles
    pub idle_mode: bool,
}

impl TickInput {
    pub fn for_side(&self, side: Side) -> PaddleInput {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

/// Advance the match by one tick
pub fn tick(state: &mut GameState, input: TickInput, settings: &Settings) {
    if state.is_finished() {
        return;
    }

    state.events.clear();

    let input = if input.idle_mode {
        TickInput {
            left: autopilot(state, Side::Left, settings),
            right: autopilot(state, Side::Right, settings),
            idle_mode: true,
        }
    } else {
        input
    };

    state.time_ticks += 1;

    // Paddles
    for paddle in &mut state.paddles {
        paddle.step(input.for_side(paddle.side), settings);
    }

    // Ball motion and color cycling
    for ball in &mut state.balls {
        if ball.update(settings) {
            log::trace!("Ball {} is now {:?}", ball.id, ball.color);
            state.events.push(GameEvent::ColorChanged {
                ball: ball.id,
                color: ball.color,
            });
        }
    }

    // Contacts, then side walls, for every ball
    for ball in &mut state.balls {
        for side in Side::ALL {
            let paddle = &mut state.paddles[side.index()];
            let Some(outcome) = resolve_paddle_contact(ball, paddle, settings) else {
                continue;
            };
            let event = match outcome {
                ContactOutcome::Damaged => GameEvent::PaddleDamaged {
                    side,
                    ball: ball.id,
                    health: paddle.health,
                },
                ContactOutcome::Blocked => GameEvent::DamageBlocked { side, ball: ball.id },
                ContactOutcome::Deflected => GameEvent::BallDeflected { side, ball: ball.id },
            };
            log::debug!("tick {}: {:?}", state.time_ticks, event);
            state.events.push(event);
        }

        bounce_off_side_walls(ball, settings);
    }

    // Left is checked first: a double knockout goes to Player 2
    for side in Side::ALL {
        if state.paddle(side).is_eliminated() {
            let winner = side.opponent();
            state.phase = GamePhase::Finished { winner };
            state.events.push(GameEvent::MatchOver { winner });
            log::info!(
                "{} wins after {} ticks (seed {})",
                winner.player_name(),
                state.time_ticks,
                state.seed
            );
            break;
        }
    }
}

/// Ticks per autopilot wobble cycle (about 8 seconds)
const WOBBLE_PERIOD: u64 = 480;

/// Integer triangle wave over `-amplitude..=amplitude`
fn wobble(ticks: u64, amplitude: i32) -> i32 {
    let quarter = (WOBBLE_PERIOD / 4) as i32;
    let p = (ticks % WOBBLE_PERIOD) as i32;
    if p < 2 * quarter {
        amplitude * (p - quarter) / quarter
    } else {
        amplitude * (3 * quarter - p) / quarter
    }
}

/// Steer a paddle without a human: chase the nearest incoming safe ball,
/// dodge the nearest incoming damaging one
pub fn autopilot(state: &GameState, side: Side, settings: &Settings) -> PaddleInput {
    let paddle = state.paddle(side);
    let paddle_x = paddle.rect.left() + paddle.rect.size.x / 2;
    let paddle_y = paddle.center_y();

    let incoming = |ball: &&Ball| match side {
        Side::Left => ball.vel.x < 0,
        Side::Right => ball.vel.x > 0,
    };
    let threat = state
        .balls
        .iter()
        .filter(incoming)
        .min_by_key(|b| (b.center().x - paddle_x).abs());

    let target = match threat {
        Some(ball) => {
            let ball_y = ball.center().y;
            match ball.color {
                BallColor::Safe => {
                    // Slow wobble so two autopilots don't rally forever
                    let offset = side.index() as u64 * WOBBLE_PERIOD / 6;
                    let amplitude = paddle.rect.height() * 3 / 5;
                    ball_y + wobble(state.time_ticks + offset, amplitude)
                }
                BallColor::Damaging => {
                    let clearance = paddle.rect.height() / 2 + settings.ball_size;
                    if ball_y >= paddle_y && ball_y - clearance > 0 {
                        ball_y - clearance
                    } else if ball_y < paddle_y && ball_y + clearance < settings.height {
                        ball_y + clearance
                    } else if ball_y >= paddle_y {
                        ball_y + clearance
                    } else {
                        ball_y - clearance
                    }
                }
            }
        }
        None => settings.height / 2,
    };

    let delta = target - paddle_y;
    PaddleInput {
        up: delta < -settings.paddle_speed,
        down: delta > settings.paddle_speed,
    }
}
