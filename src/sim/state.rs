//! Game state and core simulation types
//!
//! Everything a match needs lives in [`GameState`]; it is created from a seed
//! and advanced only by [`super::tick`].

use glam::IVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::rect::Rect;
use super::tick::PaddleInput;
use crate::settings::Settings;

/// Which side of the arena a paddle defends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Player 1
    Left,
    /// Player 2
    Right,
}

impl Side {
    /// Both sides, in collision-resolution order
    pub const ALL: [Side; 2] = [Side::Left, Side::Right];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }

    pub fn opponent(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Display name used on the HUD and outcome screen
    pub fn player_name(self) -> &'static str {
        match self {
            Side::Left => "Player 1",
            Side::Right => "Player 2",
        }
    }
}

/// Ball color state - decides what happens on paddle contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallColor {
    /// Green: bounces off paddles
    Safe,
    /// Red: passes through and costs the paddle one health
    Damaging,
}

impl BallColor {
    pub fn toggled(self) -> Self {
        match self {
            BallColor::Safe => BallColor::Damaging,
            BallColor::Damaging => BallColor::Safe,
        }
    }
}

/// Current phase of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// A paddle reached zero health
    Finished { winner: Side },
}

/// Something notable that happened during the last tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    ColorChanged { ball: u32, color: BallColor },
    PaddleDamaged { side: Side, ball: u32, health: u8 },
    /// Damaging contact absorbed by the immunity window
    DamageBlocked { side: Side, ball: u32 },
    BallDeflected { side: Side, ball: u32 },
    MatchOver { winner: Side },
}

/// A player's paddle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paddle {
    pub side: Side,
    pub rect: Rect,
    /// Height at match start; damage shrinks by a third of this
    pub base_height: i32,
    pub health: u8,
    /// Ticks of damage immunity remaining
    pub immunity_ticks: u32,
}

impl Paddle {
    /// Paddle at its side's fixed x, vertically centered
    pub fn new(side: Side, settings: &Settings) -> Self {
        let y = settings.height / 2 - settings.paddle_height / 2;
        Self {
            side,
            rect: Rect::new(
                settings.paddle_x(side),
                y,
                settings.paddle_width,
                settings.paddle_height,
            ),
            base_height: settings.paddle_height,
            health: settings.starting_health,
            immunity_ticks: 0,
        }
    }

    /// Move one tick's worth and count down immunity
    pub fn step(&mut self, input: PaddleInput, settings: &Settings) {
        let mut dy = 0;
        if input.up {
            dy -= settings.paddle_speed;
        }
        if input.down {
            dy += settings.paddle_speed;
        }
        if dy != 0 {
            self.rect.pos.y += dy;
            self.rect.clamp_y(settings.height);
        }

        if self.immunity_ticks > 0 {
            self.immunity_ticks -= 1;
        }
    }

    /// Apply one hit unless immune. Returns whether damage was applied.
    ///
    /// The paddle shrinks by a third of its base height (never below the
    /// configured minimum) around its current midpoint.
    pub fn take_damage(&mut self, settings: &Settings) -> bool {
        if self.is_immune() {
            return false;
        }

        let height = self.rect.height();
        let new_height = (height - self.base_height / 3).max(settings.min_paddle_height);
        self.rect.pos.y += (height - new_height) / 2;
        self.rect.size.y = new_height;

        self.health = self.health.saturating_sub(1);
        self.immunity_ticks = settings.immunity_ticks;
        true
    }

    #[inline]
    pub fn is_immune(&self) -> bool {
        self.immunity_ticks > 0
    }

    #[inline]
    pub fn is_eliminated(&self) -> bool {
        self.health == 0
    }

    #[inline]
    pub fn center_y(&self) -> i32 {
        self.rect.center_y()
    }
}

/// A ball entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub rect: Rect,
    /// Pixels per tick
    pub vel: IVec2,
    pub color: BallColor,
    /// Ticks since the last color toggle
    pub color_ticks: u32,
    /// Overlapping each paddle as of the last tick (indexed by [`Side::index`])
    pub contact: [bool; 2],
}

impl Ball {
    pub fn new(id: u32, pos: IVec2, vel: IVec2, settings: &Settings) -> Self {
        Self {
            id,
            rect: Rect::new(pos.x, pos.y, settings.ball_size, settings.ball_size),
            vel,
            color: BallColor::Damaging,
            color_ticks: 0,
            contact: [false; 2],
        }
    }

    /// Ball at a random spot in the middle of the arena, heading diagonally
    pub fn spawn<R: Rng + ?Sized>(id: u32, rng: &mut R, settings: &Settings) -> Self {
        let pos = IVec2::new(
            rng.random_range(settings.spawn_x_range()),
            rng.random_range(settings.spawn_y_range()),
        );
        let speed = settings.ball_speed;
        let vel = IVec2::new(
            if rng.random_bool(0.5) { speed } else { -speed },
            if rng.random_bool(0.5) { speed } else { -speed },
        );
        Self::new(id, pos, vel, settings)
    }

    /// Integrate position, bounce off the top/bottom walls and advance the
    /// color timer. Returns true when the color toggled this tick.
    pub fn update(&mut self, settings: &Settings) -> bool {
        self.rect.pos += self.vel;

        if self.rect.top() <= 0 || self.rect.bottom() >= settings.height {
            self.vel.y = -self.vel.y;
            // Pull back inside so the next tick can't flip it again
            self.rect.clamp_y(settings.height);
        }

        self.color_ticks += 1;
        if self.color_ticks >= settings.color_toggle_ticks {
            self.color = self.color.toggled();
            self.color_ticks = 0;
            return true;
        }
        false
    }

    pub fn ticks_until_color_change(&self, settings: &Settings) -> u32 {
        settings.color_toggle_ticks.saturating_sub(self.color_ticks)
    }

    /// Whole seconds until the next toggle (display only)
    pub fn time_until_color_change(&self, settings: &Settings) -> u32 {
        self.ticks_until_color_change(settings) / settings.tick_rate
    }

    #[inline]
    pub fn in_contact(&self, side: Side) -> bool {
        self.contact[side.index()]
    }

    #[inline]
    pub fn set_contact(&mut self, side: Side, touching: bool) {
        self.contact[side.index()] = touching;
    }

    pub fn center(&self) -> IVec2 {
        self.rect.pos + self.rect.size / 2
    }
}

/// Complete match state (deterministic, serializable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Seed the balls were spawned from
    pub seed: u64,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub phase: GamePhase,
    /// Indexed by [`Side::index`]
    pub paddles: [Paddle; 2],
    /// Sorted by id
    pub balls: Vec<Ball>,
    /// Events emitted by the most recent tick
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create a fresh match with the given seed
    pub fn new(seed: u64, settings: &Settings) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let balls = (0..settings.ball_count)
            .map(|i| Ball::spawn(i as u32 + 1, &mut rng, settings))
            .collect();

        Self {
            seed,
            time_ticks: 0,
            phase: GamePhase::Playing,
            paddles: [
                Paddle::new(Side::Left, settings),
                Paddle::new(Side::Right, settings),
            ],
            balls,
            events: Vec::new(),
        }
    }

    #[inline]
    pub fn paddle(&self, side: Side) -> &Paddle {
        &self.paddles[side.index()]
    }

    #[inline]
    pub fn paddle_mut(&mut self, side: Side) -> &mut Paddle {
        &mut self.paddles[side.index()]
    }

    pub fn winner(&self) -> Option<Side> {
        match self.phase {
            GamePhase::Finished { winner } => Some(winner),
            GamePhase::Playing => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.winner().is_some()
    }

    /// Shared HUD countdown: the soonest color change across all balls
    pub fn next_color_change_secs(&self, settings: &Settings) -> u32 {
        self.balls
            .iter()
            .map(|b| b.time_until_color_change(settings))
            .min()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn settings() -> Settings {
        Settings::default()
    }

    #[test]
    fn test_paddle_starts_centered() {
        let s = settings();
        let left = Paddle::new(Side::Left, &s);
        let right = Paddle::new(Side::Right, &s);
        assert_eq!(left.rect, Rect::new(30, 250, 20, 100));
        assert_eq!(right.rect, Rect::new(750, 250, 20, 100));
        assert_eq!(left.health, 3);
        assert_eq!(left.immunity_ticks, 0);
    }

    #[test]
    fn test_paddle_movement_clamped() {
        let s = settings();
        let mut paddle = Paddle::new(Side::Left, &s);
        let up = PaddleInput { up: true, down: false };
        for _ in 0..100 {
            paddle.step(up, &s);
        }
        assert_eq!(paddle.rect.top(), 0);

        let down = PaddleInput { up: false, down: true };
        for _ in 0..200 {
            paddle.step(down, &s);
        }
        assert_eq!(paddle.rect.bottom(), 600);
    }

    #[test]
    fn test_paddle_opposing_keys_cancel() {
        let s = settings();
        let mut paddle = Paddle::new(Side::Right, &s);
        paddle.step(PaddleInput { up: true, down: true }, &s);
        assert_eq!(paddle.rect.top(), 250);
        paddle.step(PaddleInput { up: false, down: true }, &s);
        assert_eq!(paddle.rect.top(), 256);
    }

    #[test]
    fn test_take_damage_shrinks_around_center() {
        let s = settings();
        let mut paddle = Paddle::new(Side::Left, &s);
        assert!(paddle.take_damage(&s));
        assert_eq!(paddle.rect.height(), 67);
        assert_eq!(paddle.rect.top(), 266);
        assert_eq!(paddle.health, 2);
        assert_eq!(paddle.immunity_ticks, 60);
    }

    #[test]
    fn test_immunity_blocks_second_hit() {
        let s = settings();
        let mut paddle = Paddle::new(Side::Left, &s);
        assert!(paddle.take_damage(&s));
        for _ in 0..59 {
            paddle.step(PaddleInput::default(), &s);
        }
        assert!(!paddle.take_damage(&s));
        assert_eq!(paddle.health, 2);

        paddle.step(PaddleInput::default(), &s);
        assert!(!paddle.is_immune());
        assert!(paddle.take_damage(&s));
        assert_eq!(paddle.health, 1);
    }

    #[test]
    fn test_height_floor() {
        let s = settings();
        let mut paddle = Paddle::new(Side::Left, &s);
        let heights: Vec<i32> = (0..3)
            .map(|_| {
                paddle.immunity_ticks = 0;
                paddle.take_damage(&s);
                paddle.rect.height()
            })
            .collect();
        assert_eq!(heights, vec![67, 34, 10]);
        assert!(paddle.is_eliminated());
    }

    #[test]
    fn test_ball_bounces_off_top() {
        let s = settings();
        let mut ball = Ball::new(1, IVec2::new(400, 0), IVec2::new(3, -3), &s);
        ball.update(&s);
        assert_eq!(ball.vel.y, 3);
        assert_eq!(ball.rect.top(), 0);

        // Moving away on the next tick does not flip again
        ball.update(&s);
        assert_eq!(ball.vel.y, 3);
        assert_eq!(ball.rect.top(), 3);
    }

    #[test]
    fn test_ball_bounces_off_bottom_inclusive() {
        let s = settings();
        let mut ball = Ball::new(1, IVec2::new(400, 577), IVec2::new(3, 3), &s);
        ball.update(&s);
        assert_eq!(ball.rect.bottom(), 600);
        assert_eq!(ball.vel.y, -3);
    }

    #[test]
    fn test_color_countdown() {
        let s = settings();
        let mut ball = Ball::new(1, IVec2::new(400, 300), IVec2::new(3, 3), &s);
        assert_eq!(ball.time_until_color_change(&s), 5);
        for _ in 0..61 {
            ball.update(&s);
        }
        assert_eq!(ball.time_until_color_change(&s), 3);
    }

    #[test]
    fn test_spawn_is_seeded() {
        let s = settings();
        let a = GameState::new(42, &s);
        let b = GameState::new(42, &s);
        assert_eq!(a, b);
        assert_eq!(a.balls.len(), 2);
        for ball in &a.balls {
            assert!(s.spawn_x_range().contains(&ball.rect.left()));
            assert!(s.spawn_y_range().contains(&ball.rect.top()));
            assert_eq!(ball.vel.x.abs(), 3);
            assert_eq!(ball.vel.y.abs(), 3);
            assert_eq!(ball.color, BallColor::Damaging);
        }
    }

    #[test]
    fn test_shared_countdown_is_minimum() {
        let s = settings();
        let mut state = GameState::new(7, &s);
        state.balls[0].color_ticks = 250;
        state.balls[1].color_ticks = 10;
        assert_eq!(state.next_color_change_secs(&s), 0);
        state.balls[0].color_ticks = 100;
        assert_eq!(state.next_color_change_secs(&s), 3);
    }

    proptest! {
        #[test]
        fn prop_height_never_below_floor(hits in 3usize..20, start_y in 0i32..500) {
            let s = settings();
            let mut paddle = Paddle::new(Side::Left, &s);
            paddle.rect.pos.y = start_y;
            for _ in 0..hits {
                paddle.immunity_ticks = 0;
                let before = paddle.health;
                let applied = paddle.take_damage(&s);
                prop_assert!(applied);
                prop_assert!(paddle.rect.height() >= s.min_paddle_height);
                prop_assert_eq!(paddle.health, before.saturating_sub(1));
            }
            prop_assert_eq!(paddle.health, 0);
        }

        #[test]
        fn prop_color_toggles_every_interval(
            x in 0i32..780,
            y in 0i32..580,
            vx in prop::bool::ANY,
            vy in prop::bool::ANY,
            periods in 1u32..6,
        ) {
            let s = settings();
            let vel = IVec2::new(if vx { 3 } else { -3 }, if vy { 3 } else { -3 });
            let mut ball = Ball::new(1, IVec2::new(x, y), vel, &s);
            let mut toggles = Vec::new();
            for t in 1..=periods * s.color_toggle_ticks {
                if ball.update(&s) {
                    toggles.push(t);
                }
            }
            let expected: Vec<u32> = (1..=periods).map(|p| p * s.color_toggle_ticks).collect();
            prop_assert_eq!(toggles, expected);
        }

        #[test]
        fn prop_vertical_flip_only_at_bounds(y in 0i32..=580, up in prop::bool::ANY) {
            let s = settings();
            let vy = if up { -3 } else { 3 };
            let mut ball = Ball::new(1, IVec2::new(400, y), IVec2::new(3, vy), &s);
            let crossed = y + vy <= 0 || y + vy + s.ball_size >= s.height;
            ball.update(&s);
            prop_assert_eq!(ball.vel.y == -vy, crossed);
            prop_assert!(ball.rect.top() >= 0 && ball.rect.bottom() <= s.height);
        }
    }
}
