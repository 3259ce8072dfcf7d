//! Paddle tennis against a computer opponent.
//!
//! The playfield is measured in abstract units with the origin at the top left. The player
//! defends the bottom edge and the opponent the top edge. All rectangles are stored by their top
//! left corner.

use core::time::Duration;

use rand::prelude::*;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TennisConfig {
    pub width: f32,
    pub height: f32,
    pub paddle_width: f32,
    pub paddle_height: f32,
    /// Distance between a paddle and its edge of the playfield.
    pub paddle_margin: f32,
    pub ball_size: f32,
    pub base_speed: f32,
    /// Factor applied to both velocity components on every paddle hit.
    pub speed_up: f32,
    /// Largest random offset added to the horizontal serve speed.
    pub serve_jitter: f32,
    pub ai_speed: f32,
    /// Probability that the opponent aims at the ball instead of a random offset.
    pub ai_accuracy: f64,
    pub ai_error: f32,
    pub lives: u8,
    pub tick_ms: u64,
    pub player_respawn_ms: u64,
    pub ai_respawn_ms: u64,
}

impl Default for TennisConfig {
    fn default() -> Self {
        Self {
            width: 400.0,
            height: 600.0,
            paddle_width: 100.0,
            paddle_height: 20.0,
            paddle_margin: 40.0,
            ball_size: 20.0,
            base_speed: 9.0,
            speed_up: 1.02,
            serve_jitter: 1.0,
            ai_speed: 10.0,
            ai_accuracy: 0.85,
            ai_error: 200.0,
            lives: 4,
            tick_ms: 16,
            player_respawn_ms: 1200,
            ai_respawn_ms: 1000,
        }
    }
}

impl TennisConfig {
    pub fn validate(&self) -> Result<()> {
        let dims = [
            self.width,
            self.height,
            self.paddle_width,
            self.paddle_height,
            self.ball_size,
            self.base_speed,
            self.ai_speed,
        ];
        if dims.iter().any(|&value| !value.is_finite() || value <= 0.0) {
            return Err(GameError::InvalidConfig("sizes and speeds must be positive"));
        }
        if self.paddle_width >= self.width || self.ball_size >= self.width {
            return Err(GameError::InvalidConfig("paddle or ball wider than the playfield"));
        }
        let lanes = 2.0 * (self.paddle_margin + self.paddle_height) + self.ball_size;
        if self.paddle_margin < 0.0 || lanes >= self.height {
            return Err(GameError::InvalidConfig("paddles leave no room for the ball"));
        }
        if !(self.speed_up >= 1.0) {
            return Err(GameError::InvalidConfig("paddle hits must not slow the ball"));
        }
        if !(0.0..self.base_speed).contains(&self.serve_jitter) {
            return Err(GameError::InvalidConfig("serve jitter must be below base speed"));
        }
        if !(0.0..=1.0).contains(&self.ai_accuracy) || !(self.ai_error >= 0.0) {
            return Err(GameError::InvalidConfig("opponent accuracy out of range"));
        }
        if self.lives == 0 {
            return Err(GameError::InvalidConfig("each side needs at least one life"));
        }
        if self.tick_ms == 0 {
            return Err(GameError::InvalidConfig("tick period must be positive"));
        }
        Ok(())
    }

    pub fn player_y(&self) -> f32 {
        self.height - self.paddle_margin - self.paddle_height
    }

    pub fn ai_y(&self) -> f32 {
        self.paddle_margin
    }

    fn max_paddle_x(&self) -> f32 {
        self.width - self.paddle_width
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Strict overlap, rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Side {
    Player,
    Ai,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TennisMove {
    /// Centers the player paddle on `x`.
    MovePaddle { x: f32 },
    Nudge(Direction),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TennisEffect {
    Serve,
}

#[derive(Clone, Debug)]
pub struct Tennis {
    config: TennisConfig,
    ball: Vec2,
    velocity: Vec2,
    ball_active: bool,
    player_x: f32,
    ai_x: f32,
    player_lives: u8,
    ai_lives: u8,
    player_points: u32,
    ai_points: u32,
    paddle_hits: u32,
    outcome: Option<Outcome>,
    rng: SmallRng,
    signals: Vec<Signal<TennisEffect>>,
}

impl Tennis {
    pub fn config(&self) -> &TennisConfig {
        &self.config
    }

    pub fn ball(&self) -> Rect {
        Rect {
            x: self.ball.x,
            y: self.ball.y,
            width: self.config.ball_size,
            height: self.config.ball_size,
        }
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn ball_active(&self) -> bool {
        self.ball_active
    }

    pub fn paddle(&self, side: Side) -> Rect {
        let (x, y) = match side {
            Side::Player => (self.player_x, self.config.player_y()),
            Side::Ai => (self.ai_x, self.config.ai_y()),
        };
        Rect {
            x,
            y,
            width: self.config.paddle_width,
            height: self.config.paddle_height,
        }
    }

    pub fn lives(&self, side: Side) -> u8 {
        match side {
            Side::Player => self.player_lives,
            Side::Ai => self.ai_lives,
        }
    }

    pub fn points(&self, side: Side) -> u32 {
        match side {
            Side::Player => self.player_points,
            Side::Ai => self.ai_points,
        }
    }

    pub fn paddle_hits(&self) -> u32 {
        self.paddle_hits
    }

    fn reset(&mut self) {
        let center = self.config.max_paddle_x() / 2.0;
        self.player_x = center;
        self.ai_x = center;
        self.player_lives = self.config.lives;
        self.ai_lives = self.config.lives;
        self.player_points = 0;
        self.ai_points = 0;
        self.outcome = None;
        self.signals.clear();
        self.serve();
    }

    /// Puts the ball back in the middle at base speed, heading in a random direction.
    fn serve(&mut self) {
        let config = &self.config;
        self.ball = Vec2::new(
            (config.width - config.ball_size) / 2.0,
            (config.height - config.ball_size) / 2.0,
        );
        let sign_x = if self.rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let sign_y = if self.rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let jitter = if config.serve_jitter > 0.0 {
            self.rng.random_range(-config.serve_jitter..config.serve_jitter)
        } else {
            0.0
        };
        self.velocity = Vec2::new(sign_x * config.base_speed + jitter, sign_y * config.base_speed);
        self.paddle_hits = 0;
        self.ball_active = true;
    }

    fn move_player(&mut self, left: f32) -> MoveResult {
        let x = left.clamp(0.0, self.config.max_paddle_x());
        let changed = x != self.player_x;
        self.player_x = x;
        MoveResult::changed_if(changed)
    }

    fn bounce_off_walls(&mut self) {
        let max_x = self.config.width - self.config.ball_size;
        if self.ball.x <= 0.0 {
            self.ball.x = 0.0;
            self.velocity.x = self.velocity.x.abs();
        } else if self.ball.x >= max_x {
            self.ball.x = max_x;
            self.velocity.x = -self.velocity.x.abs();
        }
    }

    /// Reflects the ball off a paddle it is moving towards, a ball already leaving is untouched.
    fn bounce_off_paddles(&mut self) {
        let ball = self.ball();
        let size = self.config.ball_size;
        if self.velocity.y > 0.0 && ball.intersects(&self.paddle(Side::Player)) {
            self.velocity.y = -self.velocity.y;
            self.ball.y = self.config.player_y() - size;
            self.speed_up();
        } else if self.velocity.y < 0.0 && ball.intersects(&self.paddle(Side::Ai)) {
            self.velocity.y = -self.velocity.y;
            self.ball.y = self.config.ai_y() + self.config.paddle_height;
            self.speed_up();
        }
    }

    fn speed_up(&mut self) {
        self.velocity.x *= self.config.speed_up;
        self.velocity.y *= self.config.speed_up;
        self.paddle_hits += 1;
    }

    /// Moves the opponent paddle towards its target at constant speed, never overshooting.
    fn move_ai(&mut self) {
        let config = &self.config;
        let ball_center = self.ball.x + config.ball_size / 2.0;
        let aim = if self.rng.random_bool(config.ai_accuracy) || config.ai_error == 0.0 {
            ball_center
        } else {
            ball_center + self.rng.random_range(-config.ai_error..config.ai_error)
        };
        let target = (aim - config.paddle_width / 2.0).clamp(0.0, config.max_paddle_x());
        let step = (target - self.ai_x).clamp(-config.ai_speed, config.ai_speed);
        self.ai_x = (self.ai_x + step).clamp(0.0, config.max_paddle_x());
    }

    fn lose_point(&mut self, side: Side) -> MoveResult {
        self.ball_active = false;
        let (lives, delay) = match side {
            Side::Player => {
                self.player_lives = self.player_lives.saturating_sub(1);
                self.ai_points += 1;
                self.signals.push(Signal::Cue(Cue::Lose));
                (self.player_lives, self.config.player_respawn_ms)
            }
            Side::Ai => {
                self.ai_lives = self.ai_lives.saturating_sub(1);
                self.player_points += 1;
                (self.ai_lives, self.config.ai_respawn_ms)
            }
        };
        log::debug!(
            "{:?} lost a point, score {}:{}",
            side,
            self.player_points,
            self.ai_points
        );

        if lives == 0 {
            let outcome = match side {
                Side::Player => Outcome::Loss,
                Side::Ai => Outcome::Win,
            };
            self.outcome = Some(outcome);
            return MoveResult::finished(outcome);
        }
        self.signals.push(Signal::After(
            Duration::from_millis(delay),
            TennisEffect::Serve,
        ));
        MoveResult::CHANGED
    }
}

impl Game for Tennis {
    type Config = TennisConfig;
    type Move = TennisMove;
    type Effect = TennisEffect;

    const KIND: GameKind = GameKind::Tennis;

    fn new(config: TennisConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let mut tennis = Self {
            config,
            ball: Vec2::default(),
            velocity: Vec2::default(),
            ball_active: false,
            player_x: 0.0,
            ai_x: 0.0,
            player_lives: 0,
            ai_lives: 0,
            player_points: 0,
            ai_points: 0,
            paddle_hits: 0,
            outcome: None,
            rng: SmallRng::seed_from_u64(seed),
            signals: Vec::new(),
        };
        tennis.reset();
        Ok(tennis)
    }

    fn tick_period(&self) -> Option<Duration> {
        Some(Duration::from_millis(self.config.tick_ms))
    }

    fn map_input(&self, input: RawInput) -> Option<TennisMove> {
        match input {
            RawInput::Drag { x } => Some(TennisMove::MovePaddle { x }),
            RawInput::Arrow(dir @ (Direction::Left | Direction::Right))
            | RawInput::Swipe(dir @ (Direction::Left | Direction::Right)) => {
                Some(TennisMove::Nudge(dir))
            }
            _ => None,
        }
    }

    fn apply_move(&mut self, mv: TennisMove) -> MoveResult {
        if self.outcome.is_some() {
            return MoveResult::NO_CHANGE;
        }
        match mv {
            TennisMove::MovePaddle { x } if x.is_finite() => {
                self.move_player(x - self.config.paddle_width / 2.0)
            }
            TennisMove::MovePaddle { .. } => MoveResult::NO_CHANGE,
            TennisMove::Nudge(dir) => {
                let step = self.config.paddle_width / 2.0;
                let (_, d_col) = dir.delta();
                self.move_player(self.player_x + step * d_col as f32)
            }
        }
    }

    fn tick(&mut self) -> MoveResult {
        if self.outcome.is_some() || !self.ball_active {
            return MoveResult::NO_CHANGE;
        }

        self.ball.x += self.velocity.x;
        self.ball.y += self.velocity.y;
        self.bounce_off_walls();
        self.bounce_off_paddles();

        if self.ball.y > self.config.height {
            return self.lose_point(Side::Player);
        }
        if self.ball.y + self.config.ball_size < 0.0 {
            return self.lose_point(Side::Ai);
        }

        self.move_ai();
        MoveResult::CHANGED
    }

    fn resolve(&mut self, effect: TennisEffect) -> MoveResult {
        match effect {
            TennisEffect::Serve if self.outcome.is_none() && !self.ball_active => {
                self.serve();
                MoveResult::CHANGED
            }
            TennisEffect::Serve => MoveResult::NO_CHANGE,
        }
    }

    fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// The ball is out of play between a lost point and the next serve.
    fn is_resolving(&self) -> bool {
        self.outcome.is_none() && !self.ball_active
    }

    fn take_signals(&mut self) -> Vec<Signal<TennisEffect>> {
        core::mem::take(&mut self.signals)
    }

    fn score(&self) -> Option<Score> {
        (self.outcome.is_some() && self.player_points > 0)
            .then_some(Score::Points(self.player_points))
    }

    fn restart(&mut self) {
        self.reset();
    }
}
