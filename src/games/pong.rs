//! Pong core
//!
//! Delta-time simulation: player paddle vs a tracking AI. Ball speed grows
//! on every paddle bounce up to the difficulty cap; bounce angle is
//! proportional to where on the paddle the contact happened. First to
//! seven points ends the match.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::input::{Key, Keyboard};
use crate::scheduler::clamp_delta;
use crate::session::{GameLifecycle, Phase};
use crate::settings::Difficulty;

/// Logical playfield (units).
pub const FIELD_WIDTH: f32 = 640.0;
pub const FIELD_HEIGHT: f32 = 400.0;

pub const WIN_SCORE: u32 = 7;
pub const PADDLE_MARGIN: f32 = 16.0;
pub const PADDLE_WIDTH: f32 = 10.0;
/// 18% of the field height, floored at 50.
pub const PADDLE_HEIGHT: f32 = 72.0;
pub const BALL_SIZE: f32 = 10.0;
pub const BALL_START_SPEED: f32 = 252.0;
pub const BALL_SPEED_INCREMENT: f32 = 12.0;
pub const PLAYER_SPEED: f32 = 360.0;

/// Maximum deflection off a paddle edge (radians).
const MAX_BOUNCE_ANGLE: f32 = std::f32::consts::FRAC_PI_4;

/// Who won the finished match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    PlayerWins,
    CpuWins,
}

/// Vertical paddle, stored by its top edge.
#[derive(Debug, Clone, Copy)]
pub struct Paddle {
    pub x: f32,
    pub y: f32,
}

impl Paddle {
    fn centered(x: f32) -> Self {
        Self {
            x,
            y: (FIELD_HEIGHT - PADDLE_HEIGHT) / 2.0,
        }
    }

    pub fn center(&self) -> f32 {
        self.y + PADDLE_HEIGHT / 2.0
    }

    fn clamp(&mut self) {
        self.y = self.y.clamp(0.0, FIELD_HEIGHT - PADDLE_HEIGHT);
    }
}

/// The ball, stored by its top-left corner like the paddles.
#[derive(Debug, Clone, Copy)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    pub speed: f32,
}

impl Ball {
    pub fn center_y(&self) -> f32 {
        self.pos.y + BALL_SIZE / 2.0
    }
}

/// Per-tick input. Held keys move the paddle; a pointer position overrides
/// them and maps directly to the paddle center (the single direct-write
/// input path in the crate).
#[derive(Debug, Clone, Copy, Default)]
pub struct PongInput {
    pub up: bool,
    pub down: bool,
    pub pointer_y: Option<f32>,
}

impl PongInput {
    /// Sample the held movement keys; the host sets `pointer_y` when a
    /// pointer or touch drag is active.
    pub fn from_keyboard(keyboard: &Keyboard) -> Self {
        Self {
            up: keyboard.is_held(Key::Up),
            down: keyboard.is_held(Key::Down),
            pointer_y: None,
        }
    }
}

#[derive(Debug)]
pub struct PongState {
    pub phase: Phase,
    pub player: Paddle,
    pub cpu: Paddle,
    pub ball: Ball,
    pub player_score: u32,
    pub cpu_score: u32,
    pub difficulty: Difficulty,
    pub outcome: Option<Outcome>,
    /// Ball position the AI last looked at; refreshed every reaction period.
    ai_target: f32,
    ai_clock: f32,
    rng: Pcg32,
}

impl PongState {
    pub fn new(seed: u64, difficulty: Difficulty) -> Self {
        let mut state = Self {
            phase: Phase::Idle,
            player: Paddle::centered(PADDLE_MARGIN),
            cpu: Paddle::centered(FIELD_WIDTH - PADDLE_MARGIN - PADDLE_WIDTH),
            ball: Ball {
                pos: Vec2::ZERO,
                vel: Vec2::ZERO,
                speed: BALL_START_SPEED,
            },
            player_score: 0,
            cpu_score: 0,
            difficulty,
            outcome: None,
            ai_target: FIELD_HEIGHT / 2.0,
            ai_clock: 0.0,
            rng: Pcg32::seed_from_u64(seed),
        };
        let dir = if state.rng.random::<bool>() { 1.0 } else { -1.0 };
        state.reset_ball(dir);
        state
    }

    /// Center the ball and serve toward `direction` (+1 right, -1 left)
    /// with a random vertical component.
    fn reset_ball(&mut self, direction: f32) {
        let vy = BALL_START_SPEED * (self.rng.random::<f32>() * 1.5 - 0.75);
        self.ball = Ball {
            pos: Vec2::new(
                (FIELD_WIDTH - BALL_SIZE) / 2.0,
                (FIELD_HEIGHT - BALL_SIZE) / 2.0,
            ),
            vel: Vec2::new(BALL_START_SPEED * direction, vy),
            speed: BALL_START_SPEED,
        };
    }

    fn paddle_overlap(&self, paddle: Paddle) -> bool {
        let b = &self.ball;
        b.pos.x < paddle.x + PADDLE_WIDTH
            && b.pos.x + BALL_SIZE > paddle.x
            && b.pos.y < paddle.y + PADDLE_HEIGHT
            && b.pos.y + BALL_SIZE > paddle.y
    }

    /// Reflect off a paddle. Contact offset from the paddle center picks
    /// the bounce angle; speed grows by the increment up to the cap.
    fn reflect(&mut self, paddle_center: f32, paddle_x: f32, direction: f32) {
        let offset = ((self.ball.center_y() - paddle_center) / (PADDLE_HEIGHT / 2.0))
            .clamp(-1.0, 1.0);
        let angle = offset * MAX_BOUNCE_ANGLE;
        let speed = (self.ball.speed + BALL_SPEED_INCREMENT).min(self.difficulty.ball_speed_cap());

        self.ball.speed = speed;
        self.ball.vel = Vec2::new(speed * angle.cos() * direction, speed * angle.sin());

        // Reposition flush with the paddle face so one contact is one bounce
        self.ball.pos.x = if direction > 0.0 {
            paddle_x + PADDLE_WIDTH
        } else {
            paddle_x - BALL_SIZE
        };
    }

    fn step_player(&mut self, input: &PongInput, dt: f32) {
        if let Some(y) = input.pointer_y {
            self.player.y = y - PADDLE_HEIGHT / 2.0;
        } else if input.up {
            self.player.y -= PLAYER_SPEED * dt;
        } else if input.down {
            self.player.y += PLAYER_SPEED * dt;
        }
        self.player.clamp();
    }

    fn step_cpu(&mut self, dt: f32) {
        self.ai_clock += dt;
        if self.ai_clock >= self.difficulty.ai_reaction() {
            self.ai_clock = 0.0;
            self.ai_target = self.ball.center_y();
        }

        let speed = self.difficulty.ai_speed();
        let diff = self.ai_target - self.cpu.center();
        let step = speed * dt;
        if diff.abs() <= step {
            self.cpu.y += diff;
        } else {
            self.cpu.y += step * diff.signum();
        }
        self.cpu.clamp();
    }

    fn step_ball(&mut self, dt: f32) {
        self.ball.pos += self.ball.vel * dt;

        // Top/bottom walls reflect and clamp
        if self.ball.pos.y <= 0.0 || self.ball.pos.y + BALL_SIZE >= FIELD_HEIGHT {
            self.ball.vel.y = -self.ball.vel.y;
            self.ball.pos.y = self.ball.pos.y.clamp(0.0, FIELD_HEIGHT - BALL_SIZE);
        }

        if self.ball.vel.x < 0.0 && self.paddle_overlap(self.player) {
            self.reflect(self.player.center(), self.player.x, 1.0);
        } else if self.ball.vel.x > 0.0 && self.paddle_overlap(self.cpu) {
            self.reflect(self.cpu.center(), self.cpu.x, -1.0);
        }

        // Out of bounds terminates the rally, not a silent correction
        if self.ball.pos.x + BALL_SIZE < 0.0 {
            self.cpu_score += 1;
            if self.cpu_score >= WIN_SCORE {
                self.finish(Outcome::CpuWins);
            } else {
                self.reset_ball(1.0);
            }
        } else if self.ball.pos.x > FIELD_WIDTH {
            self.player_score += 1;
            if self.player_score >= WIN_SCORE {
                self.finish(Outcome::PlayerWins);
            } else {
                self.reset_ball(-1.0);
            }
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
        self.phase = Phase::GameOver;
        log::info!("pong over: {:?} {}-{}", outcome, self.player_score, self.cpu_score);
    }
}

impl GameLifecycle for PongState {
    fn phase(&self) -> Phase {
        self.phase
    }

    fn start(&mut self) {
        if !self.phase.can_start() {
            return;
        }
        self.player_score = 0;
        self.cpu_score = 0;
        self.outcome = None;
        self.player = Paddle::centered(PADDLE_MARGIN);
        self.cpu = Paddle::centered(FIELD_WIDTH - PADDLE_MARGIN - PADDLE_WIDTH);
        self.ai_target = FIELD_HEIGHT / 2.0;
        self.ai_clock = 0.0;
        let dir = if self.rng.random::<bool>() { 1.0 } else { -1.0 };
        self.reset_ball(dir);
        self.phase = Phase::Playing;
    }

    fn pause(&mut self) {
        self.phase.pause();
    }

    fn resume(&mut self) {
        self.phase.resume();
    }
}

/// Advance the match by one frame.
pub fn tick(state: &mut PongState, input: &PongInput, dt: f32) {
    if !state.phase.is_playing() {
        return;
    }
    let dt = clamp_delta(dt);

    state.step_player(input, dt);
    state.step_cpu(dt);
    state.step_ball(dt);
}
