//! Space Invaders core
//!
//! Delta-time simulation. The formation moves as one rigid block, reversing
//! and stepping down when any member reaches a side margin. Only the
//! bottom-most invader of a column may shoot, and the player is limited to
//! three outstanding bullets. Sound-worthy events go to the audio
//! collaborator and nowhere else.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::audio::{AudioSink, ToneKind};
use crate::input::{Key, Keyboard};
use crate::scheduler::clamp_delta;
use crate::session::{GameLifecycle, Phase};

pub const FIELD_WIDTH: f32 = 600.0;
pub const FIELD_HEIGHT: f32 = 480.0;

pub const COLS: usize = 10;
pub const ROWS: usize = 5;

pub const PLAYER_SPEED: f32 = 280.0;
pub const PLAYER_WIDTH: f32 = 36.0;
pub const PLAYER_HEIGHT: f32 = 14.0;
/// Top edge of the player ship.
pub const PLAYER_Y: f32 = FIELD_HEIGHT - 40.0;
pub const MAX_PLAYER_BULLETS: usize = 3;

pub const BULLET_SPEED: f32 = 420.0;
pub const INVADER_BULLET_SPEED: f32 = 220.0;
pub const BULLET_WIDTH: f32 = 4.0;
pub const BULLET_HEIGHT: f32 = 10.0;

pub const INVADER_MOVE_SPEED: f32 = 28.0;
pub const INVADER_DROP: f32 = 18.0;
pub const INVADER_SHOT_INTERVAL: f32 = 0.9;
pub const SIDE_MARGIN: f32 = 16.0;

pub const STARTING_LIVES: u32 = 3;

// Formation geometry: the grid takes 80% of the field width, gaps are 0.4
// of a cell slot, both floored to whole units.
pub const INVADER_GAP: f32 = 19.0;
pub const INVADER_WIDTH: f32 = 30.0;
pub const INVADER_HEIGHT: f32 = 21.0;
const FORMATION_START_Y: f32 = 40.0;

#[derive(Debug, Clone, Copy)]
pub struct Invader {
    /// Top-left corner.
    pub pos: Vec2,
    pub row: usize,
    pub col: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Bullet {
    /// Top-left corner; size is [`BULLET_WIDTH`] x [`BULLET_HEIGHT`].
    pub pos: Vec2,
}

/// Per-frame input: held movement plus a fire press edge.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvadersInput {
    pub left: bool,
    pub right: bool,
    pub fire: bool,
    /// Direct horizontal drag from a touch gesture.
    pub drag_dx: f32,
}

impl InvadersInput {
    /// Sample the held keys and drain this frame's press edges; a tap on
    /// the touch surface also maps to `fire`.
    pub fn from_keyboard(keyboard: &mut Keyboard) -> Self {
        let mut input = Self {
            left: keyboard.is_held(Key::Left),
            right: keyboard.is_held(Key::Right),
            fire: false,
            drag_dx: 0.0,
        };
        for key in keyboard.take_pressed() {
            if key == Key::Fire {
                input.fire = true;
            }
        }
        input
    }
}

#[derive(Debug)]
pub struct InvadersState {
    pub phase: Phase,
    /// Player ship center x.
    pub player_x: f32,
    pub invaders: Vec<Invader>,
    pub player_bullets: Vec<Bullet>,
    pub invader_bullets: Vec<Bullet>,
    pub score: u64,
    pub level: u32,
    pub lives: u32,
    direction: f32,
    speed: f32,
    shot_clock: f32,
    rng: Pcg32,
}

fn axis_aligned_overlap(a_pos: Vec2, a_size: Vec2, b_pos: Vec2, b_size: Vec2) -> bool {
    a_pos.x < b_pos.x + b_size.x
        && a_pos.x + a_size.x > b_pos.x
        && a_pos.y < b_pos.y + b_size.y
        && a_pos.y + a_size.y > b_pos.y
}

impl InvadersState {
    pub fn new(seed: u64) -> Self {
        let mut state = Self {
            phase: Phase::Idle,
            player_x: FIELD_WIDTH / 2.0,
            invaders: Vec::new(),
            player_bullets: Vec::new(),
            invader_bullets: Vec::new(),
            score: 0,
            level: 1,
            lives: STARTING_LIVES,
            direction: 1.0,
            speed: INVADER_MOVE_SPEED,
            shot_clock: 0.0,
            rng: Pcg32::seed_from_u64(seed),
        };
        state.reset_formation();
        state
    }

    /// Rebuild the formation for the current level. Score and lives stay.
    fn reset_formation(&mut self) {
        self.player_x = FIELD_WIDTH / 2.0;
        self.player_bullets.clear();
        self.invader_bullets.clear();
        self.direction = 1.0;
        self.speed = INVADER_MOVE_SPEED + self.level as f32 * 6.0;
        self.shot_clock = 0.0;

        let formation_width =
            INVADER_WIDTH * COLS as f32 + INVADER_GAP * (COLS as f32 - 1.0);
        let start_x = (FIELD_WIDTH - formation_width) / 2.0;

        self.invaders.clear();
        for row in 0..ROWS {
            for col in 0..COLS {
                self.invaders.push(Invader {
                    pos: Vec2::new(
                        start_x + col as f32 * (INVADER_WIDTH + INVADER_GAP),
                        FORMATION_START_Y + row as f32 * (INVADER_HEIGHT + INVADER_GAP),
                    ),
                    row,
                    col,
                });
            }
        }
    }

    fn player_rect(&self) -> (Vec2, Vec2) {
        (
            Vec2::new(self.player_x - PLAYER_WIDTH / 2.0, PLAYER_Y),
            Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT),
        )
    }

    fn step_player(&mut self, input: &InvadersInput, dt: f32) {
        if input.left {
            self.player_x -= PLAYER_SPEED * dt;
        } else if input.right {
            self.player_x += PLAYER_SPEED * dt;
        }
        self.player_x += input.drag_dx;
        // Clamp boundary policy: the ship never leaves the field
        self.player_x = self
            .player_x
            .clamp(PLAYER_WIDTH / 2.0, FIELD_WIDTH - PLAYER_WIDTH / 2.0);
    }

    fn shoot(&mut self, audio: &mut dyn AudioSink) {
        if self.player_bullets.len() >= MAX_PLAYER_BULLETS {
            return;
        }
        self.player_bullets.push(Bullet {
            pos: Vec2::new(self.player_x - BULLET_WIDTH / 2.0, PLAYER_Y - BULLET_HEIGHT),
        });
        audio.play_tone(ToneKind::Shoot);
    }

    fn step_invaders(&mut self, dt: f32) {
        if self.invaders.is_empty() {
            return;
        }
        let dx = self.direction * self.speed * dt;
        for invader in &mut self.invaders {
            invader.pos.x += dx;
        }

        let left_most = self.invaders.iter().map(|i| i.pos.x).fold(f32::MAX, f32::min);
        let right_most = self
            .invaders
            .iter()
            .map(|i| i.pos.x + INVADER_WIDTH)
            .fold(f32::MIN, f32::max);
        let bottom_most = self
            .invaders
            .iter()
            .map(|i| i.pos.y + INVADER_HEIGHT)
            .fold(f32::MIN, f32::max);

        if left_most <= SIDE_MARGIN || right_most >= FIELD_WIDTH - SIDE_MARGIN {
            // Undo the move, step the whole block down, reverse
            for invader in &mut self.invaders {
                invader.pos.x -= dx;
                invader.pos.y += INVADER_DROP;
            }
            self.direction = -self.direction;
        }

        if bottom_most >= PLAYER_Y - 10.0 {
            self.phase = Phase::GameOver;
            log::info!("invaders reached the ground, score {}", self.score);
        }
    }

    /// The bottom-most invader of a random occupied column fires.
    fn invader_shot(&mut self) {
        let mut front: [Option<usize>; COLS] = [None; COLS];
        for (i, invader) in self.invaders.iter().enumerate() {
            match front[invader.col] {
                Some(j) if self.invaders[j].pos.y >= invader.pos.y => {}
                _ => front[invader.col] = Some(i),
            }
        }
        let shooters: Vec<usize> = front.iter().flatten().copied().collect();
        if shooters.is_empty() {
            return;
        }
        let shooter = &self.invaders[shooters[self.rng.random_range(0..shooters.len())]];
        self.invader_bullets.push(Bullet {
            pos: Vec2::new(
                shooter.pos.x + INVADER_WIDTH / 2.0 - BULLET_WIDTH / 2.0,
                shooter.pos.y + INVADER_HEIGHT,
            ),
        });
    }

    fn step_bullets(&mut self, dt: f32) {
        for bullet in &mut self.player_bullets {
            bullet.pos.y -= BULLET_SPEED * dt;
        }
        self.player_bullets.retain(|b| b.pos.y + BULLET_HEIGHT > 0.0);

        for bullet in &mut self.invader_bullets {
            bullet.pos.y += INVADER_BULLET_SPEED * dt;
        }
        self.invader_bullets
            .retain(|b| b.pos.y < FIELD_HEIGHT + BULLET_HEIGHT);
    }

    fn handle_collisions(&mut self, audio: &mut dyn AudioSink) {
        let bullet_size = Vec2::new(BULLET_WIDTH, BULLET_HEIGHT);
        let invader_size = Vec2::new(INVADER_WIDTH, INVADER_HEIGHT);

        // Collect hits, then filter, so the scan sees a stable set
        let mut dead_bullets = vec![false; self.player_bullets.len()];
        let mut dead_invaders = vec![false; self.invaders.len()];
        for (bi, bullet) in self.player_bullets.iter().enumerate() {
            for (ii, invader) in self.invaders.iter().enumerate() {
                if dead_bullets[bi] || dead_invaders[ii] {
                    continue;
                }
                if axis_aligned_overlap(bullet.pos, bullet_size, invader.pos, invader_size) {
                    dead_bullets[bi] = true;
                    dead_invaders[ii] = true;
                    self.score += 10 + (ROWS - invader.row) as u64 * 2;
                    audio.play_tone(ToneKind::Hit);
                }
            }
        }
        let mut keep = dead_bullets.iter().map(|d| !d);
        self.player_bullets.retain(|_| keep.next().unwrap());
        let mut keep = dead_invaders.iter().map(|d| !d);
        self.invaders.retain(|_| keep.next().unwrap());

        let (player_pos, player_size) = self.player_rect();
        let hit = self
            .invader_bullets
            .iter()
            .any(|b| axis_aligned_overlap(b.pos, bullet_size, player_pos, player_size));
        if hit {
            audio.play_tone(ToneKind::Damage);
            self.lose_life();
        }
    }

    fn lose_life(&mut self) {
        self.lives -= 1;
        if self.lives == 0 {
            self.phase = Phase::GameOver;
            log::info!("invaders over, score {}", self.score);
            return;
        }
        self.player_x = FIELD_WIDTH / 2.0;
        self.invader_bullets.clear();
    }
}

impl GameLifecycle for InvadersState {
    fn phase(&self) -> Phase {
        self.phase
    }

    fn start(&mut self) {
        if !self.phase.can_start() {
            return;
        }
        self.score = 0;
        self.level = 1;
        self.lives = STARTING_LIVES;
        self.reset_formation();
        self.phase = Phase::Playing;
    }

    fn pause(&mut self) {
        self.phase.pause();
    }

    fn resume(&mut self) {
        self.phase.resume();
    }
}

/// Advance the simulation by one frame.
pub fn tick(state: &mut InvadersState, input: &InvadersInput, dt: f32, audio: &mut dyn AudioSink) {
    if !state.phase.is_playing() {
        return;
    }
    let dt = clamp_delta(dt);

    state.step_player(input, dt);
    if input.fire {
        state.shoot(audio);
    }

    state.step_invaders(dt);
    if !state.phase.is_playing() {
        return;
    }

    state.shot_clock += dt;
    if state.shot_clock >= INVADER_SHOT_INTERVAL {
        state.shot_clock = 0.0;
        state.invader_shot();
    }

    state.step_bullets(dt);
    state.handle_collisions(audio);

    if state.invaders.is_empty() && state.phase.is_playing() {
        state.level += 1;
        state.reset_formation();
    }
}
