//! Asteroids core
//!
//! Delta-time simulation with toroidal wrapping. Thrust integrates into a
//! damped velocity; rocks split into two smaller children until the last
//! size tier. The ship gets a short invulnerability window after each
//! respawn. Hits are collected first and applied afterwards so nothing is
//! removed out from under the pairwise scan.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::input::{Key, Keyboard, Zone};
use crate::scheduler::clamp_delta;
use crate::session::{GameLifecycle, Phase};
use crate::wrap_coord;

pub const FIELD_WIDTH: f32 = 800.0;
pub const FIELD_HEIGHT: f32 = 600.0;
/// Sprites fully leave the field before reappearing on the far side.
pub const WRAP_MARGIN: f32 = 20.0;

pub const ROTATE_SPEED: f32 = 3.2;
pub const THRUST: f32 = 220.0;
/// Per-frame friction at a 60 Hz reference, applied as pow(dt * 60).
pub const FRICTION: f32 = 0.985;
pub const SHIP_RADIUS: f32 = 10.0;
pub const RESPAWN_INVULN_SECS: f32 = 2.0;

pub const BULLET_SPEED: f32 = 420.0;
pub const BULLET_LIFE: f32 = 1.1;

/// Radius per size tier; a destroyed rock spawns two of the next tier.
pub const ASTEROID_SIZES: [f32; 3] = [48.0, 28.0, 16.0];
/// Score per size tier.
pub const SCORE_VALUES: [u64; 3] = [20, 50, 100];
pub const ASTEROID_SPEED: f32 = 70.0;
pub const ASTEROID_DRIFT: f32 = 120.0;
/// Rocks never spawn this close to the ship.
pub const SAFE_SPAWN_RADIUS: f32 = 120.0;

pub const STARTING_LIVES: u32 = 3;
pub const STARTING_ASTEROIDS: usize = 5;

#[derive(Debug, Clone, Copy)]
pub struct Ship {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Heading in radians; -PI/2 points up.
    pub angle: f32,
    pub thrusting: bool,
    /// Seconds of post-respawn invulnerability left.
    pub invulnerable: f32,
}

impl Ship {
    fn spawn() -> Self {
        Self {
            pos: Vec2::new(FIELD_WIDTH / 2.0, FIELD_HEIGHT / 2.0),
            vel: Vec2::ZERO,
            angle: -std::f32::consts::FRAC_PI_2,
            thrusting: false,
            invulnerable: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Bullet {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct Asteroid {
    pub pos: Vec2,
    pub vel: Vec2,
    pub tier: usize,
}

impl Asteroid {
    pub fn radius(&self) -> f32 {
        ASTEROID_SIZES[self.tier]
    }
}

/// Per-frame input. Rotation and thrust are sampled from held keys or touch
/// zones; `fire` is a press edge.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsteroidsInput {
    pub rotate_left: bool,
    pub rotate_right: bool,
    pub thrust: bool,
    pub fire: bool,
}

impl AsteroidsInput {
    /// Sample the held keys and drain this frame's press edges.
    pub fn from_keyboard(keyboard: &mut Keyboard) -> Self {
        let mut input = Self {
            rotate_left: keyboard.is_held(Key::Left),
            rotate_right: keyboard.is_held(Key::Right),
            thrust: keyboard.is_held(Key::Up),
            fire: false,
        };
        for key in keyboard.take_pressed() {
            if key == Key::Fire {
                input.fire = true;
            }
        }
        input
    }

    /// Fold in a held touch zone (a tap elsewhere maps to `fire`).
    pub fn apply_zone(&mut self, zone: Option<Zone>) {
        match zone {
            Some(Zone::Thrust) => self.thrust = true,
            Some(Zone::TurnLeft) => self.rotate_left = true,
            Some(Zone::TurnRight) => self.rotate_right = true,
            None => {}
        }
    }
}

#[derive(Debug)]
pub struct AsteroidsState {
    pub phase: Phase,
    pub ship: Ship,
    pub bullets: Vec<Bullet>,
    pub asteroids: Vec<Asteroid>,
    pub score: u64,
    pub lives: u32,
    pub level: u32,
    rng: Pcg32,
}

impl AsteroidsState {
    pub fn new(seed: u64) -> Self {
        let mut state = Self {
            phase: Phase::Idle,
            ship: Ship::spawn(),
            bullets: Vec::new(),
            asteroids: Vec::new(),
            score: 0,
            lives: STARTING_LIVES,
            level: 1,
            rng: Pcg32::seed_from_u64(seed),
        };
        state.spawn_wave(STARTING_ASTEROIDS);
        state
    }

    fn random_asteroid(&mut self, pos: Vec2, tier: usize) -> Asteroid {
        let angle = self.rng.random::<f32>() * std::f32::consts::TAU;
        let speed = ASTEROID_SPEED + self.rng.random::<f32>() * ASTEROID_DRIFT;
        Asteroid {
            pos,
            vel: Vec2::from_angle(angle) * speed,
            tier,
        }
    }

    /// Spawn `count` large rocks, re-rolling any position that lands inside
    /// the safe radius around the ship.
    fn spawn_wave(&mut self, count: usize) {
        let mut spawned = 0;
        while spawned < count {
            let pos = Vec2::new(
                self.rng.random::<f32>() * FIELD_WIDTH,
                self.rng.random::<f32>() * FIELD_HEIGHT,
            );
            if pos.distance(self.ship.pos) < SAFE_SPAWN_RADIUS {
                continue;
            }
            let rock = self.random_asteroid(pos, 0);
            self.asteroids.push(rock);
            spawned += 1;
        }
    }

    /// Fire a bullet from the nose, inheriting part of the ship's velocity.
    fn shoot(&mut self) {
        let heading = Vec2::from_angle(self.ship.angle);
        self.bullets.push(Bullet {
            pos: self.ship.pos + heading * (SHIP_RADIUS + 4.0),
            vel: heading * BULLET_SPEED + self.ship.vel * 0.4,
            life: BULLET_LIFE,
        });
    }

    fn wrap(pos: &mut Vec2) {
        pos.x = wrap_coord(pos.x, FIELD_WIDTH, WRAP_MARGIN);
        pos.y = wrap_coord(pos.y, FIELD_HEIGHT, WRAP_MARGIN);
    }

    fn step_ship(&mut self, input: &AsteroidsInput, dt: f32) {
        if input.rotate_left {
            self.ship.angle -= ROTATE_SPEED * dt;
        }
        if input.rotate_right {
            self.ship.angle += ROTATE_SPEED * dt;
        }

        self.ship.thrusting = input.thrust;
        if input.thrust {
            self.ship.vel += Vec2::from_angle(self.ship.angle) * THRUST * dt;
        }

        // Frame-rate independent damping
        let damping = FRICTION.powf(dt * 60.0);
        self.ship.vel *= damping;

        self.ship.pos += self.ship.vel * dt;
        Self::wrap(&mut self.ship.pos);

        self.ship.invulnerable = (self.ship.invulnerable - dt).max(0.0);
    }

    fn step_bullets(&mut self, dt: f32) {
        for bullet in &mut self.bullets {
            bullet.pos += bullet.vel * dt;
            bullet.life -= dt;
            Self::wrap(&mut bullet.pos);
        }
        self.bullets.retain(|b| b.life > 0.0);
    }

    fn step_asteroids(&mut self, dt: f32) {
        for rock in &mut self.asteroids {
            rock.pos += rock.vel * dt;
            Self::wrap(&mut rock.pos);
        }
    }

    fn handle_collisions(&mut self) {
        // Mark hits first, mutate after: the pairwise scan never observes a
        // half-updated collection
        let mut dead_bullets = vec![false; self.bullets.len()];
        let mut hit_rocks = vec![false; self.asteroids.len()];

        for (bi, bullet) in self.bullets.iter().enumerate() {
            for (ai, rock) in self.asteroids.iter().enumerate() {
                if dead_bullets[bi] || hit_rocks[ai] {
                    continue;
                }
                if bullet.pos.distance(rock.pos) < rock.radius() {
                    dead_bullets[bi] = true;
                    hit_rocks[ai] = true;
                }
            }
        }

        let mut children = Vec::new();
        for (ai, rock) in self.asteroids.iter().enumerate() {
            if hit_rocks[ai] {
                self.score += SCORE_VALUES[rock.tier];
                if rock.tier + 1 < ASTEROID_SIZES.len() {
                    children.push((rock.pos, rock.tier + 1));
                    children.push((rock.pos, rock.tier + 1));
                }
            }
        }

        let mut keep = hit_rocks.iter().map(|h| !h);
        self.asteroids.retain(|_| keep.next().unwrap());
        let mut keep = dead_bullets.iter().map(|d| !d);
        self.bullets.retain(|_| keep.next().unwrap());

        for (pos, tier) in children {
            let child = self.random_asteroid(pos, tier);
            self.asteroids.push(child);
        }

        if self.ship.invulnerable > 0.0 {
            return;
        }
        let hit = self
            .asteroids
            .iter()
            .any(|rock| rock.pos.distance(self.ship.pos) < rock.radius() + SHIP_RADIUS);
        if hit {
            self.ship_hit();
        }
    }

    fn ship_hit(&mut self) {
        self.lives -= 1;
        if self.lives == 0 {
            self.phase = Phase::GameOver;
            log::info!("asteroids over, score {}", self.score);
            return;
        }
        self.ship = Ship::spawn();
        self.ship.invulnerable = RESPAWN_INVULN_SECS;
        self.bullets.clear();
    }
}

impl GameLifecycle for AsteroidsState {
    fn phase(&self) -> Phase {
        self.phase
    }

    fn start(&mut self) {
        if !self.phase.can_start() {
            return;
        }
        self.score = 0;
        self.lives = STARTING_LIVES;
        self.level = 1;
        self.ship = Ship::spawn();
        self.bullets.clear();
        self.asteroids.clear();
        self.spawn_wave(STARTING_ASTEROIDS);
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
pub fn tick(state: &mut AsteroidsState, input: &AsteroidsInput, dt: f32) {
    if !state.phase.is_playing() {
        return;
    }
    let dt = clamp_delta(dt);

    if input.fire {
        state.shoot();
    }
    state.step_ship(input, dt);
    state.step_bullets(dt);
    state.step_asteroids(dt);
    state.handle_collisions();

    if state.asteroids.is_empty() && state.phase.is_playing() {
        state.level += 1;
        let count = STARTING_ASTEROIDS + state.level as usize;
        state.spawn_wave(count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing_state() -> AsteroidsState {
        let mut state = AsteroidsState::new(123);
        state.start();
        state
    }

    #[test]
    fn test_large_rock_splits_into_two() {
        let mut state = playing_state();
        state.asteroids.clear();
        state.asteroids.push(Asteroid {
            pos: Vec2::new(400.0, 100.0),
            vel: Vec2::ZERO,
            tier: 0,
        });
        state.bullets.push(Bullet {
            pos: Vec2::new(400.0, 100.0),
            vel: Vec2::ZERO,
            life: 1.0,
        });

        state.handle_collisions();

        assert_eq!(state.score, SCORE_VALUES[0]);
        assert!(state.bullets.is_empty());
        assert_eq!(state.asteroids.len(), 2);
        for child in &state.asteroids {
            assert_eq!(child.tier, 1);
            assert_eq!(child.pos, Vec2::new(400.0, 100.0));
        }
        // Independent random headings
        assert_ne!(state.asteroids[0].vel, state.asteroids[1].vel);
    }

    #[test]
    fn test_smallest_rock_just_dies() {
        let mut state = playing_state();
        state.asteroids.clear();
        state.asteroids.push(Asteroid {
            pos: Vec2::new(200.0, 200.0),
            vel: Vec2::ZERO,
            tier: 2,
        });
        state.bullets.push(Bullet {
            pos: Vec2::new(200.0, 200.0),
            vel: Vec2::ZERO,
            life: 1.0,
        });

        state.handle_collisions();
        assert!(state.asteroids.is_empty());
        assert_eq!(state.score, SCORE_VALUES[2]);
    }

    #[test]
    fn test_one_bullet_kills_once() {
        let mut state = playing_state();
        state.asteroids.clear();
        // Two overlapping rocks; one bullet may only take one of them
        for _ in 0..2 {
            state.asteroids.push(Asteroid {
                pos: Vec2::new(300.0, 300.0),
                vel: Vec2::ZERO,
                tier: 2,
            });
        }
        state.bullets.push(Bullet {
            pos: Vec2::new(300.0, 300.0),
            vel: Vec2::ZERO,
            life: 1.0,
        });

        state.handle_collisions();
        assert_eq!(state.asteroids.len(), 1);
        assert_eq!(state.score, SCORE_VALUES[2]);
    }

    #[test]
    fn test_ship_hit_respawns_invulnerable() {
        let mut state = playing_state();
        state.asteroids.clear();
        state.ship.pos = Vec2::new(100.0, 100.0);
        state.ship.invulnerable = 0.0;
        state.asteroids.push(Asteroid {
            pos: Vec2::new(100.0, 100.0),
            vel: Vec2::ZERO,
            tier: 0,
        });
        state.bullets.push(Bullet {
            pos: Vec2::new(700.0, 500.0),
            vel: Vec2::ZERO,
            life: 1.0,
        });

        state.handle_collisions();

        assert_eq!(state.lives, STARTING_LIVES - 1);
        assert_eq!(state.ship.pos, Vec2::new(FIELD_WIDTH / 2.0, FIELD_HEIGHT / 2.0));
        assert_eq!(state.ship.invulnerable, RESPAWN_INVULN_SECS);
        assert!(state.bullets.is_empty());

        // The fresh window absorbs the overlap at the old position
        state.ship.pos = Vec2::new(100.0, 100.0);
        state.handle_collisions();
        assert_eq!(state.lives, STARTING_LIVES - 1);
    }

    #[test]
    fn test_last_life_ends_game() {
        let mut state = playing_state();
        state.lives = 1;
        state.asteroids.clear();
        state.asteroids.push(Asteroid {
            pos: state.ship.pos,
            vel: Vec2::ZERO,
            tier: 0,
        });
        state.ship.invulnerable = 0.0;

        state.handle_collisions();
        assert_eq!(state.phase, Phase::GameOver);
    }

    #[test]
    fn test_wrap_keeps_actors_in_band() {
        let mut pos = Vec2::new(-WRAP_MARGIN - 5.0, 300.0);
        AsteroidsState::wrap(&mut pos);
        assert_eq!(pos.x, FIELD_WIDTH + WRAP_MARGIN);

        let mut pos = Vec2::new(400.0, FIELD_HEIGHT + WRAP_MARGIN + 1.0);
        AsteroidsState::wrap(&mut pos);
        assert_eq!(pos.y, -WRAP_MARGIN);
    }

    #[test]
    fn test_bullets_expire() {
        let mut state = playing_state();
        state.asteroids.clear();
        state.bullets.push(Bullet {
            pos: Vec2::new(400.0, 300.0),
            vel: Vec2::ZERO,
            life: 0.03,
        });
        state.step_bullets(0.05);
        assert!(state.bullets.is_empty());
    }

    #[test]
    fn test_fire_spawns_bullet_at_nose() {
        let mut state = playing_state();
        state.asteroids.clear();
        state.bullets.clear();
        state.shoot();
        assert_eq!(state.bullets.len(), 1);
        let bullet = state.bullets[0];
        // Ship faces up: bullet starts above the ship and flies upward
        assert!(bullet.pos.y < state.ship.pos.y);
        assert!(bullet.vel.y < 0.0);
    }

    #[test]
    fn test_wave_spawn_avoids_ship() {
        let mut state = playing_state();
        for rock in &state.asteroids {
            assert!(rock.pos.distance(state.ship.pos) >= SAFE_SPAWN_RADIUS);
        }
    }

    #[test]
    fn test_clearing_wave_advances_level() {
        let mut state = playing_state();
        state.asteroids.clear();
        state.ship.invulnerable = RESPAWN_INVULN_SECS;
        tick(&mut state, &AsteroidsInput::default(), 0.016);
        assert_eq!(state.level, 2);
        assert_eq!(state.asteroids.len(), STARTING_ASTEROIDS + 2);
    }

    #[test]
    fn test_thrust_and_damping() {
        let mut state = playing_state();
        state.asteroids.clear();
        let input = AsteroidsInput {
            thrust: true,
            ..Default::default()
        };
        state.step_ship(&input, 0.016);
        assert!(state.ship.vel.length() > 0.0);
        assert!(state.ship.thrusting);

        let speed = state.ship.vel.length();
        let coast = AsteroidsInput::default();
        state.step_ship(&coast, 0.016);
        assert!(state.ship.vel.length() < speed);
        assert!(!state.ship.thrusting);
    }

    #[test]
    fn test_keyboard_mapping() {
        let mut kb = Keyboard::new();
        kb.key_down(Key::Left);
        kb.key_down(Key::Up);
        kb.key_down(Key::Fire);

        let input = AsteroidsInput::from_keyboard(&mut kb);
        assert!(input.rotate_left);
        assert!(input.thrust);
        assert!(input.fire);

        // Fire is an edge: still held, but not re-fired next frame
        let input = AsteroidsInput::from_keyboard(&mut kb);
        assert!(input.thrust);
        assert!(!input.fire);
    }

    #[test]
    fn test_touch_zone_mapping() {
        let mut input = AsteroidsInput::default();
        input.apply_zone(Some(Zone::Thrust));
        assert!(input.thrust);
        input.apply_zone(Some(Zone::TurnLeft));
        assert!(input.rotate_left);
    }

    #[test]
    fn test_paused_state_is_inert() {
        let mut state = playing_state();
        state.pause();
        let before = state.ship.pos;
        let input = AsteroidsInput {
            thrust: true,
            fire: true,
            ..Default::default()
        };
        tick(&mut state, &input, 0.016);
        assert_eq!(state.ship.pos, before);
        assert!(state.bullets.is_empty());
    }
}
