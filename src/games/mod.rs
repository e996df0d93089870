//! Per-game simulation cores
//!
//! Each game is a state struct plus an advance function. All of them are
//! pure and deterministic: seeded RNG only, no platform calls, no rendering.
//! The host owns the frame/tick callback, feeds clamped wall-clock deltas
//! in, and reads the public fields back out to draw.

pub mod asteroids;
pub mod invaders;
pub mod pacman;
pub mod pong;
pub mod snake;
pub mod tetris;
