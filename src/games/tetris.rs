//! Tetris core
//!
//! Fixed-interval gravity with a level-dependent drop period. Pieces use the
//! classic 4x4 rotation boxes; rotation tries a short fixed wall-kick offset
//! list rather than a full rotation-system table. Locking scans for full
//! rows bottom-up, runs a brief clearing animation, then compacts and
//! scores by simultaneous lines times the current level.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::input::{Dir, Gesture, Key, Keyboard};
use crate::scheduler::{Countdown, FixedTimestep};
use crate::session::{GameLifecycle, Phase};

pub const BOARD_WIDTH: i32 = 10;
pub const BOARD_HEIGHT: i32 = 20;

/// Points for 1, 2, 3, 4 simultaneous lines (multiplied by level).
pub const LINE_POINTS: [u64; 4] = [40, 100, 300, 1200];

/// Drop period per level, milliseconds. Clamped at the last entry.
pub const SPEEDS_MS: [u32; 15] = [
    800, 717, 633, 550, 467, 383, 300, 217, 133, 100, 83, 67, 50, 33, 17,
];

/// Kick offsets tried in order when an in-place rotation is blocked.
pub const WALL_KICKS: [(i32, i32); 5] = [(-1, 0), (1, 0), (0, -1), (-2, 0), (2, 0)];

/// Row-clear animation length before compaction (seconds).
pub const CLEAR_ANIM_SECS: f32 = 0.3;

/// How many upcoming pieces the host may preview.
pub const PREVIEW_COUNT: usize = 3;

const SPAWN_X: i32 = 3;
const SPAWN_Y: i32 = 0;

/// The seven tetrominoes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

pub const PIECE_KINDS: [PieceKind; 7] = [
    PieceKind::I,
    PieceKind::O,
    PieceKind::T,
    PieceKind::S,
    PieceKind::Z,
    PieceKind::J,
    PieceKind::L,
];

impl PieceKind {
    /// Occupied cells of the 4x4 rotation box, (x, y) offsets from the
    /// piece origin. Rotation index 0..=3, clockwise.
    pub fn cells(self, rotation: u8) -> [(i32, i32); 4] {
        use PieceKind::*;
        match (self, rotation % 4) {
            (I, 0) => [(0, 1), (1, 1), (2, 1), (3, 1)],
            (I, 1) => [(2, 0), (2, 1), (2, 2), (2, 3)],
            (I, 2) => [(0, 2), (1, 2), (2, 2), (3, 2)],
            (I, _) => [(1, 0), (1, 1), (1, 2), (1, 3)],

            (O, _) => [(1, 0), (2, 0), (1, 1), (2, 1)],

            (T, 0) => [(1, 0), (0, 1), (1, 1), (2, 1)],
            (T, 1) => [(1, 0), (1, 1), (2, 1), (1, 2)],
            (T, 2) => [(0, 1), (1, 1), (2, 1), (1, 2)],
            (T, _) => [(1, 0), (0, 1), (1, 1), (1, 2)],

            (S, 0) => [(1, 0), (2, 0), (0, 1), (1, 1)],
            (S, 1) => [(1, 0), (1, 1), (2, 1), (2, 2)],
            (S, 2) => [(1, 1), (2, 1), (0, 2), (1, 2)],
            (S, _) => [(0, 0), (0, 1), (1, 1), (1, 2)],

            (Z, 0) => [(0, 0), (1, 0), (1, 1), (2, 1)],
            (Z, 1) => [(2, 0), (1, 1), (2, 1), (1, 2)],
            (Z, 2) => [(0, 1), (1, 1), (1, 2), (2, 2)],
            (Z, _) => [(1, 0), (0, 1), (1, 1), (0, 2)],

            (J, 0) => [(0, 0), (0, 1), (1, 1), (2, 1)],
            (J, 1) => [(1, 0), (2, 0), (1, 1), (1, 2)],
            (J, 2) => [(0, 1), (1, 1), (2, 1), (2, 2)],
            (J, _) => [(1, 0), (1, 1), (0, 2), (1, 2)],

            (L, 0) => [(2, 0), (0, 1), (1, 1), (2, 1)],
            (L, 1) => [(1, 0), (1, 1), (1, 2), (2, 2)],
            (L, 2) => [(0, 1), (1, 1), (2, 1), (0, 2)],
            (L, _) => [(0, 0), (1, 0), (1, 1), (1, 2)],
        }
    }
}

/// Board cell: empty or locked with the kind that filled it (for coloring).
pub type Cell = Option<PieceKind>;

/// The falling piece.
#[derive(Debug, Clone, Copy)]
pub struct ActivePiece {
    pub kind: PieceKind,
    pub x: i32,
    pub y: i32,
    pub rotation: u8,
}

#[derive(Debug)]
pub struct TetrisState {
    pub phase: Phase,
    /// Rows top to bottom.
    pub board: Vec<[Cell; BOARD_WIDTH as usize]>,
    pub active: Option<ActivePiece>,
    pub next_queue: Vec<PieceKind>,
    pub hold: Option<PieceKind>,
    pub score: u64,
    pub level: u32,
    pub lines: u32,
    /// Full rows waiting for the clear animation to finish.
    pub clearing: Vec<i32>,
    can_hold: bool,
    clear_timer: Countdown,
    gravity: FixedTimestep,
    rng: Pcg32,
}

/// One-shot intents for a single advance call, all press-edge driven.
#[derive(Debug, Clone, Copy, Default)]
pub struct TetrisInput {
    pub move_left: bool,
    pub move_right: bool,
    pub soft_drop: bool,
    pub rotate_cw: bool,
    pub rotate_ccw: bool,
    pub hard_drop: bool,
    pub hold: bool,
}

impl TetrisInput {
    /// Drain this frame's press edges into intents.
    pub fn from_keyboard(keyboard: &mut Keyboard) -> Self {
        let mut input = Self::default();
        for key in keyboard.take_pressed() {
            match key {
                Key::Left => input.move_left = true,
                Key::Right => input.move_right = true,
                Key::Down => input.soft_drop = true,
                Key::Up => input.rotate_cw = true,
                Key::RotateCcw => input.rotate_ccw = true,
                Key::Fire => input.hard_drop = true,
                Key::Hold => input.hold = true,
                Key::Pause => {}
            }
        }
        input
    }

    /// Map a completed touch gesture: tap rotates, a downward swipe hard
    /// drops, an upward swipe holds, sideways swipes move.
    pub fn from_gesture(gesture: Gesture) -> Self {
        let mut input = Self::default();
        match gesture {
            Gesture::Tap => input.rotate_cw = true,
            Gesture::Swipe(Dir::Down) => input.hard_drop = true,
            Gesture::Swipe(Dir::Up) => input.hold = true,
            Gesture::Swipe(Dir::Left) => input.move_left = true,
            Gesture::Swipe(Dir::Right) => input.move_right = true,
        }
        input
    }
}

impl TetrisState {
    pub fn new(seed: u64) -> Self {
        let mut state = Self {
            phase: Phase::Idle,
            board: vec![[None; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize],
            active: None,
            next_queue: Vec::new(),
            hold: None,
            score: 0,
            level: 1,
            lines: 0,
            clearing: Vec::new(),
            can_hold: true,
            clear_timer: Countdown::idle(),
            gravity: FixedTimestep::new(drop_period(1)),
            rng: Pcg32::seed_from_u64(seed),
        };
        state.reset_run();
        state
    }

    fn reset_run(&mut self) {
        self.board = vec![[None; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize];
        self.hold = None;
        self.can_hold = true;
        self.score = 0;
        self.level = 1;
        self.lines = 0;
        self.clearing.clear();
        self.clear_timer.cancel();
        self.gravity = FixedTimestep::new(drop_period(1));
        self.next_queue = (0..4).map(|_| self.random_piece()).collect();
        self.active = None;
        self.spawn_piece();
    }

    fn random_piece(&mut self) -> PieceKind {
        PIECE_KINDS[self.rng.random_range(0..PIECE_KINDS.len())]
    }

    /// Would the piece fit at (x, y, rotation) on the current board? Cells
    /// above the top row are allowed; side walls and the floor are not.
    pub fn fits(&self, kind: PieceKind, x: i32, y: i32, rotation: u8) -> bool {
        for (cx, cy) in kind.cells(rotation) {
            let bx = x + cx;
            let by = y + cy;
            if bx < 0 || bx >= BOARD_WIDTH || by >= BOARD_HEIGHT {
                return false;
            }
            if by >= 0 && self.board[by as usize][bx as usize].is_some() {
                return false;
            }
        }
        true
    }

    /// Pull the next piece from the queue. Spawning into an occupied
    /// position is the game-over condition.
    fn spawn_piece(&mut self) {
        let kind = self.next_queue.remove(0);
        let refill = self.random_piece();
        self.next_queue.push(refill);
        self.can_hold = true;

        self.active = Some(ActivePiece {
            kind,
            x: SPAWN_X,
            y: SPAWN_Y,
            rotation: 0,
        });
        if !self.fits(kind, SPAWN_X, SPAWN_Y, 0) {
            self.phase = Phase::GameOver;
            log::info!("tetris over, score {} lines {}", self.score, self.lines);
        }
    }

    /// Try to shift the active piece. Returns whether it moved.
    pub fn move_piece(&mut self, dx: i32, dy: i32) -> bool {
        let Some(piece) = self.active else {
            return false;
        };
        if self.fits(piece.kind, piece.x + dx, piece.y + dy, piece.rotation) {
            let piece = self.active.as_mut().unwrap();
            piece.x += dx;
            piece.y += dy;
            true
        } else {
            false
        }
    }

    /// Rotate the active piece (+1 clockwise, -1 counter-clockwise),
    /// trying each wall-kick offset when the in-place rotation is blocked.
    /// An illegal rotation is simply refused.
    pub fn rotate(&mut self, direction: i32) -> bool {
        let Some(piece) = self.active else {
            return false;
        };
        let rotation = ((piece.rotation as i32 + direction).rem_euclid(4)) as u8;

        if self.fits(piece.kind, piece.x, piece.y, rotation) {
            self.active.as_mut().unwrap().rotation = rotation;
            return true;
        }
        for (kx, ky) in WALL_KICKS {
            if self.fits(piece.kind, piece.x + kx, piece.y + ky, rotation) {
                let piece = self.active.as_mut().unwrap();
                piece.x += kx;
                piece.y += ky;
                piece.rotation = rotation;
                return true;
            }
        }
        false
    }

    /// One cell down for one point.
    pub fn soft_drop(&mut self) {
        if self.move_piece(0, 1) {
            self.score += 1;
        }
    }

    /// Drop to the floor (two points per cell) and lock immediately.
    pub fn hard_drop(&mut self) {
        let mut distance = 0u64;
        while self.move_piece(0, 1) {
            distance += 1;
        }
        self.score += distance * 2;
        self.lock_active();
    }

    /// Swap the active piece with the held one; once per spawn.
    pub fn hold_piece(&mut self) {
        if !self.can_hold {
            return;
        }
        let Some(piece) = self.active else {
            return;
        };
        self.can_hold = false;

        match self.hold.take() {
            Some(held) => {
                self.active = Some(ActivePiece {
                    kind: held,
                    x: SPAWN_X,
                    y: SPAWN_Y,
                    rotation: 0,
                });
                self.hold = Some(piece.kind);
            }
            None => {
                self.hold = Some(piece.kind);
                self.spawn_piece();
                // spawn_piece re-arms hold; the swap still counts as used
                self.can_hold = false;
            }
        }
    }

    /// Row the active piece would land on: the ghost projection.
    pub fn ghost_y(&self) -> Option<i32> {
        let piece = self.active?;
        let mut y = piece.y;
        while self.fits(piece.kind, piece.x, y + 1, piece.rotation) {
            y += 1;
        }
        Some(y)
    }

    /// Write the active piece into the board and check for full rows.
    fn lock_active(&mut self) {
        let Some(piece) = self.active.take() else {
            return;
        };
        for (cx, cy) in piece.kind.cells(piece.rotation) {
            let bx = piece.x + cx;
            let by = piece.y + cy;
            if (0..BOARD_WIDTH).contains(&bx) && (0..BOARD_HEIGHT).contains(&by) {
                self.board[by as usize][bx as usize] = Some(piece.kind);
            }
        }

        // Full rows, scanned bottom-up
        self.clearing = (0..BOARD_HEIGHT)
            .rev()
            .filter(|&y| self.board[y as usize].iter().all(|c| c.is_some()))
            .collect();

        if self.clearing.is_empty() {
            self.spawn_piece();
        } else {
            // Next spawn waits for the animation, then compaction
            self.clear_timer.start(CLEAR_ANIM_SECS);
        }
    }

    /// Remove the cleared rows, shift everything down, score, level up.
    fn finish_clear(&mut self) {
        let count = self.clearing.len();
        let mut rows: Vec<i32> = std::mem::take(&mut self.clearing);
        rows.sort_unstable();
        for y in rows {
            self.board.remove(y as usize);
            self.board.insert(0, [None; BOARD_WIDTH as usize]);
        }

        // Score uses the level in effect when the lines were made
        self.score += LINE_POINTS[count.min(4) - 1] * self.level as u64;
        self.lines += count as u32;

        let new_level = self.lines / 10 + 1;
        if new_level > self.level {
            self.level = new_level;
            self.gravity.set_period(drop_period(self.level));
            log::debug!("tetris level {}", self.level);
        }

        self.spawn_piece();
    }

    fn apply_input(&mut self, input: &TetrisInput) {
        if input.move_left {
            self.move_piece(-1, 0);
        }
        if input.move_right {
            self.move_piece(1, 0);
        }
        if input.soft_drop {
            self.soft_drop();
        }
        if input.rotate_cw {
            self.rotate(1);
        }
        if input.rotate_ccw {
            self.rotate(-1);
        }
        if input.hold {
            self.hold_piece();
        }
        if input.hard_drop {
            self.hard_drop();
        }
    }
}

/// Drop period for a level, in seconds.
pub fn drop_period(level: u32) -> f32 {
    let idx = (level as usize - 1).min(SPEEDS_MS.len() - 1);
    SPEEDS_MS[idx] as f32 / 1000.0
}

impl GameLifecycle for TetrisState {
    fn phase(&self) -> Phase {
        self.phase
    }

    fn start(&mut self) {
        if !self.phase.can_start() {
            return;
        }
        self.reset_run();
        self.phase = Phase::Playing;
    }

    fn pause(&mut self) {
        self.phase.pause();
    }

    fn resume(&mut self) {
        if self.phase.resume() {
            self.gravity.reset();
        }
    }
}

/// Advance by wall-clock `dt`, applying this frame's intents first.
pub fn advance(state: &mut TetrisState, input: &TetrisInput, dt: f32) {
    if !state.phase.is_playing() {
        return;
    }

    if state.clearing.is_empty() {
        state.apply_input(input);
        if !state.phase.is_playing() {
            return;
        }
        for _ in 0..state.gravity.advance(dt) {
            if !state.phase.is_playing() || !state.clearing.is_empty() {
                break;
            }
            if !state.move_piece(0, 1) {
                state.lock_active();
            }
        }
    } else if state.clear_timer.tick(dt) {
        state.finish_clear();
    }
}
