//! Pac-Man core
//!
//! Two fixed-interval clocks: the player steps every 180 ms, the ghosts on a
//! level-dependent period. Ghosts share a scatter/chase mode clock but each
//! has its own chase-targeting rule. A power pellet flips released ghosts
//! into frightened mode for eight seconds; eating one sends it home and
//! doubles the combo award. Death and level completion are short transient
//! phases that resolve back to play on internal countdowns.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::input::Dir;
use crate::scheduler::{Countdown, FixedTimestep};
use crate::session::{GameLifecycle, Phase};

pub const GRID_SIZE: i32 = 21;
pub const STARTING_LIVES: u32 = 3;

/// Seconds per player step.
pub const PLAYER_TICK: f32 = 0.18;
/// Base seconds per ghost step; shrinks with level.
pub const GHOST_TICK: f32 = 0.22;

pub const POWER_DURATION: f32 = 8.0;
/// Frightened ghosts flash for the last stretch of the power window.
pub const POWER_WARNING: f32 = 2.0;
pub const SCATTER_DURATION: f32 = 7.0;
pub const CHASE_DURATION: f32 = 20.0;
/// Staggered ghost release delays after each (re)start.
pub const GHOST_RELEASE: [f32; 4] = [0.0, 3.0, 6.0, 9.0];

pub const PELLET_POINTS: u64 = 10;
pub const POWER_PELLET_POINTS: u64 = 50;
/// First frightened ghost in a power window; doubles per consecutive ghost.
pub const GHOST_BASE_POINTS: u64 = 200;

const DEATH_INTERLUDE: f32 = 1.0;
const LEVEL_INTERLUDE: f32 = 2.0;

/// Cell the door opens onto; released and revived ghosts start here.
const HOUSE_EXIT: (i32, i32) = (10, 7);
/// Where eaten ghosts return to.
const HOUSE_CENTER: (i32, i32) = (10, 9);

/// Maze cells. Pellet counts are tracked incrementally as cells transition
/// to `Path`, never by rescanning the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Path,
    Wall,
    Pellet,
    PowerPellet,
    House,
    Door,
}

#[rustfmt::skip]
const MAZE_TEMPLATE: [[u8; 21]; 21] = [
    [1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1],
    [1,2,2,2,2,2,2,2,2,2,1,2,2,2,2,2,2,2,2,2,1],
    [1,3,1,1,2,1,1,1,1,2,1,2,1,1,1,1,2,1,1,3,1],
    [1,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,1],
    [1,2,1,1,2,1,2,1,1,1,1,1,1,1,2,1,2,1,1,2,1],
    [1,2,2,2,2,1,2,2,2,2,1,2,2,2,2,1,2,2,2,2,1],
    [1,1,1,1,2,1,1,1,1,0,1,0,1,1,1,1,2,1,1,1,1],
    [0,0,0,1,2,1,0,0,0,0,0,0,0,0,0,1,2,1,0,0,0],
    [1,1,1,1,2,1,0,1,1,5,4,5,1,1,0,1,2,1,1,1,1],
    [0,0,0,0,2,0,0,1,4,4,4,4,4,1,0,0,2,0,0,0,0],
    [1,1,1,1,2,1,0,1,1,1,1,1,1,1,0,1,2,1,1,1,1],
    [0,0,0,1,2,1,0,0,0,0,0,0,0,0,0,1,2,1,0,0,0],
    [1,1,1,1,2,1,0,1,1,1,1,1,1,1,0,1,2,1,1,1,1],
    [1,2,2,2,2,2,2,2,2,2,1,2,2,2,2,2,2,2,2,2,1],
    [1,2,1,1,2,1,1,1,1,2,1,2,1,1,1,1,2,1,1,2,1],
    [1,3,2,1,2,2,2,2,2,2,0,2,2,2,2,2,2,1,2,3,1],
    [1,1,2,1,2,1,2,1,1,1,1,1,1,1,2,1,2,1,2,1,1],
    [1,2,2,2,2,1,2,2,2,2,1,2,2,2,2,1,2,2,2,2,1],
    [1,2,1,1,1,1,1,1,1,2,1,2,1,1,1,1,1,1,1,2,1],
    [1,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,1],
    [1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1],
];

fn tile_from_code(code: u8) -> Tile {
    match code {
        1 => Tile::Wall,
        2 => Tile::Pellet,
        3 => Tile::PowerPellet,
        4 => Tile::House,
        5 => Tile::Door,
        _ => Tile::Path,
    }
}

/// Lifecycle phase, including the two transient interludes the player
/// cannot reach directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacPhase {
    Idle,
    Playing,
    Paused,
    /// Life lost; resolves after a short delay.
    Dying,
    /// Maze cleared; resolves into the next level.
    LevelComplete,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GhostName {
    Blinky,
    Pinky,
    Inky,
    Clyde,
}

impl GhostName {
    fn scatter_corner(self) -> (i32, i32) {
        match self {
            GhostName::Blinky => (19, 0),
            GhostName::Pinky => (1, 0),
            GhostName::Inky => (19, 20),
            GhostName::Clyde => (1, 20),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GhostMode {
    Scatter,
    Chase,
    /// Vulnerable, wandering randomly.
    Frightened,
    /// Heading back to the house to revive.
    Eaten,
}

#[derive(Debug, Clone, Copy)]
pub struct Ghost {
    pub name: GhostName,
    pub cell: (i32, i32),
    pub mode: GhostMode,
    pub released: bool,
    /// Previous cell; ghosts do not reverse unless cornered.
    prev: Option<(i32, i32)>,
    release: Countdown,
}

impl Ghost {
    fn new(name: GhostName, cell: (i32, i32), delay: f32) -> Self {
        Self {
            name,
            cell,
            mode: GhostMode::Scatter,
            released: delay == 0.0,
            prev: None,
            release: Countdown::new(delay),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Player {
    pub cell: (i32, i32),
    pub dir: (i32, i32),
    next_dir: (i32, i32),
}

impl Player {
    fn spawn() -> Self {
        Self {
            cell: (10, 15),
            dir: (0, 0),
            next_dir: (-1, 0),
        }
    }
}

#[derive(Debug)]
pub struct PacmanState {
    pub phase: PacPhase,
    pub maze: [[Tile; GRID_SIZE as usize]; GRID_SIZE as usize],
    pub pellets_remaining: u32,
    pub player: Player,
    pub ghosts: [Ghost; 4],
    pub score: u64,
    pub level: u32,
    pub lives: u32,
    /// Ghosts eaten during the current power window.
    pub combo: u32,
    current_mode: GhostMode,
    mode_timer: Countdown,
    frightened: Countdown,
    interlude: Countdown,
    player_clock: FixedTimestep,
    ghost_clock: FixedTimestep,
    rng: Pcg32,
}

/// Ghost step period shrinks each level, floored at 120 ms.
pub fn ghost_period(level: u32) -> f32 {
    (GHOST_TICK - level as f32 * 0.01).max(0.12)
}

fn wrap_x(x: i32) -> i32 {
    if x < 0 {
        GRID_SIZE - 1
    } else if x >= GRID_SIZE {
        0
    } else {
        x
    }
}

fn manhattan(a: (i32, i32), b: (i32, i32)) -> i32 {
    (a.0 - b.0).abs() + (a.1 - b.1).abs()
}

impl PacmanState {
    pub fn new(seed: u64) -> Self {
        let mut state = Self {
            phase: PacPhase::Idle,
            maze: [[Tile::Path; GRID_SIZE as usize]; GRID_SIZE as usize],
            pellets_remaining: 0,
            player: Player::spawn(),
            ghosts: Self::spawn_ghosts(),
            score: 0,
            level: 1,
            lives: STARTING_LIVES,
            combo: 0,
            current_mode: GhostMode::Scatter,
            mode_timer: Countdown::idle(),
            frightened: Countdown::idle(),
            interlude: Countdown::idle(),
            player_clock: FixedTimestep::new(PLAYER_TICK),
            ghost_clock: FixedTimestep::new(ghost_period(1)),
            rng: Pcg32::seed_from_u64(seed),
        };
        state.build_maze();
        state
    }

    fn spawn_ghosts() -> [Ghost; 4] {
        [
            Ghost::new(GhostName::Blinky, (10, 9), GHOST_RELEASE[0]),
            Ghost::new(GhostName::Pinky, (9, 9), GHOST_RELEASE[1]),
            Ghost::new(GhostName::Inky, (11, 9), GHOST_RELEASE[2]),
            Ghost::new(GhostName::Clyde, (10, 10), GHOST_RELEASE[3]),
        ]
    }

    fn build_maze(&mut self) {
        self.pellets_remaining = 0;
        for y in 0..GRID_SIZE as usize {
            for x in 0..GRID_SIZE as usize {
                let tile = tile_from_code(MAZE_TEMPLATE[y][x]);
                if matches!(tile, Tile::Pellet | Tile::PowerPellet) {
                    self.pellets_remaining += 1;
                }
                self.maze[y][x] = tile;
            }
        }
    }

    pub fn tile(&self, cell: (i32, i32)) -> Option<Tile> {
        if (0..GRID_SIZE).contains(&cell.0) && (0..GRID_SIZE).contains(&cell.1) {
            Some(self.maze[cell.1 as usize][cell.0 as usize])
        } else {
            None
        }
    }

    /// Whether the frightened window is in its warning stretch.
    pub fn frightened_ending(&self) -> bool {
        self.frightened.active() && self.frightened.remaining() <= POWER_WARNING
    }

    pub fn frightened_active(&self) -> bool {
        self.frightened.active()
    }

    /// Buffer the next direction; applied at the tick boundary when the
    /// target cell is open.
    pub fn set_direction(&mut self, dir: Dir) {
        if self.phase != PacPhase::Playing {
            return;
        }
        self.player.next_dir = dir.delta();
    }

    fn can_move(&self, cell: (i32, i32)) -> bool {
        // Off the sides is the tunnel
        if cell.0 < 0 || cell.0 >= GRID_SIZE {
            return true;
        }
        match self.tile(cell) {
            Some(Tile::Wall) | Some(Tile::House) | Some(Tile::Door) | None => false,
            _ => true,
        }
    }

    fn can_ghost_move(&self, cell: (i32, i32), eaten: bool) -> bool {
        if cell.0 < 0 || cell.0 >= GRID_SIZE {
            return true;
        }
        match self.tile(cell) {
            Some(Tile::Wall) | None => false,
            // The door only opens for ghosts heading home
            Some(Tile::Door) => eaten,
            _ => true,
        }
    }

    fn step_player(&mut self) {
        let p = self.player;
        let buffered = (p.cell.0 + p.next_dir.0, p.cell.1 + p.next_dir.1);
        if self.can_move(buffered) {
            self.player.dir = self.player.next_dir;
        }

        let target = (
            self.player.cell.0 + self.player.dir.0,
            self.player.cell.1 + self.player.dir.1,
        );
        if self.can_move(target) {
            self.player.cell = (wrap_x(target.0), target.1);
            self.eat_at_player();
        }

        self.check_collisions();
    }

    fn eat_at_player(&mut self) {
        let (x, y) = self.player.cell;
        match self.maze[y as usize][x as usize] {
            Tile::Pellet => {
                self.maze[y as usize][x as usize] = Tile::Path;
                self.score += PELLET_POINTS;
                self.pellets_remaining -= 1;
                self.check_level_complete();
            }
            Tile::PowerPellet => {
                self.maze[y as usize][x as usize] = Tile::Path;
                self.score += POWER_PELLET_POINTS;
                self.pellets_remaining -= 1;
                self.activate_power_mode();
                self.check_level_complete();
            }
            _ => {}
        }
    }

    fn activate_power_mode(&mut self) {
        self.frightened.start(POWER_DURATION);
        self.combo = 0;
        for ghost in &mut self.ghosts {
            if ghost.released && ghost.mode != GhostMode::Eaten {
                ghost.mode = GhostMode::Frightened;
                // Frightened ghosts may reverse immediately
                ghost.prev = None;
            }
        }
    }

    fn ghost_target(&self, ghost: &Ghost) -> (i32, i32) {
        match ghost.mode {
            GhostMode::Scatter => ghost.name.scatter_corner(),
            GhostMode::Frightened | GhostMode::Eaten => ghost.cell,
            GhostMode::Chase => {
                let p = self.player;
                match ghost.name {
                    // Direct pursuit
                    GhostName::Blinky => p.cell,
                    // Four cells ahead of the player's heading
                    GhostName::Pinky => {
                        (p.cell.0 + p.dir.0 * 4, p.cell.1 + p.dir.1 * 4)
                    }
                    // Double the vector from Blinky to two-ahead
                    GhostName::Inky => {
                        let blinky = self
                            .ghosts
                            .iter()
                            .find(|g| g.name == GhostName::Blinky)
                            .map(|g| g.cell)
                            .unwrap_or(p.cell);
                        let ahead = (p.cell.0 + p.dir.0 * 2, p.cell.1 + p.dir.1 * 2);
                        (ahead.0 + (ahead.0 - blinky.0), ahead.1 + (ahead.1 - blinky.1))
                    }
                    // Pursue when far, retreat to the corner when close
                    GhostName::Clyde => {
                        if manhattan(ghost.cell, p.cell) > 8 {
                            p.cell
                        } else {
                            GhostName::Clyde.scatter_corner()
                        }
                    }
                }
            }
        }
    }

    fn ghost_moves(&self, ghost: &Ghost) -> Vec<(i32, i32)> {
        let eaten = ghost.mode == GhostMode::Eaten;
        let dirs = [(0, -1), (0, 1), (-1, 0), (1, 0)];
        let candidate = |skip_prev: bool| {
            dirs.iter()
                .map(|d| (ghost.cell.0 + d.0, ghost.cell.1 + d.1))
                .filter(|&c| !(skip_prev && ghost.prev == Some(c)))
                .filter(|&c| self.can_ghost_move(c, eaten))
                .collect::<Vec<_>>()
        };
        let moves = candidate(true);
        if moves.is_empty() {
            // Cornered: reversing is allowed after all
            candidate(false)
        } else {
            moves
        }
    }

    fn step_ghosts(&mut self) {
        for i in 0..self.ghosts.len() {
            let ghost = self.ghosts[i];
            if !ghost.released {
                continue;
            }

            let moves = self.ghost_moves(&ghost);
            if moves.is_empty() {
                continue;
            }

            let chosen = match ghost.mode {
                GhostMode::Frightened => moves[self.rng.random_range(0..moves.len())],
                GhostMode::Eaten => *moves
                    .iter()
                    .min_by_key(|&&c| manhattan(c, HOUSE_CENTER))
                    .unwrap(),
                _ => {
                    let target = self.ghost_target(&ghost);
                    *moves
                        .iter()
                        .min_by_key(|&&c| manhattan(c, target))
                        .unwrap()
                }
            };

            let g = &mut self.ghosts[i];
            g.prev = Some(g.cell);
            g.cell = (wrap_x(chosen.0), chosen.1);
            if g.mode == GhostMode::Eaten && g.cell == HOUSE_CENTER {
                g.mode = self.current_mode;
            }
        }

        self.check_collisions();
    }

    fn check_collisions(&mut self) {
        for i in 0..self.ghosts.len() {
            let ghost = self.ghosts[i];
            if !ghost.released || ghost.cell != self.player.cell {
                continue;
            }
            match ghost.mode {
                GhostMode::Frightened => self.eat_ghost(i),
                GhostMode::Eaten => {}
                _ => {
                    self.begin_death();
                    return;
                }
            }
        }
    }

    fn eat_ghost(&mut self, index: usize) {
        self.ghosts[index].mode = GhostMode::Eaten;
        self.combo += 1;
        let award = GHOST_BASE_POINTS * 2u64.pow(self.combo - 1);
        self.score += award;
        log::debug!("ghost eaten, combo {} award {}", self.combo, award);
    }

    fn begin_death(&mut self) {
        self.phase = PacPhase::Dying;
        self.lives = self.lives.saturating_sub(1);
        self.interlude.start(DEATH_INTERLUDE);
    }

    fn check_level_complete(&mut self) {
        if self.pellets_remaining == 0 {
            self.phase = PacPhase::LevelComplete;
            self.level += 1;
            self.interlude.start(LEVEL_INTERLUDE);
        }
    }

    /// Reset actor positions and mode clocks, keeping score/level/maze.
    fn reset_positions(&mut self) {
        self.player = Player::spawn();
        self.ghosts = Self::spawn_ghosts();
        self.frightened.cancel();
        self.current_mode = GhostMode::Scatter;
        self.mode_timer.start(SCATTER_DURATION);
        self.player_clock.reset();
        self.ghost_clock = FixedTimestep::new(ghost_period(self.level));
    }

    fn resolve_death(&mut self) {
        if self.lives == 0 {
            self.phase = PacPhase::GameOver;
            log::info!("pacman over, score {}", self.score);
        } else {
            self.reset_positions();
            self.phase = PacPhase::Playing;
        }
    }

    fn resolve_level_complete(&mut self) {
        self.build_maze();
        self.reset_positions();
        self.phase = PacPhase::Playing;
    }

    /// Toggle the shared scatter/chase mode and apply it to ghosts that are
    /// in the normal pursuit cycle.
    fn switch_mode(&mut self) {
        self.current_mode = match self.current_mode {
            GhostMode::Scatter => GhostMode::Chase,
            _ => GhostMode::Scatter,
        };
        self.mode_timer.start(match self.current_mode {
            GhostMode::Scatter => SCATTER_DURATION,
            _ => CHASE_DURATION,
        });
        for ghost in &mut self.ghosts {
            if matches!(ghost.mode, GhostMode::Scatter | GhostMode::Chase) {
                ghost.mode = self.current_mode;
            }
        }
    }

    fn tick_timers(&mut self, dt: f32) {
        for ghost in &mut self.ghosts {
            if !ghost.released && ghost.release.tick(dt) {
                ghost.released = true;
                ghost.cell = HOUSE_EXIT;
            }
        }

        if self.frightened.active() {
            if self.frightened.tick(dt) {
                for ghost in &mut self.ghosts {
                    if ghost.mode == GhostMode::Frightened {
                        ghost.mode = self.current_mode;
                    }
                }
            }
            // The scatter/chase clock is suspended while power mode runs
        } else if self.mode_timer.tick(dt) {
            self.switch_mode();
        }
    }
}

impl GameLifecycle for PacmanState {
    fn phase(&self) -> Phase {
        match self.phase {
            PacPhase::Idle => Phase::Idle,
            PacPhase::Paused => Phase::Paused,
            PacPhase::GameOver => Phase::GameOver,
            // Interludes count as play in the shared lifecycle
            _ => Phase::Playing,
        }
    }

    fn start(&mut self) {
        if !matches!(self.phase, PacPhase::Idle | PacPhase::GameOver) {
            return;
        }
        self.score = 0;
        self.level = 1;
        self.lives = STARTING_LIVES;
        self.combo = 0;
        self.build_maze();
        self.reset_positions();
        self.phase = PacPhase::Playing;
    }

    fn pause(&mut self) {
        if self.phase == PacPhase::Playing {
            self.phase = PacPhase::Paused;
        }
    }

    fn resume(&mut self) {
        if self.phase == PacPhase::Paused {
            self.phase = PacPhase::Playing;
            self.player_clock.reset();
            self.ghost_clock.reset();
        }
    }
}

/// Advance the simulation by wall-clock `dt`.
pub fn advance(state: &mut PacmanState, dt: f32) {
    match state.phase {
        PacPhase::Playing => {
            state.tick_timers(dt);
            for _ in 0..state.player_clock.advance(dt) {
                if state.phase != PacPhase::Playing {
                    return;
                }
                state.step_player();
            }
            for _ in 0..state.ghost_clock.advance(dt) {
                if state.phase != PacPhase::Playing {
                    return;
                }
                state.step_ghosts();
            }
        }
        PacPhase::Dying => {
            if state.interlude.tick(dt) {
                state.resolve_death();
            }
        }
        PacPhase::LevelComplete => {
            if state.interlude.tick(dt) {
                state.resolve_level_complete();
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing_state() -> PacmanState {
        let mut state = PacmanState::new(5);
        state.start();
        state
    }

    fn ghost_mut(state: &mut PacmanState, name: GhostName) -> &mut Ghost {
        state.ghosts.iter_mut().find(|g| g.name == name).unwrap()
    }

    #[test]
    fn test_pellet_count_matches_template() {
        let state = playing_state();
        let scanned = (0..GRID_SIZE)
            .flat_map(|y| (0..GRID_SIZE).map(move |x| (x, y)))
            .filter(|&c| {
                matches!(
                    state.tile(c),
                    Some(Tile::Pellet) | Some(Tile::PowerPellet)
                )
            })
            .count() as u32;
        assert_eq!(state.pellets_remaining, scanned);
        assert!(state.pellets_remaining > 0);
    }

    #[test]
    fn test_pellet_eaten_decrements_counter() {
        let mut state = playing_state();
        // (9, 15) holds a pellet and is open from the spawn heading left
        state.player.cell = (10, 15);
        let before = state.pellets_remaining;
        state.step_player();
        assert_eq!(state.player.cell, (9, 15));
        assert_eq!(state.pellets_remaining, before - 1);
        assert_eq!(state.score, PELLET_POINTS);
        assert_eq!(state.tile((9, 15)), Some(Tile::Path));
    }

    #[test]
    fn test_buffered_direction_waits_for_opening() {
        let mut state = playing_state();
        state.step_player(); // (9,15)
        state.step_player(); // (8,15)
        state.set_direction(Dir::Up);

        // The cells above this stretch of row 15 are walls, so the buffered
        // turn holds and motion continues left until an opening appears
        state.step_player();
        assert_eq!(state.player.cell, (7, 15));
        assert_eq!(state.player.dir, (-1, 0));

        state.step_player(); // (6,15)
        state.step_player(); // (5,15)
        state.step_player(); // (4,15)
        // (4,14) is open: the turn finally applies
        state.step_player();
        assert_eq!(state.player.cell, (4, 14));
        assert_eq!(state.player.dir, (0, -1));
    }

    #[test]
    fn test_tunnel_wraps() {
        let mut state = playing_state();
        state.player.cell = (0, 9);
        state.player.dir = (-1, 0);
        state.player.next_dir = (-1, 0);
        state.step_player();
        assert_eq!(state.player.cell.0, GRID_SIZE - 1);
    }

    #[test]
    fn test_power_pellet_frightens_released_ghosts() {
        let mut state = playing_state();
        ghost_mut(&mut state, GhostName::Blinky).mode = GhostMode::Chase;
        state.player.cell = (1, 2); // power pellet corner
        state.eat_at_player();

        assert!(state.frightened_active());
        assert!(!state.frightened_ending());
        assert_eq!(state.score, POWER_PELLET_POINTS);
        assert_eq!(
            ghost_mut(&mut state, GhostName::Blinky).mode,
            GhostMode::Frightened
        );
        // Unreleased ghosts are untouched
        assert_eq!(
            ghost_mut(&mut state, GhostName::Clyde).mode,
            GhostMode::Scatter
        );
    }

    #[test]
    fn test_frightened_ghost_eaten_with_combo() {
        let mut state = playing_state();
        state.frightened.start(POWER_DURATION);
        {
            let blinky = ghost_mut(&mut state, GhostName::Blinky);
            blinky.mode = GhostMode::Frightened;
            blinky.cell = (9, 15);
        }
        state.player.cell = (9, 15);
        state.check_collisions();

        assert_eq!(state.combo, 1);
        assert_eq!(state.score, 200);
        assert_eq!(
            ghost_mut(&mut state, GhostName::Blinky).mode,
            GhostMode::Eaten
        );

        // Second ghost in the same window doubles the award
        {
            let pinky = ghost_mut(&mut state, GhostName::Pinky);
            pinky.released = true;
            pinky.mode = GhostMode::Frightened;
            pinky.cell = (9, 15);
        }
        state.check_collisions();
        assert_eq!(state.combo, 2);
        assert_eq!(state.score, 200 + 400);
    }

    #[test]
    fn test_normal_ghost_contact_kills() {
        let mut state = playing_state();
        {
            let blinky = ghost_mut(&mut state, GhostName::Blinky);
            blinky.mode = GhostMode::Chase;
            blinky.cell = (10, 15);
        }
        state.check_collisions();

        assert_eq!(state.phase, PacPhase::Dying);
        assert_eq!(state.lives, STARTING_LIVES - 1);

        // The interlude resolves back into play with positions reset
        advance(&mut state, DEATH_INTERLUDE + 0.01);
        assert_eq!(state.phase, PacPhase::Playing);
        assert_eq!(state.player.cell, (10, 15));
    }

    #[test]
    fn test_last_life_ends_game() {
        let mut state = playing_state();
        state.lives = 1;
        state.begin_death();
        advance(&mut state, DEATH_INTERLUDE + 0.01);
        assert_eq!(state.phase, PacPhase::GameOver);
    }

    #[test]
    fn test_level_complete_interlude() {
        let mut state = playing_state();
        state.score = 100;
        // Leave a single pellet and eat it
        state.build_maze();
        for y in 0..GRID_SIZE as usize {
            for x in 0..GRID_SIZE as usize {
                if matches!(state.maze[y][x], Tile::Pellet | Tile::PowerPellet) {
                    state.maze[y][x] = Tile::Path;
                }
            }
        }
        state.pellets_remaining = 1;
        state.maze[15][9] = Tile::Pellet;
        state.player.cell = (9, 15);
        state.eat_at_player();

        assert_eq!(state.phase, PacPhase::LevelComplete);
        assert_eq!(state.level, 2);

        advance(&mut state, LEVEL_INTERLUDE + 0.01);
        assert_eq!(state.phase, PacPhase::Playing);
        // Fresh maze, faster ghosts
        assert!(state.pellets_remaining > 1);
        assert_eq!(state.ghost_clock.period(), ghost_period(2));
    }

    #[test]
    fn test_scatter_chase_alternation() {
        let mut state = playing_state();
        assert_eq!(state.current_mode, GhostMode::Scatter);

        state.tick_timers(SCATTER_DURATION + 0.01);
        assert_eq!(state.current_mode, GhostMode::Chase);
        assert_eq!(
            ghost_mut(&mut state, GhostName::Blinky).mode,
            GhostMode::Chase
        );

        state.tick_timers(CHASE_DURATION + 0.01);
        assert_eq!(state.current_mode, GhostMode::Scatter);
    }

    #[test]
    fn test_mode_clock_suspended_while_frightened() {
        let mut state = playing_state();
        state.frightened.start(POWER_DURATION);
        // Long past the scatter duration, but power mode holds the clock
        state.tick_timers(SCATTER_DURATION + 1.0);
        assert_eq!(state.current_mode, GhostMode::Scatter);
    }

    #[test]
    fn test_frightened_expiry_restores_mode() {
        let mut state = playing_state();
        state.activate_power_mode();
        state.tick_timers(POWER_DURATION + 0.01);
        assert_eq!(
            ghost_mut(&mut state, GhostName::Blinky).mode,
            GhostMode::Scatter
        );
        assert!(!state.frightened_active());
    }

    #[test]
    fn test_frightened_warning_window() {
        let mut state = playing_state();
        state.activate_power_mode();
        state.tick_timers(POWER_DURATION - 1.0);
        assert!(state.frightened_ending());
    }

    #[test]
    fn test_ghost_release_schedule() {
        let mut state = playing_state();
        assert!(ghost_mut(&mut state, GhostName::Blinky).released);
        assert!(!ghost_mut(&mut state, GhostName::Pinky).released);

        state.tick_timers(3.01);
        assert!(ghost_mut(&mut state, GhostName::Pinky).released);
        assert_eq!(ghost_mut(&mut state, GhostName::Pinky).cell, HOUSE_EXIT);
        assert!(!ghost_mut(&mut state, GhostName::Clyde).released);
    }

    #[test]
    fn test_chase_targets() {
        let mut state = playing_state();
        state.player.cell = (10, 15);
        state.player.dir = (-1, 0);

        let blinky = *ghost_mut(&mut state, GhostName::Blinky);
        let mut chase = blinky;
        chase.mode = GhostMode::Chase;
        assert_eq!(state.ghost_target(&chase), (10, 15));

        let mut pinky = *ghost_mut(&mut state, GhostName::Pinky);
        pinky.mode = GhostMode::Chase;
        assert_eq!(state.ghost_target(&pinky), (6, 15));

        // Inky: two ahead is (8,15); blinky is at (10,9); doubled vector
        let mut inky = *ghost_mut(&mut state, GhostName::Inky);
        inky.mode = GhostMode::Chase;
        assert_eq!(state.ghost_target(&inky), (6, 21));

        // Clyde far away pursues, nearby retreats
        let mut clyde = *ghost_mut(&mut state, GhostName::Clyde);
        clyde.mode = GhostMode::Chase;
        clyde.cell = (1, 1);
        assert_eq!(state.ghost_target(&clyde), (10, 15));
        clyde.cell = (9, 14);
        assert_eq!(state.ghost_target(&clyde), (1, 20));
    }

    #[test]
    fn test_eaten_ghost_returns_home_and_revives() {
        let mut state = playing_state();
        {
            let blinky = ghost_mut(&mut state, GhostName::Blinky);
            blinky.mode = GhostMode::Eaten;
            blinky.cell = (10, 7);
            blinky.prev = None;
        }
        // Door at (9..11, 8) region: eaten ghosts may pass it
        assert!(state.can_ghost_move((9, 8), true));
        assert!(!state.can_ghost_move((9, 8), false));

        for _ in 0..8 {
            state.step_ghosts();
            if ghost_mut(&mut state, GhostName::Blinky).mode != GhostMode::Eaten {
                break;
            }
        }
        let blinky = ghost_mut(&mut state, GhostName::Blinky);
        assert_eq!(blinky.cell, HOUSE_CENTER);
        assert_ne!(blinky.mode, GhostMode::Eaten);
    }

    #[test]
    fn test_ghost_does_not_reverse() {
        let mut state = playing_state();
        // Corridor along row 1: a ghost that just came from the left must
        // not step straight back
        {
            let blinky = ghost_mut(&mut state, GhostName::Blinky);
            blinky.cell = (5, 1);
            blinky.prev = Some((4, 1));
            blinky.mode = GhostMode::Scatter;
        }
        state.step_ghosts();
        assert_ne!(ghost_mut(&mut state, GhostName::Blinky).cell, (4, 1));
    }

    #[test]
    fn test_pause_gates_everything() {
        let mut state = playing_state();
        state.pause();
        let cell = state.player.cell;
        advance(&mut state, 5.0);
        assert_eq!(state.player.cell, cell);
        // Direction input is ignored while paused
        state.set_direction(Dir::Up);
        state.resume();
        assert_eq!(state.player.next_dir, (-1, 0));
    }

    #[test]
    fn test_no_pause_during_interludes() {
        let mut state = playing_state();
        state.begin_death();
        state.pause();
        assert_eq!(state.phase, PacPhase::Dying);
    }
}
