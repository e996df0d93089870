//! Input normalization
//!
//! Raw browser events (key names, touch points, pointer coordinates) become
//! discrete intents here. Continuous actions (thrust, paddle movement) are
//! sampled from the held-key set every simulation step; discrete actions
//! (shoot, rotate, hold, pause) are recorded once on the press edge and
//! drained by the consumer, so holding a key never re-fires them.
//!
//! The input layer only ever writes to these structures. Entity positions
//! belong to the simulation step; the one sanctioned exception is Pong's
//! pointer-drag paddle, which the pong core clamps itself.

/// Grid/diagonal-free movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    /// Cell delta for grid games (screen coordinates, y grows downward).
    pub fn delta(self) -> (i32, i32) {
        match self {
            Dir::Up => (0, -1),
            Dir::Down => (0, 1),
            Dir::Left => (-1, 0),
            Dir::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Dir {
        match self {
            Dir::Up => Dir::Down,
            Dir::Down => Dir::Up,
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

/// Normalized key. Arrows and their WASD aliases collapse to one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    /// Space: shoot / hard drop / launch
    Fire,
    /// `z`: counter-clockwise rotate (Tetris)
    RotateCcw,
    /// `c`: hold piece (Tetris)
    Hold,
    /// `p` or Escape
    Pause,
}

const KEY_COUNT: usize = 8;

impl Key {
    /// Map a browser `KeyboardEvent.key` value. Unmapped keys return None.
    pub fn from_browser(key: &str) -> Option<Key> {
        match key {
            "ArrowUp" | "w" | "W" => Some(Key::Up),
            "ArrowDown" | "s" | "S" => Some(Key::Down),
            "ArrowLeft" | "a" | "A" => Some(Key::Left),
            "ArrowRight" | "d" | "D" => Some(Key::Right),
            " " => Some(Key::Fire),
            "z" | "Z" => Some(Key::RotateCcw),
            "c" | "C" => Some(Key::Hold),
            "p" | "P" | "Escape" => Some(Key::Pause),
            _ => None,
        }
    }

    fn index(self) -> usize {
        match self {
            Key::Up => 0,
            Key::Down => 1,
            Key::Left => 2,
            Key::Right => 3,
            Key::Fire => 4,
            Key::RotateCcw => 5,
            Key::Hold => 6,
            Key::Pause => 7,
        }
    }
}

/// Held-key set plus press-edge queue.
#[derive(Debug, Default)]
pub struct Keyboard {
    held: [bool; KEY_COUNT],
    pressed: Vec<Key>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key-down event. Auto-repeat (down while already held)
    /// records no new press edge.
    pub fn key_down(&mut self, key: Key) {
        let i = key.index();
        if !self.held[i] {
            self.held[i] = true;
            self.pressed.push(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        self.held[key.index()] = false;
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held[key.index()]
    }

    /// Drain press edges accumulated since the last call.
    pub fn take_pressed(&mut self) -> Vec<Key> {
        std::mem::take(&mut self.pressed)
    }

    /// Forget all held keys and pending edges (e.g. on focus loss).
    pub fn clear(&mut self) {
        self.held = [false; KEY_COUNT];
        self.pressed.clear();
    }
}

/// Completed touch gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Displacement stayed under the threshold: context action
    /// (shoot, rotate, or pause toggle depending on the game).
    Tap,
    Swipe(Dir),
}

/// Swipe/tap recognizer over touch start/move/end events.
///
/// The start reference resets on every touch-start, so consecutive swipes
/// never accumulate drift. Games that consume movement incrementally
/// (Tetris piece dragging, Invaders ship dragging) use the drag methods;
/// a gesture consumed as a drag yields no swipe on release.
#[derive(Debug)]
pub struct SwipeTracker {
    threshold: f32,
    start: Option<(f32, f32)>,
    last: (f32, f32),
    held_for: f32,
    long_press_fired: bool,
    dragged: bool,
}

/// Hold duration that counts as a long press (Tetris pause).
pub const LONG_PRESS_SECS: f32 = 0.5;

impl SwipeTracker {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            start: None,
            last: (0.0, 0.0),
            held_for: 0.0,
            long_press_fired: false,
            dragged: false,
        }
    }

    pub fn begin(&mut self, x: f32, y: f32) {
        self.start = Some((x, y));
        self.last = (x, y);
        self.held_for = 0.0;
        self.long_press_fired = false;
        self.dragged = false;
    }

    /// Continuous drag: returns the horizontal movement since the previous
    /// move event (Invaders ship follows the finger directly).
    pub fn drag_dx(&mut self, x: f32, y: f32) -> f32 {
        if self.start.is_none() {
            return 0.0;
        }
        let dx = x - self.last.0;
        self.last = (x, y);
        if dx != 0.0 {
            self.dragged = true;
        }
        dx
    }

    /// Quantized horizontal drag: one step per threshold-width of travel
    /// (Tetris piece movement while the finger is down).
    pub fn drag_steps(&mut self, x: f32, y: f32) -> i32 {
        let Some(_) = self.start else { return 0 };
        let dx = x - self.last.0;
        let dy = y - self.last.1;
        if dx.abs() >= self.threshold && dx.abs() >= dy.abs() {
            let steps = (dx.abs() / self.threshold).floor() as i32;
            self.last = (x, y);
            self.dragged = true;
            if dx > 0.0 { steps } else { -steps }
        } else {
            0
        }
    }

    /// Advance the long-press clock. Fires at most once per touch, and only
    /// if the finger has not moved into a drag.
    pub fn tick_long_press(&mut self, dt: f32) -> bool {
        if self.start.is_none() || self.dragged || self.long_press_fired {
            return false;
        }
        self.held_for += dt;
        if self.held_for >= LONG_PRESS_SECS {
            self.long_press_fired = true;
            true
        } else {
            false
        }
    }

    /// Finish the touch. Returns the recognized gesture, or None when the
    /// movement was already consumed as a drag or a long press fired.
    pub fn end(&mut self, x: f32, y: f32) -> Option<Gesture> {
        let start = self.start.take()?;
        if self.dragged || self.long_press_fired {
            return None;
        }
        let dx = x - start.0;
        let dy = y - start.1;
        let (ax, ay) = (dx.abs(), dy.abs());
        if ax < self.threshold && ay < self.threshold {
            return Some(Gesture::Tap);
        }
        Some(if ax > ay {
            Gesture::Swipe(if dx > 0.0 { Dir::Right } else { Dir::Left })
        } else {
            Gesture::Swipe(if dy > 0.0 { Dir::Down } else { Dir::Up })
        })
    }
}

/// Held-touch screen region for Asteroids' mobile controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Thrust,
    TurnLeft,
    TurnRight,
}

/// Classify a touch position: top 40% of the screen thrusts, the left and
/// right 40% bands turn. The dead center strip does nothing.
pub fn classify_zone(x: f32, y: f32, width: f32, height: f32) -> Option<Zone> {
    if y < height * 0.4 {
        Some(Zone::Thrust)
    } else if x < width * 0.4 {
        Some(Zone::TurnLeft)
    } else if x > width * 0.6 {
        Some(Zone::TurnRight)
    } else {
        None
    }
}

/// Reclassify a held touch from its drag direction: an upward pull thrusts,
/// a sideways pull turns. Used while the finger moves without lifting.
pub fn zone_from_swipe(start: (f32, f32), current: (f32, f32), threshold: f32) -> Option<Zone> {
    let dx = current.0 - start.0;
    let dy = current.1 - start.1;
    if dy.abs() > threshold && dy < 0.0 {
        Some(Zone::Thrust)
    } else if dx.abs() > threshold {
        Some(if dx > 0.0 { Zone::TurnRight } else { Zone::TurnLeft })
    } else {
        None
    }
}
