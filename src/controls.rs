//! Per-tick control vector handed to the game loop.

use serde::Serialize;
use std::fmt;

/// Horizontal movement intent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "i8")]
pub enum Direction {
    Left,
    #[default]
    Neutral,
    Right,
}

impl Direction {
    /// `-1`, `0` or `1`.
    pub const fn value(self) -> i8 {
        match self {
            Direction::Left => -1,
            Direction::Neutral => 0,
            Direction::Right => 1,
        }
    }

    pub const fn is_neutral(self) -> bool {
        matches!(self, Direction::Neutral)
    }
}

impl From<Direction> for i8 {
    fn from(direction: Direction) -> Self {
        direction.value()
    }
}

/// Display tag summarizing a `Controls` value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GestureLabel {
    #[default]
    Idle,
    Move,
    Jump,
    Crouch,
    Attack,
}

impl GestureLabel {
    pub const ALL: [GestureLabel; 5] = [
        GestureLabel::Idle,
        GestureLabel::Move,
        GestureLabel::Jump,
        GestureLabel::Crouch,
        GestureLabel::Attack,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            GestureLabel::Idle => "IDLE",
            GestureLabel::Move => "MOVE",
            GestureLabel::Jump => "JUMP",
            GestureLabel::Crouch => "CROUCH",
            GestureLabel::Attack => "ATTACK",
        }
    }

    /// Label for a signal set. Priority: ATTACK > CROUCH > JUMP > MOVE > IDLE.
    pub const fn for_signals(direction: Direction, jump: bool, crouch: bool, attack: bool) -> Self {
        if attack {
            GestureLabel::Attack
        } else if crouch {
            GestureLabel::Crouch
        } else if jump {
            GestureLabel::Jump
        } else if !direction.is_neutral() {
            GestureLabel::Move
        } else {
            GestureLabel::Idle
        }
    }
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discrete control vector for one tick. Always fully populated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Controls {
    pub direction: Direction,
    pub jump: bool,
    pub crouch: bool,
    pub attack: bool,
    pub label: GestureLabel,
}

impl Controls {
    /// No hand, no camera, or nothing recognized.
    pub const NEUTRAL: Controls = Controls {
        direction: Direction::Neutral,
        jump: false,
        crouch: false,
        attack: false,
        label: GestureLabel::Idle,
    };

    /// Build a control vector with the label derived from the signals.
    pub const fn from_signals(direction: Direction, jump: bool, crouch: bool, attack: bool) -> Self {
        Self {
            direction,
            jump,
            crouch,
            attack,
            label: GestureLabel::for_signals(direction, jump, crouch, attack),
        }
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Manual input sampled from the keyboard on the same tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyboardInput {
    pub direction: Direction,
    pub jump: bool,
    pub crouch: bool,
    pub attack: bool,
}

/// What the player entity should do this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayerIntent {
    pub direction: Direction,
    pub jump: bool,
    pub crouch: bool,
    pub attack: bool,
}

impl PlayerIntent {
    /// Merge gesture controls with keyboard input.
    ///
    /// A non-neutral gesture direction overrides the keyboard; the action
    /// flags fire when either source asserts them.
    pub fn combine(gesture: &Controls, keys: &KeyboardInput) -> Self {
        let direction = if gesture.direction.is_neutral() {
            keys.direction
        } else {
            gesture.direction
        };
        Self {
            direction,
            jump: gesture.jump || keys.jump,
            crouch: gesture.crouch || keys.crouch,
            attack: gesture.attack || keys.attack,
        }
    }
}
