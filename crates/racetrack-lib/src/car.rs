//! Discrete vector physics for a single car.
//!
//! Every value here is a small `Copy` type. Moves never mutate a state in
//! place; they return the successor state instead.

use std::fmt;
use std::ops::Add;

use serde::Serialize;

/// Integer grid coordinates. `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub struct Coordinates {
    pub x: i32,
    pub y: i32,
}

impl Coordinates {
    pub const ZERO: Coordinates = Coordinates { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance between two coordinates.
    pub fn manhattan(self, other: Coordinates) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Componentwise sign, i.e. a unit step toward the direction of `self`.
    pub fn signum(self) -> Coordinates {
        Coordinates::new(self.x.signum(), self.y.signum())
    }

    fn clamp_unit(self) -> Coordinates {
        Coordinates::new(self.x.clamp(-1, 1), self.y.clamp(-1, 1))
    }
}

impl Add for Coordinates {
    type Output = Coordinates;

    fn add(self, rhs: Coordinates) -> Coordinates {
        Coordinates::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// One of the nine moves available to a car on every turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Thrust {
    Up,
    Down,
    Left,
    Right,
    UpRight,
    UpLeft,
    DownRight,
    DownLeft,
    /// Keep the current acceleration.
    Coast,
}

impl Thrust {
    /// Expansion order used by the state-space builder.
    pub const ALL: [Thrust; 9] = [
        Thrust::Up,
        Thrust::Down,
        Thrust::Left,
        Thrust::Right,
        Thrust::UpRight,
        Thrust::UpLeft,
        Thrust::DownRight,
        Thrust::DownLeft,
        Thrust::Coast,
    ];

    /// Acceleration delta applied by this move. Rows grow downward, so "up" is `-y`.
    pub fn delta(self) -> Coordinates {
        match self {
            Thrust::Up => Coordinates::new(0, -1),
            Thrust::Down => Coordinates::new(0, 1),
            Thrust::Left => Coordinates::new(-1, 0),
            Thrust::Right => Coordinates::new(1, 0),
            Thrust::UpRight => Coordinates::new(1, -1),
            Thrust::UpLeft => Coordinates::new(-1, -1),
            Thrust::DownRight => Coordinates::new(1, 1),
            Thrust::DownLeft => Coordinates::new(-1, 1),
            Thrust::Coast => Coordinates::ZERO,
        }
    }
}

/// Physical state of a car: position, velocity and acceleration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub struct CarState {
    pub pos: Coordinates,
    pub vel: Coordinates,
    pub acc: Coordinates,
}

impl CarState {
    /// A car resting at `pos`.
    pub const fn parked(pos: Coordinates) -> Self {
        Self {
            pos,
            vel: Coordinates::ZERO,
            acc: Coordinates::ZERO,
        }
    }

    /// Apply `thrust` without moving: acceleration is clamped to the unit
    /// square and integrated into the velocity.
    pub fn accelerate(self, thrust: Thrust) -> CarState {
        let acc = (self.acc + thrust.delta()).clamp_unit();
        CarState {
            pos: self.pos,
            vel: self.vel + acc,
            acc,
        }
    }

    /// Position the car would reach by applying its current velocity.
    pub fn destination(self) -> Coordinates {
        self.pos + self.vel
    }

    pub fn with_pos(self, pos: Coordinates) -> CarState {
        CarState { pos, ..self }
    }

    /// Same position, velocity and acceleration reset to zero.
    pub fn at_rest(self) -> CarState {
        CarState::parked(self.pos)
    }
}

impl fmt::Display for CarState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pos:{}, vel:{}, acc:{}", self.pos, self.vel, self.acc)
    }
}
