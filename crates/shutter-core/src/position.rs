//! Shutter position value
//!
//! A position is an integer percentage where 0 means fully open and 100
//! means fully closed. Any reversal of that scale is applied by the shutter
//! that owns the device, never by the driver or transport.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Position of a shutter in percent, validated to `0..=100`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u8")]
pub struct Position(u8);

impl Position {
    /// Fully open
    pub const OPEN: Position = Position(0);

    /// Fully closed
    pub const CLOSED: Position = Position(100);

    /// Create a position, rejecting values above 100
    pub fn new(value: u8) -> Result<Self> {
        if value > 100 {
            return Err(Error::InvalidPosition(value as u16));
        }
        Ok(Self(value))
    }

    /// Create a position, saturating values above 100
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(0, 100) as u8)
    }

    /// Raw percentage value
    pub fn value(self) -> u8 {
        self.0
    }

    /// The same position on the inverted scale (`100 - p`)
    pub fn reversed(self) -> Self {
        Self(100 - self.0)
    }

    /// Apply the reversal transform only when `reverse` is set
    pub fn reversed_if(self, reverse: bool) -> Self {
        if reverse { self.reversed() } else { self }
    }

    /// Floor of the arithmetic mean of `positions`.
    ///
    /// Returns `OPEN` for an empty slice or when every value is zero.
    pub fn mean(positions: &[Position]) -> Self {
        let total: u32 = positions.iter().map(|p| p.0 as u32).sum();
        if total == 0 {
            return Self::OPEN;
        }
        Self((total / positions.len() as u32) as u8)
    }
}

impl TryFrom<u16> for Position {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self> {
        if value > 100 {
            return Err(Error::InvalidPosition(value));
        }
        Ok(Self(value as u8))
    }
}

impl TryFrom<u8> for Position {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Position> for u8 {
    fn from(position: Position) -> Self {
        position.0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
