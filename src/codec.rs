use std::fmt;
use std::str::FromStr;

use crate::error::{HarnessError, Result};

/// Payload width of a value in its 2-byte slot. Not carried on the wire,
/// both ends must agree on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Width(u8);

impl Width {
    /// Simulated accelerator data bus.
    pub const BITS8: Width = Width(8);
    /// UART accelerator payload.
    pub const BITS10: Width = Width(10);

    pub fn new(bits: u8) -> Option<Self> {
        (8..=16).contains(&bits).then_some(Width(bits))
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn max(self) -> u16 {
        (((1u32) << self.0) - 1) as u16
    }

    /// Mask applied to the high byte.
    fn high_mask(self) -> u8 {
        (((1u16) << (self.0 - 8)) - 1) as u8
    }

    /// Range check for values that did not start life as `u16`
    /// (user input, generated data).
    pub fn check(self, value: i64) -> Result<u16> {
        if (0..=i64::from(self.max())).contains(&value) {
            Ok(value as u16)
        } else {
            Err(HarnessError::Range { value, width: self })
        }
    }
}

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.0)
    }
}

impl FromStr for Width {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let bits: u8 = s
            .trim_end_matches("-bit")
            .parse()
            .map_err(|_| format!("bad width {s:?}"))?;
        Width::new(bits).ok_or_else(|| format!("width must be 8..=16 bits, got {bits}"))
    }
}

pub fn encode(value: u16, width: Width) -> Result<[u8; 2]> {
    if value > width.max() {
        return Err(HarnessError::Range {
            value: i64::from(value),
            width,
        });
    }
    Ok([(value & 0xFF) as u8, (value >> 8) as u8 & width.high_mask()])
}

pub fn decode(pair: [u8; 2], width: Width) -> u16 {
    let [low, high] = pair;
    (u16::from(high & width.high_mask()) << 8) | u16::from(low)
}
