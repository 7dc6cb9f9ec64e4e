//! Fixed-point math and grid geometry for deterministic simulation.
//!
//! Unit stats carry fractional increments (0.5 defense per extra member,
//! 1.2 attack for raiders, ...). They are stored as fixed-point values built
//! from exact tenths so that combat arithmetic never depends on the host's
//! floating-point behaviour.

use std::fmt;

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Builds a fixed-point value from a count of tenths (`995` is `99.5`).
///
/// Counts beyond the fixed-point range saturate to the nearest whole value.
#[must_use]
pub fn from_tenths(tenths: i64) -> Fixed {
    Fixed::checked_from_num(tenths).map_or_else(
        || Fixed::saturating_from_num(tenths / 10),
        |value| value / Fixed::from_num(10),
    )
}

/// Converts a fixed-point value back to the nearest whole count of tenths.
///
/// Values produced by [`from_tenths`] round-trip exactly.
#[must_use]
pub fn to_tenths(value: Fixed) -> i64 {
    value
        .saturating_mul(Fixed::from_num(10))
        .saturating_round()
        .to_num::<i64>()
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Integer cell coordinate on the battle grid.
///
/// `x` is the column (0 on the left), `y` the row (0 at the north edge).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct GridPos {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl GridPos {
    /// Create a new grid position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev (king-move) distance. Engagement and heal ranges use this.
    #[must_use]
    pub fn chebyshev(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        dx.max(dy)
    }

    /// Manhattan distance, the number of single-axis steps between cells.
    #[must_use]
    pub fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// One single-axis step toward `target`.
    ///
    /// Moves along the axis with the larger remaining delta; ties go to x.
    /// Returns `self` when already at the target.
    #[must_use]
    pub fn step_toward(self, target: Self) -> Self {
        let dx = target.x - self.x;
        let dy = target.y - self.y;
        if dx == 0 && dy == 0 {
            return self;
        }
        if dx.abs() >= dy.abs() {
            Self::new(self.x + dx.signum(), self.y)
        } else {
            Self::new(self.x, self.y + dy.signum())
        }
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenths_round_trip() {
        for tenths in [0, 5, 8, 12, 995, 495, 6_900, -3] {
            assert_eq!(to_tenths(from_tenths(tenths)), tenths);
        }
    }

    #[test]
    fn test_tenths_accumulate_exactly() {
        // 19 extra raider members at 1.2 each
        let attack = from_tenths(1_000 + 19 * 12);
        assert_eq!(to_tenths(attack), 1_228);
        assert_eq!(attack.floor(), Fixed::from_num(122));
    }

    #[test]
    fn test_tenths_saturate_out_of_range() {
        assert_eq!(from_tenths(i64::MAX), Fixed::MAX);
        assert_eq!(from_tenths(i64::MIN), Fixed::MIN);
        let big = from_tenths(2_400_000_988);
        assert!(big > Fixed::from_num(200_000_000));
        assert!(to_tenths(Fixed::MAX) > 20_000_000_000);
    }

    #[test]
    fn test_fixed_determinism() {
        let a = Fixed::from_num(1) / Fixed::from_num(3);
        let b = Fixed::from_num(1) / Fixed::from_num(3);
        assert_eq!(a, b);
        assert_eq!(a * Fixed::from_num(7), b * Fixed::from_num(7));
    }

    #[test]
    fn test_chebyshev_distance() {
        let a = GridPos::new(3, 4);
        assert_eq!(a.chebyshev(GridPos::new(3, 4)), 0);
        assert_eq!(a.chebyshev(GridPos::new(4, 5)), 1);
        assert_eq!(a.chebyshev(GridPos::new(1, 9)), 5);
        assert_eq!(a.manhattan(GridPos::new(1, 9)), 7);
    }

    #[test]
    fn test_step_prefers_larger_delta() {
        let from = GridPos::new(0, 0);
        assert_eq!(from.step_toward(GridPos::new(1, 5)), GridPos::new(0, 1));
        assert_eq!(from.step_toward(GridPos::new(-4, 2)), GridPos::new(-1, 0));
        // ties go to x
        assert_eq!(from.step_toward(GridPos::new(2, 2)), GridPos::new(1, 0));
        assert_eq!(from.step_toward(from), from);
    }
}
