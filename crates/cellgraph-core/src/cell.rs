//! Cell identity and position types.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Sub;

/// External identifier of a cell, as supplied by the geometry source.
///
/// Guaranteed non-empty once a cell has been registered.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(String);

impl CellId {
    /// Wrap an identifier string. Emptiness is checked at registration,
    /// not here.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for CellId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CellId {
    fn from(v: &str) -> Self {
        Self(v.to_owned())
    }
}

impl From<String> for CellId {
    fn from(v: String) -> Self {
        Self(v)
    }
}

/// Dense index of a cell within a [`CellRegistry`](crate::CellRegistry).
///
/// Indices follow registration order: `CellIndex(n)` is the n-th distinct
/// id that was registered. Downstream components refer to cells by index
/// and resolve ids only at emission time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellIndex(pub u32);

impl CellIndex {
    /// The index as a `usize`, for slice access.
    #[inline]
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CellIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for CellIndex {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Centroid of a cell in the shared spatial frame.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// East-west axis; east is positive.
    pub x: f64,
    /// North-south axis; north is positive.
    pub y: f64,
    /// Vertical axis; up is positive.
    pub z: f64,
}

impl Position {
    /// Construct a position from its three coordinates.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// `true` if all three coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Position) -> f64 {
        (*other - *self).length()
    }
}

impl From<[f64; 3]> for Position {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<(f64, f64, f64)> for Position {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self { x, y, z }
    }
}

/// Vector from one position to another: `to - from`.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Displacement {
    /// Change along x.
    pub dx: f64,
    /// Change along y.
    pub dy: f64,
    /// Change along z.
    pub dz: f64,
}

impl Displacement {
    /// Euclidean length.
    ///
    /// Computed as `sqrt(dx² + dy² + dz²)` in that order, so that `a - b`
    /// and `b - a` always yield bit-identical lengths.
    #[inline]
    pub fn length(&self) -> f64 {
        (self.dx * self.dx + self.dy * self.dy + self.dz * self.dz).sqrt()
    }
}

impl Sub for Position {
    type Output = Displacement;

    #[inline]
    fn sub(self, rhs: Position) -> Displacement {
        Displacement {
            dx: self.x - rhs.x,
            dy: self.y - rhs.y,
            dz: self.z - rhs.z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displacement_is_to_minus_from() {
        let a = Position::new(1.0, 2.0, 3.0);
        let b = Position::new(4.0, 0.0, 3.5);
        let d = b - a;
        assert_eq!(d.dx, 3.0);
        assert_eq!(d.dy, -2.0);
        assert_eq!(d.dz, 0.5);
    }

    #[test]
    fn distance_is_bitwise_symmetric() {
        let a = Position::new(0.1, 0.7, -3.3);
        let b = Position::new(1.3, -0.2, 2.9);
        assert_eq!(a.distance(&b).to_bits(), b.distance(&a).to_bits());
    }

    #[test]
    fn finiteness() {
        assert!(Position::new(0.0, -1.0, 1e300).is_finite());
        assert!(!Position::new(f64::NAN, 0.0, 0.0).is_finite());
        assert!(!Position::new(0.0, f64::INFINITY, 0.0).is_finite());
        assert!(!Position::new(0.0, 0.0, f64::NEG_INFINITY).is_finite());
    }

    #[test]
    fn cell_id_borrows_as_str() {
        let id = CellId::from("v_M1_00001");
        let s: &str = id.borrow();
        assert_eq!(s, "v_M1_00001");
        assert_eq!(id.to_string(), "v_M1_00001");
    }
}
