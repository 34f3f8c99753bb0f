//! Six-way direction labels for neighbour edges.
//!
//! The classifier is a single-dominant-axis scheme, not an octant
//! decomposition: the vertical axis wins whenever its share of the unit
//! displacement exceeds [`VERTICAL_DOMINANCE`] (about 45.6° above or below
//! the horizontal plane), otherwise the larger horizontal axis wins, with
//! ties going to north/south.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Normalised |dz| above which a displacement is labelled vertical.
pub const VERTICAL_DOMINANCE: f64 = 0.7;

/// Coarse direction from one cell to a neighbour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Neighbour lies mostly above (+z).
    Above,
    /// Neighbour lies mostly below (-z).
    Below,
    /// Neighbour lies mostly east (+x).
    East,
    /// Neighbour lies mostly west (-x).
    West,
    /// Neighbour lies mostly north (+y).
    North,
    /// Neighbour lies mostly south (-y).
    South,
    /// Neighbour shares the same centroid (zero displacement).
    Same,
}

impl Direction {
    /// All labels, in histogram order.
    pub const ALL: [Direction; 7] = [
        Direction::Above,
        Direction::Below,
        Direction::East,
        Direction::West,
        Direction::North,
        Direction::South,
        Direction::Same,
    ];

    /// Classify the displacement `(dx, dy, dz)` whose Euclidean length is
    /// `distance`.
    ///
    /// A zero `distance` yields [`Direction::Same`]; the axis ratios are
    /// undefined there.
    pub fn classify(dx: f64, dy: f64, dz: f64, distance: f64) -> Direction {
        if distance == 0.0 {
            return Direction::Same;
        }

        let nx = dx.abs() / distance;
        let ny = dy.abs() / distance;
        let nz = dz.abs() / distance;

        if nz > VERTICAL_DOMINANCE {
            if dz > 0.0 {
                Direction::Above
            } else {
                Direction::Below
            }
        } else if nx > ny {
            if dx > 0.0 {
                Direction::East
            } else {
                Direction::West
            }
        } else if dy > 0.0 {
            Direction::North
        } else {
            Direction::South
        }
    }

    /// The label seen from the other end of the edge.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Above => Direction::Below,
            Direction::Below => Direction::Above,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::Same => Direction::Same,
        }
    }

    /// Lowercase wire label, as written to edge files.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Above => "above",
            Direction::Below => "below",
            Direction::East => "east",
            Direction::West => "west",
            Direction::North => "north",
            Direction::South => "south",
            Direction::Same => "same",
        }
    }

    /// Position in [`Direction::ALL`].
    pub fn ordinal(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown direction label.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown direction label '{0}'")]
pub struct ParseDirectionError(pub String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| ParseDirectionError(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn classify(dx: f64, dy: f64, dz: f64) -> Direction {
        let d = (dx * dx + dy * dy + dz * dz).sqrt();
        Direction::classify(dx, dy, dz, d)
    }

    #[test]
    fn unit_axes() {
        assert_eq!(classify(1.0, 0.0, 0.0), Direction::East);
        assert_eq!(classify(-1.0, 0.0, 0.0), Direction::West);
        assert_eq!(classify(0.0, 1.0, 0.0), Direction::North);
        assert_eq!(classify(0.0, -1.0, 0.0), Direction::South);
        assert_eq!(classify(0.0, 0.0, 1.0), Direction::Above);
        assert_eq!(classify(0.0, 0.0, -1.0), Direction::Below);
    }

    #[test]
    fn zero_distance_is_same() {
        assert_eq!(Direction::classify(0.0, 0.0, 0.0, 0.0), Direction::Same);
    }

    #[test]
    fn horizontal_tie_goes_to_north_south() {
        assert_eq!(classify(1.0, 1.0, 0.0), Direction::North);
        assert_eq!(classify(1.0, -1.0, 0.0), Direction::South);
        assert_eq!(classify(-1.0, -1.0, 0.0), Direction::South);
    }

    #[test]
    fn vertical_threshold_is_strict() {
        // nz exactly 0.7: not vertical, falls through to horizontal axes.
        let dz = 0.7;
        let dx = (1.0f64 - dz * dz).sqrt();
        assert_eq!(Direction::classify(dx, 0.0, dz, 1.0), Direction::East);
        assert_eq!(Direction::classify(dx, 0.0, 0.7001, 1.0), Direction::Above);
    }

    #[test]
    fn diagonal_up_is_vertical() {
        // 45° up: nz = 0.707 > 0.7.
        assert_eq!(classify(1.0, 0.0, 1.0), Direction::Above);
        assert_eq!(classify(0.0, -1.0, -1.0), Direction::Below);
    }

    #[test]
    fn shallow_diagonal_is_horizontal() {
        assert_eq!(classify(2.0, 0.5, 1.0), Direction::East);
        assert_eq!(classify(0.5, -2.0, -1.0), Direction::South);
    }

    #[test]
    fn opposite_is_involution() {
        for d in Direction::ALL {
            assert_eq!(d.opposite().opposite(), d);
        }
        assert_eq!(Direction::Same.opposite(), Direction::Same);
    }

    #[test]
    fn labels_roundtrip_through_from_str() {
        for d in Direction::ALL {
            assert_eq!(d.as_str().parse::<Direction>(), Ok(d));
        }
        assert!("up".parse::<Direction>().is_err());
    }

    #[test]
    fn ordinals_match_all() {
        for (i, d) in Direction::ALL.into_iter().enumerate() {
            assert_eq!(d.ordinal(), i);
        }
    }

    proptest! {
        #[test]
        fn reversed_displacement_is_antipodal(
            dx in -10.0f64..10.0, dy in -10.0f64..10.0, dz in -10.0f64..10.0,
        ) {
            let d = (dx * dx + dy * dy + dz * dz).sqrt();
            prop_assume!(d > 0.0);
            let fwd = Direction::classify(dx, dy, dz, d);
            let back = Direction::classify(-dx, -dy, -dz, d);
            prop_assert_eq!(back, fwd.opposite());
            prop_assert_ne!(fwd, Direction::Same);
        }
    }
}
