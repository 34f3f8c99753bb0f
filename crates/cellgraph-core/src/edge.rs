//! Directed neighbour edges.

use crate::cell::CellIndex;
use crate::direction::Direction;
use crate::registry::CellRegistry;
use serde::Serialize;

/// Decimal places kept in emitted distances.
pub const DISTANCE_DECIMALS: i32 = 3;

/// Round a distance to [`DISTANCE_DECIMALS`] places.
///
/// Rounds half away from zero. Distances are non-negative, so this is
/// plain round-half-up.
pub fn round_distance(distance: f64) -> f64 {
    let scale = 10f64.powi(DISTANCE_DECIMALS);
    (distance * scale).round() / scale
}

/// A directed adjacency from `from` to `to`.
///
/// Endpoints are registry indices; ids are resolved only when the edge
/// is written. `distance` is the exact Euclidean distance; rounding
/// happens at the output boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NeighborEdge {
    /// Source cell.
    pub from: CellIndex,
    /// Target cell.
    pub to: CellIndex,
    /// Label of `to` as seen from `from`.
    pub direction: Direction,
    /// Unrounded Euclidean distance.
    pub distance: f64,
}

impl NeighborEdge {
    /// The same relationship seen from the other end.
    pub fn reversed(&self) -> NeighborEdge {
        NeighborEdge {
            from: self.to,
            to: self.from,
            direction: self.direction.opposite(),
            distance: self.distance,
        }
    }

    /// Distance rounded for output.
    pub fn rounded_distance(&self) -> f64 {
        round_distance(self.distance)
    }

    /// Resolve endpoint ids against the registry that produced this edge.
    ///
    /// Returns `None` if either index is out of range for `registry`.
    pub fn resolve<'r>(&self, registry: &'r CellRegistry) -> Option<EdgeRecord<'r>> {
        Some(EdgeRecord {
            from_id: registry.id(self.from)?.as_str(),
            to_id: registry.id(self.to)?.as_str(),
            direction: self.direction,
            distance: self.rounded_distance(),
        })
    }
}

/// Output form of an edge: the four-field record downstream ingestion
/// consumes, in field order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EdgeRecord<'a> {
    /// Id of the source cell.
    pub from_id: &'a str,
    /// Id of the target cell.
    pub to_id: &'a str,
    /// Direction label.
    pub direction: Direction,
    /// Distance rounded to [`DISTANCE_DECIMALS`].
    pub distance: f64,
}
