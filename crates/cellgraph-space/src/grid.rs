//! Uniform 3D bucket grid.
//!
//! Space is partitioned into axis-aligned cubes of edge `cell_size`. A cell
//! at position `p` lives in the bucket `floor(p / cell_size)` on each axis.
//! With `cell_size` equal to the adjacency threshold, any two positions at
//! most one threshold apart differ by at most one bucket per axis, so the
//! 27 buckets around a cell (its own plus the 26 touching it) contain every
//! neighbour.
//!
//! # Bucket keys
//!
//! Keys are recomputed on demand from positions rather than stored per
//! cell. Coordinates far enough from the origin to overflow `i64` bucket
//! indices saturate; such inputs are outside any realistic model frame.

use crate::error::GridError;
use crate::index::CandidateIndex;
use cellgraph_core::{CellIndex, Position};
use smallvec::SmallVec;
use std::collections::HashMap;

/// The 27 bucket offsets visited per query, `dz`-major then `dy` then `dx`.
pub const NEIGHBOUR_OFFSETS: [(i64, i64, i64); 27] = {
    let mut out = [(0i64, 0i64, 0i64); 27];
    let mut i = 0;
    let mut dz = -1;
    while dz <= 1 {
        let mut dy = -1;
        while dy <= 1 {
            let mut dx = -1;
            while dx <= 1 {
                out[i] = (dx, dy, dz);
                i += 1;
                dx += 1;
            }
            dy += 1;
        }
        dz += 1;
    }
    out
};

/// Integer bucket coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketKey {
    /// Bucket index along x.
    pub x: i64,
    /// Bucket index along y.
    pub y: i64,
    /// Bucket index along z.
    pub z: i64,
}

impl BucketKey {
    /// Bucket containing `position` for buckets of edge `cell_size`.
    #[inline]
    pub fn of(position: Position, cell_size: f64) -> Self {
        Self {
            x: axis_bucket(position.x, cell_size),
            y: axis_bucket(position.y, cell_size),
            z: axis_bucket(position.z, cell_size),
        }
    }

    /// The key shifted by `(dx, dy, dz)` buckets.
    #[inline]
    pub fn offset(self, (dx, dy, dz): (i64, i64, i64)) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            z: self.z.saturating_add(dz),
        }
    }
}

#[inline]
fn axis_bucket(coord: f64, cell_size: f64) -> i64 {
    // A negative subnormal would floor to -1 while a neighbour exactly one
    // cell size away lands in bucket 1.
    let coord = if coord.is_subnormal() { 0.0 } else { coord };
    // `as` saturates on overflow.
    (coord / cell_size).floor() as i64
}

/// Occupancy statistics of a built grid.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GridStats {
    /// Number of non-empty buckets.
    pub occupied_buckets: usize,
    /// Largest number of cells sharing one bucket.
    pub max_occupancy: usize,
    /// Mean cells per non-empty bucket.
    pub mean_occupancy: f64,
}

/// Uniform bucket grid over a fixed set of positions.
///
/// Buckets hold cell indices in ascending order; queries visit buckets in
/// [`NEIGHBOUR_OFFSETS`] order, so candidate order is deterministic.
#[derive(Clone, Debug)]
pub struct SpatialGrid {
    cell_size: f64,
    positions: Vec<Position>,
    /// Most voxel-scale inputs put only a handful of cells in each bucket.
    buckets: HashMap<BucketKey, SmallVec<[CellIndex; 4]>>,
}

impl SpatialGrid {
    /// Build a grid over `positions`, indexed by [`CellIndex`] order, with
    /// buckets of edge `cell_size`.
    ///
    /// Pass the adjacency threshold as `cell_size`; smaller buckets would
    /// break the 27-bucket neighbour guarantee.
    pub fn build(positions: &[Position], cell_size: f64) -> Result<Self, GridError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(GridError::InvalidCellSize { value: cell_size });
        }
        if positions.len() as u64 >= u64::from(u32::MAX) {
            return Err(GridError::TooManyCells {
                count: positions.len(),
            });
        }

        let mut buckets: HashMap<BucketKey, SmallVec<[CellIndex; 4]>> = HashMap::new();
        for (i, p) in positions.iter().enumerate() {
            if !p.is_finite() {
                return Err(GridError::NonFinitePosition { index: i });
            }
            buckets
                .entry(BucketKey::of(*p, cell_size))
                .or_default()
                .push(CellIndex(i as u32));
        }

        Ok(Self {
            cell_size,
            positions: positions.to_vec(),
            buckets,
        })
    }

    /// Bucket edge length.
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Bucket holding `cell`, if it is indexed.
    pub fn bucket_of(&self, cell: CellIndex) -> Option<BucketKey> {
        self.positions
            .get(cell.get())
            .map(|p| BucketKey::of(*p, self.cell_size))
    }

    /// Cells in the bucket `key`, in ascending index order.
    pub fn bucket(&self, key: &BucketKey) -> &[CellIndex] {
        self.buckets.get(key).map(|b| b.as_slice()).unwrap_or(&[])
    }

    /// Occupancy statistics.
    pub fn stats(&self) -> GridStats {
        let occupied_buckets = self.buckets.len();
        let max_occupancy = self.buckets.values().map(|b| b.len()).max().unwrap_or(0);
        let mean_occupancy = if occupied_buckets == 0 {
            0.0
        } else {
            self.positions.len() as f64 / occupied_buckets as f64
        };
        GridStats {
            occupied_buckets,
            max_occupancy,
            mean_occupancy,
        }
    }
}

impl CandidateIndex for SpatialGrid {
    fn name(&self) -> &'static str {
        "grid"
    }

    fn len(&self) -> usize {
        self.positions.len()
    }

    fn query_candidates(&self, cell: CellIndex, out: &mut Vec<CellIndex>) {
        let Some(home) = self.bucket_of(cell) else {
            return;
        };
        for offset in NEIGHBOUR_OFFSETS {
            if let Some(bucket) = self.buckets.get(&home.offset(offset)) {
                out.extend(bucket.iter().copied().filter(|&c| c != cell));
            }
        }
    }
}
