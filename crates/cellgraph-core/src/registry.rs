//! The cell registry: validated, immutable cell set for one run.
//!
//! Records arrive from an external geometry source and pass through a
//! [`RegistryBuilder`], which rejects invalid records (counting them in the
//! [`IngestReport`]) and resolves duplicate ids according to a
//! [`DuplicatePolicy`]. The finished [`CellRegistry`] assigns each distinct
//! id a dense [`CellIndex`] in registration order and never changes again.

use crate::cell::{CellId, CellIndex, Position};
use crate::error::{RecordError, RegistryError};
use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One unvalidated input tuple.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawCellRecord {
    /// Cell identifier, kept as given; must not be empty or all whitespace.
    pub id: String,
    /// Centroid x.
    pub x: f64,
    /// Centroid y.
    pub y: f64,
    /// Centroid z.
    pub z: f64,
}

impl RawCellRecord {
    /// Construct a raw record.
    pub fn new(id: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            z,
        }
    }

    /// Validate into an id and position.
    pub fn validate(self) -> Result<(CellId, Position), RecordError> {
        if self.id.trim().is_empty() {
            return Err(RecordError::MissingId);
        }
        for (axis, value) in [("x", self.x), ("y", self.y), ("z", self.z)] {
            if !value.is_finite() {
                return Err(RecordError::NonFiniteCoordinate {
                    id: self.id,
                    axis,
                    value,
                });
            }
        }
        Ok((CellId::new(self.id), Position::new(self.x, self.y, self.z)))
    }
}

/// What to do when an id is registered twice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// The later record's position replaces the earlier one. The cell keeps
    /// the registration slot of its first appearance.
    #[default]
    LastWriteWins,
    /// The later record is ignored.
    KeepFirst,
    /// The first duplicate aborts ingestion.
    Reject,
}

/// Counters describing one ingestion pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Records offered to the builder, valid or not.
    pub records_seen: u64,
    /// Records skipped as invalid.
    pub skipped: u64,
    /// Records whose id had already been registered.
    pub duplicate_ids: u64,
}

/// Incremental registry construction.
#[derive(Debug)]
pub struct RegistryBuilder {
    policy: DuplicatePolicy,
    cells: IndexMap<CellId, Position>,
    report: IngestReport,
}

impl RegistryBuilder {
    /// Create an empty builder using `policy` for duplicate ids.
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            cells: IndexMap::new(),
            report: IngestReport::default(),
        }
    }

    /// Create an empty builder with room for `capacity` cells.
    pub fn with_capacity(policy: DuplicatePolicy, capacity: usize) -> Self {
        Self {
            policy,
            cells: IndexMap::with_capacity(capacity),
            report: IngestReport::default(),
        }
    }

    /// Offer one record. Invalid records are skipped and counted; only a
    /// duplicate under [`DuplicatePolicy::Reject`] or index exhaustion is
    /// an error.
    pub fn push(&mut self, record: RawCellRecord) -> Result<(), RegistryError> {
        self.report.records_seen += 1;
        match record.validate() {
            Ok((id, position)) => self.insert(id, position),
            Err(err) => {
                self.report.skipped += 1;
                tracing::debug!(%err, "skipping invalid cell record");
                Ok(())
            }
        }
    }

    /// Count a record the source could not decode.
    pub fn reject(&mut self, err: &RecordError) {
        self.report.records_seen += 1;
        self.report.skipped += 1;
        tracing::debug!(%err, "skipping undecodable cell record");
    }

    /// Offer a record as produced by a fallible source.
    pub fn offer(
        &mut self,
        item: Result<RawCellRecord, RecordError>,
    ) -> Result<(), RegistryError> {
        match item {
            Ok(record) => self.push(record),
            Err(err) => {
                self.reject(&err);
                Ok(())
            }
        }
    }

    fn insert(&mut self, id: CellId, position: Position) -> Result<(), RegistryError> {
        let next = self.cells.len();
        match self.cells.entry(id) {
            Entry::Occupied(mut slot) => {
                self.report.duplicate_ids += 1;
                match self.policy {
                    DuplicatePolicy::LastWriteWins => {
                        tracing::warn!(
                            id = %slot.key(),
                            previous = ?slot.get(),
                            replacement = ?position,
                            "duplicate cell id, keeping last position"
                        );
                        slot.insert(position);
                    }
                    DuplicatePolicy::KeepFirst => {
                        tracing::warn!(
                            id = %slot.key(),
                            ignored = ?position,
                            "duplicate cell id, keeping first position"
                        );
                    }
                    DuplicatePolicy::Reject => {
                        return Err(RegistryError::DuplicateId {
                            id: slot.key().to_string(),
                        });
                    }
                }
            }
            Entry::Vacant(slot) => {
                if next as u64 >= u64::from(u32::MAX) {
                    return Err(RegistryError::TooManyCells {
                        max: u64::from(u32::MAX),
                    });
                }
                slot.insert(position);
            }
        }
        Ok(())
    }

    /// Number of distinct cells registered so far.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// `true` if no cell has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Freeze the registry.
    pub fn finish(self) -> (CellRegistry, IngestReport) {
        if self.report.skipped > 0 {
            tracing::warn!(
                skipped = self.report.skipped,
                seen = self.report.records_seen,
                "skipped invalid cell records"
            );
        }
        let positions = self.cells.values().copied().collect();
        (
            CellRegistry {
                cells: self.cells,
                positions,
            },
            self.report,
        )
    }
}

/// Immutable, validated cell set.
///
/// Cells are addressed by [`CellIndex`] in registration order. The
/// registry is `Sync` and shared by reference across evaluation workers.
#[derive(Clone, Debug, Default)]
pub struct CellRegistry {
    cells: IndexMap<CellId, Position>,
    /// Dense copy of positions in index order, for index construction and
    /// the evaluator's inner loop.
    positions: Vec<Position>,
}

impl CellRegistry {
    /// Validate and register `records` under the default
    /// [`DuplicatePolicy::LastWriteWins`].
    pub fn ingest(
        records: impl IntoIterator<Item = RawCellRecord>,
    ) -> Result<(Self, IngestReport), RegistryError> {
        Self::ingest_with(records, DuplicatePolicy::default())
    }

    /// Validate and register `records` under `policy`.
    pub fn ingest_with(
        records: impl IntoIterator<Item = RawCellRecord>,
        policy: DuplicatePolicy,
    ) -> Result<(Self, IngestReport), RegistryError> {
        let records = records.into_iter();
        let mut builder = RegistryBuilder::with_capacity(policy, records.size_hint().0);
        for record in records {
            builder.push(record)?;
        }
        Ok(builder.finish())
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// `true` if the registry holds no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Id of the cell at `index`.
    pub fn id(&self, index: CellIndex) -> Option<&CellId> {
        self.cells.get_index(index.get()).map(|(id, _)| id)
    }

    /// Position of the cell at `index`.
    pub fn position(&self, index: CellIndex) -> Option<Position> {
        self.positions.get(index.get()).copied()
    }

    /// All positions, indexed by [`CellIndex`].
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Look up the index of `id`.
    pub fn index_of(&self, id: &str) -> Option<CellIndex> {
        self.cells
            .get_index_of(id)
            .map(|i| CellIndex(i as u32))
    }

    /// Iterate cells in registration order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (CellIndex, &CellId, Position)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, (id, pos))| (CellIndex(i as u32), id, *pos))
    }
}
