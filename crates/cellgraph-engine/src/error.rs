//! Fatal run errors.

use cellgraph_core::RegistryError;
use cellgraph_space::GridError;

use crate::config::ConfigError;
use crate::emitter::EmitError;
use crate::source::SourceError;
use crate::summary::{Progress, Stage};

/// What went wrong.
#[derive(Debug, thiserror::Error)]
pub enum RunErrorKind {
    /// Invalid or unusable configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The cell source failed as a whole.
    #[error(transparent)]
    Source(#[from] SourceError),
    /// Registration failed (duplicate under `reject`, or capacity).
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// The candidate index could not be built.
    #[error(transparent)]
    Index(#[from] GridError),
    /// Writing edges failed.
    #[error(transparent)]
    Emit(#[from] EmitError),
}

/// A fatal run failure: the stage that failed, how much work completed, and
/// the cause.
///
/// The message names only the stage and progress; the cause and anything
/// beneath it are reached through [`Error::source`](std::error::Error::source).
#[derive(Debug, thiserror::Error)]
#[error("{stage} stage failed ({progress})")]
pub struct RunError {
    /// Stage that failed.
    pub stage: Stage,
    /// Work completed before the failure.
    pub progress: Progress,
    /// Underlying cause.
    #[source]
    pub kind: RunErrorKind,
}

impl RunError {
    /// Failure at `stage` with nothing completed.
    pub fn at(stage: Stage, kind: impl Into<RunErrorKind>) -> Self {
        Self {
            stage,
            progress: Progress::default(),
            kind: kind.into(),
        }
    }

    /// Attach completed work.
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }
}
