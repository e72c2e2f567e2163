//! Configuration errors.
//!
//! Only misconfiguration is an error. Stale indices, not-yet-visible items and animation
//! preemption are ordinary control flow and never surface here.

use crate::{Axis, GridConstraint};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// The data source declared no prototypes.
    #[error("data source declares no prototypes")]
    EmptyPrototypes,

    #[error("grid constraint count must be at least 1")]
    ZeroConstraintCount,

    /// The constraint does not fix the cross-axis cell count for this scroll axis.
    #[error("grid constraint {constraint:?} cannot scroll along {axis:?}")]
    UnsupportedGridLayout {
        constraint: GridConstraint,
        axis: Axis,
    },

    #[error("grid cell size must be positive on both axes")]
    InvalidCellSize,

    #[error("engine was destroyed")]
    AlreadyDestroyed,
}

pub type Result<T> = core::result::Result<T, ConfigError>;
