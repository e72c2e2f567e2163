//! A headless recycling window engine for long scrollable collections.
//!
//! For adapter-level utilities (animated navigation, paging, the controller facade), see the
//! `recycler-adapter` crate.
//!
//! Only the items intersecting the viewport, plus a small look-ahead buffer, are backed by live
//! views. Views that scroll out are returned to per-prototype pools and rebound to new indices
//! instead of being destroyed. Lists measure items lazily; grids use a fixed cell size.
//!
//! It is UI-agnostic. A scene layer is expected to provide, through [`RenderHost`]:
//! - viewport size
//! - view instantiation, activation, measurement and placement
//! - content size / offset updates
//!
//! and the application provides content through [`DataSource`].
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod error;
pub mod geometry;
mod ledger;
mod options;
mod pool;
mod source;
mod tracker;
mod types;
mod view;

#[cfg(test)]
mod tests;

pub use error::{ConfigError, Result};
pub use geometry::{GridDescriptor, GridIndexMapper, IndexGeometry};
pub use ledger::{PositionLedger, PositionRecord};
pub use options::{
    GridConstraint, GridOptions, RecyclerOptions, StartAxis, StartCorner, Tolerances,
};
pub use pool::RecyclePool;
pub use source::{DataSource, RenderHost};
pub use tracker::{PoolStats, TrackerState, WindowTracker};
pub use types::{Axis, MovementRestriction, PrototypeId, ScrollDirection, Vec2, WindowState};
pub use view::{ViewCapabilities, ViewHandle};
