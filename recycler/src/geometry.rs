//! Index geometry strategies.
//!
//! The window tracker works in *lines*: positions along the scroll axis that hold one or more
//! items. A list has one item per line; a grid has a full row (vertical scrolling) or column
//! (horizontal scrolling) of cells per line. [`IndexGeometry`] is the seam between the two.

use core::fmt;

use crate::error::{ConfigError, Result};
use crate::{
    Axis, GridConstraint, GridOptions, RecyclerOptions, StartAxis, StartCorner, Vec2,
};

/// Maps logical item indices onto scroll-axis lines.
///
/// Implementations must be deterministic: identical inputs always produce identical outputs.
pub trait IndexGeometry: fmt::Debug + Send + Sync {
    /// Validates the layout against the viewport and resolves viewport-dependent parameters.
    ///
    /// On error the geometry is left unchanged.
    fn configure(&mut self, viewport: Vec2) -> Result<()>;

    fn set_item_count(&mut self, item_count: usize);

    fn item_count(&self) -> usize;

    fn line_count(&self) -> usize;

    /// The line that holds logical `index`, `None` past the end.
    fn line_of(&self, index: usize) -> Option<usize>;

    /// Emits the logical indices shown on `line`, skipping padding cells.
    fn for_each_in_line(&self, line: usize, f: &mut dyn FnMut(usize));

    /// Offset of `index` across the scroll axis, relative to the cross padding.
    fn cross_offset(&self, index: usize) -> f32;

    /// Fixed cell size (absolute), when every item has the same known size.
    fn cell_size(&self) -> Option<Vec2>;

    /// Logical index displayed at flat slot `flat`, `None` for slots that show nothing.
    fn actual_index(&self, flat: usize) -> Option<usize>;

    fn is_flexible(&self) -> bool {
        false
    }

    fn line_items(&self, line: usize) -> Vec<usize> {
        let mut out = Vec::new();
        self.for_each_in_line(line, &mut |i| out.push(i));
        out
    }
}

/// Builds the geometry strategy selected by `options`.
pub fn from_options(options: &RecyclerOptions) -> Box<dyn IndexGeometry> {
    match options.grid {
        Some(grid) => Box::new(GridGeometry::new(options, grid)),
        None => Box::new(LinearGeometry::new(options.reverse)),
    }
}

/// One item per line.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinearGeometry {
    item_count: usize,
    reverse: bool,
}

impl LinearGeometry {
    pub fn new(reverse: bool) -> Self {
        Self {
            item_count: 0,
            reverse,
        }
    }
}

impl IndexGeometry for LinearGeometry {
    fn configure(&mut self, _viewport: Vec2) -> Result<()> {
        Ok(())
    }

    fn set_item_count(&mut self, item_count: usize) {
        self.item_count = item_count;
    }

    fn item_count(&self) -> usize {
        self.item_count
    }

    fn line_count(&self) -> usize {
        self.item_count
    }

    fn line_of(&self, index: usize) -> Option<usize> {
        // The reverse mapping is its own inverse.
        self.actual_index(index)
    }

    fn for_each_in_line(&self, line: usize, f: &mut dyn FnMut(usize)) {
        if let Some(index) = self.actual_index(line) {
            f(index);
        }
    }

    fn cross_offset(&self, _index: usize) -> f32 {
        0.0
    }

    fn cell_size(&self) -> Option<Vec2> {
        None
    }

    fn actual_index(&self, flat: usize) -> Option<usize> {
        if flat >= self.item_count {
            return None;
        }
        Some(if self.reverse {
            self.item_count - 1 - flat
        } else {
            flat
        })
    }
}

/// Resolved grid dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridDescriptor {
    pub width: usize,
    pub height: usize,
    /// The fixed dimension (columns for `FixedColumnCount`, rows for `FixedRowCount`).
    pub constraint_count: usize,
    pub start_axis: StartAxis,
    pub start_corner: StartCorner,
    /// Cells along the start axis before wrapping.
    pub max_items_in_axis: usize,
    pub item_count: usize,
}

impl GridDescriptor {
    pub fn fixed_columns(
        columns: usize,
        start_axis: StartAxis,
        start_corner: StartCorner,
        item_count: usize,
    ) -> Self {
        let width = columns.max(1);
        let height = item_count.div_ceil(width).max(1);
        Self::build(width, height, width, start_axis, start_corner, item_count)
    }

    pub fn fixed_rows(
        rows: usize,
        start_axis: StartAxis,
        start_corner: StartCorner,
        item_count: usize,
    ) -> Self {
        let height = rows.max(1);
        let width = item_count.div_ceil(height).max(1);
        Self::build(width, height, height, start_axis, start_corner, item_count)
    }

    fn build(
        width: usize,
        height: usize,
        constraint_count: usize,
        start_axis: StartAxis,
        start_corner: StartCorner,
        item_count: usize,
    ) -> Self {
        let max_items_in_axis = match start_axis {
            StartAxis::Horizontal => width,
            StartAxis::Vertical => height,
        };
        Self {
            width,
            height,
            constraint_count,
            start_axis,
            start_corner,
            max_items_in_axis,
            item_count,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }
}

/// Flat index <-> `(column, row)` translation for a [`GridDescriptor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridIndexMapper {
    descriptor: GridDescriptor,
    reverse: bool,
}

impl GridIndexMapper {
    pub fn new(descriptor: GridDescriptor, reverse: bool) -> Self {
        Self {
            descriptor,
            reverse,
        }
    }

    pub fn descriptor(&self) -> &GridDescriptor {
        &self.descriptor
    }

    /// Cell coordinate `(column, row)` of flat slot `flat`.
    pub fn coords(&self, flat: usize) -> (usize, usize) {
        let d = &self.descriptor;
        let (col, row) = match d.start_axis {
            StartAxis::Horizontal => (flat % d.width, flat / d.width),
            StartAxis::Vertical => (flat / d.height, flat % d.height),
        };
        self.flip(col, row)
    }

    /// Flat slot at cell `(column, row)`, `None` outside the grid.
    pub fn flat_at(&self, col: usize, row: usize) -> Option<usize> {
        let d = &self.descriptor;
        if col >= d.width || row >= d.height {
            return None;
        }
        let (col, row) = self.flip(col, row);
        Some(match d.start_axis {
            StartAxis::Horizontal => row * d.width + col,
            StartAxis::Vertical => col * d.height + row,
        })
    }

    /// Logical index shown in flat slot `flat`; padding slots past the item count yield `None`.
    pub fn actual_index(&self, flat: usize) -> Option<usize> {
        let count = self.descriptor.item_count;
        if flat >= count {
            return None;
        }
        Some(if self.reverse { count - 1 - flat } else { flat })
    }

    /// Flat slot holding logical `index`.
    pub fn flat_of(&self, index: usize) -> Option<usize> {
        // Reversal is an involution over `0..count`.
        self.actual_index(index)
    }

    fn flip(&self, col: usize, row: usize) -> (usize, usize) {
        let d = &self.descriptor;
        let col = if d.start_corner.flips_columns() {
            d.width - 1 - col
        } else {
            col
        };
        let row = if d.start_corner.flips_rows() {
            d.height - 1 - row
        } else {
            row
        };
        (col, row)
    }
}

/// Fixed-size cells arranged in rows/columns.
#[derive(Clone, Debug)]
pub struct GridGeometry {
    axis: Axis,
    options: GridOptions,
    reverse: bool,
    cross_space: f32,
    resolved: usize,
    mapper: GridIndexMapper,
}

impl GridGeometry {
    pub fn new(options: &RecyclerOptions, grid: GridOptions) -> Self {
        let mut geometry = Self {
            axis: options.axis,
            options: grid,
            reverse: options.reverse,
            cross_space: options.cross_padding_start + options.cross_padding_end,
            resolved: 1,
            mapper: GridIndexMapper::new(
                GridDescriptor::fixed_columns(1, grid.start_axis, grid.start_corner, 0),
                options.reverse,
            ),
        };
        geometry.rebuild(0);
        geometry
    }

    pub fn mapper(&self) -> &GridIndexMapper {
        &self.mapper
    }

    /// Cross-axis cell count a flexible grid resolves to for `viewport`.
    pub fn flexible_count(&self, viewport: Vec2) -> usize {
        let cell = self.axis.cross(self.options.cell_size);
        let available = self.axis.cross(viewport) - self.cross_space + self.options.cross_spacing;
        let fit = (available / (cell + self.options.cross_spacing)).floor();
        if fit.is_finite() && fit >= 1.0 {
            fit as usize
        } else {
            1
        }
    }

    fn rebuild(&mut self, item_count: usize) {
        let grid = &self.options;
        let descriptor = match self.axis {
            Axis::Vertical => GridDescriptor::fixed_columns(
                self.resolved,
                grid.start_axis,
                grid.start_corner,
                item_count,
            ),
            Axis::Horizontal => GridDescriptor::fixed_rows(
                self.resolved,
                grid.start_axis,
                grid.start_corner,
                item_count,
            ),
        };
        self.mapper = GridIndexMapper::new(descriptor, self.reverse);
    }

    fn cross_count(&self) -> usize {
        let d = self.mapper.descriptor();
        match self.axis {
            Axis::Vertical => d.width,
            Axis::Horizontal => d.height,
        }
    }
}

impl IndexGeometry for GridGeometry {
    fn configure(&mut self, viewport: Vec2) -> Result<()> {
        let cell = self.options.cell_size;
        if !(cell.x > 0.0 && cell.y > 0.0) {
            return Err(ConfigError::InvalidCellSize);
        }
        let resolved = match (self.options.constraint, self.axis) {
            (GridConstraint::Flexible, _) => self.flexible_count(viewport),
            (GridConstraint::FixedColumnCount(0) | GridConstraint::FixedRowCount(0), _) => {
                return Err(ConfigError::ZeroConstraintCount);
            }
            (GridConstraint::FixedColumnCount(n), Axis::Vertical)
            | (GridConstraint::FixedRowCount(n), Axis::Horizontal) => n,
            (constraint, axis) => {
                return Err(ConfigError::UnsupportedGridLayout { constraint, axis });
            }
        };
        self.resolved = resolved;
        self.rebuild(self.item_count());
        Ok(())
    }

    fn set_item_count(&mut self, item_count: usize) {
        self.rebuild(item_count);
    }

    fn item_count(&self) -> usize {
        self.mapper.descriptor().item_count
    }

    fn line_count(&self) -> usize {
        if self.item_count() == 0 {
            return 0;
        }
        let d = self.mapper.descriptor();
        match self.axis {
            Axis::Vertical => d.height,
            Axis::Horizontal => d.width,
        }
    }

    fn line_of(&self, index: usize) -> Option<usize> {
        let flat = self.mapper.flat_of(index)?;
        let (col, row) = self.mapper.coords(flat);
        Some(match self.axis {
            Axis::Vertical => row,
            Axis::Horizontal => col,
        })
    }

    fn for_each_in_line(&self, line: usize, f: &mut dyn FnMut(usize)) {
        for c in 0..self.cross_count() {
            let (col, row) = match self.axis {
                Axis::Vertical => (c, line),
                Axis::Horizontal => (line, c),
            };
            if let Some(index) = self
                .mapper
                .flat_at(col, row)
                .and_then(|flat| self.mapper.actual_index(flat))
            {
                f(index);
            }
        }
    }

    fn cross_offset(&self, index: usize) -> f32 {
        let Some(flat) = self.mapper.flat_of(index) else {
            return 0.0;
        };
        let (col, row) = self.mapper.coords(flat);
        let slot = match self.axis {
            Axis::Vertical => col,
            Axis::Horizontal => row,
        };
        slot as f32 * (self.axis.cross(self.options.cell_size) + self.options.cross_spacing)
    }

    fn cell_size(&self) -> Option<Vec2> {
        Some(self.options.cell_size)
    }

    fn actual_index(&self, flat: usize) -> Option<usize> {
        self.mapper.actual_index(flat)
    }

    fn is_flexible(&self) -> bool {
        self.options.constraint == GridConstraint::Flexible
    }
}
