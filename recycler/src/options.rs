use crate::Axis;

/// How a grid fixes its cross-axis cell count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GridConstraint {
    FixedColumnCount(usize),
    FixedRowCount(usize),
    /// Resolved at reset time from the viewport size, the cell size and the cross spacing.
    Flexible,
}

/// The axis cells are filled along first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StartAxis {
    #[default]
    Horizontal,
    Vertical,
}

/// The corner the first cell is placed in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StartCorner {
    #[default]
    UpperLeft,
    UpperRight,
    LowerLeft,
    LowerRight,
}

impl StartCorner {
    pub fn flips_columns(self) -> bool {
        matches!(self, Self::UpperRight | Self::LowerRight)
    }

    pub fn flips_rows(self) -> bool {
        matches!(self, Self::LowerLeft | Self::LowerRight)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridOptions {
    pub constraint: GridConstraint,
    pub start_axis: StartAxis,
    pub start_corner: StartCorner,
    /// Cell size as an absolute `(width, height)` pair.
    pub cell_size: crate::Vec2,
    /// Space between cells across the scroll axis.
    pub cross_spacing: f32,
}

impl GridOptions {
    pub fn new(constraint: GridConstraint, cell_size: crate::Vec2) -> Self {
        Self {
            constraint,
            start_axis: StartAxis::default(),
            start_corner: StartCorner::default(),
            cell_size,
            cross_spacing: 0.0,
        }
    }

    pub fn with_start_axis(mut self, start_axis: StartAxis) -> Self {
        self.start_axis = start_axis;
        self
    }

    pub fn with_start_corner(mut self, start_corner: StartCorner) -> Self {
        self.start_corner = start_corner;
        self
    }

    pub fn with_cross_spacing(mut self, cross_spacing: f32) -> Self {
        self.cross_spacing = cross_spacing;
        self
    }
}

/// Comparison thresholds used while reconciling.
///
/// These are tuning knobs rather than load-bearing constants.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tolerances {
    /// Minimum offset change that triggers a reconcile.
    pub scroll_epsilon: f32,
    /// Gap (beyond one spacing unit) tolerated at the window edges before forcing a show.
    pub clearance_epsilon: f32,
    /// Slack when deciding whether the viewport sits at the start/end of the content.
    pub edge_epsilon: f32,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            scroll_epsilon: 0.1,
            clearance_epsilon: 0.1,
            edge_epsilon: 0.1,
        }
    }
}

/// Configuration for [`crate::WindowTracker`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecyclerOptions {
    pub axis: Axis,
    /// Space between consecutive lines along the scroll axis.
    pub spacing: f32,
    /// Padding before the first line.
    pub padding_start: f32,
    /// Padding after the last line.
    pub padding_end: f32,
    pub cross_padding_start: f32,
    pub cross_padding_end: f32,
    /// Shows the last item first (`actual = count - 1 - flat`).
    pub reverse: bool,
    pub grid: Option<GridOptions>,
    pub tolerances: Tolerances,
    /// Overscroll past the start that fires `on_pull_to_refresh`.
    pub pull_to_refresh_distance: Option<f32>,
    /// Overscroll past the end that fires `on_push_to_close`.
    pub push_to_close_distance: Option<f32>,
}

impl Default for RecyclerOptions {
    fn default() -> Self {
        Self::new(Axis::Vertical)
    }
}

impl RecyclerOptions {
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            spacing: 0.0,
            padding_start: 0.0,
            padding_end: 0.0,
            cross_padding_start: 0.0,
            cross_padding_end: 0.0,
            reverse: false,
            grid: None,
            tolerances: Tolerances::default(),
            pull_to_refresh_distance: None,
            push_to_close_distance: None,
        }
    }

    pub fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_padding(mut self, padding_start: f32, padding_end: f32) -> Self {
        self.padding_start = padding_start;
        self.padding_end = padding_end;
        self
    }

    pub fn with_cross_padding(mut self, cross_padding_start: f32, cross_padding_end: f32) -> Self {
        self.cross_padding_start = cross_padding_start;
        self.cross_padding_end = cross_padding_end;
        self
    }

    pub fn with_reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn with_grid(mut self, grid: Option<GridOptions>) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_tolerances(mut self, tolerances: Tolerances) -> Self {
        self.tolerances = tolerances;
        self
    }

    pub fn with_pull_to_refresh_distance(mut self, distance: Option<f32>) -> Self {
        self.pull_to_refresh_distance = distance;
        self
    }

    pub fn with_push_to_close_distance(mut self, distance: Option<f32>) -> Self {
        self.push_to_close_distance = distance;
        self
    }
}
