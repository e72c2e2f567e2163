use crate::{Axis, Vec2};

/// Position/size bookkeeping for one logical index.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionRecord {
    /// Top-left in host layout coordinates.
    pub top_left: Vec2,
    /// `top_left` with the sign normalized so both axes grow positively.
    pub abs_top_left: Vec2,
    /// `abs_top_left + size`.
    pub abs_bottom_right: Vec2,
    pub size: Vec2,
    pub position_known: bool,
    pub size_known: bool,
}

impl PositionRecord {
    fn refresh(&mut self) {
        self.abs_top_left = Vec2::new(self.top_left.x, -self.top_left.y);
        self.abs_bottom_right = self.abs_top_left + self.size;
    }
}

/// Per-index position ledger.
///
/// Records are created lazily: the backing storage grows to the highest referenced index and is
/// only truncated when the item count shrinks. A reload rebuilds every record wholesale.
#[derive(Clone, Debug)]
pub struct PositionLedger {
    axis: Axis,
    records: Vec<PositionRecord>,
    item_count: usize,
    positions_known: usize,
    sizes_known: usize,
    known_main_total: f64,
}

impl PositionLedger {
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            records: Vec::new(),
            item_count: 0,
            positions_known: 0,
            sizes_known: 0,
            known_main_total: 0.0,
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// Drops every record and starts a new reload cycle for `item_count` items.
    pub fn reset(&mut self, item_count: usize) {
        self.records.clear();
        self.item_count = item_count;
        self.positions_known = 0;
        self.sizes_known = 0;
        self.known_main_total = 0.0;
    }

    /// Changes the item count, truncating records past the new end.
    pub fn set_item_count(&mut self, item_count: usize) {
        if item_count < self.records.len() {
            for record in &self.records[item_count..] {
                if record.position_known {
                    self.positions_known -= 1;
                }
                if record.size_known {
                    self.sizes_known -= 1;
                    self.known_main_total -= self.axis.main(record.size) as f64;
                }
            }
            self.records.truncate(item_count);
        }
        self.item_count = item_count;
    }

    pub fn get(&self, index: usize) -> Option<&PositionRecord> {
        if index >= self.item_count {
            return None;
        }
        self.records.get(index)
    }

    pub fn is_position_known(&self, index: usize) -> bool {
        self.get(index).is_some_and(|r| r.position_known)
    }

    pub fn is_size_known(&self, index: usize) -> bool {
        self.get(index).is_some_and(|r| r.size_known)
    }

    pub fn all_positions_known(&self) -> bool {
        self.positions_known == self.item_count
    }

    pub fn positions_known(&self) -> usize {
        self.positions_known
    }

    /// Average main-axis size over all measured records.
    pub fn average_main_size(&self) -> Option<f32> {
        (self.sizes_known > 0).then(|| (self.known_main_total / self.sizes_known as f64) as f32)
    }

    pub fn set_position(&mut self, index: usize, top_left: Vec2) -> bool {
        let Some(record) = self.record_mut(index) else {
            return false;
        };
        let newly_known = !record.position_known;
        record.top_left = top_left;
        record.position_known = true;
        record.refresh();
        if newly_known {
            self.positions_known += 1;
        }
        true
    }

    pub fn set_size(&mut self, index: usize, size: Vec2) -> bool {
        let axis = self.axis;
        let Some(record) = self.record_mut(index) else {
            return false;
        };
        let previous = record.size_known.then(|| axis.main(record.size));
        record.size = size;
        record.size_known = true;
        record.refresh();
        match previous {
            Some(old) => self.known_main_total += (axis.main(size) - old) as f64,
            None => {
                self.sizes_known += 1;
                self.known_main_total += axis.main(size) as f64;
            }
        }
        true
    }

    pub fn set_position_and_size(&mut self, index: usize, top_left: Vec2, size: Vec2) -> bool {
        self.set_size(index, size) && self.set_position(index, top_left)
    }

    /// Moves a known position by `delta` along the scroll axis.
    pub fn shift_main(&mut self, index: usize, delta: f32) -> bool {
        let axis = self.axis;
        let Some(record) = self.record_mut(index) else {
            return false;
        };
        if !record.position_known {
            return false;
        }
        let main = axis.main(record.abs_top_left) + delta;
        let cross = axis.cross(record.abs_top_left);
        record.top_left = axis.layout_point(main, cross);
        record.refresh();
        true
    }

    fn record_mut(&mut self, index: usize) -> Option<&mut PositionRecord> {
        if index >= self.item_count {
            return None;
        }
        if self.records.len() <= index {
            self.records.resize(index + 1, PositionRecord::default());
        }
        self.records.get_mut(index)
    }
}
