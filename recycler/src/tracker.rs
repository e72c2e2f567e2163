use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{ConfigError, Result};
use crate::geometry::{self, IndexGeometry};
use crate::{
    DataSource, MovementRestriction, PositionLedger, PrototypeId, RecyclePool, RecyclerOptions,
    RenderHost, ScrollDirection, Vec2, ViewHandle, WindowState,
};

/// Lifecycle of a [`WindowTracker`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrackerState {
    #[default]
    Uninitialized,
    Initializing,
    Steady,
    Reconciling,
    Destroyed,
}

/// Per-prototype view accounting. `live + pooled == created` always holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolStats {
    pub prototype: PrototypeId,
    pub live: usize,
    pub pooled: usize,
    pub created: usize,
}

#[derive(Clone, Copy, Debug, Default)]
struct EdgeFlags {
    at_start: bool,
    at_end: bool,
    last_visible: bool,
    pulled: bool,
    pushed: bool,
}

#[derive(Clone, Copy, Debug)]
enum Anchor {
    /// The line starts at this main-axis position.
    Start(f32),
    /// The line ends at this main-axis position.
    End(f32),
}

/// The windowing and recycling core.
///
/// Tracks which lines are materialized, grows/shrinks that window as the viewport moves,
/// recycles views through per-prototype pools and keeps the position ledger consistent.
///
/// The tracker holds no collaborators: every mutating call borrows the [`DataSource`] and the
/// [`RenderHost`] for its duration.
pub struct WindowTracker<N> {
    options: RecyclerOptions,
    geometry: Box<dyn IndexGeometry>,
    ledger: PositionLedger,
    pool: RecyclePool<N>,
    live: BTreeMap<usize, ViewHandle<N>>,
    hidden_statics: HashMap<usize, ViewHandle<N>>,
    created: HashMap<PrototypeId, usize>,
    pending_reload: BTreeSet<usize>,
    window: Option<WindowState>,
    state: TrackerState,
    viewport: Vec2,
    offset: f32,
    direction: ScrollDirection,
    extra: usize,
    sizes_from_source: bool,
    content_size: f32,
    furthest_known: Option<usize>,
    movement: Option<MovementRestriction>,
    edges: EdgeFlags,
    clearance_pending: bool,
    suspended: bool,
    navigating: bool,
    deferred_offset: f32,
    will_focus: Option<(usize, bool)>,
}

impl<N> core::fmt::Debug for WindowTracker<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WindowTracker")
            .field("state", &self.state)
            .field("window", &self.window)
            .field("item_count", &self.geometry.item_count())
            .field("offset", &self.offset)
            .field("content_size", &self.content_size)
            .field("live", &self.live.len())
            .field("pooled", &self.pool.total_pooled())
            .finish_non_exhaustive()
    }
}

impl<N> WindowTracker<N> {
    pub fn new(options: RecyclerOptions) -> Self {
        let geometry = geometry::from_options(&options);
        Self {
            ledger: PositionLedger::new(options.axis),
            geometry,
            options,
            pool: RecyclePool::new(),
            live: BTreeMap::new(),
            hidden_statics: HashMap::new(),
            created: HashMap::new(),
            pending_reload: BTreeSet::new(),
            window: None,
            state: TrackerState::Uninitialized,
            viewport: Vec2::ZERO,
            offset: 0.0,
            direction: ScrollDirection::Forward,
            extra: 0,
            sizes_from_source: false,
            content_size: 0.0,
            furthest_known: None,
            movement: None,
            edges: EdgeFlags::default(),
            clearance_pending: false,
            suspended: false,
            navigating: false,
            deferred_offset: 0.0,
            will_focus: None,
        }
    }

    pub fn options(&self) -> &RecyclerOptions {
        &self.options
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    /// The materialized window, `None` while nothing is materialized.
    pub fn window(&self) -> Option<WindowState> {
        self.window
    }

    pub fn window_state(&self) -> WindowState {
        self.window.unwrap_or_default()
    }

    pub fn item_count(&self) -> usize {
        self.geometry.item_count()
    }

    pub fn line_count(&self) -> usize {
        self.geometry.line_count()
    }

    pub fn line_of(&self, index: usize) -> Option<usize> {
        self.geometry.line_of(index)
    }

    pub fn geometry(&self) -> &dyn IndexGeometry {
        self.geometry.as_ref()
    }

    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    pub fn pool(&self) -> &RecyclePool<N> {
        &self.pool
    }

    /// Last reconciled content offset.
    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn direction(&self) -> ScrollDirection {
        self.direction
    }

    pub fn content_size(&self) -> f32 {
        self.content_size
    }

    pub fn max_offset(&self) -> f32 {
        (self.content_size - self.viewport_main()).max(0.0)
    }

    pub fn all_positions_known(&self) -> bool {
        self.geometry.cell_size().is_some() || self.ledger.all_positions_known()
    }

    pub fn view(&self, index: usize) -> Option<&ViewHandle<N>> {
        self.live.get(&index)
    }

    pub fn view_mut(&mut self, index: usize) -> Option<&mut ViewHandle<N>> {
        self.live.get_mut(&index)
    }

    pub fn live_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.live.keys().copied()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_pending_reload(&self, index: usize) -> bool {
        self.pending_reload.contains(&index)
    }

    pub fn clearance_pending(&self) -> bool {
        self.clearance_pending
    }

    /// Forces the next reconcile to run even if the offset did not move.
    pub fn mark_clearance_pending(&mut self) {
        self.clearance_pending = true;
    }

    /// While suspended, offsets are recorded but the window does not grow or shrink.
    pub fn set_suspended(&mut self, suspended: bool) {
        self.suspended = suspended;
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// While navigating, scroll corrections caused by size changes are deferred to the next
    /// full recompute.
    pub fn set_navigating(&mut self, navigating: bool) {
        self.navigating = navigating;
    }

    /// Hands over the scroll correction deferred while navigating.
    ///
    /// The caller becomes responsible for applying it, usually by shifting its animation.
    pub fn take_deferred_offset(&mut self) -> f32 {
        core::mem::take(&mut self.deferred_offset)
    }

    pub fn pool_stats(&self) -> Vec<PoolStats> {
        let prototypes: BTreeSet<&PrototypeId> =
            self.created.keys().chain(self.pool.prototypes()).collect();
        prototypes
            .into_iter()
            .map(|prototype| PoolStats {
                prototype: prototype.clone(),
                live: self
                    .live
                    .values()
                    .filter(|h| !h.is_static() && h.prototype() == prototype)
                    .count(),
                pooled: self.pool.pooled_count(prototype),
                created: self.created.get(prototype).copied().unwrap_or(0),
            })
            .collect()
    }

    /// Offset that aligns `index` with the viewport start, if its position is known.
    pub fn exact_offset(&self, index: usize) -> Option<f32> {
        let line = self.geometry.line_of(index)?;
        if line == 0 {
            return Some(0.0);
        }
        self.line_span(line).map(|(start, _)| start)
    }

    /// Best current guess for [`Self::exact_offset`], extrapolated from measured sizes.
    pub fn estimated_offset(&self, index: usize) -> f32 {
        match self.geometry.line_of(index) {
            Some(0) => 0.0,
            Some(line) => self.estimated_line_start(line),
            None => self.max_offset(),
        }
    }

    /// Maps `t` in `[0, 1]` onto the scrollable range.
    pub fn normalized_offset(&self, t: f32) -> f32 {
        t.clamp(0.0, 1.0) * self.max_offset()
    }

    fn viewport_main(&self) -> f32 {
        self.options.axis.main(self.viewport)
    }

    fn update_window(&mut self, f: impl FnOnce(&mut WindowState)) {
        if let Some(w) = self.window.as_mut() {
            f(w);
        }
    }

    /// Main-axis `(start, end)` of `line` when it is known.
    fn line_span(&self, line: usize) -> Option<(f32, f32)> {
        if let Some(cell) = self.geometry.cell_size() {
            if line >= self.geometry.line_count() {
                return None;
            }
            let main = self.options.axis.main(cell);
            let start = self.options.padding_start + line as f32 * (main + self.options.spacing);
            return Some((start, start + main));
        }
        let index = self.geometry.actual_index(line)?;
        let record = self.ledger.get(index)?;
        (record.position_known && record.size_known).then(|| {
            let axis = self.options.axis;
            (
                axis.main(record.abs_top_left),
                axis.main(record.abs_bottom_right),
            )
        })
    }

    fn span(&self, line: usize) -> (f32, f32) {
        self.line_span(line).unwrap_or_else(|| {
            let start = self.estimated_line_start(line);
            (start, start)
        })
    }

    fn average_line_size(&self) -> f32 {
        if let Some(cell) = self.geometry.cell_size() {
            return self.options.axis.main(cell);
        }
        self.ledger
            .average_main_size()
            .unwrap_or_else(|| self.viewport_main().max(1.0))
    }

    fn nearest_known_line(&self, line: usize) -> Option<usize> {
        let last = self.furthest_known?;
        (0..=last)
            .filter(|&l| self.line_span(l).is_some())
            .min_by_key(|&l| l.abs_diff(line))
    }

    fn estimated_line_start(&self, line: usize) -> f32 {
        if let Some((start, _)) = self.line_span(line) {
            return start;
        }
        let stride = self.average_line_size() + self.options.spacing;
        match self.nearest_known_line(line) {
            Some(known) if known < line => {
                let end = self.line_span(known).map_or(0.0, |(_, end)| end);
                end + self.options.spacing + (line - known - 1) as f32 * stride
            }
            Some(known) => {
                let start = self.line_span(known).map_or(0.0, |(start, _)| start);
                start - (known - line) as f32 * stride
            }
            None => self.options.padding_start + line as f32 * stride,
        }
    }

    fn correct_offset<H: RenderHost<Node = N>>(&mut self, host: &mut H, delta: f32) {
        if self.navigating {
            self.deferred_offset += delta;
            return;
        }
        self.offset += delta;
        host.set_offset(self.offset);
    }

    fn shift_lines<H: RenderHost<Node = N>>(
        &mut self,
        host: &mut H,
        from: usize,
        to: usize,
        delta: f32,
    ) {
        for line in from..=to {
            for index in self.geometry.line_items(line) {
                if !self.ledger.shift_main(index, delta) {
                    continue;
                }
                if let (Some(handle), Some(record)) =
                    (self.live.get_mut(&index), self.ledger.get(index))
                {
                    host.place(&mut handle.node, record.top_left, record.size);
                }
            }
        }
    }

    /// Shifts everything after `index` by `delta`, compensating the offset when the change
    /// happened before the visible window.
    fn apply_size_delta<H: RenderHost<Node = N>>(&mut self, host: &mut H, index: usize, delta: f32) {
        if delta.abs() <= f32::EPSILON || self.geometry.cell_size().is_some() {
            return;
        }
        let Some(line) = self.geometry.line_of(index) else {
            return;
        };
        vtrace!(index, delta, "size delta");
        if let Some(last) = self.furthest_known.filter(|&last| last > line) {
            self.shift_lines(host, line + 1, last, delta);
        }
        if self.window.is_some_and(|w| line < w.min_visible) {
            self.correct_offset(host, delta);
        }
    }
}

impl<N> WindowTracker<N> {
    /// Validates the configuration and (re)builds the window from index 0.
    ///
    /// Nothing is mutated when validation fails.
    pub fn reset<S, H>(&mut self, source: &mut S, host: &mut H) -> Result<()>
    where
        S: DataSource<N>,
        H: RenderHost<Node = N>,
    {
        if self.state == TrackerState::Destroyed {
            return Err(ConfigError::AlreadyDestroyed);
        }
        if source.prototypes().is_empty() {
            return Err(ConfigError::EmptyPrototypes);
        }
        let viewport = host.viewport_size();
        let count = source.item_count();
        let mut geometry = geometry::from_options(&self.options);
        geometry.set_item_count(count);
        geometry.configure(viewport)?;

        vdebug!(count, "reset");
        self.state = TrackerState::Initializing;
        self.retire_all(source, host);
        for prototype in source.prototypes() {
            self.pool.register(prototype);
        }
        self.geometry = geometry;
        self.viewport = viewport;
        self.extra = source.extra_items_visible();
        self.sizes_from_source = source.is_item_size_known();
        self.ledger.reset(count);
        self.pending_reload.clear();
        self.furthest_known = None;
        self.window = None;
        self.edges = EdgeFlags::default();
        self.movement = None;
        self.offset = 0.0;
        self.direction = ScrollDirection::Forward;
        self.deferred_offset = 0.0;
        self.will_focus = None;
        self.suspended = false;
        self.navigating = false;
        host.set_offset(0.0);

        if self.sizes_from_source {
            self.precompute_positions(source);
        }
        self.initialize_window(source, host, 0, None);
        self.clearance_pending = false;
        self.state = TrackerState::Steady;
        self.finish_pass(source, host, true);
        Ok(())
    }

    /// Per-tick reconciliation against a new content offset.
    ///
    /// Returns `true` when the window was reconsidered. Offsets closer than the scroll epsilon to
    /// the last reconciled one are ignored unless clearance is pending.
    pub fn reconcile<S, H>(&mut self, source: &mut S, host: &mut H, offset: f32) -> bool
    where
        S: DataSource<N>,
        H: RenderHost<Node = N>,
    {
        if self.state != TrackerState::Steady {
            return false;
        }
        let moved = (offset - self.offset).abs() >= self.options.tolerances.scroll_epsilon;
        if !moved && !self.clearance_pending {
            return false;
        }
        if offset > self.offset {
            self.direction = ScrollDirection::Forward;
        } else if offset < self.offset {
            self.direction = ScrollDirection::Backward;
        }
        self.offset = offset;
        if self.suspended {
            return false;
        }

        vtrace!(offset, direction = ?self.direction, "reconcile");
        if self.window.is_none() {
            self.initialize_window(source, host, 0, None);
        } else {
            self.settle(source, host);
        }
        self.clearance_pending = false;
        self.finish_pass(source, host, false);
        true
    }

    /// Full recompute: finds the visible lines among the live ones straight from the ledger,
    /// then grows/shrinks the look-ahead buffer by the difference.
    pub fn recompute_window<S, H>(&mut self, source: &mut S, host: &mut H)
    where
        S: DataSource<N>,
        H: RenderHost<Node = N>,
    {
        if self.state != TrackerState::Steady {
            return;
        }
        if !self.navigating && self.deferred_offset != 0.0 {
            let delta = core::mem::take(&mut self.deferred_offset);
            self.correct_offset(host, delta);
        }

        let lines = self.geometry.line_count();
        match self.window {
            _ if lines == 0 => {
                self.retire_all(source, host);
                self.window = None;
            }
            None => self.initialize_window(source, host, 0, None),
            Some(w) => {
                let (o, v) = (self.offset, self.viewport_main());
                let mut visible: Option<(usize, usize)> = None;
                for line in w.min_extra..=w.max_extra {
                    let Some((start, end)) = self.line_span(line) else {
                        continue;
                    };
                    if end > o && start < o + v {
                        visible = Some(visible.map_or((line, line), |(first, _)| (first, line)));
                    }
                }
                match visible {
                    Some((first, last)) => self.update_window(|w| {
                        w.min_visible = first;
                        w.max_visible = last;
                    }),
                    None if self.span(w.min_extra).0 >= o + v => {
                        self.direction = ScrollDirection::Backward;
                        self.update_window(|w| {
                            w.min_visible = w.min_extra;
                            w.max_visible = w.min_extra;
                        });
                    }
                    None => {
                        self.direction = ScrollDirection::Forward;
                        self.update_window(|w| {
                            w.min_visible = w.max_extra;
                            w.max_visible = w.max_extra;
                        });
                    }
                }
                self.settle(source, host);
            }
        }
        self.clearance_pending = false;
        self.finish_pass(source, host, false);
    }

    /// Re-reads the data source and reconciles the window with the new item count.
    ///
    /// With `reload_all_visible`, every record is rebuilt and every live view rebound; the first
    /// visible item keeps its on-screen position. Otherwise live views are kept, views whose
    /// prototype changed are replaced and items past the new end are retired.
    pub fn reload_data<S, H>(&mut self, source: &mut S, host: &mut H, reload_all_visible: bool)
    where
        S: DataSource<N>,
        H: RenderHost<Node = N>,
    {
        let anchor = self.capture_anchor();
        self.reload_with_anchor(source, host, reload_all_visible, anchor);
    }

    /// Re-measures / rebinds one item.
    ///
    /// Returns `false` when the item is not live; the reload is then applied the next time the
    /// item is shown. Indices past the item count are ignored.
    pub fn reload_item<S, H>(
        &mut self,
        source: &mut S,
        host: &mut H,
        index: usize,
        tag: Option<&str>,
        reload_data: bool,
    ) -> bool
    where
        S: DataSource<N>,
        H: RenderHost<Node = N>,
    {
        if self.state != TrackerState::Steady || index >= self.item_count() {
            return false;
        }
        self.state = TrackerState::Reconciling;
        let axis = self.options.axis;
        let applied = match self.live.remove(&index) {
            Some(mut handle) => {
                if reload_data {
                    source.reload_item_data(&mut handle, index, tag);
                }
                let old = self.ledger.get(index).map_or(0.0, |r| axis.main(r.size));
                let size = self.measure(source, host, &mut handle, index, true);
                self.ledger.set_size(index, size);
                if let Some(record) = self.ledger.get(index) {
                    host.place(&mut handle.node, record.top_left, size);
                }
                handle.set_bounds(size);
                self.live.insert(index, handle);
                self.apply_size_delta(host, index, axis.main(size) - old);
                true
            }
            None => {
                if self.sizes_from_source
                    && self.geometry.cell_size().is_none()
                    && self.ledger.is_size_known(index)
                {
                    let old = self.ledger.get(index).map_or(0.0, |r| axis.main(r.size));
                    let ignore = source.ignore_content_padding(index);
                    let main = source.item_size(index);
                    self.ledger
                        .set_size(index, axis.compose(main, self.cross_extent(ignore)));
                    self.apply_size_delta(host, index, main - old);
                }
                self.pending_reload.insert(index);
                false
            }
        };
        vtrace!(index, applied, "reload item");
        self.state = TrackerState::Steady;
        self.recompute_window(source, host);
        applied
    }

    /// Re-applies the ledger position of a live item to its view.
    pub fn set_item_position<H>(&mut self, host: &mut H, index: usize) -> bool
    where
        H: RenderHost<Node = N>,
    {
        if index >= self.item_count() {
            return false;
        }
        match (self.live.get_mut(&index), self.ledger.get(index)) {
            (Some(handle), Some(record)) => {
                host.place(&mut handle.node, record.top_left, record.size);
                true
            }
            _ => {
                self.pending_reload.insert(index);
                false
            }
        }
    }

    /// Explicit viewport-resized event from the host.
    pub fn on_viewport_resized<S, H>(&mut self, source: &mut S, host: &mut H, viewport: Vec2)
    where
        S: DataSource<N>,
        H: RenderHost<Node = N>,
    {
        if self.state != TrackerState::Steady || viewport == self.viewport {
            return;
        }
        let axis = self.options.axis;
        let cross_changed = (axis.cross(viewport) - axis.cross(self.viewport)).abs() > f32::EPSILON;
        let anchor = self.capture_anchor();
        self.viewport = viewport;
        vdebug!(width = viewport.x, height = viewport.y, "viewport resized");

        if self.geometry.is_flexible() {
            if let Err(_err) = self.geometry.configure(viewport) {
                vwarn!(error = %_err, "flexible grid could not be resolved");
                return;
            }
            self.reload_with_anchor(source, host, true, anchor);
        } else if cross_changed && self.geometry.cell_size().is_none() {
            self.reload_with_anchor(source, host, true, anchor);
        } else {
            self.clearance_pending = true;
            self.recompute_window(source, host);
        }
    }

    /// Fires `on_page_will_focus` now if `index` is live, otherwise once it is materialized.
    pub fn queue_will_focus<S>(&mut self, source: &mut S, index: usize, is_forward: bool)
    where
        S: DataSource<N>,
    {
        match self.live.get_mut(&index) {
            Some(handle) => {
                self.will_focus = None;
                source.on_page_will_focus(index, is_forward, Some(handle));
            }
            None => self.will_focus = Some((index, is_forward)),
        }
    }

    /// Destroys live and pooled views and hides static ones. Further calls are ignored.
    pub fn destroy<S, H>(&mut self, source: &mut S, host: &mut H)
    where
        S: DataSource<N>,
        H: RenderHost<Node = N>,
    {
        if self.state == TrackerState::Destroyed {
            return;
        }
        vdebug!(live = self.live.len(), pooled = self.pool.total_pooled(), "destroy");
        for (index, mut handle) in core::mem::take(&mut self.live) {
            source.on_item_hidden(index, &mut handle);
            if handle.is_static() {
                host.set_active(&mut handle.node, false);
            } else {
                host.destroy(handle.node);
            }
        }
        self.hidden_statics.clear();
        for handle in self.pool.drain() {
            host.destroy(handle.node);
        }
        self.created.clear();
        self.pending_reload.clear();
        self.window = None;
        self.will_focus = None;
        self.state = TrackerState::Destroyed;
    }

    fn capture_anchor(&self) -> Option<(usize, f32)> {
        let w = self.window?;
        let index = self.geometry.line_items(w.min_visible).first().copied()?;
        Some((index, self.span(w.min_visible).0))
    }

    fn reload_with_anchor<S, H>(
        &mut self,
        source: &mut S,
        host: &mut H,
        reload_all_visible: bool,
        anchor: Option<(usize, f32)>,
    ) where
        S: DataSource<N>,
        H: RenderHost<Node = N>,
    {
        if self.state != TrackerState::Steady {
            vwarn!(state = ?self.state, "reload ignored");
            return;
        }
        self.state = TrackerState::Reconciling;
        let count = source.item_count();
        let sizes_from_source = source.is_item_size_known();
        vdebug!(count, reload_all_visible, "reload data");
        let full = reload_all_visible
            || sizes_from_source
            || sizes_from_source != self.sizes_from_source
            || self.options.reverse
            || self.geometry.cell_size().is_some();
        self.extra = source.extra_items_visible();
        self.sizes_from_source = sizes_from_source;

        let stale: Vec<usize> = self.live.range(count..).map(|(&i, _)| i).collect();
        for index in stale {
            self.retire_index(source, host, index);
        }
        self.pending_reload.retain(|&i| i < count);
        if self.will_focus.is_some_and(|(i, _)| i >= count) {
            self.will_focus = None;
        }
        self.geometry.set_item_count(count);
        let lines = self.geometry.line_count();

        if full {
            self.retire_all(source, host);
            self.ledger.reset(count);
            self.furthest_known = None;
            self.window = None;
            if sizes_from_source {
                self.precompute_positions(source);
            }
            if lines > 0 {
                let (line, start) = match anchor {
                    Some((index, start)) if index < count => {
                        (self.geometry.line_of(index).unwrap_or(0), Some(start))
                    }
                    Some(_) => (lines - 1, None),
                    None => (0, None),
                };
                self.initialize_window(source, host, line, start);
            }
        } else {
            self.ledger.set_item_count(count);
            self.furthest_known = match lines.checked_sub(1) {
                Some(last) => self.furthest_known.map(|k| k.min(last)),
                None => None,
            };
            self.refresh_live_views(source, host);
            match self.window {
                Some(w) if lines > 0 && w.min_extra < lines => {
                    let last = lines - 1;
                    self.update_window(|w| {
                        w.max_extra = w.max_extra.min(last);
                        w.max_visible = w.max_visible.min(w.max_extra);
                        w.min_visible = w.min_visible.min(w.max_visible);
                    });
                }
                Some(_) if lines > 0 => {
                    self.retire_all(source, host);
                    self.window = None;
                    let start = self.estimated_line_start(lines - 1);
                    self.initialize_window(source, host, lines - 1, Some(start));
                }
                _ => {
                    self.retire_all(source, host);
                    self.window = None;
                }
            }
        }

        self.state = TrackerState::Steady;
        self.clearance_pending = true;
        self.recompute_window(source, host);
    }

    /// Rebinds every live view to the data now at its index and re-measures it.
    ///
    /// Views whose prototype no longer matches are swapped for a matching one first. Indices
    /// are visited in ascending order so each size delta lands before the next line is placed.
    fn refresh_live_views<S, H>(&mut self, source: &mut S, host: &mut H)
    where
        S: DataSource<N>,
        H: RenderHost<Node = N>,
    {
        let axis = self.options.axis;
        let indices: Vec<usize> = self.live.keys().copied().collect();
        for index in indices {
            let Some(handle) = self.live.remove(&index) else {
                continue;
            };
            let created = handle.is_static() != source.is_item_static(index)
                || *handle.prototype() != source.prototype(index);
            let mut handle = if created {
                vtrace!(index, "prototype changed");
                self.retire_handle(source, host, index, handle);
                self.obtain_view(source, host, index)
            } else {
                handle
            };
            source.set_item_data(&mut handle, index);
            self.pending_reload.remove(&index);
            let old = self.ledger.get(index).map_or(0.0, |r| axis.main(r.size));
            let size = self.measure(source, host, &mut handle, index, true);
            self.ledger.set_size(index, size);
            if let Some(record) = self.ledger.get(index) {
                host.place(&mut handle.node, record.top_left, size);
            }
            handle.set_bounds(size);
            if created {
                source.on_item_created(index, &mut handle);
            }
            self.live.insert(index, handle);
            self.apply_size_delta(host, index, axis.main(size) - old);
        }
    }

    fn precompute_positions<S: DataSource<N>>(&mut self, source: &S) {
        if self.geometry.cell_size().is_some() {
            return;
        }
        let axis = self.options.axis;
        let lines = self.geometry.line_count();
        let mut start = self.leading_padding(source);
        for line in 0..lines {
            let Some(index) = self.geometry.actual_index(line) else {
                continue;
            };
            let ignore = source.ignore_content_padding(index);
            let size = axis.compose(source.item_size(index), self.cross_extent(ignore));
            let top_left = axis.layout_point(start, self.cross_start(index, ignore));
            self.ledger.set_position_and_size(index, top_left, size);
            start += axis.main(size) + self.options.spacing;
        }
        self.furthest_known = lines.checked_sub(1);
    }

    /// Materializes `line` and grows the window until the viewport and look-ahead are covered.
    fn initialize_window<S, H>(
        &mut self,
        source: &mut S,
        host: &mut H,
        line: usize,
        start: Option<f32>,
    ) where
        S: DataSource<N>,
        H: RenderHost<Node = N>,
    {
        let lines = self.geometry.line_count();
        let Some(last) = lines.checked_sub(1) else {
            self.window = None;
            return;
        };
        let line = line.min(last);
        let start = if line == 0 {
            self.line_span(0)
                .map_or_else(|| self.leading_padding(source), |(s, _)| s)
        } else if self.sizes_from_source || self.geometry.cell_size().is_some() {
            self.estimated_line_start(line)
        } else {
            start.unwrap_or_else(|| self.estimated_line_start(line))
        };
        vtrace!(line, start, "initialize window");
        self.materialize_line(source, host, line, Anchor::Start(start));
        self.window = Some(WindowState::single(line));
        self.settle(source, host);
    }

    /// Directional sweep, gap clearance, exact visible bounds, then a final sweep so the
    /// look-ahead buffer matches the direction again.
    fn settle<S, H>(&mut self, source: &mut S, host: &mut H)
    where
        S: DataSource<N>,
        H: RenderHost<Node = N>,
    {
        self.sweep(source, host);
        self.clear_gaps(source, host);
        self.trim_visible();
        self.sweep(source, host);
    }

    fn sweep<S, H>(&mut self, source: &mut S, host: &mut H)
    where
        S: DataSource<N>,
        H: RenderHost<Node = N>,
    {
        match self.direction {
            ScrollDirection::Forward => self.sweep_forward(source, host),
            ScrollDirection::Backward => self.sweep_backward(source, host),
        }
    }

    fn sweep_forward<S, H>(&mut self, source: &mut S, host: &mut H)
    where
        S: DataSource<N>,
        H: RenderHost<Node = N>,
    {
        let lines = self.geometry.line_count();
        let spacing = self.options.spacing;
        loop {
            let Some(w) = self.window else {
                return;
            };
            let mut progressed = false;

            // Hide the trailing edge first so the pool can serve the leading edge.
            if w.min_visible < w.max_visible && self.span(w.min_visible).1 <= self.offset {
                self.update_window(|w| w.min_visible += 1);
                progressed = true;
            }
            while self.retire_first(source, host) {
                progressed = true;
            }

            let w = self.window_state();
            let next = w.max_visible + 1;
            if next < lines && self.span(w.max_visible).1 + spacing < self.offset + self.viewport_main()
            {
                if w.max_extra < next {
                    self.extend_end(source, host);
                }
                self.update_window(|w| w.max_visible = next);
                progressed = true;
            }
            let want = (self.window_state().max_visible + self.extra).min(lines - 1);
            while self.window_state().max_extra < want && self.extend_end(source, host) {
                progressed = true;
            }
            while self.window_state().max_extra > want && self.retire_last(source, host) {
                progressed = true;
            }

            if !progressed {
                break;
            }
        }
    }

    fn sweep_backward<S, H>(&mut self, source: &mut S, host: &mut H)
    where
        S: DataSource<N>,
        H: RenderHost<Node = N>,
    {
        let spacing = self.options.spacing;
        loop {
            let Some(w) = self.window else {
                return;
            };
            let mut progressed = false;

            if w.max_visible > w.min_visible
                && self.span(w.max_visible).0 >= self.offset + self.viewport_main()
            {
                self.update_window(|w| w.max_visible -= 1);
                progressed = true;
            }
            while self.retire_last(source, host) {
                progressed = true;
            }

            let w = self.window_state();
            if w.min_visible > 0 && self.span(w.min_visible).0 - spacing > self.offset {
                let prev = w.min_visible - 1;
                if w.min_extra > prev {
                    self.extend_start(source, host);
                }
                self.update_window(|w| w.min_visible = prev);
                progressed = true;
            }
            let want = self.window_state().min_visible.saturating_sub(self.extra);
            while self.window_state().min_extra > want && self.extend_start(source, host) {
                progressed = true;
            }
            while self.window_state().min_extra < want && self.retire_first(source, host) {
                progressed = true;
            }

            if !progressed {
                break;
            }
        }
    }

    /// Shows lines at either visible edge when the gap to the viewport edge exceeds one spacing
    /// unit. Covers discontinuous jumps and content shrinking under the viewport.
    fn clear_gaps<S, H>(&mut self, source: &mut S, host: &mut H)
    where
        S: DataSource<N>,
        H: RenderHost<Node = N>,
    {
        let lines = self.geometry.line_count();
        let spacing = self.options.spacing;
        let eps = self.options.tolerances.clearance_epsilon;
        loop {
            let Some(w) = self.window else {
                return;
            };
            if w.min_visible > 0 && self.span(w.min_visible).0 - spacing > self.offset + eps {
                let prev = w.min_visible - 1;
                if w.min_extra > prev {
                    self.extend_start(source, host);
                }
                self.update_window(|w| w.min_visible = prev);
                continue;
            }
            let next = w.max_visible + 1;
            if next < lines
                && self.span(w.max_visible).1 + spacing < self.offset + self.viewport_main() - eps
            {
                if w.max_extra < next {
                    self.extend_end(source, host);
                }
                self.update_window(|w| w.max_visible = next);
                continue;
            }
            break;
        }
    }

    fn trim_visible(&mut self) {
        let (o, v) = (self.offset, self.viewport_main());
        loop {
            let Some(w) = self.window else {
                return;
            };
            if w.min_visible < w.max_visible && self.span(w.min_visible).1 <= o {
                self.update_window(|w| w.min_visible += 1);
            } else if w.max_visible > w.min_visible && self.span(w.max_visible).0 >= o + v {
                self.update_window(|w| w.max_visible -= 1);
            } else {
                return;
            }
        }
    }

    fn extend_end<S, H>(&mut self, source: &mut S, host: &mut H) -> bool
    where
        S: DataSource<N>,
        H: RenderHost<Node = N>,
    {
        let Some(w) = self.window else {
            return false;
        };
        let next = w.max_extra + 1;
        if next >= self.geometry.line_count() {
            return false;
        }
        let start = self.span(w.max_extra).1 + self.options.spacing;
        self.materialize_line(source, host, next, Anchor::Start(start));
        self.update_window(|w| w.max_extra = next);
        true
    }

    fn extend_start<S, H>(&mut self, source: &mut S, host: &mut H) -> bool
    where
        S: DataSource<N>,
        H: RenderHost<Node = N>,
    {
        let Some(w) = self.window else {
            return false;
        };
        let Some(prev) = w.min_extra.checked_sub(1) else {
            return false;
        };
        let end = self.span(w.min_extra).0 - self.options.spacing;
        self.materialize_line(source, host, prev, Anchor::End(end));
        self.update_window(|w| w.min_extra = prev);
        true
    }

    fn retire_first<S, H>(&mut self, source: &mut S, host: &mut H) -> bool
    where
        S: DataSource<N>,
        H: RenderHost<Node = N>,
    {
        let Some(w) = self.window else {
            return false;
        };
        if w.min_extra >= w.min_visible {
            return false;
        }
        self.retire_line(source, host, w.min_extra);
        self.update_window(|w| w.min_extra += 1);
        true
    }

    fn retire_last<S, H>(&mut self, source: &mut S, host: &mut H) -> bool
    where
        S: DataSource<N>,
        H: RenderHost<Node = N>,
    {
        let Some(w) = self.window else {
            return false;
        };
        if w.max_extra <= w.max_visible {
            return false;
        }
        self.retire_line(source, host, w.max_extra);
        self.update_window(|w| w.max_extra -= 1);
        true
    }

    fn materialize_line<S, H>(&mut self, source: &mut S, host: &mut H, line: usize, anchor: Anchor)
    where
        S: DataSource<N>,
        H: RenderHost<Node = N>,
    {
        let axis = self.options.axis;
        let items = self.geometry.line_items(line);
        let mut bound = Vec::with_capacity(items.len());
        let mut extent = 0.0f32;
        for index in items {
            let mut handle = self.obtain_view(source, host, index);
            let remeasure = self.pending_reload.remove(&index);
            source.set_item_data(&mut handle, index);
            let size = self.measure(source, host, &mut handle, index, remeasure);
            extent = extent.max(axis.main(size));
            bound.push((index, handle, size));
        }

        let start = match anchor {
            Anchor::Start(start) => start,
            Anchor::End(end) => end - extent,
        };
        for (index, mut handle, size) in bound {
            let ignore = source.ignore_content_padding(index);
            let top_left = axis.layout_point(start, self.cross_start(index, ignore));
            self.ledger.set_position_and_size(index, top_left, size);
            handle.set_bounds(size);
            host.place(&mut handle.node, top_left, size);
            source.on_item_created(index, &mut handle);
            if let Some((_, is_forward)) = self.will_focus.filter(|&(i, _)| i == index) {
                self.will_focus = None;
                source.on_page_will_focus(index, is_forward, Some(&mut handle));
            }
            self.live.insert(index, handle);
        }
        vtrace!(line, start, extent, "materialize");

        if self.geometry.cell_size().is_none() {
            self.furthest_known = Some(self.furthest_known.map_or(line, |k| k.max(line)));
            let leading = self.leading_padding(source);
            self.stitch(host, line, anchor, start, start + extent, leading);
        }
    }

    /// Keeps known neighbors consistent with a freshly measured line.
    fn stitch<H>(
        &mut self,
        host: &mut H,
        line: usize,
        anchor: Anchor,
        start: f32,
        end: f32,
        leading: f32,
    ) where
        H: RenderHost<Node = N>,
    {
        let eps = self.options.tolerances.clearance_epsilon;
        match anchor {
            Anchor::Start(_) => {
                let next = line + 1;
                let (Some((next_start, _)), Some(last)) = (self.line_span(next), self.furthest_known)
                else {
                    return;
                };
                let delta = end + self.options.spacing - next_start;
                if delta.abs() > eps && next <= last {
                    self.shift_lines(host, next, last, delta);
                    if self.window.is_some_and(|w| line < w.min_visible) {
                        self.correct_offset(host, delta);
                    }
                }
            }
            // Positions built backwards from an anchor drift from the real content start;
            // re-align once the first line is reached.
            Anchor::End(_) if line == 0 => {
                let delta = leading - start;
                if delta.abs() > eps {
                    vdebug!(delta, "rebase content start");
                    let last = self.furthest_known.unwrap_or(0);
                    self.shift_lines(host, 0, last, delta);
                    self.correct_offset(host, delta);
                }
            }
            Anchor::End(_) => {}
        }
    }

    fn obtain_view<S, H>(&mut self, source: &mut S, host: &mut H, index: usize) -> ViewHandle<N>
    where
        S: DataSource<N>,
        H: RenderHost<Node = N>,
    {
        if source.is_item_static(index) {
            if let Some(mut handle) = self.hidden_statics.remove(&index) {
                host.set_active(&mut handle.node, true);
                return handle;
            }
            if let Some(node) = host.static_view(index) {
                let mut handle = ViewHandle::new_static(node, source.prototype(index), index);
                host.set_active(&mut handle.node, true);
                return handle;
            }
            vwarn!(index, "static item has no scene view, using the pool");
        }

        let prototype = source.prototype(index);
        let mut handle = match self.pool.try_acquire(&prototype) {
            Some(handle) => handle,
            None => {
                vtrace!(index, prototype = prototype.as_str(), "instantiate");
                let node = host.instantiate(&prototype);
                let capabilities = host.capabilities(&prototype);
                *self.created.entry(prototype.clone()).or_default() += 1;
                ViewHandle::new(node, prototype, capabilities)
            }
        };
        handle.assign(Some(index));
        host.set_active(&mut handle.node, true);
        handle
    }

    fn measure<S, H>(
        &self,
        source: &S,
        host: &mut H,
        handle: &mut ViewHandle<N>,
        index: usize,
        force: bool,
    ) -> Vec2
    where
        S: DataSource<N>,
        H: RenderHost<Node = N>,
    {
        if let Some(cell) = self.geometry.cell_size() {
            return cell;
        }
        if self.sizes_from_source {
            let ignore = source.ignore_content_padding(index);
            return self
                .options
                .axis
                .compose(source.item_size(index), self.cross_extent(ignore));
        }
        if !force {
            if let Some(record) = self.ledger.get(index).filter(|r| r.size_known) {
                return record.size;
            }
        }
        host.layout(&mut handle.node)
    }

    fn retire_line<S, H>(&mut self, source: &mut S, host: &mut H, line: usize)
    where
        S: DataSource<N>,
        H: RenderHost<Node = N>,
    {
        vtrace!(line, "retire");
        for index in self.geometry.line_items(line) {
            self.retire_index(source, host, index);
        }
    }

    fn retire_index<S, H>(&mut self, source: &mut S, host: &mut H, index: usize)
    where
        S: DataSource<N>,
        H: RenderHost<Node = N>,
    {
        let Some(handle) = self.live.remove(&index) else {
            return;
        };
        self.retire_handle(source, host, index, handle);
    }

    fn retire_all<S, H>(&mut self, source: &mut S, host: &mut H)
    where
        S: DataSource<N>,
        H: RenderHost<Node = N>,
    {
        for (index, handle) in core::mem::take(&mut self.live) {
            self.retire_handle(source, host, index, handle);
        }
    }

    fn retire_handle<S, H>(
        &mut self,
        source: &mut S,
        host: &mut H,
        index: usize,
        mut handle: ViewHandle<N>,
    ) where
        S: DataSource<N>,
        H: RenderHost<Node = N>,
    {
        source.on_item_hidden(index, &mut handle);
        host.set_active(&mut handle.node, false);
        if handle.is_static() {
            self.hidden_statics.insert(index, handle);
        } else {
            self.pool.release(handle);
        }
    }

    fn leading_padding<S: DataSource<N>>(&self, source: &S) -> f32 {
        match self.geometry.actual_index(0) {
            Some(index)
                if self.geometry.cell_size().is_none() && source.ignore_content_padding(index) =>
            {
                0.0
            }
            _ => self.options.padding_start,
        }
    }

    fn cross_extent(&self, ignore_padding: bool) -> f32 {
        let cross = self.options.axis.cross(self.viewport);
        if ignore_padding {
            cross
        } else {
            (cross - self.options.cross_padding_start - self.options.cross_padding_end).max(0.0)
        }
    }

    fn cross_start(&self, index: usize, ignore_padding: bool) -> f32 {
        let padding = if ignore_padding {
            0.0
        } else {
            self.options.cross_padding_start
        };
        padding + self.geometry.cross_offset(index)
    }

    fn compute_content_size<S: DataSource<N>>(&self, source: &S) -> f32 {
        let lines = self.geometry.line_count();
        let Some(last) = lines.checked_sub(1) else {
            return self.options.padding_start + self.options.padding_end;
        };
        let trailing = match self.geometry.actual_index(last) {
            Some(index)
                if self.geometry.cell_size().is_none() && source.ignore_content_padding(index) =>
            {
                0.0
            }
            _ => self.options.padding_end,
        };
        if self.geometry.cell_size().is_some() {
            return self.span(last).1 + trailing;
        }
        let stride = self.average_line_size() + self.options.spacing;
        match self.furthest_known.and_then(|k| self.line_span(k).map(|s| (k, s))) {
            Some((known, (_, end))) => end + (last - known) as f32 * stride + trailing,
            None => {
                self.leading_padding(source) + lines as f32 * stride - self.options.spacing
                    + trailing
            }
        }
    }

    /// Content size, edge callbacks, movement restriction and visual hooks.
    fn finish_pass<S, H>(&mut self, source: &mut S, host: &mut H, force: bool)
    where
        S: DataSource<N>,
        H: RenderHost<Node = N>,
    {
        let size = self.compute_content_size(source);
        if force || (size - self.content_size).abs() > f32::EPSILON {
            self.content_size = size;
            host.set_content_size(size);
        }
        self.update_edges(source, host);
        self.update_visuals(host);
    }

    fn update_edges<S, H>(&mut self, source: &mut S, host: &mut H)
    where
        S: DataSource<N>,
        H: RenderHost<Node = N>,
    {
        let lines = self.geometry.line_count();
        let eps = self.options.tolerances.edge_epsilon;
        let (o, v) = (self.offset, self.viewport_main());
        let max_offset = self.max_offset();

        let (first_visible, last_visible) = match (self.window, lines.checked_sub(1)) {
            (Some(w), Some(last)) => (w.min_visible == 0, w.max_visible == last),
            _ => (false, false),
        };
        let at_start = first_visible && o <= eps;
        let at_end = last_visible && o >= max_offset - eps;

        if at_start && !self.edges.at_start {
            vtrace!("reached start");
            source.on_reached_start();
        }
        self.edges.at_start = at_start;
        if at_end && !self.edges.at_end {
            vtrace!("reached end");
            source.on_reached_end();
        }
        self.edges.at_end = at_end;
        if last_visible && !self.edges.last_visible {
            source.on_last_item_visible();
        }
        self.edges.last_visible = last_visible;

        let fits = lines == 0 || (first_visible && last_visible && self.content_size <= v + eps);
        let movement = if fits {
            MovementRestriction::Clamped
        } else {
            MovementRestriction::Elastic
        };
        if self.movement != Some(movement) {
            self.movement = Some(movement);
            host.set_movement(movement);
        }

        if let Some(distance) = self.options.pull_to_refresh_distance {
            if o < -distance && !self.edges.pulled {
                self.edges.pulled = true;
                source.on_pull_to_refresh();
            } else if o >= 0.0 {
                self.edges.pulled = false;
            }
        }
        if let Some(distance) = self.options.push_to_close_distance {
            if o > max_offset + distance && !self.edges.pushed {
                self.edges.pushed = true;
                source.on_push_to_close();
            } else if o <= max_offset {
                self.edges.pushed = false;
            }
        }
    }

    fn update_visuals<H>(&mut self, host: &mut H)
    where
        H: RenderHost<Node = N>,
    {
        let axis = self.options.axis;
        let v = self.viewport_main().max(f32::EPSILON);
        for (&index, handle) in self.live.iter_mut() {
            if !handle.capabilities().visual_update {
                continue;
            }
            let Some(record) = self.ledger.get(index) else {
                continue;
            };
            let position = (axis.main(record.abs_top_left) - self.offset) / v;
            host.update_visual(&mut handle.node, index, position);
        }
    }
}
