use core::fmt;

use recycler::{
    DataSource, PoolStats, RecyclerOptions, RenderHost, Result, Vec2, ViewHandle, WindowTracker,
};

use crate::{
    Easing, Motion, NavigationKind, NavigationPolicy, NavigationStep, Navigator, PagedPolicy,
    PagingOptions, PlainPolicy, navigator::destination,
};

/// Safety net for instant navigations resolved within a single call.
const MAX_INSTANT_STEPS: usize = 64;

/// Re-landing attempts when the content keeps shifting under a finished navigation.
const MAX_SETTLE_PASSES: usize = 4;

/// The engine facade: owns the window tracker, the navigator, the navigation policy, the data
/// source and the rendering host.
///
/// Adapters drive it by calling:
/// - `on_scroll` / `begin_drag` / `end_drag` when UI scroll events occur
/// - `on_viewport_resized` when the viewport changes size
/// - `tick(dt)` each frame (for navigation and deferred clearance)
///
/// While a navigation runs, the offset returned from `tick()` is the one the scroll container
/// should show; the controller already pushed it to the host.
pub struct Controller<S, H: RenderHost> {
    tracker: WindowTracker<H::Node>,
    navigator: Navigator,
    policy: Box<dyn NavigationPolicy>,
    source: S,
    host: H,
    scroll_offset: f32,
    dragging: bool,
}

impl<S, H: RenderHost> fmt::Debug for Controller<S, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("tracker", &self.tracker)
            .field("navigator", &self.navigator)
            .field("policy", &self.policy)
            .field("scroll_offset", &self.scroll_offset)
            .field("dragging", &self.dragging)
            .finish_non_exhaustive()
    }
}

impl<S, H> Controller<S, H>
where
    H: RenderHost,
    S: DataSource<H::Node>,
{
    pub fn new(options: RecyclerOptions, source: S, host: H) -> Self {
        Self {
            tracker: WindowTracker::new(options),
            navigator: Navigator::default(),
            policy: Box::new(PlainPolicy),
            source,
            host,
            scroll_offset: 0.0,
            dragging: false,
        }
    }

    pub fn with_policy(mut self, policy: impl NavigationPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Paging mode: one item per page, drag releases settle on a page.
    pub fn with_paging(mut self, options: PagingOptions) -> Self {
        self.navigator.set_easing(options.easing);
        self.with_policy(PagedPolicy::new(options))
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.navigator.set_easing(easing);
        self
    }

    pub fn tracker(&self) -> &WindowTracker<H::Node> {
        &self.tracker
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    pub fn is_navigating(&self) -> bool {
        self.navigator.is_active()
    }

    pub fn remaining_budget(&self) -> Option<Motion> {
        self.navigator.remaining_budget()
    }

    pub fn current_page(&self) -> Option<usize> {
        self.policy.current_page()
    }

    pub fn stats(&self) -> Vec<PoolStats> {
        self.tracker.pool_stats()
    }

    /// Validates the configuration and builds the window from index 0.
    ///
    /// On error nothing changed.
    pub fn initialize(&mut self) -> Result<()> {
        self.tracker.reset(&mut self.source, &mut self.host)?;
        self.navigator.cancel();
        self.policy.reset();
        self.scroll_offset = 0.0;
        self.dragging = false;
        Ok(())
    }

    /// Swaps the data source and re-initializes. The previous source is kept on error.
    pub fn set_data_source(&mut self, source: S) -> Result<S> {
        let previous = core::mem::replace(&mut self.source, source);
        match self.initialize() {
            Ok(()) => Ok(previous),
            Err(err) => {
                self.source = previous;
                Err(err)
            }
        }
    }

    /// Preempts any in-flight navigation and reconciles with the data source.
    pub fn reload_data(&mut self, reload_all_visible: bool) {
        self.interrupt_navigation();
        self.tracker
            .reload_data(&mut self.source, &mut self.host, reload_all_visible);
        self.scroll_offset = self.tracker.offset();
    }

    pub fn reload_item(&mut self, index: usize, tag: Option<&str>, reload_data: bool) -> bool {
        let applied =
            self.tracker
                .reload_item(&mut self.source, &mut self.host, index, tag, reload_data);
        self.forward_deferred_shift();
        self.scroll_offset = self.tracker.offset();
        applied
    }

    pub fn set_item_position(&mut self, index: usize) -> bool {
        self.tracker.set_item_position(&mut self.host, index)
    }

    pub fn item_at_index(&self, index: usize) -> Option<&ViewHandle<H::Node>> {
        self.tracker.view(index)
    }

    pub fn item_at_index_mut(&mut self, index: usize) -> Option<&mut ViewHandle<H::Node>> {
        self.tracker.view_mut(index)
    }

    /// Starts navigating to `index`. Instant motions complete before returning.
    ///
    /// Returns `false` for indices past the item count.
    pub fn scroll_to_index(&mut self, index: usize, motion: Motion, emit_event: bool) -> bool {
        if index >= self.tracker.item_count() {
            vwarn!(index, count = self.tracker.item_count(), "scroll to stale index");
            return false;
        }
        self.interrupt_navigation();
        if let Some(from) = self.policy.current_page().filter(|&from| from != index) {
            self.announce_page_change(from, index);
        }
        self.navigator
            .start_index(&self.tracker, index, motion, emit_event);
        self.tracker.set_navigating(true);
        if motion.is_instant() {
            self.drain_navigation();
        }
        true
    }

    /// Starts navigating to `position` in `[0, 1]` of the scrollable range.
    ///
    /// The window is frozen while moving and fully recomputed on arrival.
    pub fn scroll_to_normalized_position(&mut self, position: f32, motion: Motion) {
        self.interrupt_navigation();
        self.navigator
            .start_normalized(&self.tracker, position, motion);
        self.tracker.set_navigating(true);
        self.tracker.set_suspended(true);
        if motion.is_instant() {
            self.drain_navigation();
        }
    }

    /// The host reports a new content offset (user scroll or an echo of `set_offset`).
    ///
    /// Does not cancel an in-flight navigation; the next tick overrides the offset.
    pub fn on_scroll(&mut self, offset: f32) {
        self.scroll_offset = offset;
        self.tracker
            .reconcile(&mut self.source, &mut self.host, offset);
        self.forward_deferred_shift();
    }

    pub fn begin_drag(&mut self) {
        self.interrupt_navigation();
        self.dragging = true;
        self.policy.drag_started(self.scroll_offset);
    }

    /// Ends a drag; returns the page the policy settles on, if any.
    pub fn end_drag(&mut self) -> Option<usize> {
        if !core::mem::take(&mut self.dragging) {
            return None;
        }
        let target = self
            .policy
            .drag_released(self.scroll_offset, self.tracker.item_count())?;
        if target.changes_page() {
            self.announce_page_change(target.from, target.to);
        }
        self.navigator
            .start_index(&self.tracker, target.to, target.motion, false);
        self.tracker.set_navigating(true);
        if target.motion.is_instant() {
            self.drain_navigation();
        }
        Some(target.to)
    }

    pub fn on_viewport_resized(&mut self, size: Vec2) {
        self.tracker
            .on_viewport_resized(&mut self.source, &mut self.host, size);
        self.forward_deferred_shift();
        self.scroll_offset = self.tracker.offset();
    }

    /// Advances navigation by `dt` seconds and runs pending clearance.
    ///
    /// Returns the offset applied this tick while navigating.
    pub fn tick(&mut self, dt: f32) -> Option<f32> {
        if self.navigator.is_active() {
            return self.step_navigation(dt);
        }
        if self.tracker.clearance_pending() {
            self.tracker
                .reconcile(&mut self.source, &mut self.host, self.scroll_offset);
        }
        None
    }

    /// Destroys every view. Later calls are no-ops and `initialize` fails.
    pub fn destroy(&mut self) {
        self.navigator.cancel();
        self.tracker.destroy(&mut self.source, &mut self.host);
    }

    fn step_navigation(&mut self, dt: f32) -> Option<f32> {
        match self.navigator.advance(dt, &self.tracker) {
            NavigationStep::Idle => None,
            NavigationStep::Moved(offset) => {
                self.apply_offset(offset);
                self.forward_deferred_shift();
                Some(offset)
            }
            NavigationStep::Finished { offset, kind } => {
                self.apply_offset(offset);
                self.settle(offset, kind);
                self.finish_navigation(kind);
                Some(self.scroll_offset)
            }
        }
    }

    fn drain_navigation(&mut self) {
        let mut steps = 0;
        while self.navigator.is_active() && steps < MAX_INSTANT_STEPS {
            self.step_navigation(0.0);
            steps += 1;
        }
    }

    fn apply_offset(&mut self, offset: f32) {
        self.scroll_offset = offset;
        self.host.set_offset(offset);
        self.tracker
            .reconcile(&mut self.source, &mut self.host, offset);
    }

    /// Feeds a scroll correction deferred by the tracker into the in-flight animation.
    fn forward_deferred_shift(&mut self) {
        if !self.navigator.is_active() {
            return;
        }
        let shift = self.tracker.take_deferred_offset();
        if shift != 0.0 {
            self.navigator.shift(shift);
        }
    }

    /// Lands again when the last step shifted the content: on the destination's new position
    /// when it is known, otherwise on the shifted offset.
    fn settle(&mut self, mut offset: f32, kind: NavigationKind) {
        for _ in 0..MAX_SETTLE_PASSES {
            let shift = self.tracker.take_deferred_offset();
            if shift == 0.0 {
                return;
            }
            offset = match kind {
                NavigationKind::Index { index, .. } => match destination(&self.tracker, index) {
                    (to, true) => to,
                    (_, false) => offset + shift,
                },
                NavigationKind::Normalized { .. } => offset + shift,
            };
            vdebug!(offset, shift, "navigation landed on shifted content");
            self.apply_offset(offset);
        }
    }

    /// Fires the will-unfocus/will-focus pair for a page change about to animate.
    fn announce_page_change(&mut self, from: usize, to: usize) {
        let forward = to > from;
        self.source
            .on_page_will_unfocus(from, forward, self.tracker.view_mut(from));
        self.tracker.queue_will_focus(&mut self.source, to, forward);
    }

    fn finish_navigation(&mut self, kind: NavigationKind) {
        self.tracker.set_navigating(false);
        self.tracker.set_suspended(false);
        self.tracker
            .recompute_window(&mut self.source, &mut self.host);
        self.scroll_offset = self.tracker.offset();

        if let NavigationKind::Index { index, emit_event } = kind {
            if emit_event {
                self.source.on_scrolled_to_index(index);
            }
            if let Some(change) = self.policy.navigation_finished(index) {
                vdebug!(from = change.unfocused, to = change.focused, "page changed");
                self.source.on_page_unfocused(change.unfocused);
                self.source.on_page_focused(change.focused);
            }
        }
    }

    fn interrupt_navigation(&mut self) {
        if self.navigator.cancel().is_none() {
            return;
        }
        self.tracker.set_navigating(false);
        self.tracker.set_suspended(false);
        self.tracker
            .recompute_window(&mut self.source, &mut self.host);
        self.scroll_offset = self.tracker.offset();
    }
}
