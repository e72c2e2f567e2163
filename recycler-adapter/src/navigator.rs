//! Animated navigation with incremental homing.
//!
//! When the destination of a scroll-to-index is not known yet (its size was never measured), the
//! navigator animates towards an estimate. As the window tracker walks towards it the item gets
//! measured; the navigator then abandons the provisional leg and launches a corrected one with
//! whatever time budget the original animation had left.

use crate::{AnimationStatus, Easing, Tween};

/// Shortest leg launched by a correction or re-estimate.
const MIN_LEG: f32 = 0.05;

/// Upper bound on provisional legs for one navigation.
const MAX_LEGS: usize = 16;

/// Destination drift below this is ignored.
const DRIFT_EPSILON: f32 = 1e-3;

/// How a navigation moves.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Motion {
    /// Jump straight to the destination.
    Instant,
    /// Seconds for the whole movement.
    Duration(f32),
    /// Content units per second.
    Speed(f32),
}

impl Default for Motion {
    fn default() -> Self {
        Self::Duration(0.3)
    }
}

impl Motion {
    pub fn duration_for(self, distance: f32) -> f32 {
        match self {
            Self::Instant => 0.0,
            Self::Duration(seconds) => seconds.max(0.0),
            Self::Speed(speed) if speed > 0.0 => distance.abs() / speed,
            Self::Speed(_) => 0.0,
        }
    }

    pub fn is_instant(self) -> bool {
        matches!(self, Self::Instant)
    }
}

/// What the navigator can observe about the scrollable content.
pub trait ScrollTarget {
    fn offset(&self) -> f32;

    /// Offset that aligns `index` with the viewport start, when its position is known.
    fn exact_offset(&self, index: usize) -> Option<f32>;

    fn estimated_offset(&self, index: usize) -> f32;

    fn max_offset(&self) -> f32;

    fn all_positions_known(&self) -> bool;

    fn normalized_offset(&self, t: f32) -> f32;
}

impl<N> ScrollTarget for recycler::WindowTracker<N> {
    fn offset(&self) -> f32 {
        recycler::WindowTracker::offset(self)
    }

    fn exact_offset(&self, index: usize) -> Option<f32> {
        recycler::WindowTracker::exact_offset(self, index)
    }

    fn estimated_offset(&self, index: usize) -> f32 {
        recycler::WindowTracker::estimated_offset(self, index)
    }

    fn max_offset(&self) -> f32 {
        recycler::WindowTracker::max_offset(self)
    }

    fn all_positions_known(&self) -> bool {
        recycler::WindowTracker::all_positions_known(self)
    }

    fn normalized_offset(&self, t: f32) -> f32 {
        recycler::WindowTracker::normalized_offset(self, t)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NavigationKind {
    Index { index: usize, emit_event: bool },
    Normalized { position: f32 },
}

/// Result of one [`Navigator::advance`] call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NavigationStep {
    Idle,
    Moved(f32),
    Finished { offset: f32, kind: NavigationKind },
}

#[derive(Clone, Copy, Debug)]
struct Navigation {
    kind: NavigationKind,
    motion: Motion,
    tween: Tween,
    homing: bool,
    legs: usize,
}

#[derive(Clone, Debug, Default)]
pub struct Navigator {
    easing: Easing,
    active: Option<Navigation>,
    corrections: usize,
}

impl Navigator {
    pub fn new(easing: Easing) -> Self {
        Self {
            easing,
            active: None,
            corrections: 0,
        }
    }

    pub fn easing(&self) -> Easing {
        self.easing
    }

    pub fn set_easing(&mut self, easing: Easing) {
        self.easing = easing;
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn kind(&self) -> Option<NavigationKind> {
        self.active.map(|n| n.kind)
    }

    /// Current leg destination.
    pub fn destination(&self) -> Option<f32> {
        self.active.map(|n| n.tween.to)
    }

    /// Whether the current leg still aims at an estimate.
    pub fn is_homing(&self) -> bool {
        self.active.is_some_and(|n| n.homing)
    }

    /// Homing corrections performed by the current (or last) navigation.
    pub fn corrections(&self) -> usize {
        self.corrections
    }

    /// Budget left on the in-flight navigation; pass it to a superseding call to keep the timing.
    pub fn remaining_budget(&self) -> Option<Motion> {
        self.active.map(|n| match n.motion {
            Motion::Instant => Motion::Instant,
            Motion::Duration(_) | Motion::Speed(_) => Motion::Duration(n.tween.remaining()),
        })
    }

    /// Stops the in-flight navigation without completing it.
    pub fn cancel(&mut self) -> Option<NavigationKind> {
        let cancelled = self.active.take().map(|n| n.kind);
        if let Some(_kind) = cancelled {
            vdebug!(kind = ?_kind, "navigation superseded");
        }
        cancelled
    }

    /// Moves the in-flight animation by `delta` after the content shifted under it.
    ///
    /// Both ends move so the content on screen stays put; index destinations are re-read on the
    /// next advance.
    pub fn shift(&mut self, delta: f32) {
        if let Some(nav) = self.active.as_mut() {
            vtrace!(delta, "navigation shifted");
            nav.tween.from += delta;
            nav.tween.to += delta;
        }
    }

    /// Starts a scroll-to-index, superseding any in-flight navigation.
    ///
    /// Returns the (possibly provisional) destination offset.
    pub fn start_index(
        &mut self,
        target: &dyn ScrollTarget,
        index: usize,
        motion: Motion,
        emit_event: bool,
    ) -> f32 {
        self.cancel();
        let (to, exact) = destination(target, index);
        let from = target.offset();
        vdebug!(index, from, to, exact, "scroll to index");
        self.corrections = 0;
        self.active = Some(Navigation {
            kind: NavigationKind::Index { index, emit_event },
            motion,
            tween: Tween::new(from, to, motion.duration_for(to - from), self.easing),
            homing: !exact,
            legs: 1,
        });
        to
    }

    /// Starts a scroll to `position` in `[0, 1]` of the scrollable range.
    pub fn start_normalized(
        &mut self,
        target: &dyn ScrollTarget,
        position: f32,
        motion: Motion,
    ) -> f32 {
        self.cancel();
        let position = position.clamp(0.0, 1.0);
        let from = target.offset();
        let to = target.normalized_offset(position);
        vdebug!(position, from, to, "scroll to normalized position");
        self.corrections = 0;
        self.active = Some(Navigation {
            kind: NavigationKind::Normalized { position },
            motion,
            tween: Tween::new(from, to, motion.duration_for(to - from), self.easing),
            homing: false,
            legs: 1,
        });
        to
    }

    /// Advances the in-flight navigation by `dt` seconds.
    pub fn advance(&mut self, dt: f32, target: &dyn ScrollTarget) -> NavigationStep {
        let Some(mut nav) = self.active else {
            return NavigationStep::Idle;
        };

        if let (false, NavigationKind::Index { index, .. }) = (nav.homing, nav.kind) {
            if let Some(exact) = target.exact_offset(index) {
                let to = clamp(target, exact);
                if (to - nav.tween.to).abs() > DRIFT_EPSILON {
                    vtrace!(index, from = nav.tween.to, to, "destination moved");
                    nav.tween.to = to;
                }
            }
        }

        if let (true, NavigationKind::Index { index, .. }) = (nav.homing, nav.kind) {
            if let Some(exact) = target.exact_offset(index) {
                let to = clamp(target, exact);
                let budget = if nav.motion.is_instant() {
                    0.0
                } else {
                    nav.tween.remaining().max(MIN_LEG)
                };
                vdebug!(index, to, budget, "homing correction");
                nav.tween.retarget(to, budget);
                nav.homing = false;
                self.corrections += 1;
            }
        }

        let status = nav.tween.advance(dt);
        let offset = nav.tween.value();
        vtrace!(offset, ?status, "navigation step");

        if status == AnimationStatus::Running {
            self.active = Some(nav);
            return NavigationStep::Moved(offset);
        }

        if let (true, NavigationKind::Index { index, .. }) = (nav.homing, nav.kind) {
            if nav.legs < MAX_LEGS {
                let to = target.estimated_offset(index).max(0.0);
                let duration = if nav.motion.is_instant() { 0.0 } else { MIN_LEG };
                nav.tween = Tween::new(offset, to, duration, self.easing);
                nav.legs += 1;
                self.active = Some(nav);
                return NavigationStep::Moved(offset);
            }
            vwarn!(index, legs = nav.legs, "destination never became known");
        }

        self.active = None;
        vdebug!(offset, "navigation finished");
        NavigationStep::Finished {
            offset,
            kind: nav.kind,
        }
    }
}

fn clamp(target: &dyn ScrollTarget, offset: f32) -> f32 {
    if target.all_positions_known() {
        offset.clamp(0.0, target.max_offset())
    } else {
        offset
    }
}

pub(crate) fn destination(target: &dyn ScrollTarget, index: usize) -> (f32, bool) {
    match target.exact_offset(index) {
        Some(offset) => (clamp(target, offset), true),
        None => (target.estimated_offset(index).max(0.0), false),
    }
}
