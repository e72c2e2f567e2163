//! Navigation policies: what a drag release means.

use core::fmt;

use crate::{Easing, Motion};

/// Page transition decided on drag release.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageTarget {
    pub from: usize,
    pub to: usize,
    pub motion: Motion,
}

impl PageTarget {
    pub fn is_forward(&self) -> bool {
        self.to > self.from
    }

    pub fn changes_page(&self) -> bool {
        self.to != self.from
    }
}

/// A completed page change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FocusChange {
    pub unfocused: usize,
    pub focused: usize,
}

/// Injected into the controller to decide how drags settle.
pub trait NavigationPolicy: fmt::Debug {
    fn drag_started(&mut self, _offset: f32) {}

    /// Where to settle after a drag released at `offset`, if anywhere.
    fn drag_released(&mut self, _offset: f32, _item_count: usize) -> Option<PageTarget> {
        None
    }

    /// A scroll-to-index reached `index`.
    fn navigation_finished(&mut self, _index: usize) -> Option<FocusChange> {
        None
    }

    fn current_page(&self) -> Option<usize> {
        None
    }

    /// Back to the first page after a data source reset.
    fn reset(&mut self) {}
}

/// Free scrolling: drags settle wherever they are released.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainPolicy;

impl NavigationPolicy for PlainPolicy {}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PagingOptions {
    /// Drag displacement that turns a release into a page change.
    pub swipe_threshold: f32,
    pub motion: Motion,
    pub easing: Easing,
}

impl Default for PagingOptions {
    fn default() -> Self {
        Self {
            swipe_threshold: 100.0,
            motion: Motion::Duration(0.25),
            easing: Easing::SmoothStep,
        }
    }
}

impl PagingOptions {
    pub fn with_swipe_threshold(mut self, swipe_threshold: f32) -> Self {
        self.swipe_threshold = swipe_threshold;
        self
    }

    pub fn with_motion(mut self, motion: Motion) -> Self {
        self.motion = motion;
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

/// One item per page. A release past the swipe threshold moves exactly one page in the drag
/// direction regardless of speed; anything shorter snaps back.
#[derive(Clone, Copy, Debug)]
pub struct PagedPolicy {
    options: PagingOptions,
    page: usize,
    drag_origin: Option<f32>,
}

impl PagedPolicy {
    pub fn new(options: PagingOptions) -> Self {
        Self {
            options,
            page: 0,
            drag_origin: None,
        }
    }

    pub fn options(&self) -> &PagingOptions {
        &self.options
    }
}

impl NavigationPolicy for PagedPolicy {
    fn drag_started(&mut self, offset: f32) {
        self.drag_origin = Some(offset);
    }

    fn drag_released(&mut self, offset: f32, item_count: usize) -> Option<PageTarget> {
        let origin = self.drag_origin.take()?;
        let last = item_count.checked_sub(1)?;
        let displacement = offset - origin;
        let threshold = self.options.swipe_threshold;
        let from = self.page.min(last);
        let to = if displacement > threshold {
            (from + 1).min(last)
        } else if displacement < -threshold {
            from.saturating_sub(1)
        } else {
            from
        };
        vdebug!(displacement, from, to, "page release");
        Some(PageTarget {
            from,
            to,
            motion: self.options.motion,
        })
    }

    fn navigation_finished(&mut self, index: usize) -> Option<FocusChange> {
        let previous = core::mem::replace(&mut self.page, index);
        (previous != index).then_some(FocusChange {
            unfocused: previous,
            focused: index,
        })
    }

    fn current_page(&self) -> Option<usize> {
        Some(self.page)
    }

    fn reset(&mut self) {
        self.page = 0;
        self.drag_origin = None;
    }
}
