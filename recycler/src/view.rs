use crate::{PrototypeId, Vec2};

/// Optional behaviors a prototype declares when it is instantiated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewCapabilities {
    /// The host wants `RenderHost::update_visual` every reconcile while the view is live.
    pub visual_update: bool,
}

/// A renderable node plus the bookkeeping the engine needs to lay it out and recycle it.
///
/// A handle is owned by exactly one place at a time: the tracker's live set, the recycling pool,
/// or (for static views) the tracker's hidden-static set.
#[derive(Debug)]
pub struct ViewHandle<N> {
    pub node: N,
    prototype: PrototypeId,
    index: Option<usize>,
    is_static: bool,
    capabilities: ViewCapabilities,
    bounds: Vec2,
}

impl<N> ViewHandle<N> {
    pub(crate) fn new(node: N, prototype: PrototypeId, capabilities: ViewCapabilities) -> Self {
        Self {
            node,
            prototype,
            index: None,
            is_static: false,
            capabilities,
            bounds: Vec2::ZERO,
        }
    }

    pub(crate) fn new_static(node: N, prototype: PrototypeId, index: usize) -> Self {
        Self {
            node,
            prototype,
            index: Some(index),
            is_static: true,
            capabilities: ViewCapabilities::default(),
            bounds: Vec2::ZERO,
        }
    }

    pub fn prototype(&self) -> &PrototypeId {
        &self.prototype
    }

    /// The logical index this view currently shows, `None` while pooled.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn capabilities(&self) -> ViewCapabilities {
        self.capabilities
    }

    /// Last size applied to the view.
    pub fn bounds(&self) -> Vec2 {
        self.bounds
    }

    pub(crate) fn assign(&mut self, index: Option<usize>) {
        self.index = index;
    }

    pub(crate) fn set_bounds(&mut self, bounds: Vec2) {
        self.bounds = bounds;
    }
}
