//! Collaborator contracts.
//!
//! [`DataSource`] is implemented by the application and owns the content; [`RenderHost`] is
//! implemented by the UI layer and owns the scene-graph nodes. The engine only decides which
//! logical items are materialized and where they sit along the scroll axis.

use crate::{MovementRestriction, PrototypeId, Vec2, ViewCapabilities, ViewHandle};

/// The content side of the engine.
///
/// Callbacks receive the [`ViewHandle`] that currently shows the item so the application can
/// bind data to `view.node`.
pub trait DataSource<N> {
    fn item_count(&self) -> usize;

    /// Look-ahead lines materialized beyond the viewport in the scroll direction.
    fn extra_items_visible(&self) -> usize {
        1
    }

    /// When `true`, [`DataSource::item_size`] is authoritative and views are never measured.
    fn is_item_size_known(&self) -> bool {
        false
    }

    fn prototypes(&self) -> &[PrototypeId];

    /// Main-axis size of `index`; only consulted when `is_item_size_known` is `true`.
    fn item_size(&self, _index: usize) -> f32 {
        0.0
    }

    fn prototype(&self, index: usize) -> PrototypeId;

    fn is_item_static(&self, _index: usize) -> bool {
        false
    }

    /// Lays the item out without the content padding.
    fn ignore_content_padding(&self, _index: usize) -> bool {
        false
    }

    fn set_item_data(&mut self, view: &mut ViewHandle<N>, index: usize);

    /// Partial refresh requested by `reload_item`; defaults to a full rebind.
    fn reload_item_data(&mut self, view: &mut ViewHandle<N>, index: usize, _tag: Option<&str>) {
        self.set_item_data(view, index);
    }

    fn on_item_created(&mut self, _index: usize, _view: &mut ViewHandle<N>) {}

    fn on_item_hidden(&mut self, _index: usize, _view: &mut ViewHandle<N>) {}

    fn on_reached_start(&mut self) {}

    fn on_reached_end(&mut self) {}

    fn on_pull_to_refresh(&mut self) {}

    fn on_push_to_close(&mut self) {}

    fn on_last_item_visible(&mut self) {}

    fn on_scrolled_to_index(&mut self, _index: usize) {}

    fn on_page_will_focus(
        &mut self,
        _index: usize,
        _is_forward: bool,
        _view: Option<&mut ViewHandle<N>>,
    ) {
    }

    fn on_page_will_unfocus(
        &mut self,
        _index: usize,
        _is_forward: bool,
        _view: Option<&mut ViewHandle<N>>,
    ) {
    }

    fn on_page_focused(&mut self, _index: usize) {}

    fn on_page_unfocused(&mut self, _index: usize) {}
}

/// The rendering side of the engine.
pub trait RenderHost {
    type Node;

    fn instantiate(&mut self, prototype: &PrototypeId) -> Self::Node;

    /// Capabilities declared by `prototype`; queried once per instantiated view.
    fn capabilities(&self, _prototype: &PrototypeId) -> ViewCapabilities {
        ViewCapabilities::default()
    }

    /// A pre-existing node for a static item, if the scene has one.
    fn static_view(&mut self, _index: usize) -> Option<Self::Node> {
        None
    }

    fn destroy(&mut self, node: Self::Node);

    fn set_active(&mut self, node: &mut Self::Node, active: bool);

    /// Forces a layout pass and returns the measured absolute size.
    fn layout(&mut self, node: &mut Self::Node) -> Vec2;

    /// Moves a node to `top_left` (host layout coordinates) with the given absolute size.
    fn place(&mut self, node: &mut Self::Node, top_left: Vec2, size: Vec2);

    fn set_content_size(&mut self, size: f32);

    fn set_offset(&mut self, offset: f32);

    fn viewport_size(&self) -> Vec2;

    fn set_movement(&mut self, movement: MovementRestriction);

    /// Per-reconcile hook for views whose prototype declared `visual_update`.
    ///
    /// `position` is the item's start relative to the viewport, normalized by the viewport size.
    fn update_visual(&mut self, _node: &mut Self::Node, _index: usize, _position: f32) {}
}
