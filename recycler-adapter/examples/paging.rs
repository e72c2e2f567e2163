use recycler_adapter::recycler::{
    Axis, DataSource, MovementRestriction, PrototypeId, RecyclerOptions, RenderHost, Vec2,
    ViewHandle,
};
use recycler_adapter::{Controller, Motion, PagingOptions};

struct Page;

struct Pager;

impl RenderHost for Pager {
    type Node = Page;

    fn instantiate(&mut self, _prototype: &PrototypeId) -> Page {
        Page
    }

    fn destroy(&mut self, _node: Page) {}

    fn set_active(&mut self, _node: &mut Page, _active: bool) {}

    fn layout(&mut self, _node: &mut Page) -> Vec2 {
        Vec2::new(390.0, 844.0)
    }

    fn place(&mut self, _node: &mut Page, _top_left: Vec2, _size: Vec2) {}

    fn set_content_size(&mut self, _size: f32) {}

    fn set_offset(&mut self, _offset: f32) {}

    fn viewport_size(&self) -> Vec2 {
        Vec2::new(390.0, 844.0)
    }

    fn set_movement(&mut self, _movement: MovementRestriction) {}
}

struct Onboarding {
    prototypes: Vec<PrototypeId>,
}

impl DataSource<Page> for Onboarding {
    fn item_count(&self) -> usize {
        5
    }

    fn prototypes(&self) -> &[PrototypeId] {
        &self.prototypes
    }

    fn prototype(&self, _index: usize) -> PrototypeId {
        self.prototypes[0].clone()
    }

    fn set_item_data(&mut self, _view: &mut ViewHandle<Page>, _index: usize) {}

    fn on_page_will_unfocus(
        &mut self,
        index: usize,
        is_forward: bool,
        _view: Option<&mut ViewHandle<Page>>,
    ) {
        println!("page {index} will unfocus (forward={is_forward})");
    }

    fn on_page_will_focus(
        &mut self,
        index: usize,
        is_forward: bool,
        view: Option<&mut ViewHandle<Page>>,
    ) {
        println!("page {index} will focus (forward={is_forward}, live={})", view.is_some());
    }

    fn on_page_focused(&mut self, index: usize) {
        println!("page {index} focused");
    }
}

fn main() {
    // Example: a vertical pager; each drag release settles on a neighbouring page.
    let source = Onboarding {
        prototypes: vec![PrototypeId::new("page")],
    };
    let mut c = Controller::new(RecyclerOptions::new(Axis::Vertical), source, Pager)
        .with_paging(PagingOptions::default().with_motion(Motion::Duration(0.3)));
    if let Err(err) = c.initialize() {
        eprintln!("invalid configuration: {err}");
        return;
    }

    for drag in [300.0, 900.0, -50.0, -400.0] {
        c.begin_drag();
        c.on_scroll(c.scroll_offset() + drag);
        let target = c.end_drag();
        while c.tick(1.0 / 60.0).is_some() {}
        println!(
            "drag={drag} target={target:?} page={:?} offset={}",
            c.current_page(),
            c.scroll_offset()
        );
    }
}
