use recycler_adapter::recycler::{
    Axis, DataSource, MovementRestriction, PrototypeId, RecyclerOptions, RenderHost, Vec2,
    ViewHandle,
};
use recycler_adapter::{Controller, Motion};

struct Cell {
    height: f32,
}

struct Scroller {
    offset: f32,
}

impl RenderHost for Scroller {
    type Node = Cell;

    fn instantiate(&mut self, _prototype: &PrototypeId) -> Cell {
        Cell { height: 0.0 }
    }

    fn destroy(&mut self, _node: Cell) {}

    fn set_active(&mut self, _node: &mut Cell, _active: bool) {}

    fn layout(&mut self, node: &mut Cell) -> Vec2 {
        Vec2::new(360.0, node.height)
    }

    fn place(&mut self, _node: &mut Cell, _top_left: Vec2, _size: Vec2) {}

    fn set_content_size(&mut self, _size: f32) {}

    fn set_offset(&mut self, offset: f32) {
        self.offset = offset;
    }

    fn viewport_size(&self) -> Vec2 {
        Vec2::new(360.0, 640.0)
    }

    fn set_movement(&mut self, _movement: MovementRestriction) {}
}

struct Feed {
    prototypes: Vec<PrototypeId>,
}

impl DataSource<Cell> for Feed {
    fn item_count(&self) -> usize {
        1_000
    }

    fn prototypes(&self) -> &[PrototypeId] {
        &self.prototypes
    }

    fn prototype(&self, _index: usize) -> PrototypeId {
        self.prototypes[0].clone()
    }

    fn set_item_data(&mut self, view: &mut ViewHandle<Cell>, index: usize) {
        // Heights are only known once an item is bound.
        view.node.height = 48.0 + (index % 7) as f32 * 20.0;
    }

    fn on_scrolled_to_index(&mut self, index: usize) {
        println!("arrived at {index}");
    }
}

fn main() {
    // Example: animate to an item whose position is unknown until the window reaches it.
    //
    // An adapter would:
    // - call scroll_to_index in response to a command
    // - call tick(dt) from its frame loop
    // - show the returned offset in the real scroll container
    let feed = Feed {
        prototypes: vec![PrototypeId::new("post")],
    };
    let mut c = Controller::new(
        RecyclerOptions::new(Axis::Vertical),
        feed,
        Scroller { offset: 0.0 },
    );
    if let Err(err) = c.initialize() {
        eprintln!("invalid configuration: {err}");
        return;
    }

    c.scroll_to_index(640, Motion::Duration(0.8), true);
    println!("provisional destination={:?}", c.navigator().destination());

    let mut frame = 0u32;
    while let Some(offset) = c.tick(1.0 / 60.0) {
        frame += 1;
        if frame % 10 == 0 {
            println!(
                "frame={frame} offset={offset:.1} homing={} window={:?}",
                c.navigator().is_homing(),
                c.tracker().window_state()
            );
        }
    }

    println!(
        "done: offset={:.1} corrections={} host_offset={:.1}",
        c.scroll_offset(),
        c.navigator().corrections(),
        c.host().offset
    );
}
