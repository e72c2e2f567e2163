// Example: a measured list driven by scroll offsets, printing the window and pool usage.
use recycler::{
    Axis, DataSource, MovementRestriction, PrototypeId, RecyclerOptions, RenderHost, Vec2,
    ViewHandle, WindowTracker,
};

struct Row {
    text: String,
    height: f32,
}

#[derive(Default)]
struct Scene {
    created: usize,
}

impl RenderHost for Scene {
    type Node = Row;

    fn instantiate(&mut self, _prototype: &PrototypeId) -> Row {
        self.created += 1;
        Row {
            text: String::new(),
            height: 0.0,
        }
    }

    fn destroy(&mut self, _node: Row) {}

    fn set_active(&mut self, _node: &mut Row, _active: bool) {}

    fn layout(&mut self, node: &mut Row) -> Vec2 {
        Vec2::new(320.0, node.height)
    }

    fn place(&mut self, _node: &mut Row, _top_left: Vec2, _size: Vec2) {}

    fn set_content_size(&mut self, _size: f32) {}

    fn set_offset(&mut self, _offset: f32) {}

    fn viewport_size(&self) -> Vec2 {
        Vec2::new(320.0, 480.0)
    }

    fn set_movement(&mut self, _movement: MovementRestriction) {}
}

struct Messages {
    prototypes: Vec<PrototypeId>,
    lines: Vec<String>,
}

impl DataSource<Row> for Messages {
    fn item_count(&self) -> usize {
        self.lines.len()
    }

    fn prototypes(&self) -> &[PrototypeId] {
        &self.prototypes
    }

    fn prototype(&self, _index: usize) -> PrototypeId {
        self.prototypes[0].clone()
    }

    fn set_item_data(&mut self, view: &mut ViewHandle<Row>, index: usize) {
        let line = &self.lines[index];
        view.node.height = 24.0 + 16.0 * (line.len() / 40) as f32;
        view.node.text.clone_from(line);
    }

    fn on_reached_end(&mut self) {
        println!("reached end");
    }
}

fn main() {
    let mut source = Messages {
        prototypes: vec![PrototypeId::new("message")],
        lines: (0..500)
            .map(|i| "lorem ipsum ".repeat(1 + i % 9))
            .collect(),
    };
    let mut scene = Scene::default();
    let mut tracker = WindowTracker::new(RecyclerOptions::new(Axis::Vertical).with_spacing(4.0));
    if let Err(err) = tracker.reset(&mut source, &mut scene) {
        eprintln!("invalid configuration: {err}");
        return;
    }

    let mut offset = 0.0;
    while offset < 6_000.0 {
        offset += 90.0;
        tracker.reconcile(&mut source, &mut scene, offset);
    }
    println!("window={:?}", tracker.window_state());
    println!("content_size={}", tracker.content_size());
    println!("views_created={}", scene.created);
    for stats in tracker.pool_stats() {
        println!("{stats:?}");
    }
}
