// Example: a fixed-column grid scrolling vertically, filled from the upper-right corner.
use recycler::{
    Axis, DataSource, GridConstraint, GridOptions, MovementRestriction, PrototypeId,
    RecyclerOptions, RenderHost, StartCorner, Vec2, ViewHandle, WindowTracker,
};

#[derive(Debug)]
struct Tile {
    index: Option<usize>,
    at: Vec2,
}

struct Board;

impl RenderHost for Board {
    type Node = Tile;

    fn instantiate(&mut self, _prototype: &PrototypeId) -> Tile {
        Tile {
            index: None,
            at: Vec2::ZERO,
        }
    }

    fn destroy(&mut self, _node: Tile) {}

    fn set_active(&mut self, _node: &mut Tile, _active: bool) {}

    fn layout(&mut self, _node: &mut Tile) -> Vec2 {
        Vec2::new(100.0, 100.0)
    }

    fn place(&mut self, node: &mut Tile, top_left: Vec2, _size: Vec2) {
        node.at = top_left;
    }

    fn set_content_size(&mut self, _size: f32) {}

    fn set_offset(&mut self, _offset: f32) {}

    fn viewport_size(&self) -> Vec2 {
        Vec2::new(400.0, 300.0)
    }

    fn set_movement(&mut self, _movement: MovementRestriction) {}
}

struct Photos {
    prototypes: [PrototypeId; 1],
    count: usize,
}

impl DataSource<Tile> for Photos {
    fn item_count(&self) -> usize {
        self.count
    }

    fn prototypes(&self) -> &[PrototypeId] {
        &self.prototypes
    }

    fn prototype(&self, _index: usize) -> PrototypeId {
        self.prototypes[0].clone()
    }

    fn set_item_data(&mut self, view: &mut ViewHandle<Tile>, index: usize) {
        view.node.index = Some(index);
    }
}

fn main() {
    let grid = GridOptions::new(GridConstraint::FixedColumnCount(4), Vec2::new(100.0, 100.0))
        .with_start_corner(StartCorner::UpperRight);
    let options = RecyclerOptions::new(Axis::Vertical).with_grid(Some(grid));
    let mut source = Photos {
        prototypes: [PrototypeId::new("photo")],
        count: 103,
    };
    let mut board = Board;
    let mut tracker = WindowTracker::new(options);
    if let Err(err) = tracker.reset(&mut source, &mut board) {
        eprintln!("invalid configuration: {err}");
        return;
    }

    tracker.reconcile(&mut source, &mut board, 1_250.0);
    println!("rows={} window={:?}", tracker.line_count(), tracker.window_state());
    for index in tracker.live_indices() {
        if let Some(view) = tracker.view(index) {
            println!("item {index:>3} at {:?}", view.node.at);
        }
    }
}
