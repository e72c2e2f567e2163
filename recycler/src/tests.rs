use crate::*;

use std::collections::{BTreeSet, HashSet};

use proptest::prelude::*;

#[derive(Clone, Copy, Debug)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        // Deterministic, dependency-free PRNG for tests.
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn gen_range_usize(&mut self, start: usize, end_exclusive: usize) -> usize {
        debug_assert!(start < end_exclusive);
        start + (self.next_u64() % (end_exclusive - start) as u64) as usize
    }

    fn gen_bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

#[derive(Debug)]
struct Node {
    id: usize,
    active: bool,
    bound: Option<usize>,
    measured: Vec2,
    top_left: Vec2,
    size: Vec2,
}

impl Node {
    fn new(id: usize) -> Self {
        Self {
            id,
            active: false,
            bound: None,
            measured: Vec2::ZERO,
            top_left: Vec2::ZERO,
            size: Vec2::ZERO,
        }
    }
}

#[derive(Debug, Default)]
struct MockHost {
    viewport: Vec2,
    next_id: usize,
    instantiated: usize,
    destroyed: Vec<usize>,
    offset: f32,
    content_size: f32,
    movement: Vec<MovementRestriction>,
    static_indices: HashSet<usize>,
    static_requests: usize,
    visual_prototypes: HashSet<&'static str>,
    visuals: Vec<(usize, f32)>,
}

impl MockHost {
    fn new(width: f32, height: f32) -> Self {
        Self {
            viewport: Vec2::new(width, height),
            ..Self::default()
        }
    }
}

impl RenderHost for MockHost {
    type Node = Node;

    fn instantiate(&mut self, _prototype: &PrototypeId) -> Node {
        self.instantiated += 1;
        self.next_id += 1;
        Node::new(self.next_id)
    }

    fn capabilities(&self, prototype: &PrototypeId) -> ViewCapabilities {
        ViewCapabilities {
            visual_update: self.visual_prototypes.contains(prototype.as_str()),
        }
    }

    fn static_view(&mut self, index: usize) -> Option<Node> {
        self.static_indices.contains(&index).then(|| {
            self.static_requests += 1;
            Node::new(10_000 + index)
        })
    }

    fn destroy(&mut self, node: Node) {
        self.destroyed.push(node.id);
    }

    fn set_active(&mut self, node: &mut Node, active: bool) {
        node.active = active;
    }

    fn layout(&mut self, node: &mut Node) -> Vec2 {
        node.measured
    }

    fn place(&mut self, node: &mut Node, top_left: Vec2, size: Vec2) {
        node.top_left = top_left;
        node.size = size;
    }

    fn set_content_size(&mut self, size: f32) {
        self.content_size = size;
    }

    fn set_offset(&mut self, offset: f32) {
        self.offset = offset;
    }

    fn viewport_size(&self) -> Vec2 {
        self.viewport
    }

    fn set_movement(&mut self, movement: MovementRestriction) {
        self.movement.push(movement);
    }

    fn update_visual(&mut self, _node: &mut Node, index: usize, position: f32) {
        self.visuals.push((index, position));
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Event {
    Created(usize),
    Hidden(usize),
    ReachedStart,
    ReachedEnd,
    LastVisible,
    PullToRefresh,
    PushToClose,
}

#[derive(Debug)]
struct MockSource {
    axis: Axis,
    sizes: Vec<f32>,
    prototypes: Vec<PrototypeId>,
    kinds: Vec<usize>,
    extra: usize,
    size_known: bool,
    statics: HashSet<usize>,
    events: Vec<Event>,
}

impl MockSource {
    fn list(count: usize, size: f32) -> Self {
        Self::with_sizes(vec![size; count])
    }

    fn with_sizes(sizes: Vec<f32>) -> Self {
        Self {
            axis: Axis::Vertical,
            kinds: vec![0; sizes.len()],
            sizes,
            prototypes: vec![PrototypeId::new("a"), PrototypeId::new("b")],
            extra: 2,
            size_known: false,
            statics: HashSet::new(),
            events: Vec::new(),
        }
    }

    fn set_count(&mut self, count: usize, size: f32) {
        self.sizes.resize(count, size);
        self.kinds.resize(count, 0);
    }

    fn count(&self, event: &Event) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }
}

impl DataSource<Node> for MockSource {
    fn item_count(&self) -> usize {
        self.sizes.len()
    }

    fn extra_items_visible(&self) -> usize {
        self.extra
    }

    fn is_item_size_known(&self) -> bool {
        self.size_known
    }

    fn prototypes(&self) -> &[PrototypeId] {
        &self.prototypes
    }

    fn item_size(&self, index: usize) -> f32 {
        self.sizes[index]
    }

    fn prototype(&self, index: usize) -> PrototypeId {
        self.prototypes[self.kinds[index]].clone()
    }

    fn is_item_static(&self, index: usize) -> bool {
        self.statics.contains(&index)
    }

    fn set_item_data(&mut self, view: &mut ViewHandle<Node>, index: usize) {
        view.node.bound = Some(index);
        view.node.measured = self.axis.compose(self.sizes[index], 100.0);
    }

    fn on_item_created(&mut self, index: usize, _view: &mut ViewHandle<Node>) {
        self.events.push(Event::Created(index));
    }

    fn on_item_hidden(&mut self, index: usize, _view: &mut ViewHandle<Node>) {
        self.events.push(Event::Hidden(index));
    }

    fn on_reached_start(&mut self) {
        self.events.push(Event::ReachedStart);
    }

    fn on_reached_end(&mut self) {
        self.events.push(Event::ReachedEnd);
    }

    fn on_last_item_visible(&mut self) {
        self.events.push(Event::LastVisible);
    }

    fn on_pull_to_refresh(&mut self) {
        self.events.push(Event::PullToRefresh);
    }

    fn on_push_to_close(&mut self) {
        self.events.push(Event::PushToClose);
    }
}

fn init(
    options: RecyclerOptions,
    source: &mut MockSource,
    host: &mut MockHost,
) -> WindowTracker<Node> {
    let mut t = WindowTracker::new(options);
    t.reset(source, host).unwrap();
    t
}

fn start_of(t: &WindowTracker<Node>, index: usize) -> f32 {
    let record = t.ledger().get(index).unwrap();
    t.options().axis.main(record.abs_top_left)
}

fn line_span(t: &WindowTracker<Node>, line: usize) -> (f32, f32) {
    let axis = t.options().axis;
    let index = t.geometry().line_items(line)[0];
    let record = t.ledger().get(index).unwrap();
    if let Some(cell) = t.geometry().cell_size() {
        let start = axis.main(record.abs_top_left);
        return (start, start + axis.main(cell));
    }
    (
        axis.main(record.abs_top_left),
        axis.main(record.abs_bottom_right),
    )
}

fn assert_invariants(t: &WindowTracker<Node>) {
    let Some(w) = t.window() else {
        assert_eq!(t.live_count(), 0);
        return;
    };
    assert!(w.is_ordered(), "{w:?}");
    assert!(w.max_extra < t.line_count(), "{w:?}");

    let mut expected: Vec<usize> = (w.min_extra..=w.max_extra)
        .flat_map(|line| t.geometry().line_items(line))
        .collect();
    expected.sort_unstable();
    let live: Vec<usize> = t.live_indices().collect();
    assert_eq!(live, expected, "live set must match the window {w:?}");
    for &index in &live {
        let view = t.view(index).unwrap();
        assert_eq!(view.index(), Some(index));
        assert!(view.node.active);
        assert_eq!(view.node.bound, Some(index));
    }

    let spacing = t.options().spacing;
    for line in w.min_extra..w.max_extra {
        let (_, end) = line_span(t, line);
        let (next, _) = line_span(t, line + 1);
        assert!(
            (next - (end + spacing)).abs() < 0.01,
            "line {} starts at {next}, expected {}",
            line + 1,
            end + spacing
        );
    }

    let axis = t.options().axis;
    let (o, v) = (t.offset(), axis.main(t.viewport()));
    if w.min_visible < w.max_visible {
        for line in w.min_visible..=w.max_visible {
            let (start, end) = line_span(t, line);
            assert!(end > o && start < o + v, "line {line} is not visible at {o}");
        }
    }
    let eps = t.options().tolerances.clearance_epsilon + 0.01;
    if w.min_visible > 0 {
        assert!(line_span(t, w.min_visible).0 - spacing <= o + eps, "gap at start");
    }
    if w.max_visible + 1 < t.line_count() {
        assert!(line_span(t, w.max_visible).1 + spacing >= o + v - eps, "gap at end");
    }

    for stat in t.pool_stats() {
        assert_eq!(stat.live + stat.pooled, stat.created, "{stat:?}");
    }
}

#[test]
fn initial_window_covers_viewport_plus_look_ahead() {
    let mut source = MockSource::list(100, 50.0);
    let mut host = MockHost::new(100.0, 200.0);
    let t = init(RecyclerOptions::default(), &mut source, &mut host);

    assert_eq!(t.state(), TrackerState::Steady);
    assert_eq!(
        t.window(),
        Some(WindowState {
            min_visible: 0,
            max_visible: 3,
            min_extra: 0,
            max_extra: 5,
        })
    );
    assert_eq!(t.live_indices().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(host.instantiated, 6);
    assert_eq!(host.content_size, 5000.0);
    assert_eq!(host.offset, 0.0);
    assert_eq!(t.view(1).unwrap().node.top_left, Vec2::new(0.0, -50.0));
    assert_eq!(t.view(1).unwrap().node.size, Vec2::new(100.0, 50.0));
    assert_invariants(&t);
}

#[test]
fn scrolling_one_item_retires_exactly_one_and_reuses_it() {
    let mut source = MockSource::list(100, 50.0);
    let mut host = MockHost::new(100.0, 200.0);
    let mut t = init(RecyclerOptions::default(), &mut source, &mut host);
    source.events.clear();

    assert!(t.reconcile(&mut source, &mut host, 50.0));

    assert_eq!(
        t.window(),
        Some(WindowState {
            min_visible: 1,
            max_visible: 4,
            min_extra: 1,
            max_extra: 6,
        })
    );
    assert_eq!(source.events, vec![Event::Hidden(0), Event::Created(6)]);
    assert_eq!(host.instantiated, 6, "the retired view must be reused");
    assert_eq!(t.direction(), ScrollDirection::Forward);
    assert_invariants(&t);
}

#[test]
fn reconcile_is_idempotent_for_the_same_offset() {
    let mut source = MockSource::list(100, 50.0);
    let mut host = MockHost::new(100.0, 200.0);
    let mut t = init(RecyclerOptions::default(), &mut source, &mut host);

    assert!(t.reconcile(&mut source, &mut host, 120.0));
    let window = t.window();
    let events = source.events.len();

    assert!(!t.reconcile(&mut source, &mut host, 120.0));
    assert!(!t.reconcile(&mut source, &mut host, 120.05));
    assert_eq!(t.window(), window);
    assert_eq!(source.events.len(), events);
}

#[test]
fn shrinking_a_visible_item_shifts_following_items() {
    let mut source = MockSource::list(100, 50.0);
    let mut host = MockHost::new(100.0, 200.0);
    let mut t = init(RecyclerOptions::default(), &mut source, &mut host);

    source.sizes[2] = 40.0;
    assert!(t.reload_item(&mut source, &mut host, 2, None, true));

    assert_eq!(start_of(&t, 3), 140.0);
    assert_eq!(t.view(3).unwrap().node.top_left, Vec2::new(0.0, -140.0));
    assert_eq!(t.offset(), 0.0);
    assert_eq!(host.offset, 0.0);
    assert_eq!(t.window_state().max_visible, 4);
    assert_invariants(&t);
}

#[test]
fn growing_an_item_before_the_viewport_compensates_the_offset() {
    let mut source = MockSource::list(100, 50.0);
    let mut host = MockHost::new(100.0, 200.0);
    let mut t = init(RecyclerOptions::default(), &mut source, &mut host);

    t.reconcile(&mut source, &mut host, 300.0);
    t.reconcile(&mut source, &mut host, 290.0);
    assert_eq!(t.direction(), ScrollDirection::Backward);
    let w = t.window_state();
    assert_eq!((w.min_extra, w.min_visible), (3, 5));
    let before = start_of(&t, 5) - t.offset();

    source.sizes[3] = 80.0;
    assert!(t.reload_item(&mut source, &mut host, 3, Some("size"), true));

    assert_eq!(t.offset(), 320.0);
    assert_eq!(host.offset, 320.0);
    assert_eq!(start_of(&t, 5), 280.0);
    assert_eq!(start_of(&t, 5) - t.offset(), before);
    assert_invariants(&t);
}

#[test]
fn reload_of_hidden_item_is_applied_when_it_is_shown_again() {
    let mut source = MockSource::list(100, 50.0);
    let mut host = MockHost::new(100.0, 200.0);
    let mut t = init(RecyclerOptions::default(), &mut source, &mut host);
    t.reconcile(&mut source, &mut host, 1000.0);
    t.reconcile(&mut source, &mut host, 0.0);
    assert!(t.view(20).is_none());

    source.sizes[20] = 120.0;
    assert!(!t.reload_item(&mut source, &mut host, 20, None, true));
    assert!(t.is_pending_reload(20));
    assert!(!t.reload_item(&mut source, &mut host, 500, None, true));

    t.reconcile(&mut source, &mut host, 1000.0);
    assert!(t.view(20).is_some());
    assert!(!t.is_pending_reload(20));
    assert_eq!(t.ledger().get(20).unwrap().size.y, 120.0);
    assert_invariants(&t);
}

#[test]
fn far_jump_keeps_view_count_bounded() {
    let mut source = MockSource::list(1000, 50.0);
    let mut host = MockHost::new(100.0, 200.0);
    let mut t = init(RecyclerOptions::default(), &mut source, &mut host);

    t.reconcile(&mut source, &mut host, 20_000.0);
    assert_eq!(t.window_state().min_visible, 400);
    assert!(t.live_count() <= 8);
    assert!(host.instantiated <= 8);
    assert_invariants(&t);

    t.reconcile(&mut source, &mut host, 0.0);
    assert_eq!(t.window_state().min_visible, 0);
    assert_invariants(&t);
}

#[test]
fn backward_walk_after_full_reload_rebases_content_start() {
    let mut source = MockSource::list(100, 50.0);
    let mut host = MockHost::new(100.0, 200.0);
    let mut t = init(RecyclerOptions::default(), &mut source, &mut host);
    t.reconcile(&mut source, &mut host, 300.0);

    source.sizes = vec![60.0; 100];
    t.reload_data(&mut source, &mut host, true);
    assert_eq!(start_of(&t, 6), 300.0);
    assert_eq!(t.offset(), 300.0);
    assert_invariants(&t);

    t.reconcile(&mut source, &mut host, 0.0);
    assert_eq!(start_of(&t, 0), 0.0);
    assert_eq!(t.offset(), 60.0);
    assert_eq!(host.offset, 60.0);
    assert_invariants(&t);
}

#[test]
fn reload_with_fewer_items_retires_views_past_the_end() {
    let mut source = MockSource::list(100, 50.0);
    let mut host = MockHost::new(100.0, 200.0);
    let mut t = init(RecyclerOptions::default(), &mut source, &mut host);
    assert_eq!(host.movement.last(), Some(&MovementRestriction::Elastic));

    source.set_count(3, 50.0);
    t.reload_data(&mut source, &mut host, false);

    assert_eq!(t.live_indices().collect::<Vec<_>>(), vec![0, 1, 2]);
    assert_eq!(
        t.window(),
        Some(WindowState {
            min_visible: 0,
            max_visible: 2,
            min_extra: 0,
            max_extra: 2,
        })
    );
    assert_eq!(host.content_size, 150.0);
    assert_eq!(host.movement.last(), Some(&MovementRestriction::Clamped));
    assert_invariants(&t);

    source.set_count(0, 50.0);
    t.reload_data(&mut source, &mut host, false);
    assert_eq!(t.window(), None);
    assert_eq!(t.live_count(), 0);
    assert_invariants(&t);

    source.set_count(10, 50.0);
    t.reload_data(&mut source, &mut host, false);
    assert_eq!(t.window_state().max_visible, 3);
    assert_invariants(&t);
}

#[test]
fn prototype_change_replaces_the_live_view() {
    let mut source = MockSource::list(20, 50.0);
    let mut host = MockHost::new(100.0, 200.0);
    let mut t = init(RecyclerOptions::default(), &mut source, &mut host);

    source.kinds[1] = 1;
    source.sizes[1] = 70.0;
    t.reload_data(&mut source, &mut host, false);

    assert_eq!(t.view(1).unwrap().prototype().as_str(), "b");
    assert_eq!(start_of(&t, 2), 120.0);
    let stats = t.pool_stats();
    let a = stats.iter().find(|s| s.prototype.as_str() == "a").unwrap();
    let b = stats.iter().find(|s| s.prototype.as_str() == "b").unwrap();
    assert_eq!((a.pooled, b.live, b.created), (1, 1, 1));
    assert_invariants(&t);
}

#[test]
fn reload_after_front_insert_rebinds_and_remeasures_live_views() {
    let mut source = MockSource::list(20, 50.0);
    let mut host = MockHost::new(100.0, 200.0);
    let mut t = init(RecyclerOptions::default(), &mut source, &mut host);
    let created = host.instantiated;

    source.sizes.insert(0, 90.0);
    source.kinds.insert(0, 0);
    t.reload_data(&mut source, &mut host, false);

    assert_eq!(t.item_count(), 21);
    let first = t.view(0).unwrap();
    assert_eq!(first.node.bound, Some(0));
    assert_eq!(first.node.measured.y, 90.0);
    assert_eq!(t.ledger().get(0).unwrap().size.y, 90.0);
    assert_eq!(start_of(&t, 1), 90.0);
    assert_eq!(start_of(&t, 2), 140.0);
    for index in t.live_indices() {
        assert_eq!(t.view(index).unwrap().node.bound, Some(index));
    }
    assert_eq!(t.offset(), 0.0);
    assert_eq!(host.instantiated, created);
    assert_invariants(&t);
}

#[test]
fn diff_reload_shifts_offset_for_growth_before_the_viewport() {
    let mut source = MockSource::list(40, 50.0);
    let mut host = MockHost::new(100.0, 200.0);
    let mut t = init(RecyclerOptions::default(), &mut source, &mut host);
    t.reconcile(&mut source, &mut host, 500.0);
    t.reconcile(&mut source, &mut host, 490.0);
    let first_visible = t.window_state().min_visible;
    let min_extra = t.window_state().min_extra;
    assert!(min_extra < first_visible);
    let anchor_start = start_of(&t, first_visible);

    // The look-ahead line above the viewport grows by 30.
    source.sizes[min_extra] = 80.0;
    t.reload_data(&mut source, &mut host, false);

    assert_eq!(t.ledger().get(min_extra).unwrap().size.y, 80.0);
    assert_eq!(start_of(&t, first_visible), anchor_start + 30.0);
    assert_eq!(t.offset(), 520.0);
    assert_eq!(host.offset, 520.0);
    assert_invariants(&t);
}

#[test]
fn edge_callbacks_fire_once_per_transition() {
    let mut source = MockSource::list(10, 50.0);
    let mut host = MockHost::new(100.0, 200.0);
    let mut t = init(RecyclerOptions::default(), &mut source, &mut host);
    assert_eq!(source.count(&Event::ReachedStart), 1);
    assert_eq!(source.count(&Event::ReachedEnd), 0);

    t.reconcile(&mut source, &mut host, 300.0);
    t.reconcile(&mut source, &mut host, 320.0);
    assert_eq!(source.count(&Event::ReachedEnd), 1);
    assert_eq!(source.count(&Event::LastVisible), 1);

    t.reconcile(&mut source, &mut host, 100.0);
    t.reconcile(&mut source, &mut host, 300.0);
    assert_eq!(source.count(&Event::ReachedEnd), 2);
    assert_eq!(source.count(&Event::LastVisible), 2);

    t.reconcile(&mut source, &mut host, 0.0);
    assert_eq!(source.count(&Event::ReachedStart), 2);
}

#[test]
fn pull_and_push_gestures_are_edge_triggered() {
    let mut source = MockSource::list(10, 50.0);
    let mut host = MockHost::new(100.0, 200.0);
    let options = RecyclerOptions::default()
        .with_pull_to_refresh_distance(Some(30.0))
        .with_push_to_close_distance(Some(30.0));
    let mut t = init(options, &mut source, &mut host);

    t.reconcile(&mut source, &mut host, -40.0);
    t.reconcile(&mut source, &mut host, -50.0);
    assert_eq!(source.count(&Event::PullToRefresh), 1);
    t.reconcile(&mut source, &mut host, 0.0);
    t.reconcile(&mut source, &mut host, -40.0);
    assert_eq!(source.count(&Event::PullToRefresh), 2);

    t.reconcile(&mut source, &mut host, 320.0);
    assert_eq!(source.count(&Event::PushToClose), 0);
    t.reconcile(&mut source, &mut host, 340.0);
    t.reconcile(&mut source, &mut host, 350.0);
    assert_eq!(source.count(&Event::PushToClose), 1);
}

#[test]
fn content_that_fits_clamps_movement() {
    let mut source = MockSource::list(3, 50.0);
    let mut host = MockHost::new(100.0, 200.0);
    let t = init(RecyclerOptions::default(), &mut source, &mut host);

    assert_eq!(host.movement, vec![MovementRestriction::Clamped]);
    assert_eq!(source.count(&Event::ReachedStart), 1);
    assert_eq!(source.count(&Event::ReachedEnd), 1);
    assert_eq!(t.max_offset(), 0.0);
}

#[test]
fn empty_collection_materializes_nothing() {
    let mut source = MockSource::list(0, 50.0);
    let mut host = MockHost::new(100.0, 200.0);
    let mut t = init(RecyclerOptions::default().with_padding(10.0, 5.0), &mut source, &mut host);

    assert_eq!(t.window(), None);
    assert_eq!(host.instantiated, 0);
    assert_eq!(host.content_size, 15.0);

    // A real scroll still runs a pass over the empty window without creating anything.
    assert!(t.reconcile(&mut source, &mut host, 120.0));
    assert_eq!(t.offset(), 120.0);
    assert_eq!(t.window(), None);
    assert_eq!(t.live_count(), 0);
    assert_eq!(host.instantiated, 0);
    assert_eq!(host.content_size, 15.0);
}

#[test]
fn padding_and_spacing_position_items() {
    let mut source = MockSource::list(20, 50.0);
    let mut host = MockHost::new(100.0, 200.0);
    let options = RecyclerOptions::default()
        .with_spacing(4.0)
        .with_padding(10.0, 20.0)
        .with_cross_padding(5.0, 15.0);
    let t = init(options, &mut source, &mut host);

    assert_eq!(start_of(&t, 0), 10.0);
    assert_eq!(start_of(&t, 2), 10.0 + 2.0 * 54.0);
    assert_eq!(t.view(0).unwrap().node.top_left.x, 5.0);
    assert_eq!(host.content_size, 10.0 + 20.0 * 50.0 + 19.0 * 4.0 + 20.0);
    assert_invariants(&t);
}

#[test]
fn reversed_list_shows_the_last_item_first() {
    let mut source = MockSource::list(10, 50.0);
    let mut host = MockHost::new(100.0, 200.0);
    let t = init(RecyclerOptions::default().with_reverse(true), &mut source, &mut host);

    assert_eq!(start_of(&t, 9), 0.0);
    assert_eq!(start_of(&t, 8), 50.0);
    assert_eq!(t.line_of(9), Some(0));
    assert!(t.view(0).is_none());
    assert_invariants(&t);
}

#[test]
fn horizontal_list_lays_out_along_x() {
    let mut source = MockSource::list(10, 50.0);
    source.axis = Axis::Horizontal;
    let mut host = MockHost::new(200.0, 100.0);
    let t = init(RecyclerOptions::new(Axis::Horizontal), &mut source, &mut host);

    assert_eq!(t.view(1).unwrap().node.top_left, Vec2::new(50.0, 0.0));
    assert_eq!(t.window_state().max_visible, 3);
    assert_invariants(&t);
}

#[test]
fn grid_window_is_expressed_in_rows() {
    let mut source = MockSource::list(10, 50.0);
    source.extra = 1;
    let mut host = MockHost::new(150.0, 100.0);
    let grid = GridOptions::new(GridConstraint::FixedColumnCount(3), Vec2::new(50.0, 50.0));
    let t = init(RecyclerOptions::default().with_grid(Some(grid)), &mut source, &mut host);

    assert_eq!(t.line_count(), 4);
    assert_eq!(
        t.window(),
        Some(WindowState {
            min_visible: 0,
            max_visible: 1,
            min_extra: 0,
            max_extra: 2,
        })
    );
    assert_eq!(t.live_count(), 9);
    assert_eq!(t.view(4).unwrap().node.top_left, Vec2::new(50.0, -50.0));
    assert_eq!(host.content_size, 200.0);
    assert!(t.all_positions_known());
    assert_eq!(t.exact_offset(9), Some(150.0));
    assert_invariants(&t);
}

#[test]
fn grid_scroll_keeps_rows_whole() {
    let mut source = MockSource::list(95, 50.0);
    let mut host = MockHost::new(150.0, 100.0);
    let grid = GridOptions::new(GridConstraint::FixedColumnCount(3), Vec2::new(50.0, 50.0))
        .with_cross_spacing(2.0)
        .with_start_corner(StartCorner::UpperRight);
    let mut t = init(
        RecyclerOptions::default().with_spacing(5.0).with_grid(Some(grid)),
        &mut source,
        &mut host,
    );
    assert_eq!(t.view(0).unwrap().node.top_left.x, 104.0);

    for offset in [80.0, 600.0, 1500.0, 30.0] {
        t.reconcile(&mut source, &mut host, offset);
        assert_invariants(&t);
    }
}

#[test]
fn unsupported_grid_layouts_are_rejected_without_side_effects() {
    let cases = [
        (
            GridOptions::new(GridConstraint::FixedRowCount(2), Vec2::new(50.0, 50.0)),
            ConfigError::UnsupportedGridLayout {
                constraint: GridConstraint::FixedRowCount(2),
                axis: Axis::Vertical,
            },
        ),
        (
            GridOptions::new(GridConstraint::FixedColumnCount(0), Vec2::new(50.0, 50.0)),
            ConfigError::ZeroConstraintCount,
        ),
        (
            GridOptions::new(GridConstraint::FixedColumnCount(2), Vec2::new(0.0, 50.0)),
            ConfigError::InvalidCellSize,
        ),
    ];
    for (grid, expected) in cases {
        let mut source = MockSource::list(10, 50.0);
        let mut host = MockHost::new(150.0, 100.0);
        let mut t = WindowTracker::new(RecyclerOptions::default().with_grid(Some(grid)));
        assert_eq!(t.reset(&mut source, &mut host), Err(expected));
        assert_eq!(t.state(), TrackerState::Uninitialized);
        assert_eq!(host.instantiated, 0);
    }
}

#[test]
fn empty_prototype_list_is_a_configuration_error() {
    let mut source = MockSource::list(10, 50.0);
    source.prototypes.clear();
    let mut host = MockHost::new(100.0, 200.0);
    let mut t = WindowTracker::new(RecyclerOptions::default());
    assert_eq!(
        t.reset(&mut source, &mut host),
        Err(ConfigError::EmptyPrototypes)
    );
}

#[test]
fn flexible_grid_resolves_columns_from_the_viewport() {
    let mut source = MockSource::list(10, 50.0);
    let mut host = MockHost::new(200.0, 100.0);
    let grid = GridOptions::new(GridConstraint::Flexible, Vec2::new(50.0, 50.0));
    let mut t = init(RecyclerOptions::default().with_grid(Some(grid)), &mut source, &mut host);
    assert_eq!(t.line_count(), 3);

    t.on_viewport_resized(&mut source, &mut host, Vec2::new(100.0, 100.0));
    assert_eq!(t.line_count(), 5);
    assert_eq!(t.view(1).unwrap().node.top_left, Vec2::new(50.0, 0.0));
    assert_eq!(t.view(2).unwrap().node.top_left, Vec2::new(0.0, -50.0));
    assert_invariants(&t);
}

#[test]
fn taller_viewport_shows_more_items() {
    let mut source = MockSource::list(100, 50.0);
    let mut host = MockHost::new(100.0, 200.0);
    let mut t = init(RecyclerOptions::default(), &mut source, &mut host);

    t.on_viewport_resized(&mut source, &mut host, Vec2::new(100.0, 400.0));
    assert_eq!(t.window_state().max_visible, 7);
    assert_invariants(&t);
}

#[test]
fn known_sizes_are_positioned_up_front() {
    let mut source = MockSource::list(100, 50.0);
    source.size_known = true;
    source.sizes[10] = 80.0;
    let mut host = MockHost::new(100.0, 200.0);
    let t = init(RecyclerOptions::default(), &mut source, &mut host);

    assert!(t.all_positions_known());
    assert_eq!(t.ledger().positions_known(), 100);
    assert_eq!(t.exact_offset(11), Some(580.0));
    assert_eq!(host.content_size, 5030.0);
    assert_eq!(t.view(0).unwrap().node.size, Vec2::new(100.0, 50.0));
}

#[test]
fn unknown_positions_are_estimated_from_measured_items() {
    let mut source = MockSource::list(100, 50.0);
    let mut host = MockHost::new(100.0, 200.0);
    let t = init(RecyclerOptions::default().with_spacing(10.0), &mut source, &mut host);

    assert!(!t.all_positions_known());
    assert_eq!(t.exact_offset(50), None);
    assert_eq!(t.exact_offset(0), Some(0.0));
    assert_eq!(t.estimated_offset(50), 50.0 * 60.0);
    assert_eq!(t.normalized_offset(1.0), t.max_offset());
}

#[test]
fn static_items_are_never_pooled() {
    let mut source = MockSource::list(50, 50.0);
    source.statics.insert(0);
    let mut host = MockHost::new(100.0, 200.0);
    host.static_indices.insert(0);
    let mut t = init(RecyclerOptions::default(), &mut source, &mut host);
    assert!(t.view(0).unwrap().is_static());
    assert_eq!(t.view(0).unwrap().node.id, 10_000);

    t.reconcile(&mut source, &mut host, 500.0);
    assert!(t.view(0).is_none());
    assert!(t.pool().prototypes().all(|p| t.pool().pooled_count(p) <= 6));

    t.reconcile(&mut source, &mut host, 0.0);
    assert_eq!(t.view(0).unwrap().node.id, 10_000);
    assert_eq!(host.static_requests, 1);
    assert_eq!(host.instantiated, t.pool_stats().iter().map(|s| s.created).sum::<usize>());
    assert_invariants(&t);
}

#[test]
fn visual_update_hook_runs_for_declaring_prototypes() {
    let mut source = MockSource::list(20, 50.0);
    source.kinds[1] = 1;
    let mut host = MockHost::new(100.0, 200.0);
    host.visual_prototypes.insert("b");
    let mut t = init(RecyclerOptions::default(), &mut source, &mut host);
    assert_eq!(host.visuals, vec![(1, 0.25)]);

    host.visuals.clear();
    t.reconcile(&mut source, &mut host, 50.0);
    assert_eq!(host.visuals, vec![(1, 0.0)]);
}

#[test]
fn destroy_releases_every_view() {
    let mut source = MockSource::list(100, 50.0);
    let mut host = MockHost::new(100.0, 200.0);
    let mut t = init(RecyclerOptions::default(), &mut source, &mut host);
    t.reconcile(&mut source, &mut host, 1000.0);
    let created: usize = t.pool_stats().iter().map(|s| s.created).sum();

    t.destroy(&mut source, &mut host);
    assert_eq!(host.destroyed.len(), created);
    assert_eq!(host.destroyed.iter().collect::<BTreeSet<_>>().len(), created);
    assert_eq!(t.state(), TrackerState::Destroyed);
    assert_eq!(
        t.reset(&mut source, &mut host),
        Err(ConfigError::AlreadyDestroyed)
    );
    assert!(!t.reconcile(&mut source, &mut host, 0.0));
}

#[test]
fn suspended_tracker_records_offset_without_materializing() {
    let mut source = MockSource::list(100, 50.0);
    let mut host = MockHost::new(100.0, 200.0);
    let mut t = init(RecyclerOptions::default(), &mut source, &mut host);

    t.set_suspended(true);
    assert!(!t.reconcile(&mut source, &mut host, 2000.0));
    assert_eq!(t.offset(), 2000.0);
    assert_eq!(t.window_state().max_extra, 5);

    t.set_suspended(false);
    t.recompute_window(&mut source, &mut host);
    assert_eq!(t.window_state().min_visible, 40);
    assert_invariants(&t);
}

#[test]
fn randomized_operations_preserve_window_invariants() {
    for seed in 0..24u64 {
        let mut rng = Lcg::new(seed);
        let count = rng.gen_range_usize(1, 80);
        let sizes: Vec<f32> = (0..count)
            .map(|_| rng.gen_range_usize(10, 90) as f32)
            .collect();
        let mut source = MockSource::with_sizes(sizes);
        source.extra = rng.gen_range_usize(0, 4);
        let mut host = MockHost::new(100.0, rng.gen_range_usize(80, 300) as f32);
        let options = RecyclerOptions::default()
            .with_spacing(rng.gen_range_usize(0, 6) as f32)
            .with_padding(rng.gen_range_usize(0, 20) as f32, rng.gen_range_usize(0, 20) as f32)
            .with_reverse(rng.gen_bool());
        let mut t = init(options, &mut source, &mut host);

        for _ in 0..60 {
            match rng.gen_range_usize(0, 10) {
                0 => {
                    let index = rng.gen_range_usize(0, source.sizes.len().max(1));
                    if index < source.sizes.len() {
                        source.sizes[index] = rng.gen_range_usize(10, 90) as f32;
                    }
                    t.reload_item(&mut source, &mut host, index, None, true);
                }
                1 => {
                    let count = rng.gen_range_usize(0, 80);
                    source.set_count(count, rng.gen_range_usize(10, 90) as f32);
                    t.reload_data(&mut source, &mut host, rng.gen_bool());
                }
                _ => {
                    let max = t.content_size() as usize + 100;
                    let offset = rng.gen_range_usize(0, max) as f32 - 50.0;
                    t.reconcile(&mut source, &mut host, offset);
                }
            }
            assert_invariants(&t);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn window_invariants_hold_for_any_scroll_sequence(
        sizes in prop::collection::vec(1u16..120, 1..60),
        spacing in 0u8..8,
        extra in 0usize..4,
        viewport in 60u16..400,
        offsets in prop::collection::vec(-200i32..6000, 1..30),
    ) {
        let mut source = MockSource::with_sizes(sizes.iter().map(|&s| s as f32).collect());
        source.extra = extra;
        let mut host = MockHost::new(100.0, viewport as f32);
        let options = RecyclerOptions::default().with_spacing(spacing as f32);
        let mut t = init(options, &mut source, &mut host);

        for offset in offsets {
            t.reconcile(&mut source, &mut host, offset as f32);
            assert_invariants(&t);
            prop_assert!(t.live_count() <= source.sizes.len());
        }
    }

    #[test]
    fn grid_mapping_visits_every_index_once(
        count in 0usize..200,
        constraint in 1usize..9,
        vertical_start in any::<bool>(),
        corner in 0u8..4,
        reverse in any::<bool>(),
    ) {
        let start_axis = if vertical_start { StartAxis::Vertical } else { StartAxis::Horizontal };
        let start_corner = match corner {
            0 => StartCorner::UpperLeft,
            1 => StartCorner::UpperRight,
            2 => StartCorner::LowerLeft,
            _ => StartCorner::LowerRight,
        };
        let grid = GridOptions::new(GridConstraint::FixedColumnCount(constraint), Vec2::new(10.0, 10.0))
            .with_start_axis(start_axis)
            .with_start_corner(start_corner);
        let options = RecyclerOptions::default().with_reverse(reverse).with_grid(Some(grid));
        let mut geometry = geometry::from_options(&options);
        geometry.set_item_count(count);
        prop_assert!(geometry.configure(Vec2::new(100.0, 100.0)).is_ok());

        let mut seen = vec![0usize; count];
        for line in 0..geometry.line_count() {
            for index in geometry.line_items(line) {
                seen[index] += 1;
                prop_assert_eq!(geometry.line_of(index), Some(line));
            }
        }
        prop_assert!(seen.iter().all(|&n| n == 1));
    }
}

#[test]
fn grid_mapper_round_trips_corners() {
    let descriptor =
        GridDescriptor::fixed_columns(3, StartAxis::Horizontal, StartCorner::LowerRight, 7);
    let mapper = GridIndexMapper::new(descriptor, false);
    assert_eq!((descriptor.width, descriptor.height), (3, 3));
    assert_eq!(mapper.coords(0), (2, 2));
    assert_eq!(mapper.flat_at(2, 2), Some(0));
    assert_eq!(mapper.actual_index(7), None);

    let reversed = GridIndexMapper::new(descriptor, true);
    assert_eq!(reversed.actual_index(0), Some(6));
    assert_eq!(reversed.flat_of(6), Some(0));
}

#[test]
fn ledger_tracks_known_counts_and_averages() {
    let mut ledger = PositionLedger::new(Axis::Vertical);
    ledger.reset(4);
    assert!(ledger.set_position_and_size(0, Vec2::new(0.0, -10.0), Vec2::new(100.0, 20.0)));
    assert!(ledger.set_size(1, Vec2::new(100.0, 40.0)));
    assert!(!ledger.set_size(4, Vec2::new(100.0, 40.0)));
    assert_eq!(ledger.average_main_size(), Some(30.0));
    assert_eq!(ledger.get(0).unwrap().abs_bottom_right, Vec2::new(100.0, 30.0));

    assert!(ledger.shift_main(0, 5.0));
    assert!(!ledger.shift_main(1, 5.0));
    assert_eq!(ledger.get(0).unwrap().top_left, Vec2::new(0.0, -15.0));

    ledger.set_item_count(1);
    assert_eq!(ledger.average_main_size(), Some(20.0));
    assert!(ledger.all_positions_known());
    assert!(ledger.get(1).is_none());
}

#[test]
fn pool_hands_back_views_of_the_requested_prototype() {
    let a = PrototypeId::new("a");
    let b = PrototypeId::new("b");
    let mut pool: RecyclePool<Node> = RecyclePool::new();
    pool.register(&a);
    assert!(pool.try_acquire(&a).is_none());

    let mut handle = ViewHandle::new(Node::new(1), b.clone(), ViewCapabilities::default());
    handle.assign(Some(3));
    pool.release(handle);
    assert!(pool.try_acquire(&a).is_none());
    assert_eq!(pool.pooled_count(&b), 1);

    let handle = pool.try_acquire(&b).unwrap();
    assert_eq!(handle.index(), None);
    assert_eq!(handle.node.id, 1);
    assert_eq!(pool.total_pooled(), 0);
}
