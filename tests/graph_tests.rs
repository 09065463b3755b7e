//! Graph View Integration Tests

use std::cell::RefCell;
use std::rc::Rc;

use netgraph::{
    ChunkedTrafficSource, GraphConfig, GraphView, GroupMapper, MemoryBackend, MemoryScene,
    NodeId, PointerButton, Scheduler, StateStore, TrafficBinding, Vector,
};

fn build_graph(backend: MemoryBackend) -> (Rc<RefCell<GraphView>>, Rc<RefCell<MemoryScene>>, Scheduler) {
    let scene = MemoryScene::new().into_handle();
    let scheduler = Scheduler::new();
    let store = StateStore::restore("it", Box::new(backend));
    let graph = GraphView::new(
        store,
        scene.clone(),
        scheduler.clone(),
        GraphConfig {
            rng_seed: Some(42),
            ..GraphConfig::default()
        },
    );
    (Rc::new(RefCell::new(graph)), scene, scheduler)
}

fn bind_traffic(
    graph: &Rc<RefCell<GraphView>>,
    scheduler: &Scheduler,
) -> (ChunkedTrafficSource, TrafficBinding) {
    let source = ChunkedTrafficSource::new(scheduler.clone());
    let mapper = Rc::new(RefCell::new(GroupMapper::default()));
    let binding = TrafficBinding::bind(Rc::clone(graph), &source, mapper);
    (source, binding)
}

#[test]
fn test_first_ping_between_strangers() {
    // scenario: one ping between two never-seen endpoints
    let (graph, scene, scheduler) = build_graph(MemoryBackend::new());
    let (mut source, _binding) = bind_traffic(&graph, &scheduler);

    source.ingest(r#"{"type":"traffic","edges":[{"source":"a","target":"b"}]}"#);

    let graph = graph.borrow();
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1);

    // both nodes land inside the fresh-node ring around the canvas center
    let center = graph.config().canvas_size.scaled(0.5);
    for id in ["a", "b"] {
        let distance = graph.node(&id.into()).unwrap().position().distance_to(center);
        assert!(distance <= 150.0 + 3.0 * 30.0, "{id} at {distance}");
    }
    assert_eq!(scene.borrow().packets_spawned(), 1);
}

#[test]
fn test_stored_position_beats_random_placement() {
    let mut backend = MemoryBackend::new();
    {
        let mut store = StateStore::restore("it", Box::new(MemoryBackend::new()));
        store.set_position("a", Vector::new(33.0, 44.0));
        let document = serde_json::to_string(store.state()).unwrap();
        use netgraph::StateBackend;
        backend.store("graph.states.it", &document).unwrap();
    }

    let (graph, _scene, scheduler) = build_graph(backend);
    let (mut source, _binding) = bind_traffic(&graph, &scheduler);
    source.ingest(r#"{"type":"traffic","edges":[{"source":"a","target":"b"}]}"#);

    assert_eq!(
        graph.borrow().node(&"a".into()).unwrap().position(),
        Vector::new(33.0, 44.0)
    );
}

#[test]
fn test_repeated_pings_share_one_edge() {
    // scenario: three pings, mixed directions, still a single edge
    let (graph, scene, scheduler) = build_graph(MemoryBackend::new());
    let (mut source, _binding) = bind_traffic(&graph, &scheduler);

    source.ingest(r#"{"type":"traffic","edges":[{"source":"a","target":"b"}]}"#);
    source.ingest(r#"{"type":"traffic","edges":[{"source":"b","target":"a"}]}"#);
    source.ingest(r#"{"type":"traffic","edges":[{"source":"a","target":"b"}]}"#);

    let graph = graph.borrow();
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1);
    assert_eq!(scene.borrow().packets_spawned(), 3);
    assert_eq!(graph.node(&"a".into()).unwrap().traffic(), (1, 2));
    assert_eq!(graph.node(&"b".into()).unwrap().traffic(), (2, 1));
}

#[test]
fn test_destroying_a_node_takes_its_edges_along() {
    let (graph, scene, scheduler) = build_graph(MemoryBackend::new());
    let (mut source, _binding) = bind_traffic(&graph, &scheduler);

    source.ingest(
        r#"{"type":"traffic","edges":[{"source":"hub","target":"a"},{"source":"hub","target":"b"},{"source":"a","target":"b"}]}"#,
    );
    assert_eq!(graph.borrow().edge_count(), 3);

    graph.borrow_mut().destroy_node(&"hub".into());

    let graph = graph.borrow();
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1);
    assert_eq!(scene.borrow().attached_count(netgraph::scene::ElementKind::Edge), 1);

    // late pulse timers must not resurrect anything
    scheduler.advance(10_000);
}

#[test]
fn test_positions_survive_a_restart() {
    let mut carried = None;
    {
        let (graph, _scene, scheduler) = build_graph(MemoryBackend::new());
        let mut g = graph.borrow_mut();
        g.get_or_create_node(&"a".into(), None);
        g.move_node(&"a".into(), Vector::new(123.0, 456.0));
        drop(g);
        scheduler.advance(100);

        let store = graph.borrow().store();
        let document = serde_json::to_string(store.borrow().state()).unwrap();
        carried = Some(document);
    }

    let mut backend = MemoryBackend::new();
    use netgraph::StateBackend;
    backend.store("graph.states.it", &carried.unwrap()).unwrap();

    let (graph, _scene, _scheduler) = build_graph(backend);
    graph.borrow_mut().get_or_create_node(&"a".into(), None);
    assert_eq!(
        graph.borrow().node(&"a".into()).unwrap().position(),
        Vector::new(123.0, 456.0)
    );
}

#[test]
fn test_rapid_moves_persist_once_after_quiet_window() {
    let (graph, _scene, scheduler) = build_graph(MemoryBackend::new());
    let mut g = graph.borrow_mut();
    g.get_or_create_node(&"a".into(), None);
    for step in 0..20 {
        g.move_node(&"a".into(), Vector::new(step as f64, 0.0));
        drop(g);
        scheduler.advance(50);
        g = graph.borrow_mut();
    }
    // still within the quiet window of the last move
    assert_eq!(g.store().borrow().position_of("a"), None);
    drop(g);

    scheduler.advance(100);
    assert_eq!(
        graph.borrow().store().borrow().position_of("a"),
        Some(Vector::new(19.0, 0.0))
    );
}

#[test]
fn test_marquee_grazing_a_node_corner_selects_it() {
    let (graph, _scene, _scheduler) = build_graph(MemoryBackend::new());
    let mut g = graph.borrow_mut();
    g.get_or_create_node(&"a".into(), None);
    g.move_node(&"a".into(), Vector::new(100.0, 100.0));

    // default node size is 60x30, so the bounding box is 70..130 x 85..115
    // and the bounding circle has radius 30
    g.pointer_down(Vector::new(10.0, 10.0), PointerButton::Primary);

    // corner at (75, 79): outside the circle (distance ~32.6), no selection
    g.pointer_move(Vector::new(75.0, 79.0));
    assert!(g.selection().is_empty());

    // edge reaching (100, 75): above the bounding box but inside the circle
    g.pointer_move(Vector::new(100.0, 75.0));
    assert_eq!(g.selection(), &[NodeId::from("a")]);
    g.pointer_up(Vector::new(100.0, 75.0));
}

#[test]
fn test_selection_signal_is_quiet_on_equal_content() {
    let (graph, _scene, _scheduler) = build_graph(MemoryBackend::new());
    let mut g = graph.borrow_mut();
    g.get_or_create_node(&"a".into(), None);
    g.get_or_create_node(&"b".into(), None);

    let emissions = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&emissions);
    let _sub = g
        .selection_signal()
        .subscribe(move |selection: &Vec<NodeId>| sink.borrow_mut().push(selection.clone()));

    g.update_selection(vec!["a".into(), "b".into()]);
    g.update_selection(vec!["a".into(), "b".into()]);
    g.select_all_nodes(); // already all selected: toggles to empty
    assert_eq!(emissions.borrow().len(), 2);
    assert!(emissions.borrow()[1].is_empty());
}

#[test]
fn test_grid_layout_is_reproducible_across_runs() {
    let run = || {
        let (graph, _scene, _scheduler) = build_graph(MemoryBackend::new());
        let mut g = graph.borrow_mut();
        for id in ["a", "b", "c", "d", "e"] {
            g.get_or_create_node(&id.into(), None);
        }
        let ids: Vec<NodeId> = g.node_ids();
        drop(g);
        netgraph::layout::grid_nodes(&mut graph.borrow_mut(), &ids);
        let g = graph.borrow();
        ids.iter().map(|id| g.node(id).unwrap().position()).collect::<Vec<_>>()
    };

    assert_eq!(run(), run());
}

#[test]
fn test_pulses_outlive_nothing_and_clean_up() {
    let (graph, scene, scheduler) = build_graph(MemoryBackend::new());
    let (mut source, _binding) = bind_traffic(&graph, &scheduler);

    source.ingest(
        r#"{"type":"traffic","edges":[{"source":"a","target":"b","count":5,"duration":1000}]}"#,
    );
    scheduler.advance(1000);
    assert_eq!(scene.borrow().packets_spawned(), 5);

    // settle + travel + removal margin for the last ping
    scheduler.advance(100 + 2000 + 100);
    let edge = graph.borrow().edge_of(&"a".into(), &"b".into()).unwrap().0;
    assert_eq!(scene.borrow().packets_on(edge.element()), 0);
}
