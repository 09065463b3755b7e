//! Headless demo: a layered dummy network pushing traffic into a graph.
//!
//! Producer threads emulate a transport by sending chunk JSON through a
//! [`TrafficFeed`]; the main loop pumps the feed, advances the scheduler in
//! lockstep with wall time and periodically reports what the graph looks
//! like. State lands in `./graph-state/`, so node positions survive reruns.

use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use crossbeam::channel::Sender;
use rand::Rng;
use regex::Regex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use netgraph::{
    ChunkedTrafficSource, FileBackend, GraphConfig, GraphView, GroupMapper, MappingRule,
    MemoryScene, Scheduler, StateStore, TrafficBinding, TrafficFeed,
};

const TICK_MS: u64 = 100;

/// One emulated layer link: every 500ms, a random source node of one layer
/// sends a small burst to a random target node of another.
fn spawn_layer_traffic(
    sender: Sender<String>,
    source_layer: u32,
    source_count: u32,
    target_layer: u32,
    target_count: u32,
) {
    thread::spawn(move || {
        let mut rng = rand::thread_rng();
        loop {
            thread::sleep(Duration::from_millis(500));
            let source = format!("node-{}", 10 * source_layer + rng.gen_range(0..source_count));
            let target = format!("node-{}", 10 * target_layer + rng.gen_range(0..target_count));
            let count = rng.gen_range(1..=3);
            let chunk = format!(
                r#"{{"type":"traffic","edges":[{{"source":"{source}","target":"{target}","count":{count},"duration":500}}]}}"#
            );
            if sender.send(chunk).is_err() {
                return;
            }
        }
    });
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let seconds: u64 = std::env::args()
        .nth(1)
        .map(|arg| arg.parse())
        .transpose()?
        .unwrap_or(30);

    let scene = MemoryScene::new().into_handle();
    let scheduler = Scheduler::new();
    let store = StateStore::restore("dummy", Box::new(FileBackend::new("graph-state")));
    let graph = Rc::new(RefCell::new(GraphView::new(
        store,
        scene.clone(),
        scheduler.clone(),
        GraphConfig::default(),
    )));

    // collapse the web tier into one logical node
    let mapper = Rc::new(RefCell::new(GroupMapper::new(vec![MappingRule::new(
        Regex::new(r"^node-2\d$")?,
        "frontend",
    )])));

    let mut source = ChunkedTrafficSource::new(scheduler.clone());
    let _binding = TrafficBinding::bind(Rc::clone(&graph), &source, mapper);

    let feed = TrafficFeed::new();
    // the same layered topology a small game backend would show
    spawn_layer_traffic(feed.sender(), 1, 4, 2, 2);
    spawn_layer_traffic(feed.sender(), 2, 2, 3, 8);
    spawn_layer_traffic(feed.sender(), 3, 8, 4, 3);
    spawn_layer_traffic(feed.sender(), 4, 3, 4, 3);
    spawn_layer_traffic(feed.sender(), 1, 4, 5, 3);
    spawn_layer_traffic(feed.sender(), 3, 8, 5, 3);

    feed.sender().send(
        r#"{"type":"mapping","mapping":{"node-10":"client-0","node-50":"queue-0"}}"#.to_string(),
    )?;

    info!(seconds, "dummy traffic running");
    let ticks = seconds * 1000 / TICK_MS;
    for tick in 0..ticks {
        thread::sleep(Duration::from_millis(TICK_MS));
        feed.drain(&mut source);
        scheduler.advance(TICK_MS);

        if tick % 50 == 49 {
            let graph = graph.borrow();
            info!(
                nodes = graph.node_count(),
                edges = graph.edge_count(),
                pulses = scene.borrow().packets_spawned(),
                "graph status"
            );
        }
    }

    let graph = graph.borrow();
    for node in graph.nodes() {
        let (received, sent) = node.traffic();
        info!(node = %node.id(), alias = node.alias(), received, sent, "totals");
    }
    Ok(())
}
