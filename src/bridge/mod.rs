//! Traffic-to-graph binding
//!
//! Wires a [`ChunkedTrafficSource`] into a shared [`GraphView`]: every ping
//! materializes the endpoints and the connecting edge on demand and fires a
//! pulse along it, and mapping emissions become node aliases after a quiet
//! window. Dropping the binding detaches the graph from the source.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

use crate::graph::GraphView;
use crate::mapping::GroupMapper;
use crate::reactive::Subscription;
use crate::scheduler::Debounce;
use crate::traffic::{ChunkedTrafficSource, Ping};
use crate::value_objects::NodeId;

/// Live subscription of a graph to a traffic source.
pub struct TrafficBinding {
    _subscriptions: Vec<Subscription>,
}

impl TrafficBinding {
    /// Bind the graph to the source. Endpoint ids pass through the mapper
    /// before they reach the graph, so rule edits take effect on the next
    /// ping.
    pub fn bind(
        graph: Rc<RefCell<GraphView>>,
        source: &ChunkedTrafficSource,
        mapper: Rc<RefCell<GroupMapper>>,
    ) -> Self {
        let (scheduler, mapping_debounce_ms) = {
            let graph = graph.borrow();
            (graph.scheduler(), graph.config().mapping_debounce_ms)
        };

        let ping_graph = Rc::clone(&graph);
        let pings = source.pings().subscribe(move |ping: &Ping| {
            let (source_id, target_id) = {
                let mapper = mapper.borrow();
                (
                    NodeId::from(mapper.map(&ping.source)),
                    NodeId::from(mapper.map(&ping.target)),
                )
            };
            trace!(source = %source_id, target = %target_id, "ping");

            let mut graph = ping_graph.borrow_mut();
            if source_id == target_id {
                // a group mapping collapsed both endpoints; count it, no edge
                graph.get_or_create_node(&source_id, None);
                if let Some(node) = graph.node_mut(&source_id) {
                    node.log_traffic(1, 1);
                }
                return;
            }

            let duration = graph.config().pulse_duration_ms;
            let (edge, reversed) = graph.get_or_create_edge(&source_id, &target_id);
            edge.ping(reversed, duration);

            if let Some(node) = graph.node_mut(&source_id) {
                node.log_traffic(0, 1);
            }
            if let Some(node) = graph.node_mut(&target_id) {
                node.log_traffic(1, 0);
            }
        });

        // aliases settle before they are applied; each emission replaces the
        // pending map
        let mapping_graph = Rc::clone(&graph);
        let apply = Debounce::new(
            scheduler,
            mapping_debounce_ms,
            move |mapping: HashMap<String, String>| {
                let mut graph = mapping_graph.borrow_mut();
                for (id, alias) in &mapping {
                    let node_id = NodeId::from(id.as_str());
                    if let Some(node) = graph.node_mut(&node_id) {
                        // a user-chosen alias is never overwritten
                        if node.alias() == node.id().as_str() {
                            node.set_alias(alias.as_str());
                        }
                    }
                }
            },
        );
        let mapping = source
            .mapping()
            .subscribe(move |mapping: &HashMap<String, String>| apply.feed(mapping.clone()));

        Self {
            _subscriptions: vec![pings, mapping],
        }
    }
}
