//! Traffic ingestion
//!
//! The core consumes flat [`Ping`] events; transports deliver batched JSON
//! chunks. [`ChunkedTrafficSource`] sits between the two: it parses chunks,
//! expands a batch of `count` pings evenly over `duration` milliseconds on the
//! scheduler, and folds partial mapping chunks into one cumulative alias
//! dictionary. Transport faults stay at this boundary; malformed input is
//! logged and dropped, never surfaced to the graph.

use std::collections::HashMap;

use crossbeam::channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::reactive::Signal;
use crate::scheduler::Scheduler;

/// One observed transmission between two endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ping {
    pub source: String,
    pub target: String,
}

/// One entry of a traffic chunk: `count` transmissions spread over
/// `duration` milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketBatch {
    pub source: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

impl PacketBatch {
    fn count(&self) -> u32 {
        self.count.unwrap_or(1)
    }

    fn duration(&self) -> u64 {
        self.duration.unwrap_or(1000)
    }
}

/// Wire chunk, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Chunk {
    Traffic { edges: Vec<PacketBatch> },
    Mapping { mapping: HashMap<String, String> },
}

/// Expands raw chunks into ping and mapping streams.
pub struct ChunkedTrafficSource {
    scheduler: Scheduler,
    pings: Signal<Ping>,
    mapping: Signal<HashMap<String, String>>,
    current_mapping: HashMap<String, String>,
}

impl ChunkedTrafficSource {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler,
            pings: Signal::new(),
            mapping: Signal::new(),
            current_mapping: HashMap::new(),
        }
    }

    /// The flat ping stream.
    pub fn pings(&self) -> Signal<Ping> {
        self.pings.clone()
    }

    /// Cumulative alias dictionary; every emission carries the full map.
    pub fn mapping(&self) -> Signal<HashMap<String, String>> {
        self.mapping.clone()
    }

    /// Parse and expand one raw chunk. Malformed input is dropped.
    pub fn ingest(&mut self, raw: &str) {
        match serde_json::from_str::<Chunk>(raw) {
            Ok(chunk) => self.accept(chunk),
            Err(error) => warn!(%error, "dropping malformed traffic chunk"),
        }
    }

    /// Expand an already parsed chunk.
    pub fn accept(&mut self, chunk: Chunk) {
        match chunk {
            Chunk::Traffic { edges } => {
                debug!(batches = edges.len(), "traffic chunk");
                for batch in edges {
                    self.expand(batch);
                }
            }
            Chunk::Mapping { mapping } => {
                debug!(entries = mapping.len(), "mapping chunk");
                self.current_mapping.extend(mapping);
                self.mapping.emit(self.current_mapping.clone());
            }
        }
    }

    /// A batch of n pings is paced at `duration / n` intervals. Zero counts
    /// produce nothing, a single ping fires immediately.
    fn expand(&mut self, batch: PacketBatch) {
        let count = batch.count();
        if count == 0 {
            return;
        }
        if count == 1 {
            self.pings.emit(Ping {
                source: batch.source,
                target: batch.target,
            });
            return;
        }

        let interval = batch.duration() / u64::from(count);
        for index in 0..u64::from(count) {
            let pings = self.pings.clone();
            let ping = Ping {
                source: batch.source.clone(),
                target: batch.target.clone(),
            };
            self.scheduler
                .schedule((index + 1) * interval, move || pings.emit(ping));
        }
    }
}

/// Bridges a transport thread into the single-threaded core. The transport
/// side holds a cloned [`Sender`] and pushes raw chunk payloads; the core
/// pumps them with [`TrafficFeed::drain`] from its own loop.
pub struct TrafficFeed {
    sender: Sender<String>,
    receiver: Receiver<String>,
}

impl TrafficFeed {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// A handle for the producing thread.
    pub fn sender(&self) -> Sender<String> {
        self.sender.clone()
    }

    /// Feed every queued chunk into the source. Returns how many were
    /// processed.
    pub fn drain(&self, source: &mut ChunkedTrafficSource) -> usize {
        let mut drained = 0;
        while let Ok(raw) = self.receiver.try_recv() {
            source.ingest(&raw);
            drained += 1;
        }
        drained
    }
}

impl Default for TrafficFeed {
    fn default() -> Self {
        Self::new()
    }
}
