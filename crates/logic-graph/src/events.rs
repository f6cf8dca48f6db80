//! Name-keyed event bus shared by the agents of one host.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, broadcast};

use crate::host::EntityId;
use crate::var_env::VarEnv;

/// A named event published by a node or by the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub name: String,
    /// Entity the publishing agent runs for.
    pub source: EntityId,
    #[serde(default)]
    pub payload: VarEnv,
}

impl GameEvent {
    pub fn new(name: impl Into<String>, source: EntityId) -> Self {
        Self {
            name: name.into(),
            source,
            payload: VarEnv::new(),
        }
    }

    pub fn with_payload(mut self, payload: VarEnv) -> Self {
        self.payload = payload;
        self
    }
}

/// Event bus with one broadcast channel per event name.
///
/// Channels are created on first subscription. Publishing never blocks and
/// is best-effort: events without subscribers are dropped.
#[derive(Clone, Debug)]
pub struct EventBus {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<GameEvent>>>>,
    capacity: usize,
}

impl EventBus {
    pub const DEFAULT_CAPACITY: usize = 64;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates a bus whose channels buffer `capacity` events per name.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Publishes `event`, returning the number of receivers it reached.
    pub fn publish(&self, event: GameEvent) -> usize {
        match self.channels.try_read() {
            Ok(channels) => match channels.get(&event.name) {
                Some(tx) => match tx.send(event) {
                    Ok(receivers) => receivers,
                    Err(broadcast::error::SendError(event)) => {
                        tracing::trace!(
                            target: "logic_graph::events",
                            name = %event.name,
                            "no live subscribers"
                        );
                        0
                    }
                },
                None => {
                    tracing::trace!(
                        target: "logic_graph::events",
                        name = %event.name,
                        "no subscribers"
                    );
                    0
                }
            },
            Err(_) => {
                tracing::debug!(
                    target: "logic_graph::events",
                    name = %event.name,
                    "event bus lock contended, event dropped"
                );
                0
            }
        }
    }

    /// Subscribes to events named `name`.
    ///
    /// Returns `None` only if the channel table is locked by a concurrent
    /// subscriber.
    pub fn subscribe(&self, name: &str) -> Option<broadcast::Receiver<GameEvent>> {
        let Ok(mut channels) = self.channels.try_write() else {
            tracing::warn!(
                target: "logic_graph::events",
                name,
                "event bus lock contended, subscription failed"
            );
            return None;
        };

        let capacity = self.capacity;
        let tx = channels
            .entry(name.to_string())
            .or_insert_with(|| broadcast::channel(capacity).0);
        Some(tx.subscribe())
    }

    /// Number of live receivers for `name`.
    pub fn subscriber_count(&self, name: &str) -> usize {
        self.channels
            .try_read()
            .ok()
            .and_then(|channels| channels.get(name).map(|tx| tx.receiver_count()))
            .unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
