//! Per-turtle event streams and the correlated response path back to
//! script workers.
//!
//! Every subscriber of a turtle sees every event; workers pick out their
//! own responses by correlation id.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, trace};

use super::command::{CommandError, CommandResult};
use super::config::TurtleConfig;
use super::types::{CorrelationId, TurtleId, TURTLE_RESPONSE_EVENT};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurtleEvent {
    pub turtle_id: TurtleId,
    pub name: String,
    pub args: Vec<Value>,
}

/// External event stream of each turtle.
pub trait EventSink: Send + Sync {
    fn publish(&self, turtle_id: &str, name: &str, args: Vec<Value>);

    /// The turtle is gone; pending readers should be released.
    fn close(&self, _turtle_id: &str) {}
}

/// In-process event stream built on `tokio::sync::broadcast`.
///
/// Retention is bounded by `capacity`; readers that fall further behind
/// observe a lag and lose the oldest events.
#[derive(Debug)]
pub struct BroadcastEventBus {
    capacity: usize,
    streams: Mutex<BTreeMap<TurtleId, broadcast::Sender<TurtleEvent>>>,
}

impl BroadcastEventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            streams: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn from_config(config: &TurtleConfig) -> Self {
        Self::new(config.event_capacity)
    }

    /// Receives every event published for `turtle_id` from now on.
    pub fn subscribe(&self, turtle_id: &str) -> broadcast::Receiver<TurtleEvent> {
        let mut streams = self.streams.lock().unwrap_or_else(PoisonError::into_inner);
        streams
            .entry(turtle_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    pub fn subscriber_count(&self, turtle_id: &str) -> usize {
        let streams = self.streams.lock().unwrap_or_else(PoisonError::into_inner);
        streams
            .get(turtle_id)
            .map(broadcast::Sender::receiver_count)
            .unwrap_or(0)
    }
}

impl EventSink for BroadcastEventBus {
    fn publish(&self, turtle_id: &str, name: &str, args: Vec<Value>) {
        let streams = self.streams.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = streams.get(turtle_id) else {
            trace!(turtle_id, event = name, "no subscribers; event dropped");
            return;
        };
        let event = TurtleEvent {
            turtle_id: turtle_id.to_string(),
            name: name.to_string(),
            args,
        };
        if sender.send(event).is_err() {
            trace!(turtle_id, event = name, "no live receivers; event dropped");
        }
    }

    fn close(&self, turtle_id: &str) {
        let mut streams = self.streams.lock().unwrap_or_else(PoisonError::into_inner);
        if streams.remove(turtle_id).is_some() {
            debug!(turtle_id, "event stream closed");
        }
    }
}

/// Outcome of one command, correlated with its submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub correlation_id: CorrelationId,
    pub success: bool,
    #[serde(default)]
    pub payload: Vec<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl CommandResponse {
    pub fn from_result(correlation_id: CorrelationId, result: CommandResult) -> Self {
        match result {
            Ok(payload) => Self {
                correlation_id,
                success: true,
                payload,
                message: None,
            },
            Err(err) => Self::failure(correlation_id, &err),
        }
    }

    pub fn failure(correlation_id: CorrelationId, err: &CommandError) -> Self {
        Self {
            correlation_id,
            success: false,
            payload: Vec::new(),
            message: Some(err.message().to_string()),
        }
    }

    /// Event arguments: `[id, true, payload...]` or `[id, false, message]`.
    pub fn to_args(&self) -> Vec<Value> {
        let mut args = Vec::with_capacity(self.payload.len() + 2);
        args.push(Value::from(self.correlation_id));
        args.push(Value::Bool(self.success));
        if self.success {
            args.extend(self.payload.iter().cloned());
        } else {
            args.push(Value::from(self.message.clone().unwrap_or_default()));
        }
        args
    }

    /// Parses a `turtle_response` event; any other event yields `None`.
    pub fn from_event(event: &TurtleEvent) -> Option<Self> {
        if event.name != TURTLE_RESPONSE_EVENT {
            return None;
        }
        let correlation_id = event.args.first()?.as_u64()?;
        let success = event.args.get(1)?.as_bool()?;
        if success {
            return Some(Self {
                correlation_id,
                success,
                payload: event.args[2..].to_vec(),
                message: None,
            });
        }
        let message = event
            .args
            .get(2)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Some(Self {
            correlation_id,
            success,
            payload: Vec::new(),
            message: Some(message),
        })
    }
}

/// Publishes command responses onto the turtle's event stream.
#[derive(Clone)]
pub struct ResponseChannel {
    sink: Arc<dyn EventSink>,
}

impl ResponseChannel {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    pub fn deliver(&self, turtle_id: &str, response: &CommandResponse) {
        debug!(
            turtle_id,
            correlation_id = response.correlation_id,
            success = response.success,
            "command response delivered"
        );
        self.sink
            .publish(turtle_id, TURTLE_RESPONSE_EVENT, response.to_args());
    }

    pub fn close(&self, turtle_id: &str) {
        self.sink.close(turtle_id);
    }
}
