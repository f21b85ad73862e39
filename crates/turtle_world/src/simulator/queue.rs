//! Per-turtle FIFO of pending commands.
//!
//! Script workers submit from any thread through a [`CommandSubmitter`];
//! only the tick thread pops, through the owning [`CommandQueue`].

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, ThreadId};
use tracing::debug;

use super::command::Command;
use super::types::{CorrelationId, TurtleId, FIRST_CORRELATION_ID};

pub struct QueueEntry {
    pub correlation_id: CorrelationId,
    pub command: Box<dyn Command>,
}

impl fmt::Debug for QueueEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueEntry")
            .field("correlation_id", &self.correlation_id)
            .field("command", &self.command.name())
            .finish()
    }
}

#[derive(Debug)]
struct SubmitState {
    next_id: CorrelationId,
    sender: Sender<QueueEntry>,
}

/// Cloneable, thread-safe submission handle for one turtle.
#[derive(Debug, Clone)]
pub struct CommandSubmitter {
    turtle_id: TurtleId,
    // Id assignment and enqueue happen under one lock so queue order always
    // matches id order.
    state: Arc<Mutex<SubmitState>>,
}

impl CommandSubmitter {
    pub fn turtle_id(&self) -> &TurtleId {
        &self.turtle_id
    }

    pub fn submit<C: Command + 'static>(&self, command: C) -> CorrelationId {
        self.submit_boxed(Box::new(command))
    }

    /// Always succeeds. Commands still queued when the turtle is removed are
    /// answered with a failure; commands submitted afterwards are dropped and
    /// their response never arrives.
    pub fn submit_boxed(&self, command: Box<dyn Command>) -> CorrelationId {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let correlation_id = state.next_id;
        state.next_id = state.next_id.saturating_add(1);
        let name = command.name().to_string();
        if state
            .sender
            .send(QueueEntry {
                correlation_id,
                command,
            })
            .is_err()
        {
            debug!(turtle_id = %self.turtle_id, correlation_id, command = %name, "turtle gone; command dropped");
        }
        correlation_id
    }
}

#[derive(Debug)]
pub struct CommandQueue {
    submitter: CommandSubmitter,
    receiver: Receiver<QueueEntry>,
    consumer: Option<ThreadId>,
}

impl CommandQueue {
    pub fn new(turtle_id: impl Into<TurtleId>) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            submitter: CommandSubmitter {
                turtle_id: turtle_id.into(),
                state: Arc::new(Mutex::new(SubmitState {
                    next_id: FIRST_CORRELATION_ID,
                    sender,
                })),
            },
            receiver,
            consumer: None,
        }
    }

    pub fn submitter(&self) -> CommandSubmitter {
        self.submitter.clone()
    }

    pub fn submit<C: Command + 'static>(&self, command: C) -> CorrelationId {
        self.submitter.submit(command)
    }

    /// Pops the oldest entry. Tick thread only.
    pub fn try_pop(&mut self) -> Option<QueueEntry> {
        let current = thread::current().id();
        let consumer = *self.consumer.get_or_insert(current);
        debug_assert_eq!(consumer, current, "command queue popped from a second thread");
        match self.receiver.try_recv() {
            Ok(entry) => Some(entry),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Consumes the queue, returning every entry not yet popped. Submissions
    /// racing with the drain either land in the result or are dropped.
    pub fn drain(self) -> Vec<QueueEntry> {
        let Self {
            submitter,
            receiver,
            ..
        } = self;
        let _state = submitter
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let entries = receiver.try_iter().collect();
        drop(receiver);
        entries
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}
