//! Script-worker side of the command pipeline.
//!
//! A [`TurtleClient`] submits commands and suspends on the turtle's event
//! stream until the response carrying its correlation id shows up. It
//! never touches turtle or world state directly.

use std::collections::VecDeque;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{trace, warn};

use super::command::Command;
use super::events::{BroadcastEventBus, CommandResponse, TurtleEvent};
use super::queue::CommandSubmitter;
use super::types::{CorrelationId, TurtleId};

/// Unclaimed events kept for [`TurtleClient::next_event`].
const BACKLOG_LIMIT: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("event stream of turtle {turtle_id} closed")]
    EventStreamClosed { turtle_id: TurtleId },
    #[error("no response for command {correlation_id} of turtle {turtle_id} within {timeout_ms}ms")]
    Timeout {
        turtle_id: TurtleId,
        correlation_id: CorrelationId,
        timeout_ms: u64,
    },
    /// The receiver fell behind and the oldest events were overwritten. A
    /// response among them is lost; waiting again resumes with the oldest
    /// event still buffered.
    #[error("event stream of turtle {turtle_id} lagged; {skipped} events skipped")]
    Lagged { turtle_id: TurtleId, skipped: u64 },
}

pub struct TurtleClient {
    submitter: CommandSubmitter,
    events: broadcast::Receiver<TurtleEvent>,
    backlog: VecDeque<TurtleEvent>,
}

impl TurtleClient {
    /// `events` must be subscribed before the first submission, or the
    /// response may be missed.
    pub fn new(submitter: CommandSubmitter, events: broadcast::Receiver<TurtleEvent>) -> Self {
        Self {
            submitter,
            events,
            backlog: VecDeque::new(),
        }
    }

    pub fn connect(bus: &BroadcastEventBus, submitter: CommandSubmitter) -> Self {
        let events = bus.subscribe(submitter.turtle_id());
        Self::new(submitter, events)
    }

    pub fn turtle_id(&self) -> &TurtleId {
        self.submitter.turtle_id()
    }

    pub fn submitter(&self) -> &CommandSubmitter {
        &self.submitter
    }

    /// Submits `command` and waits for its response.
    pub async fn call<C: Command + 'static>(
        &mut self,
        command: C,
    ) -> Result<CommandResponse, ClientError> {
        let correlation_id = self.submitter.submit(command);
        self.wait_for(correlation_id).await
    }

    /// Like [`call`](Self::call), giving up after `timeout`. The command is
    /// not cancelled; its late response lands in the backlog.
    pub async fn call_with_timeout<C: Command + 'static>(
        &mut self,
        command: C,
        timeout: Duration,
    ) -> Result<CommandResponse, ClientError> {
        let correlation_id = self.submitter.submit(command);
        match tokio::time::timeout(timeout, self.wait_for(correlation_id)).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout {
                turtle_id: self.turtle_id().clone(),
                correlation_id,
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }

    /// Waits for the response to `correlation_id`, keeping every other
    /// event for later readers. Fails with [`ClientError::Lagged`] when
    /// events were skipped, since the response may have been among them.
    pub async fn wait_for(
        &mut self,
        correlation_id: CorrelationId,
    ) -> Result<CommandResponse, ClientError> {
        if let Some(response) = self.take_from_backlog(correlation_id) {
            return Ok(response);
        }
        loop {
            let event = self.recv().await?;
            if let Some(response) = CommandResponse::from_event(&event) {
                if response.correlation_id == correlation_id {
                    return Ok(response);
                }
            }
            self.keep(event);
        }
    }

    /// Next event not claimed by a call, oldest first.
    pub async fn next_event(&mut self) -> Result<TurtleEvent, ClientError> {
        if let Some(event) = self.backlog.pop_front() {
            return Ok(event);
        }
        self.recv().await
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    async fn recv(&mut self) -> Result<TurtleEvent, ClientError> {
        match self.events.recv().await {
            Ok(event) => Ok(event),
            Err(RecvError::Lagged(skipped)) => {
                warn!(turtle_id = %self.turtle_id(), skipped, "event stream lagged");
                Err(ClientError::Lagged {
                    turtle_id: self.turtle_id().clone(),
                    skipped,
                })
            }
            Err(RecvError::Closed) => Err(ClientError::EventStreamClosed {
                turtle_id: self.turtle_id().clone(),
            }),
        }
    }

    fn take_from_backlog(&mut self, correlation_id: CorrelationId) -> Option<CommandResponse> {
        let index = self.backlog.iter().position(|event| {
            CommandResponse::from_event(event)
                .is_some_and(|response| response.correlation_id == correlation_id)
        })?;
        let event = self.backlog.remove(index)?;
        CommandResponse::from_event(&event)
    }

    fn keep(&mut self, event: TurtleEvent) {
        if self.backlog.len() >= BACKLOG_LIMIT {
            if let Some(dropped) = self.backlog.pop_front() {
                trace!(turtle_id = %self.turtle_id(), event = %dropped.name, "backlog full; oldest event dropped");
            }
        }
        self.backlog.push_back(event);
    }
}
