//! Error, event and command result channels for a simulated agent.
//!
//! `ResultChannels` is built once per test harness and cloned into both the
//! agent's frame handlers (producers) and the test bodies (consumers). The
//! three namespaces never share keys, so an `ERROR` for a frame type can not
//! satisfy a wait on an `EVENT` or `COMMAND` of the same name.
//!
//! ```rust,ignore
//! let channels = ResultChannels::new(ChannelConfig::default());
//!
//! let receiver = channels.add_cmd_chan(Command::Start)?;
//! // ... agent handles the START frame, then:
//! channels.send_result_and_del_cmd_chan(Command::Start, FrameResult::ok());
//!
//! let result = channels.get_cmd_chan_result(receiver, Command::Start).await?;
//! ```

use std::time::Duration;

use crate::config::ChannelConfig;
use crate::error::ChannelResult;
use crate::frame::{Command, ErrorType, EventType};
use crate::registry::{Delivery, ResultReceiver, ResultRegistry};
use crate::result::FrameResult;

/// Receiver for an error-namespace slot
pub type ErrorReceiver = ResultReceiver<ErrorType, FrameResult>;
/// Receiver for an event-namespace slot
pub type EventReceiver = ResultReceiver<EventType, FrameResult>;
/// Receiver for a command-namespace slot
pub type CmdReceiver = ResultReceiver<Command, FrameResult>;

/// The three result namespaces of a simulated agent
#[derive(Debug, Clone)]
pub struct ResultChannels {
    config: ChannelConfig,
    errors: ResultRegistry<ErrorType, FrameResult>,
    events: ResultRegistry<EventType, FrameResult>,
    commands: ResultRegistry<Command, FrameResult>,
}

impl Default for ResultChannels {
    fn default() -> Self {
        Self::new(ChannelConfig::default())
    }
}

impl ResultChannels {
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            errors: ResultRegistry::new("error"),
            events: ResultRegistry::new("event"),
            commands: ResultRegistry::new("cmd"),
        }
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn errors(&self) -> &ResultRegistry<ErrorType, FrameResult> {
        &self.errors
    }

    pub fn events(&self) -> &ResultRegistry<EventType, FrameResult> {
        &self.events
    }

    pub fn commands(&self) -> &ResultRegistry<Command, FrameResult> {
        &self.commands
    }

    // Error namespace

    pub fn add_error_chan(&self, error: ErrorType) -> ChannelResult<ErrorReceiver> {
        self.errors.register(error)
    }

    /// Wait for the error result using the configured default timeout
    pub async fn get_error_chan_result(
        &self,
        receiver: ErrorReceiver,
        error: ErrorType,
    ) -> ChannelResult<FrameResult> {
        self.get_error_chan_result_within(receiver, error, self.config.default_timeout())
            .await
    }

    pub async fn get_error_chan_result_within(
        &self,
        receiver: ErrorReceiver,
        error: ErrorType,
        timeout: Duration,
    ) -> ChannelResult<FrameResult> {
        self.errors.await_and_consume(receiver, error, timeout).await
    }

    pub fn send_result_and_del_error_chan(&self, error: ErrorType, result: FrameResult) -> Delivery {
        self.errors.deliver_and_remove(error, result)
    }

    // Event namespace

    pub fn add_event_chan(&self, event: EventType) -> ChannelResult<EventReceiver> {
        self.events.register(event)
    }

    /// Wait for the event result using the configured default timeout
    pub async fn get_event_chan_result(
        &self,
        receiver: EventReceiver,
        event: EventType,
    ) -> ChannelResult<FrameResult> {
        self.get_event_chan_result_within(receiver, event, self.config.default_timeout())
            .await
    }

    pub async fn get_event_chan_result_within(
        &self,
        receiver: EventReceiver,
        event: EventType,
        timeout: Duration,
    ) -> ChannelResult<FrameResult> {
        self.events.await_and_consume(receiver, event, timeout).await
    }

    pub fn send_result_and_del_event_chan(&self, event: EventType, result: FrameResult) -> Delivery {
        self.events.deliver_and_remove(event, result)
    }

    // Command namespace

    pub fn add_cmd_chan(&self, cmd: Command) -> ChannelResult<CmdReceiver> {
        self.commands.register(cmd)
    }

    /// Wait for the command result using the configured default timeout
    pub async fn get_cmd_chan_result(
        &self,
        receiver: CmdReceiver,
        cmd: Command,
    ) -> ChannelResult<FrameResult> {
        self.get_cmd_chan_result_within(receiver, cmd, self.config.default_timeout())
            .await
    }

    pub async fn get_cmd_chan_result_within(
        &self,
        receiver: CmdReceiver,
        cmd: Command,
        timeout: Duration,
    ) -> ChannelResult<FrameResult> {
        self.commands.await_and_consume(receiver, cmd, timeout).await
    }

    pub fn send_result_and_del_cmd_chan(&self, cmd: Command, result: FrameResult) -> Delivery {
        self.commands.deliver_and_remove(cmd, result)
    }

    /// Number of registered slots across all namespaces
    pub fn pending(&self) -> usize {
        self.errors.pending() + self.events.pending() + self.commands.pending()
    }

    /// Close every namespace, waking all waiters with a closed error
    pub fn close_all(&self) -> usize {
        self.errors.close_all() + self.events.close_all() + self.commands.close_all()
    }
}
