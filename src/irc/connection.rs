//! Chat connector: connection state machine, cooperative read loop, and
//! rate-limited outbound path.
//!
//! The connector does no scheduling of its own. An external driver calls
//! [`Connector::tick`] and [`Connector::step`] once per period; `step` handles
//! at most one inbound line and never waits for data.

use crate::app::action::Action;
use crate::app::event::{ChatMessage, SubscriptionId};
use crate::config::nickname::{anonymous_nickname, is_anonymous, ANONYMOUS_ACCESS_CODE};
use crate::config::{ConnectionConfig, RateLimitConfig};
use crate::irc::manager::Lease;
use crate::irc::parser::parse;
use crate::irc::queue::{OutboundQueue, RateWindow};
use crate::irc::transport::{TcpTransport, Transport};
use std::io;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Lines written by the login sequence; charged to the first rate window.
const HANDSHAKE_LINES: u32 = 4;

#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("a connector is already active")]
    AlreadyActive,
    #[error("no channel configured")]
    NoChannel,
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

/// Phase of the read loop between driver calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadLoop {
    NotStarted,
    Running,
    Finished,
}

/// What a single [`Connector::step`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The read loop is not running.
    Stopped,
    /// Nothing to read yet, or still connecting.
    Idle,
    /// One inbound line was handled.
    Processed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Credentials {
    username: String,
    access_code: String,
    channel: String,
}

impl Credentials {
    /// Lower-case the login and channel, falling back to an anonymous login
    /// when no username is set.
    fn normalize(&mut self) {
        if self.username.trim().is_empty() {
            self.username = anonymous_nickname();
            self.access_code = ANONYMOUS_ACCESS_CODE.to_string();
        }
        self.username = self.username.trim().to_lowercase();
        self.channel = channel_name(&self.channel).to_lowercase();
    }

    fn handshake(&self) -> [String; HANDSHAKE_LINES as usize] {
        let user = &self.username;
        [
            format!("PASS oauth:{}", self.access_code),
            format!("NICK {}", user),
            format!("USER {} 8 *:{}", user, user),
            format!("JOIN #{}", self.channel),
        ]
    }
}

/// Channel name without surrounding whitespace or a leading `#`.
fn channel_name(raw: &str) -> &str {
    raw.trim().trim_start_matches('#')
}

type Subscriber = Box<dyn FnMut(&ChatMessage) -> Vec<Action> + Send>;

/// Connection to a single chat channel.
pub struct Connector {
    state: ConnectionState,
    read_loop: ReadLoop,
    host: String,
    port: u16,
    credentials: Credentials,
    transport: Option<Box<dyn Transport>>,
    queue: OutboundQueue,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
    _lease: Option<Lease>,
}

impl Connector {
    pub fn new(connection: &ConnectionConfig, rate_limit: &RateLimitConfig) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            read_loop: ReadLoop::NotStarted,
            host: connection.host.clone(),
            port: connection.port,
            credentials: Credentials {
                username: connection.username.clone(),
                access_code: connection.access_code.clone(),
                channel: connection.channel.clone(),
            },
            transport: None,
            queue: OutboundQueue::new(RateWindow::new(
                rate_limit.lines_per_interval,
                rate_limit.interval(),
            )),
            subscribers: Vec::new(),
            next_subscription: 0,
            _lease: None,
        }
    }

    pub(crate) fn with_lease(mut self, lease: Lease) -> Self {
        self._lease = Some(lease);
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn read_loop(&self) -> ReadLoop {
        self.read_loop
    }

    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    pub fn channel(&self) -> &str {
        &self.credentials.channel
    }

    pub fn queued_lines(&self) -> usize {
        self.queue.len()
    }

    pub fn rate_window(&self) -> &RateWindow {
        self.queue.window()
    }

    /// Register a callback for received chat lines. Subscribers run
    /// synchronously, in registration order; the actions they return are
    /// applied once they have all run.
    pub fn subscribe<F>(&mut self, subscriber: F) -> SubscriptionId
    where
        F: FnMut(&ChatMessage) -> Vec<Action> + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Remove a subscriber. Returns `false` if the id was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Store new credentials and connect with them. Credentials without a
    /// channel are rejected and the current ones kept.
    pub async fn initialize_with(
        &mut self,
        username: &str,
        access_code: &str,
        channel: &str,
    ) -> Result<(), ConnectorError> {
        if channel_name(channel).is_empty() {
            return Err(ConnectorError::NoChannel);
        }
        self.credentials = Credentials {
            username: username.to_string(),
            access_code: access_code.to_string(),
            channel: channel.to_string(),
        };
        self.initialize().await
    }

    /// Open a TCP connection to the configured endpoint, log in and join the
    /// channel. Any existing connection is closed first.
    pub async fn initialize(&mut self) -> Result<(), ConnectorError> {
        self.begin_connect()?;
        let endpoint = format!("{}:{}", self.host, self.port);
        info!(%endpoint, channel = %self.credentials.channel, "connecting");
        match TcpTransport::connect(&self.host, self.port).await {
            Ok(transport) => self.complete_connect(Box::new(transport)),
            Err(source) => {
                self.state = ConnectionState::Disconnected;
                error!(%endpoint, "connect failed: {}", source);
                Err(ConnectorError::Connect { endpoint, source })
            }
        }
    }

    /// Same as [`Connector::initialize`] over an already-open transport.
    pub fn initialize_with_transport(
        &mut self,
        transport: Box<dyn Transport>,
    ) -> Result<(), ConnectorError> {
        self.begin_connect()?;
        self.complete_connect(transport)
    }

    fn begin_connect(&mut self) -> Result<(), ConnectorError> {
        if channel_name(&self.credentials.channel).is_empty() {
            return Err(ConnectorError::NoChannel);
        }
        self.state = ConnectionState::Connecting;
        self.credentials.normalize();
        if let Some(mut previous) = self.transport.take() {
            debug!("closing previous transport");
            previous.close();
        }
        Ok(())
    }

    fn complete_connect(&mut self, mut transport: Box<dyn Transport>) -> Result<(), ConnectorError> {
        let written = self
            .credentials
            .handshake()
            .iter()
            .try_for_each(|line| transport.write_line(line))
            .and_then(|()| transport.flush());
        if let Err(e) = written {
            transport.close();
            self.state = ConnectionState::Disconnected;
            error!("handshake failed: {}", e);
            return Err(e.into());
        }

        self.queue.restart_window(HANDSHAKE_LINES);
        self.transport = Some(transport);
        if self.read_loop != ReadLoop::Running {
            self.read_loop = ReadLoop::Running;
        }
        self.state = ConnectionState::Connected;
        if is_anonymous(&self.credentials.username) {
            warn!(
                username = %self.credentials.username,
                "anonymous login; the service will not relay chat sent from it"
            );
        }
        info!(
            username = %self.credentials.username,
            channel = %self.credentials.channel,
            "connected"
        );
        Ok(())
    }

    /// Close the connection. Safe to call repeatedly and from any state; the
    /// transport is closed at most once.
    pub fn teardown(&mut self) {
        if self.state != ConnectionState::Disconnected {
            self.state = ConnectionState::Disconnecting;
            info!(channel = %self.credentials.channel, "disconnecting");
        }
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
        self.queue.clear();
        self.state = ConnectionState::Disconnected;
    }

    /// Queue a chat line to the joined channel. Ignored unless connected and
    /// `text` is non-empty.
    pub fn send_chat_message(&mut self, text: &str) {
        if self.state != ConnectionState::Connected || text.is_empty() {
            return;
        }
        // A stray line break would start a second protocol line.
        let clean = text.replace(['\r', '\n'], " ");
        self.queue
            .enqueue(format!("PRIVMSG #{} :{}", self.credentials.channel, clean));
    }

    /// Advance the rate window by `elapsed` and send whatever the window
    /// allows. Returns the number of lines written.
    pub fn tick(&mut self, elapsed: Duration) -> Result<usize, ConnectorError> {
        self.queue.advance(elapsed);
        if self.state != ConnectionState::Connected {
            return Ok(0);
        }
        let Some(transport) = self.transport.as_mut() else {
            return Ok(0);
        };
        match self.queue.drain(&mut **transport) {
            Ok(sent) => Ok(sent),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Run one iteration of the read loop.
    ///
    /// Transport failures end the session: the connector tears itself down
    /// and the error is returned to the caller.
    pub fn step(&mut self) -> Result<StepOutcome, ConnectorError> {
        if self.read_loop != ReadLoop::Running {
            return Ok(StepOutcome::Stopped);
        }
        match self.state {
            ConnectionState::Connecting => return Ok(StepOutcome::Idle),
            ConnectionState::Connected => {}
            ConnectionState::Disconnecting | ConnectionState::Disconnected => {
                self.read_loop = ReadLoop::Finished;
                return Ok(StepOutcome::Stopped);
            }
        }
        let Some(transport) = self.transport.as_mut() else {
            self.read_loop = ReadLoop::Finished;
            return Ok(StepOutcome::Stopped);
        };

        let line = match transport.read_line() {
            Ok(Some(line)) => line,
            Ok(None) => return Ok(StepOutcome::Idle),
            Err(e) => return Err(self.fail(e)),
        };
        self.process_line(&line)?;
        Ok(StepOutcome::Processed)
    }

    fn process_line(&mut self, line: &str) -> Result<(), ConnectorError> {
        let msg = match parse(line) {
            Ok(msg) => msg,
            Err(e) => {
                debug!("dropping line: {}", e);
                return Ok(());
            }
        };

        match msg.command.as_str() {
            "PING" => {
                let reply = match msg.parameters.as_deref() {
                    Some(params) => format!("PONG :{}", params),
                    None => "PONG".to_string(),
                };
                self.send_forced(&reply)
            }
            "PRIVMSG" => {
                if let Some(sender) = msg.source {
                    self.publish(ChatMessage {
                        sender,
                        text: msg.parameters.unwrap_or_default(),
                    });
                }
                Ok(())
            }
            other => {
                debug!(command = other, "ignoring line");
                Ok(())
            }
        }
    }

    fn send_forced(&mut self, line: &str) -> Result<(), ConnectorError> {
        if self.state != ConnectionState::Connected {
            return Ok(());
        }
        let Some(transport) = self.transport.as_mut() else {
            return Ok(());
        };
        match self.queue.send_forced(&mut **transport, line) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(e)),
        }
    }

    fn publish(&mut self, msg: ChatMessage) {
        let mut actions = Vec::new();
        for (_, subscriber) in self.subscribers.iter_mut() {
            actions.extend(subscriber(&msg));
        }
        for action in actions {
            match action {
                Action::SendChat { text } => self.send_chat_message(&text),
            }
        }
    }

    fn fail(&mut self, e: io::Error) -> ConnectorError {
        error!(channel = %self.credentials.channel, "connection lost: {}", e);
        self.teardown();
        ConnectorError::Transport(e)
    }
}

impl Drop for Connector {
    fn drop(&mut self) {
        self.teardown();
    }
}
