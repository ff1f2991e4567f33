//! The client session: one connection, one worker task.
//!
//! [`Session`] is the handle the presentation layer holds. `connect` dials
//! the server, writes the registration lines and spawns a worker that owns
//! the socket and the [`SessionState`]. Every later request (joining,
//! parting, submitted input, disconnecting) is queued to that worker, so all
//! state changes happen in one place. The worker reports back through a
//! bounded channel of [`SessionEvent`]s and publishes state snapshots the
//! handle can read at any time.
//!
//! # Example
//!
//! ```no_run
//! use slirc_client::{ClientConfig, Session, SessionEvent};
//!
//! # async fn run() -> Result<(), slirc_client::ClientError> {
//! let (mut session, mut events) = Session::new(ClientConfig::new("slirc-bot"));
//! session.connect().await?;
//! session.join("rust").await?;
//! session.submit("hello from slirc").await?;
//!
//! while let Some(event) = events.recv().await {
//!     if let SessionEvent::Disconnected { .. } = event {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::io;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, trace, warn};

use crate::command::UserCommand;
use crate::config::ClientConfig;
use crate::encode::{self, OutgoingCommand};
use crate::error::{ClientError, Result};
use crate::event::{dispatch, ClientEvent, Dispatch};
use crate::line::{LineCodec, RawLine};
use crate::message::ParsedMessage;
use crate::state::{ConnectionState, SessionState};

const REQUEST_BUFFER: usize = 64;

/// How long `disconnect` waits for the worker before aborting it.
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Why a connection ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The user asked to disconnect.
    Requested,
    /// The server closed the connection.
    ConnectionClosed,
    /// A read or write failed, or the server went silent past the read
    /// timeout.
    Transport(String),
}

/// Everything the session reports to the presentation layer.
#[derive(Clone, Debug)]
pub enum SessionEvent {
    /// Registration has been sent; the session accepts requests.
    Connected {
        server: String,
        port: u16,
        nickname: String,
    },
    /// An event from the server.
    Irc(ClientEvent),
    /// The current channel changed.
    ChannelChanged { channel: Option<String> },
    /// A message we sent, for local echo.
    MessageSent { target: String, text: String },
    /// A request failed; the session is unchanged.
    Error(ClientError),
    /// The connection is gone. Always the last event of a connection.
    Disconnected { reason: DisconnectReason },
}

struct Worker {
    requests: mpsc::Sender<UserCommand>,
    shutdown: watch::Sender<bool>,
    published: Arc<watch::Sender<SessionState>>,
    task: JoinHandle<()>,
}

/// Handle to a client session.
pub struct Session {
    config: ClientConfig,
    events: mpsc::Sender<SessionEvent>,
    snapshot: watch::Receiver<SessionState>,
    worker: Option<Worker>,
}

impl Session {
    /// Create a disconnected session and the receiver for its events.
    pub fn new(config: ClientConfig) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (events, events_rx) = mpsc::channel(config.event_buffer.max(1));
        let initial = SessionState::new(config.server.clone(), config.port, config.nickname.clone());
        let (_, snapshot) = watch::channel(initial);
        let session = Self {
            config,
            events,
            snapshot,
            worker: None,
        };
        (session, events_rx)
    }

    /// The configuration this session connects with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// A copy of the latest published session state.
    pub fn snapshot(&self) -> SessionState {
        self.snapshot.borrow().clone()
    }

    /// The current connection state.
    pub fn state(&self) -> ConnectionState {
        self.snapshot.borrow().connection()
    }

    /// Whether requests are accepted right now.
    pub fn is_connected(&self) -> bool {
        self.snapshot.borrow().is_connected()
    }

    /// Our nickname as last confirmed by the server.
    pub fn nickname(&self) -> String {
        self.snapshot.borrow().nickname().to_owned()
    }

    /// The channel plain text goes to, if one is joined.
    pub fn current_channel(&self) -> Option<String> {
        self.snapshot.borrow().current_channel().map(str::to_owned)
    }

    /// Connect and register.
    ///
    /// On success the registration lines have been written, the session is
    /// [`ConnectionState::Connected`] and [`SessionEvent::Connected`] has
    /// been emitted. On failure the session stays disconnected and the
    /// error is both returned and emitted.
    pub async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return self.fail(ClientError::AlreadyConnected).await;
        }
        if let Err(e) = self.config.validate() {
            return self.fail(ClientError::InvalidConfig(e.to_string())).await;
        }
        self.reap().await;

        let config = &self.config;
        let mut state = SessionState::new(config.server.clone(), config.port, config.nickname.clone());
        state.begin_connect();
        let (published, snapshot) = watch::channel(state.clone());
        let published = Arc::new(published);
        self.snapshot = snapshot;

        let addr = config.address();
        info!(%addr, nickname = %config.nickname, "connecting");

        let stream = match TcpStream::connect(addr.as_str()).await {
            Ok(stream) => stream,
            Err(source) => {
                state.mark_disconnected();
                published.send_replace(state);
                return self.fail(ClientError::Connection { addr, source }).await;
            }
        };

        if config.keepalive {
            if let Err(e) = enable_keepalive(&stream) {
                warn!("failed to enable TCP keepalive: {}", e);
            }
        }

        let (read_half, write_half) = stream.into_split();
        let mut writer = FramedWrite::new(write_half, LineCodec::new());
        for cmd in encode::registration(&config.nickname) {
            trace!(line = %cmd, ">>");
            if let Err(e) = writer.send(cmd).await {
                state.mark_disconnected();
                published.send_replace(state);
                return self.fail(ClientError::Transport(e)).await;
            }
        }

        state.mark_connected();
        published.send_replace(state.clone());
        info!(%addr, "connected");

        let (requests, requests_rx) = mpsc::channel(REQUEST_BUFFER);
        let (shutdown, shutdown_rx) = watch::channel(false);
        let connection = Connection {
            reader: FramedRead::new(read_half, LineCodec::with_max_len(config.max_line_len)),
            writer,
            state,
            published: Arc::clone(&published),
            events: self.events.clone(),
            requests: requests_rx,
            shutdown: shutdown_rx,
            quit_message: config.quit_message.clone(),
            read_timeout: config.read_timeout(),
        };

        self.emit(SessionEvent::Connected {
            server: config.server.clone(),
            port: config.port,
            nickname: config.nickname.clone(),
        })
        .await;

        let task = tokio::spawn(connection.run());
        self.worker = Some(Worker {
            requests,
            shutdown,
            published,
            task,
        });
        Ok(())
    }

    /// Send QUIT (best effort), close the connection and wait for the worker
    /// to finish. Does nothing when already disconnected.
    ///
    /// The worker is signalled directly, so this completes even when the
    /// event receiver is not being drained. A worker that has not stopped
    /// within two seconds is aborted and the socket dropped.
    pub async fn disconnect(&mut self) {
        let Some(mut worker) = self.worker.take() else {
            return;
        };
        worker.shutdown.send_replace(true);

        match tokio::time::timeout(DISCONNECT_TIMEOUT, &mut worker.task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "session worker failed"),
            Err(_) => {
                warn!("session worker did not stop in time, aborting");
                worker.task.abort();

                let mut state = worker.published.borrow().clone();
                if state.is_connected() {
                    state.mark_disconnected();
                    worker.published.send_replace(state);
                    let event = SessionEvent::Disconnected {
                        reason: DisconnectReason::Requested,
                    };
                    if self.events.try_send(event).is_err() {
                        debug!("event queue full, Disconnected not delivered");
                    }
                }
            }
        }
    }

    /// Join `channel`, adding `#` when missing. It becomes the current
    /// channel.
    pub async fn join(&self, channel: &str) -> Result<()> {
        let channel = channel.trim();
        if channel.is_empty() {
            return self.fail(ClientError::EmptyChannel).await;
        }
        self.request(UserCommand::Join(channel.to_owned())).await
    }

    /// Leave the current channel, if any.
    pub async fn part(&self) -> Result<()> {
        self.request(UserCommand::Part).await
    }

    /// Submit a line of user input: plain text for the current channel or a
    /// slash-command (see [`UserCommand`]).
    ///
    /// Blank input is ignored. `Err` means the input was not queued. The
    /// channel for plain text is checked by the worker, after any join still
    /// queued ahead of it: with no current channel, a
    /// [`ClientError::NoChannel`] event is emitted, nothing is sent, and this
    /// call has already returned `Ok`.
    pub async fn submit(&self, input: &str) -> Result<()> {
        match UserCommand::parse(input) {
            Some(command) => self.request(command).await,
            None => Ok(()),
        }
    }

    async fn request(&self, command: UserCommand) -> Result<()> {
        let connected = self.snapshot.borrow().require_connected();
        if let Err(err) = connected {
            return self.fail(err).await;
        }
        let queued = match &self.worker {
            Some(worker) => worker.requests.send(command).await.is_ok(),
            None => false,
        };
        if queued {
            Ok(())
        } else {
            self.fail(ClientError::NotConnected).await
        }
    }

    /// Drop a worker whose connection has already ended.
    async fn reap(&mut self) {
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.task.await {
                warn!(error = %e, "session worker failed");
            }
        }
    }

    async fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event).await;
    }

    async fn fail(&self, err: ClientError) -> Result<()> {
        if err.is_fatal() {
            warn!(error = %err, "request failed");
        } else {
            debug!(error = %err, "request failed");
        }
        self.emit(SessionEvent::Error(err.clone())).await;
        Err(err)
    }
}

fn enable_keepalive(stream: &TcpStream) -> io::Result<()> {
    use socket2::{SockRef, TcpKeepalive};

    let sock = SockRef::from(stream);
    let keepalive = TcpKeepalive::new()
        .with_time(Duration::from_secs(120))
        .with_interval(Duration::from_secs(30));

    sock.set_tcp_keepalive(&keepalive)
}

/// The worker side of a session. Owns the socket and the state.
struct Connection {
    reader: FramedRead<OwnedReadHalf, LineCodec>,
    writer: FramedWrite<OwnedWriteHalf, LineCodec>,
    state: SessionState,
    published: Arc<watch::Sender<SessionState>>,
    events: mpsc::Sender<SessionEvent>,
    requests: mpsc::Receiver<UserCommand>,
    shutdown: watch::Receiver<bool>,
    quit_message: String,
    read_timeout: Option<Duration>,
}

impl Connection {
    async fn run(mut self) {
        let reason = match self.serve().await {
            Ok(reason) => reason,
            Err(e) => {
                warn!(error = %e, "connection lost");
                DisconnectReason::Transport(e.to_string())
            }
        };

        self.state.mark_disconnected();
        self.publish();
        info!(?reason, "disconnected");
        self.emit(SessionEvent::Disconnected { reason }).await;
    }

    async fn serve(&mut self) -> Result<DisconnectReason> {
        loop {
            tokio::select! {
                biased;
                // Also fires when the handle is dropped.
                _ = stop_requested(&mut self.shutdown) => return Ok(self.quit(None).await),
                request = self.requests.recv() => {
                    let Some(command) = request else {
                        return Ok(self.quit(None).await);
                    };
                    if let Some(reason) = self.execute(command).await? {
                        return Ok(reason);
                    }
                }
                frame = next_frame(&mut self.reader, self.read_timeout) => match frame? {
                    Some(line) => self.handle_line(line).await?,
                    None => return Ok(DisconnectReason::ConnectionClosed),
                },
            }
        }
    }

    async fn handle_line(&mut self, line: RawLine) -> Result<()> {
        if line.is_blank() {
            return Ok(());
        }
        trace!(line = %line, "<<");

        let msg = ParsedMessage::parse(line.as_str());
        match dispatch(&msg, &mut self.state) {
            Dispatch::Reply(cmd) => self.send(cmd).await?,
            Dispatch::Event(event) => {
                if matches!(event, ClientEvent::NickChanged { .. }) {
                    self.publish();
                }
                self.emit(SessionEvent::Irc(event)).await;
            }
        }
        Ok(())
    }

    /// Carry out one request. Returns a reason when the connection should
    /// end.
    async fn execute(&mut self, command: UserCommand) -> Result<Option<DisconnectReason>> {
        match command {
            UserCommand::Say(text) => match self.state.require_channel().map(str::to_owned) {
                Ok(target) => {
                    self.send(encode::privmsg(&target, &text)).await?;
                    self.emit(SessionEvent::MessageSent { target, text }).await;
                }
                Err(err) => {
                    debug!(error = %err, "plain text not sent");
                    self.emit(SessionEvent::Error(err)).await;
                }
            },
            UserCommand::Join(channel) => {
                let channel = encode::normalize_channel(&channel);
                self.send(encode::join(&channel)).await?;
                self.state.set_channel(channel.clone());
                self.publish();
                self.emit(SessionEvent::ChannelChanged {
                    channel: Some(channel),
                })
                .await;
            }
            UserCommand::Part => match self.state.clear_channel() {
                Some(channel) => {
                    self.send(encode::part(&channel)).await?;
                    self.publish();
                    self.emit(SessionEvent::ChannelChanged { channel: None }).await;
                }
                None => debug!("part requested with no current channel"),
            },
            UserCommand::Msg { target, text } => {
                self.send(encode::privmsg(&target, &text)).await?;
                self.emit(SessionEvent::MessageSent { target, text }).await;
            }
            UserCommand::Nick(nick) => self.send(encode::nick(&nick)).await?,
            UserCommand::Raw(text) => self.send(encode::raw(&text)).await?,
            UserCommand::Quit(reason) => return Ok(Some(self.quit(reason).await)),
        }
        Ok(None)
    }

    /// Send QUIT (best effort) and close our side of the socket.
    async fn quit(&mut self, reason: Option<String>) -> DisconnectReason {
        let reason = reason.unwrap_or_else(|| self.quit_message.clone());
        if let Err(e) = self.send(encode::quit(&reason)).await {
            debug!(error = %e, "QUIT not delivered");
        }
        if let Err(e) = self.writer.close().await {
            debug!(error = %e, "error closing connection");
        }
        DisconnectReason::Requested
    }

    async fn send(&mut self, cmd: OutgoingCommand) -> Result<()> {
        if cmd.is_empty() {
            debug!("dropping empty command");
            return Ok(());
        }
        trace!(command = cmd.name(), line = %cmd, ">>");
        self.writer.send(cmd).await?;
        Ok(())
    }

    fn publish(&self) {
        self.published.send_replace(self.state.clone());
    }

    /// Deliver an event, waiting for queue space unless a stop has been
    /// requested. After that, an event that does not fit is dropped.
    async fn emit(&mut self, event: SessionEvent) {
        tokio::select! {
            biased;
            _ = stop_requested(&mut self.shutdown) => {
                if let Err(e) = self.events.try_send(event) {
                    debug!(error = %e, "event dropped while stopping");
                }
            }
            permit = self.events.reserve() => {
                if let Ok(permit) = permit {
                    permit.send(event);
                }
            }
        }
    }
}

/// Resolve once the handle asks the worker to stop, or is dropped.
async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// Read the next line, applying the optional read timeout.
async fn next_frame(
    reader: &mut FramedRead<OwnedReadHalf, LineCodec>,
    timeout: Option<Duration>,
) -> Result<Option<RawLine>> {
    let frame = match timeout {
        Some(limit) => tokio::time::timeout(limit, reader.next())
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "read timed out"))?,
        None => reader.next().await,
    };
    Ok(frame.transpose()?)
}
