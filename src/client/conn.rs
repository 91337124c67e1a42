//! A single server connection: registration, keep-alives, channel tracking and dispatch.
use std::fmt;
use std::task::{Context, Poll};

use bytes::BytesMut;
use chrono::prelude::*;
use futures_util::future::FutureExt;
use futures_util::task::noop_waker_ref;
use log::{debug, info, trace, warn};
use tokio_util::codec::{Decoder, Encoder};

use crate::client::data::{Config, Scrollback, ServerConfig};
use crate::client::handler::{Event, EventHandler, HandlerRegistry};
use crate::client::transport::{ConnectFuture, Connector, Socket};
use crate::error::{ConfigError, Error, Result};
use crate::proto::{validate_channel, ChannelExt, Ctcp, IrcEvent, LineCodec, ParsedMessage};

// Bytes kept without a line terminator before the fragment is discarded.
const MAX_FRAGMENT: usize = 8 * 1024;

/// Where a connection is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket is open and no connection attempt is in progress.
    Disconnected,
    /// A connection attempt is in progress.
    Connecting,
    /// The socket is open and the registration lines have been sent.
    Registering,
    /// The server welcomed us and the start channels have been joined.
    Joined,
}

/// One IRC server connection with its resolved identity, socket and handlers.
pub struct ServerConnection {
    hostname: String,
    port: u16,
    nickname: String,
    username: String,
    password: String,
    real_name: String,
    quit_message: String,
    part_message: String,
    version: String,
    start_channels: Vec<String>,
    joined_channels: Vec<String>,
    state: ConnectionState,
    socket: Option<Box<dyn Socket>>,
    pending: Option<ConnectFuture>,
    codec: LineCodec,
    incoming: BytesMut,
    handlers: HandlerRegistry,
    scrollback: Scrollback,
    sessions: usize,
}

impl ServerConnection {
    /// Resolves the settings of the server entry at `index`, falling back to the client-wide
    /// values for every override that is absent or empty.
    pub fn new(config: &Config, server: &ServerConfig, index: usize) -> Result<ServerConnection> {
        let hostname = server
            .hostname()
            .ok_or_else(|| config.invalid(ConfigError::HostnameNotSpecified { index }))?;

        Ok(ServerConnection {
            hostname: hostname.to_owned(),
            port: server.port(),
            nickname: server.nickname(config)?.to_owned(),
            username: server.username(config)?.to_owned(),
            password: server.password(config)?.to_owned(),
            real_name: server.real_name(config).to_owned(),
            quit_message: server.quit_message(config).to_owned(),
            part_message: server.part_message(config).to_owned(),
            version: config.version(),
            start_channels: server
                .channels
                .iter()
                .filter_map(|c| validate_channel(c))
                .collect(),
            joined_channels: Vec::new(),
            state: ConnectionState::Disconnected,
            socket: None,
            pending: None,
            codec: LineCodec::new(config.encoding())?,
            incoming: BytesMut::new(),
            handlers: HandlerRegistry::new(),
            scrollback: Scrollback::new(config.scrollback()),
            sessions: 0,
        })
    }

    /// Gets the server's hostname.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Gets the server's port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Gets the nickname used on this server.
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// Gets the username used on this server.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Gets the real name used on this server.
    pub fn real_name(&self) -> &str {
        &self.real_name
    }

    /// Gets the message sent with `QUIT`.
    pub fn quit_message(&self) -> &str {
        &self.quit_message
    }

    /// Gets the message sent with `PART`.
    pub fn part_message(&self) -> &str {
        &self.part_message
    }

    /// Gets the CTCP VERSION banner.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Gets the normalized channels joined after registration.
    pub fn start_channels(&self) -> &[String] {
        &self.start_channels
    }

    /// Gets the channels the server has confirmed we are in, in the order they were joined.
    pub fn joined_channels(&self) -> &[String] {
        &self.joined_channels
    }

    /// Gets the lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns true if a socket is open.
    pub fn is_connected(&self) -> bool {
        self.socket.as_ref().map_or(false, |s| s.is_connected())
    }

    /// Gets the number of times a socket to this server has been opened.
    pub fn sessions(&self) -> usize {
        self.sessions
    }

    /// Gets the lines this connection has displayed.
    pub fn scrollback(&self) -> &Scrollback {
        &self.scrollback
    }

    /// Gets the handlers registered on this connection.
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Registers a handler. It sees every matching event dispatched after this call.
    pub fn add_handler(&mut self, handler: EventHandler) {
        self.handlers.push(handler);
    }

    /// Starts connecting through `connector`. Does nothing unless the connection is
    /// disconnected.
    pub fn connect(&mut self, connector: &dyn Connector) {
        if self.state != ConnectionState::Disconnected {
            debug!("{}: connect ignored while {:?}", self.hostname, self.state);
            return;
        }
        let text = format!("Attempting connection to {}:{}", self.hostname, self.port);
        self.log(None, text);
        self.pending = Some(connector.connect(&self.hostname, self.port));
        self.state = ConnectionState::Connecting;
    }

    /// Runs one tick: drives a pending connect, then reads and handles every complete line that
    /// is already available. Never blocks.
    pub fn poll(&mut self) {
        self.poll_connect();
        self.poll_socket();
    }

    fn poll_connect(&mut self) {
        let result = match self.pending.as_mut() {
            Some(future) => {
                let mut cx = Context::from_waker(noop_waker_ref());
                match future.poll_unpin(&mut cx) {
                    Poll::Ready(result) => result,
                    Poll::Pending => return,
                }
            }
            None => return,
        };
        self.pending = None;

        match result {
            Ok(socket) => {
                self.log(None, "Connected successfully.".to_owned());
                self.socket = Some(socket);
                self.sessions += 1;
                self.incoming.clear();
                self.codec.reset();
                self.state = ConnectionState::Registering;
                self.register();
            }
            Err(e) => {
                warn!(
                    "{}: failed to connect to {}:{}: {}",
                    self.hostname, self.hostname, self.port, e
                );
                let text = format!("Connection failed: {}", e);
                self.log(None, text);
                self.state = ConnectionState::Disconnected;
            }
        }
    }

    fn register(&mut self) {
        let lines = vec![
            format!("PASS {}", self.password),
            format!("NICK {}", self.nickname),
            format!("USER {} 8 * :{}", self.username, self.real_name),
        ];
        for line in lines {
            if self.send_raw(line).is_err() {
                return;
            }
        }
    }

    fn poll_socket(&mut self) {
        let read = match self.socket.as_mut() {
            Some(socket) => socket.read_available(&mut self.incoming),
            None => return,
        };
        if let Err(e) = read {
            warn!("{}: read failed: {}", self.hostname, e);
            self.drop_connection();
            return;
        }

        loop {
            match self.codec.decode(&mut self.incoming) {
                Ok(Some(line)) => self.handle_line(&line),
                Ok(None) => break,
                Err(e) => debug!("{}: undecodable line: {}", self.hostname, e),
            }
            // A handler may have disconnected us.
            if self.socket.is_none() {
                return;
            }
        }

        if self.incoming.len() > MAX_FRAGMENT {
            debug!(
                "{}: discarding {} bytes without a line terminator",
                self.hostname,
                self.incoming.len()
            );
            self.incoming.clear();
            self.codec.reset();
        }

        if !self.is_connected() {
            self.log(None, "Connection closed by server.".to_owned());
            self.drop_connection();
        }
    }

    /// Handles one line received from the server. Lines are ignored while no socket is open.
    pub fn handle_line(&mut self, line: &str) {
        if self.socket.is_none() || line.is_empty() {
            return;
        }
        trace!("[RECV] {}", line);

        if ParsedMessage::is_ping(line) {
            let _ = self.send_raw(ParsedMessage::pong_for(line));
            return;
        }

        match ParsedMessage::parse(line) {
            Ok(msg) => self.handle_message(line, &msg),
            Err(e) => debug!("{}: ignoring malformed line {:?}: {}", self.hostname, line, e),
        }
    }

    fn handle_message(&mut self, line: &str, msg: &ParsedMessage) {
        let (channel, payload) = match msg.event {
            ref event if event.is_registration_boundary() => {
                self.finish_registration();
                (None, msg.text())
            }
            ref event if event.is_inert() => (None, msg.text()),
            IrcEvent::Topic => {
                let channel = msg.param(1).unwrap_or("");
                let text = format!("Topic for {}: {}", channel, msg.text());
                self.log(None, text);
                (msg.param(1), msg.text())
            }
            IrcEvent::TopicWhoTime => {
                let channel = msg.param(1).unwrap_or("");
                let setter = msg.param(2).unwrap_or("");
                let time = msg.param(3).unwrap_or("");
                let text = format!(
                    "Topic for {} set by {} on {}",
                    channel,
                    setter,
                    format_timestamp(time)
                );
                self.log(None, text);
                (msg.param(1), setter)
            }
            IrcEvent::NamReply => {
                let channel = msg.param(2).unwrap_or("");
                let names: Vec<&str> = msg.text().split(' ').filter(|n| !n.is_empty()).collect();
                let text = format!(
                    "Users in {}[{}]: {}",
                    self.hostname,
                    channel,
                    names.join(", ")
                );
                self.log(None, text);
                (msg.param(2), msg.text())
            }
            IrcEvent::Motd => {
                self.log(None, msg.text().to_owned());
                (None, msg.text())
            }
            IrcEvent::Join => {
                let channel = msg
                    .trailing
                    .as_deref()
                    .or_else(|| msg.param(0))
                    .unwrap_or("");
                self.handle_join(msg.source_nickname(), channel);
                (Some(channel), channel)
            }
            IrcEvent::Kick => {
                let channel = msg.param(0).unwrap_or("");
                let kicked = msg.param(1).unwrap_or("");
                self.handle_kick(channel, kicked);
                (msg.param(0), kicked)
            }
            IrcEvent::Mode => {
                let setter = msg.prefix.as_ref().map_or("", |p| p.name());
                let target = msg.param(0).unwrap_or("");
                let mode = msg.param(1).unwrap_or("");
                let text = format!("{} sets mode {} on {}", setter, mode, target);
                self.log(None, text);
                (msg.param(0), mode)
            }
            IrcEvent::Notice | IrcEvent::Privmsg => match self.handle_chat(msg) {
                Some(channel) => (channel, msg.text()),
                None => return,
            },
            IrcEvent::Part => {
                let channel = msg.param(0).unwrap_or("");
                let who = msg.source_nickname().unwrap_or("");
                let text = format!("{} left {}", who, channel);
                self.log(Some(channel), text);
                (msg.param(0), msg.text())
            }
            _ => {
                self.log(None, line.to_owned());
                (None, line)
            }
        };

        let event = Event {
            kind: &msg.event,
            sender: msg.source_nickname(),
            channel,
            payload,
            message: msg,
        };
        self.dispatch(&event);
    }

    fn finish_registration(&mut self) {
        if self.state != ConnectionState::Registering {
            return;
        }
        if !self.start_channels.is_empty() {
            let line = format!("JOIN {}", self.start_channels.join(","));
            if self.send_raw(line).is_err() {
                return;
            }
        }
        self.state = ConnectionState::Joined;
    }

    fn handle_join(&mut self, sender: Option<&str>, channels: &str) {
        if sender != Some(&self.nickname[..]) {
            let text = format!("{} joined {}", sender.unwrap_or("someone"), channels);
            self.log(Some(channels), text);
            return;
        }
        for channel in channels.split(',').filter(|c| !c.is_empty()) {
            if !self.joined_channels.iter().any(|c| c == channel) {
                self.joined_channels.push(channel.to_owned());
            }
            self.log(Some(channel), format!("Joined {}", channel));
        }
    }

    fn handle_kick(&mut self, channel: &str, kicked: &str) {
        self.log(Some(channel), format!("{} was kicked from the channel.", kicked));
        if kicked == self.nickname {
            if let Some(i) = self.joined_channels.iter().position(|c| c == channel) {
                self.joined_channels.remove(i);
            }
        }
    }

    /// Handles PRIVMSG and NOTICE. Returns the event channel, or `None` if the message must not
    /// be dispatched.
    fn handle_chat<'m>(&mut self, msg: &'m ParsedMessage) -> Option<Option<&'m str>> {
        // Server notices without a nick!user source are dropped here.
        let sender = msg.source_nickname()?;
        if sender == self.nickname {
            return None;
        }
        let target = msg.param(0).unwrap_or("");
        let body = msg.text();

        if target.is_channel_name() {
            let text = match Ctcp::parse(body) {
                Some(Ctcp::Action(action)) => format!("{}{}", sender, action),
                _ => format!("{}: {}", sender, body),
            };
            self.log(Some(target), text);
            return Some(Some(target));
        }

        #[cfg(feature = "ctcp")]
        {
            if msg.event == IrcEvent::Privmsg && Ctcp::parse(body) == Some(Ctcp::Version) {
                self.answer_version(sender);
                return None;
            }
        }

        self.log(Some(sender), body.to_owned());
        Some(None)
    }

    #[cfg(feature = "ctcp")]
    fn answer_version(&mut self, sender: &str) {
        self.log(None, format!("Received a CTCP VERSION from {}", sender));
        let reply = Ctcp::quote(&format!("VERSION {}", self.version));
        let _ = self.send_privmsg(sender, &reply);
    }

    fn dispatch(&mut self, event: &Event) {
        for handler in self.handlers.matching(event.kind) {
            handler.call(self, event);
        }
    }

    /// Writes one raw line, adding the terminator. Anything after an embedded line break is
    /// discarded.
    pub fn send_raw<S: Into<String>>(&mut self, line: S) -> Result<()> {
        let line = line.into();
        if self.socket.is_none() {
            return Err(Error::NotConnected {
                hostname: self.hostname.clone(),
            });
        }

        let mut buf = BytesMut::new();
        trace!("[SENT] {}", LineCodec::sanitize(line.clone()));
        self.codec.encode(line, &mut buf)?;

        let written = match self.socket.as_mut() {
            Some(socket) => socket.write(&buf),
            None => Ok(()),
        };
        if let Err(e) = written {
            warn!("{}: write failed: {}", self.hostname, e);
            self.drop_connection();
            return Err(e.into());
        }
        Ok(())
    }

    /// Sends `PRIVMSG <target> :<text>`.
    pub fn send_privmsg(&mut self, target: &str, text: &str) -> Result<()> {
        self.send_raw(format!("PRIVMSG {} :{}", target, text))
    }

    /// Sends `PART <channel> :<part message>`. Membership only changes when the server reports
    /// it.
    pub fn part(&mut self, channel: &str) -> Result<()> {
        let line = format!("PART {} :{}", channel, self.part_message);
        self.send_raw(line)
    }

    /// Sends `QUIT` and closes the socket. Abandons a pending connection attempt. Calling this
    /// on a disconnected connection does nothing.
    pub fn disconnect(&mut self) {
        if self.pending.is_some() {
            self.log(None, "Connection attempt abandoned.".to_owned());
        }
        if self.is_connected() {
            let text = format!("Disconnecting from {}:{}", self.hostname, self.port);
            self.log(None, text);
            let quit = format!("QUIT :{}", self.quit_message);
            let _ = self.send_raw(quit);
        }
        self.drop_connection();
    }

    fn drop_connection(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            socket.close();
        }
        self.pending = None;
        self.state = ConnectionState::Disconnected;
        self.joined_channels.clear();
        self.incoming.clear();
        self.codec.reset();
    }

    fn log(&mut self, channel: Option<&str>, text: String) {
        match channel {
            Some(channel) => info!("{}[{}]: {}", self.hostname, channel, text),
            None => info!("{}: {}", self.hostname, text),
        }
        self.scrollback.push(channel, text);
    }
}

impl fmt::Debug for ServerConnection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ServerConnection")
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("nickname", &self.nickname)
            .field("state", &self.state)
            .field("start_channels", &self.start_channels)
            .field("joined_channels", &self.joined_channels)
            .field("handlers", &self.handlers)
            .finish()
    }
}

/// Renders a unix timestamp in local time, or returns it untouched if it is not one.
fn format_timestamp(raw: &str) -> String {
    raw.parse::<i64>()
        .ok()
        .and_then(|secs| Local.timestamp_opt(secs, 0).single())
        .map(|time| time.to_rfc2822())
        .unwrap_or_else(|| raw.to_owned())
}
