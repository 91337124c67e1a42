//! A tick-driven IRC client holding one connection per configured server.
//!
//! A [`Client`] is built from a [`Config`](data/struct.Config.html) and owns a
//! [`ServerConnection`](conn/struct.ServerConnection.html) for every server entry, in the order
//! they were configured. Nothing happens in the background: the host calls [`Client::poll`] once
//! per tick (or lets [`Client::run`] do it) and every connection reads what is available,
//! answers keep-alives, tracks its channels and hands events to the registered handlers.
//!
//! # Examples
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use sphereirc::client::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> sphereirc::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! let mut client = Client::from_config(&config)?;
//! client.add_event_handler("*", IrcEvent::Privmsg, |conn, event| {
//!     if let Some(channel) = event.channel {
//!         if event.payload.contains(conn.nickname()) {
//!             let _ = conn.send_privmsg(channel, "beep boop");
//!         }
//!     }
//! }, false)?;
//! client.connect();
//! client.run(Duration::from_millis(50)).await;
//! # Ok(())
//! # }
//! ```
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::client::conn::{ConnectionState, ServerConnection};
use crate::client::data::Config;
use crate::client::handler::{Event, EventFilter, EventHandler};
use crate::client::transport::{Connector, TcpConnector};
use crate::error::{Error, Result};

pub mod conn;
pub mod data;
pub mod handler;
pub mod mock;
pub mod prelude;
pub mod transport;

/// The handler scope that registers on every server.
pub const ALL_SERVERS: &str = "*";

/// A set of server connections sharing one configuration.
pub struct Client {
    connector: Arc<dyn Connector>,
    servers: Vec<ServerConnection>,
}

impl Client {
    /// Creates a client that connects over plain TCP. The configuration is only read.
    ///
    /// Connects run on the current tokio runtime if there is one. Otherwise the client starts a
    /// private runtime, so it can also be polled from a plain synchronous loop.
    pub fn from_config(config: &Config) -> Result<Client> {
        Client::with_connector(config, Arc::new(TcpConnector::current()?))
    }

    /// Creates a client that opens its sockets through `connector`.
    pub fn with_connector(config: &Config, connector: Arc<dyn Connector>) -> Result<Client> {
        config.validate()?;
        let servers = config
            .servers
            .iter()
            .enumerate()
            .map(|(index, server)| ServerConnection::new(config, server, index))
            .collect::<Result<Vec<_>>>()?;
        Ok(Client { connector, servers })
    }

    /// Starts connecting every server, in configuration order.
    pub fn connect(&mut self) {
        for server in &mut self.servers {
            server.connect(&*self.connector);
        }
    }

    /// Disconnects every server that is connected, in configuration order.
    pub fn disconnect(&mut self) {
        for server in &mut self.servers {
            server.disconnect();
        }
    }

    /// Runs one tick on every connection. Never blocks.
    pub fn poll(&mut self) {
        for server in &mut self.servers {
            server.poll();
        }
    }

    /// Polls every `tick` until all connections have gone down. Returns once every connection is
    /// disconnected and at least one of them has been connected at some point, so a client that
    /// never connects keeps polling forever.
    ///
    /// # Panics
    /// Panics if `tick` is zero.
    pub async fn run(&mut self, tick: Duration) {
        let mut interval = tokio::time::interval(tick);
        loop {
            interval.tick().await;
            self.poll();
            if self.is_finished() {
                return;
            }
        }
    }

    fn is_finished(&self) -> bool {
        self.servers.iter().any(|s| s.sessions() > 0)
            && self
                .servers
                .iter()
                .all(|s| s.state() == ConnectionState::Disconnected)
    }

    /// Sends `PRIVMSG <channel> :<text>` on the named server.
    pub fn send_message(&mut self, hostname: &str, channel: &str, text: &str) -> Result<()> {
        self.server_mut(hostname)?.send_privmsg(channel, text)
    }

    /// Sends a raw line on the named server.
    pub fn send_raw(&mut self, hostname: &str, line: &str) -> Result<()> {
        self.server_mut(hostname)?.send_raw(line)
    }

    /// Gets the first connection whose hostname equals `hostname`.
    pub fn server(&self, hostname: &str) -> Result<&ServerConnection> {
        self.servers
            .iter()
            .find(|s| s.hostname() == hostname)
            .ok_or_else(|| unknown_server(hostname))
    }

    /// Gets the first connection whose hostname equals `hostname`, mutably.
    pub fn server_mut(&mut self, hostname: &str) -> Result<&mut ServerConnection> {
        self.servers
            .iter_mut()
            .find(|s| s.hostname() == hostname)
            .ok_or_else(|| unknown_server(hostname))
    }

    /// Gets every connection in configuration order.
    pub fn servers(&self) -> &[ServerConnection] {
        &self.servers
    }

    /// Registers a handler on the server named by `scope`, or on every server if `scope` is
    /// [`ALL_SERVERS`]. The override flag is recorded but built-in handling always runs.
    pub fn add_event_handler<E, F>(
        &mut self,
        scope: &str,
        filter: E,
        callback: F,
        override_default: bool,
    ) -> Result<()>
    where
        E: Into<EventFilter>,
        F: Fn(&mut ServerConnection, &Event) + Send + Sync + 'static,
    {
        let handler = EventHandler::new(filter.into(), callback, override_default);
        if scope == ALL_SERVERS {
            for server in &mut self.servers {
                server.add_handler(handler.clone());
            }
        } else {
            self.server_mut(scope)?.add_handler(handler);
        }
        Ok(())
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Client")
            .field("servers", &self.servers)
            .finish()
    }
}

fn unknown_server(hostname: &str) -> Error {
    Error::UnknownServer {
        hostname: hostname.to_owned(),
    }
}
