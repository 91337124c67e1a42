//! In-memory sockets for testing hosts and handlers without a network.
use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use bytes::BytesMut;
use futures_util::future::{self, FutureExt};
use parking_lot::Mutex;

use crate::client::transport::{ConnectFuture, Connector, Socket};

#[derive(Debug, Default)]
struct MockState {
    received: Vec<u8>,
    written: Vec<u8>,
    connected: bool,
    closed: bool,
}

/// A fake socket backed by buffers. Clones share the same buffers, so a test can keep one handle
/// while the connection owns another.
#[derive(Clone, Debug)]
pub struct MockSocket {
    state: Arc<Mutex<MockState>>,
}

impl MockSocket {
    /// Creates a new connected mock socket with nothing to read.
    pub fn new() -> MockSocket {
        MockSocket {
            state: Arc::new(Mutex::new(MockState {
                connected: true,
                ..MockState::default()
            })),
        }
    }

    /// Queues bytes for the connection to read on its next poll.
    pub fn feed(&self, data: &[u8]) {
        self.state.lock().received.extend_from_slice(data);
    }

    /// Queues a line, adding the `\r\n` terminator.
    pub fn feed_line(&self, line: &str) {
        let mut state = self.state.lock();
        state.received.extend_from_slice(line.as_bytes());
        state.received.extend_from_slice(b"\r\n");
    }

    /// Gets a copy of everything that has been written.
    pub fn written(&self) -> Vec<u8> {
        self.state.lock().written.clone()
    }

    /// Gets everything written so far, split into lines without terminators.
    pub fn written_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.state.lock().written)
            .split("\r\n")
            .filter(|line| !line.is_empty())
            .map(|line| line.to_owned())
            .collect()
    }

    /// Removes and returns everything written so far, split into lines.
    pub fn take_written_lines(&self) -> Vec<String> {
        let lines = self.written_lines();
        self.state.lock().written.clear();
        lines
    }

    /// Simulates the server closing the connection. Bytes already fed can still be read.
    pub fn hang_up(&self) {
        self.state.lock().connected = false;
    }

    /// Returns true once the connection has closed this socket itself.
    pub fn was_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl Default for MockSocket {
    fn default() -> MockSocket {
        MockSocket::new()
    }
}

impl Socket for MockSocket {
    fn read_available(&mut self, buf: &mut BytesMut) -> io::Result<usize> {
        let mut state = self.state.lock();
        let n = state.received.len();
        buf.extend_from_slice(&state.received);
        state.received.clear();
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        let mut state = self.state.lock();
        if !state.connected {
            return Err(io::ErrorKind::NotConnected.into());
        }
        state.written.extend_from_slice(data);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    fn close(&mut self) {
        let mut state = self.state.lock();
        state.connected = false;
        state.closed = true;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Accept,
    Refuse,
    Stall,
}

#[derive(Debug, Default)]
struct ConnectorState {
    modes: HashMap<String, Mode>,
    sockets: HashMap<String, MockSocket>,
    attempts: HashMap<String, usize>,
}

/// A connector handing out [`MockSocket`]s. By default every connection succeeds immediately.
#[derive(Clone, Debug, Default)]
pub struct MockConnector {
    state: Arc<Mutex<ConnectorState>>,
}

impl MockConnector {
    /// Creates a connector that accepts every connection.
    pub fn new() -> MockConnector {
        MockConnector::default()
    }

    /// Makes connections to `hostname` fail with `ConnectionRefused`.
    pub fn refuse(&self, hostname: &str) {
        self.state.lock().modes.insert(hostname.to_owned(), Mode::Refuse);
    }

    /// Makes connections to `hostname` never complete.
    pub fn stall(&self, hostname: &str) {
        self.state.lock().modes.insert(hostname.to_owned(), Mode::Stall);
    }

    /// Makes connections to `hostname` succeed again.
    pub fn accept(&self, hostname: &str) {
        self.state.lock().modes.insert(hostname.to_owned(), Mode::Accept);
    }

    /// Gets the socket most recently handed out for `hostname`.
    pub fn socket(&self, hostname: &str) -> Option<MockSocket> {
        self.state.lock().sockets.get(hostname).cloned()
    }

    /// Gets the number of connection attempts made to `hostname`.
    pub fn attempts(&self, hostname: &str) -> usize {
        self.state.lock().attempts.get(hostname).cloned().unwrap_or(0)
    }
}

impl Connector for MockConnector {
    fn connect(&self, hostname: &str, port: u16) -> ConnectFuture {
        let mut state = self.state.lock();
        *state.attempts.entry(hostname.to_owned()).or_insert(0) += 1;
        match state.modes.get(hostname).cloned().unwrap_or(Mode::Accept) {
            Mode::Accept => {
                let socket = MockSocket::new();
                state.sockets.insert(hostname.to_owned(), socket.clone());
                future::ready(Ok(Box::new(socket) as Box<dyn Socket>)).boxed()
            }
            Mode::Refuse => {
                let err = io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    format!("{}:{} refused the connection", hostname, port),
                );
                future::ready(Err(err)).boxed()
            }
            Mode::Stall => future::pending().boxed(),
        }
    }
}
