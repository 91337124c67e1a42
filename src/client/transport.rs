//! The socket seam between a connection and the network.
//!
//! A [`ServerConnection`](../conn/struct.ServerConnection.html) never blocks: it asks its
//! [`Socket`] for whatever bytes are already buffered and hands it complete lines to write. The
//! only operation allowed to suspend is opening the socket, which a [`Connector`] does through a
//! boxed future that the connection polls once per tick.
use std::io;

use bytes::{Buf, BytesMut};
use futures_util::future::{BoxFuture, FutureExt};
use tokio::net::TcpStream;
use tokio::runtime::{Builder, Handle, Runtime};

/// A future resolving to a freshly opened socket.
pub type ConnectFuture = BoxFuture<'static, io::Result<Box<dyn Socket>>>;

/// A non-blocking, line-agnostic byte pipe to one server.
pub trait Socket: Send {
    /// Appends every byte that can be read right now to `buf` and returns how many were read.
    /// This must never wait for more data to arrive.
    fn read_available(&mut self, buf: &mut BytesMut) -> io::Result<usize>;

    /// Queues `data` for writing and writes as much of it as possible without blocking.
    fn write(&mut self, data: &[u8]) -> io::Result<()>;

    /// Returns false once the socket has been closed by either side.
    fn is_connected(&self) -> bool;

    /// Closes the socket. Queued bytes are flushed on a best-effort basis.
    fn close(&mut self);
}

/// Opens sockets to servers.
pub trait Connector: Send + Sync {
    /// Starts connecting to `hostname:port`.
    fn connect(&self, hostname: &str, port: u16) -> ConnectFuture;
}

/// Connects over plain TCP. Connects are spawned on a tokio runtime, whose reactor also drives
/// the readiness of the resulting sockets, so the connection itself can be polled from any
/// thread.
#[derive(Debug)]
pub struct TcpConnector {
    handle: Handle,
    // Set when the connector had to start its own reactor.
    runtime: Option<Runtime>,
}

impl TcpConnector {
    /// Creates a connector that spawns its connects on the runtime behind `handle`.
    pub fn new(handle: Handle) -> TcpConnector {
        TcpConnector {
            handle,
            runtime: None,
        }
    }

    /// Uses the runtime we are currently running in, or starts a private one when there is none.
    pub fn current() -> io::Result<TcpConnector> {
        match Handle::try_current() {
            Ok(handle) => Ok(TcpConnector::new(handle)),
            Err(_) => TcpConnector::with_runtime(),
        }
    }

    /// Creates a connector that owns a single-worker runtime for its I/O.
    pub fn with_runtime() -> io::Result<TcpConnector> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("sphereirc-io")
            .enable_io()
            .build()?;
        Ok(TcpConnector {
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
        })
    }
}

impl Connector for TcpConnector {
    fn connect(&self, hostname: &str, port: u16) -> ConnectFuture {
        let addr = format!("{}:{}", hostname, port);
        let task = self.handle.spawn(async move { TcpStream::connect(addr).await });
        async move {
            // A runtime that shut down cancels the task instead of running it.
            let stream = task
                .await
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))??;
            let socket = TcpSocket::new(stream)?;
            Ok::<_, io::Error>(Box::new(socket) as Box<dyn Socket>)
        }
        .boxed()
    }
}

impl Drop for TcpConnector {
    fn drop(&mut self) {
        // Dropping a runtime blocks, which is not allowed inside another runtime.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// A non-blocking TCP socket with an outbound queue.
#[derive(Debug)]
pub struct TcpSocket {
    stream: Option<TcpStream>,
    outgoing: BytesMut,
}

impl TcpSocket {
    /// Wraps a connected stream.
    pub fn new(stream: TcpStream) -> io::Result<TcpSocket> {
        stream.set_nodelay(true)?;
        Ok(TcpSocket {
            stream: Some(stream),
            outgoing: BytesMut::new(),
        })
    }

    /// Writes queued bytes until the kernel buffer is full.
    fn flush(&mut self) -> io::Result<()> {
        let stream = match self.stream.as_ref() {
            Some(stream) => stream,
            None => return Err(io::ErrorKind::NotConnected.into()),
        };
        while !self.outgoing.is_empty() {
            match stream.try_write(&self.outgoing) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => self.outgoing.advance(n),
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn fail<T>(&mut self, e: io::Error) -> io::Result<T> {
        self.stream = None;
        self.outgoing.clear();
        Err(e)
    }
}

impl Socket for TcpSocket {
    fn read_available(&mut self, buf: &mut BytesMut) -> io::Result<usize> {
        if let Err(e) = self.flush() {
            return self.fail(e);
        }

        let mut total = 0;
        while let Some(stream) = self.stream.as_ref() {
            buf.reserve(4096);
            match stream.try_read_buf(buf) {
                Ok(0) => {
                    // The server hung up.
                    self.stream = None;
                }
                Ok(n) => total += n,
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return self.fail(e),
            }
        }
        Ok(total)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        if self.stream.is_none() {
            return Err(io::ErrorKind::NotConnected.into());
        }
        self.outgoing.extend_from_slice(data);
        match self.flush() {
            Ok(()) => Ok(()),
            Err(e) => self.fail(e),
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn close(&mut self) {
        let _ = self.flush();
        // Dropping the stream closes it.
        self.stream = None;
        self.outgoing.clear();
    }
}

#[cfg(test)]
mod test {
    use std::thread;
    use std::time::Duration;

    use bytes::BytesMut;
    use futures_util::future::FutureExt;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::time::sleep;

    use super::{Connector, Socket, TcpConnector, TcpSocket};

    async fn pair() -> anyhow::Result<(TcpSocket, TcpStream)> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let client = TcpStream::connect(listener.local_addr()?).await?;
        let (server, _) = listener.accept().await?;
        Ok((TcpSocket::new(client)?, server))
    }

    #[tokio::test]
    async fn reads_without_blocking() -> anyhow::Result<()> {
        let (mut socket, mut server) = pair().await?;
        let mut buf = BytesMut::new();
        assert_eq!(socket.read_available(&mut buf)?, 0);
        assert!(socket.is_connected());

        server.write_all(b"PING :x\r\n").await?;
        sleep(Duration::from_millis(50)).await;
        assert_eq!(socket.read_available(&mut buf)?, 9);
        assert_eq!(&buf[..], b"PING :x\r\n");

        socket.write(b"PONG :x\r\n")?;
        let mut reply = [0u8; 9];
        server.read_exact(&mut reply).await?;
        assert_eq!(&reply, b"PONG :x\r\n");
        Ok(())
    }

    #[tokio::test]
    async fn notices_hang_up() -> anyhow::Result<()> {
        let (mut socket, server) = pair().await?;
        drop(server);
        sleep(Duration::from_millis(50)).await;
        socket.read_available(&mut BytesMut::new())?;
        assert!(!socket.is_connected());
        assert!(socket.write(b"QUIT\r\n").is_err());
        Ok(())
    }

    #[test]
    fn owned_runtime_connects_without_a_current_runtime() -> anyhow::Result<()> {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let connector = TcpConnector::current()?;
        let mut future = connector.connect("127.0.0.1", port);

        let mut result = None;
        for _ in 0..400 {
            result = (&mut future).now_or_never();
            if result.is_some() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        let socket = result.ok_or_else(|| anyhow::anyhow!("connect never finished"))??;
        assert!(socket.is_connected());
        Ok(())
    }
}
