//! A line-oriented client connection over TCP or TLS.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::error::ProtocolError;
use crate::line::LineCodec;

use super::error::{Disposition, TransportError};
use super::{tls, ConnectionConfig, ConnectionEvent, READ_BUFFER_SIZE};

trait AsyncStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> AsyncStream for T {}

type BoxedStream = Box<dyn AsyncStream>;
type LineReader = FramedRead<ReadHalf<BoxedStream>, LineCodec>;
type SharedWriter = Arc<AsyncMutex<Option<FramedWrite<WriteHalf<BoxedStream>, LineCodec>>>>;

/// State shared by everything belonging to one connection attempt.
struct Attempt {
    id: u64,
    closed: AtomicBool,
    cancel: CancellationToken,
    events: mpsc::UnboundedSender<ConnectionEvent>,
}

impl Attempt {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stop the read loop and emit `Closed`, at most once per attempt.
    fn teardown(&self) {
        self.cancel.cancel();
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(attempt = self.id, "connection closed");
            let _ = self.events.send(ConnectionEvent::Closed);
        }
    }
}

struct Live {
    attempt: Arc<Attempt>,
    writer: SharedWriter,
}

/// A client connection that frames the byte stream into protocol lines.
///
/// Received lines and the closed notification are delivered through the
/// receiver returned by [`Connection::new`]. Sends from any number of tasks
/// are serialized, so lines never interleave on the wire.
///
/// ```no_run
/// # async fn demo() -> Result<(), slirc_engine::transport::TransportError> {
/// use std::time::Duration;
/// use slirc_engine::transport::{Connection, ConnectionConfig, ConnectionEvent};
///
/// let (conn, mut events) = Connection::new(ConnectionConfig::new("irc.libera.chat", 6697).with_tls(true));
/// conn.connect(Duration::from_secs(10)).await?;
/// conn.send_line("NICK example").await?;
/// while let Some(ConnectionEvent::Line(line)) = events.recv().await {
///     println!("{line}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct Connection {
    config: ConnectionConfig,
    events: mpsc::UnboundedSender<ConnectionEvent>,
    live: parking_lot::Mutex<Option<Live>>,
    reader: parking_lot::Mutex<Option<JoinHandle<Result<(), TransportError>>>>,
    attempts: AtomicU64,
}

impl Connection {
    /// Create a disconnected connection and the receiver for its events.
    pub fn new(config: ConnectionConfig) -> (Self, mpsc::UnboundedReceiver<ConnectionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let conn = Self {
            config,
            events,
            live: parking_lot::Mutex::new(None),
            reader: parking_lot::Mutex::new(None),
            attempts: AtomicU64::new(0),
        };
        (conn, rx)
    }

    /// The endpoint this connection was built for.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Whether the current attempt is connected and not yet torn down.
    pub fn is_connected(&self) -> bool {
        self.live
            .lock()
            .as_ref()
            .is_some_and(|live| !live.attempt.is_closed())
    }

    /// Attempt a single connection, racing it against `timeout`.
    ///
    /// On success the read loop is started. On failure the connection is
    /// left disconnected and no [`ConnectionEvent::Closed`] is emitted. A
    /// previous live attempt is closed first; when two calls race, the one
    /// that finishes last wins and the other attempt is torn down.
    pub async fn connect(&self, timeout: Duration) -> Result<(), TransportError> {
        self.close().await;

        let read_codec = LineCodec::with_max_len(&self.config.encoding, self.config.max_line_len)?;
        let write_codec = read_codec.clone();

        let stream = match tokio::time::timeout(timeout, self.open()).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                warn!(host = %self.config.host, port = self.config.port, "connect failed: {}", e);
                return Err(e);
            }
            Err(_) => {
                warn!(host = %self.config.host, port = self.config.port, "connect timed out");
                return Err(TransportError::Timeout(timeout));
            }
        };

        let (read_half, write_half) = tokio::io::split(stream);
        let attempt = Arc::new(Attempt {
            id: self.attempts.fetch_add(1, Ordering::Relaxed) + 1,
            closed: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            events: self.events.clone(),
        });
        let writer: SharedWriter = Arc::new(AsyncMutex::new(Some(FramedWrite::new(
            write_half,
            write_codec,
        ))));
        let reader = FramedRead::with_capacity(read_half, read_codec, READ_BUFFER_SIZE);

        let handle = tokio::spawn(read_loop(reader, attempt.clone(), writer.clone()));

        info!(
            host = %self.config.host,
            port = self.config.port,
            tls = self.config.use_tls,
            attempt = attempt.id,
            "connected"
        );
        // A concurrent connect may have installed its own attempt meanwhile.
        let superseded = self.live.lock().replace(Live { attempt, writer });
        if let Some(old) = superseded {
            old.attempt.teardown();
        }
        *self.reader.lock() = Some(handle);
        Ok(())
    }

    async fn open(&self) -> Result<BoxedStream, TransportError> {
        let tcp = TcpStream::connect((self.config.host.as_str(), self.config.port)).await?;
        if let Err(e) = enable_keepalive(&tcp) {
            warn!("failed to enable TCP keepalive: {}", e);
        }

        if !self.config.use_tls {
            return Ok(Box::new(tcp));
        }

        let tls = tls::handshake(tcp, &self.config.host, self.config.accept_invalid_certs).await?;
        Ok(Box::new(tls))
    }

    /// Send one protocol line; the terminator is appended here.
    ///
    /// A transport fault during the write tears the connection down and is
    /// not returned. Lines containing `\r` or `\n` are rejected.
    pub async fn send_line(&self, line: &str) -> Result<(), TransportError> {
        if line.contains(['\r', '\n']) {
            return Err(ProtocolError::EmbeddedTerminator.into());
        }

        let (attempt, writer) = match self.live.lock().as_ref() {
            Some(live) if !live.attempt.is_closed() => (live.attempt.clone(), live.writer.clone()),
            _ => return Err(TransportError::NotConnected),
        };

        let mut guard = writer.lock().await;
        let framed = guard.as_mut().ok_or(TransportError::NotConnected)?;

        trace!(attempt = attempt.id, "-> {}", line);
        match framed.send(line.to_owned()).await {
            Ok(()) => Ok(()),
            Err(e) => {
                let err = TransportError::from(e);
                match err.disposition() {
                    Disposition::Fatal => Err(err),
                    Disposition::Fault => {
                        debug!(attempt = attempt.id, "write failed: {}", err);
                        guard.take();
                        attempt.teardown();
                        Ok(())
                    }
                    Disposition::Silent => Ok(()),
                }
            }
        }
    }

    /// Close the connection. Idempotent.
    ///
    /// Emits [`ConnectionEvent::Closed`] if the current attempt has not
    /// already reported it; the read loop then stops without a second one.
    pub async fn close(&self) {
        let live = self.live.lock().take();
        let Some(live) = live else {
            return;
        };

        live.attempt.teardown();
        let framed = live.writer.lock().await.take();
        if let Some(mut framed) = framed {
            if let Err(e) = framed.get_mut().shutdown().await {
                trace!("shutdown after close: {}", e);
            }
        }
    }

    /// Wait for the read loop of the latest attempt to finish.
    ///
    /// Returns the error that stopped it if that error was not a transport
    /// fault; faults and local closes yield `Ok(())`.
    pub async fn wait(&self) -> Result<(), TransportError> {
        let handle = self.reader.lock().take();
        match handle {
            Some(handle) => match handle.await {
                Ok(result) => result,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(_) => Ok(()),
            },
            None => Ok(()),
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(live) = self.live.get_mut().take() {
            live.attempt.cancel.cancel();
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .finish()
    }
}

async fn read_loop(
    mut reader: LineReader,
    attempt: Arc<Attempt>,
    writer: SharedWriter,
) -> Result<(), TransportError> {
    loop {
        let next = tokio::select! {
            biased;
            _ = attempt.cancel.cancelled() => return Ok(()),
            next = reader.next() => next,
        };

        let err = match next {
            Some(Ok(line)) => {
                trace!(attempt = attempt.id, "<- {}", line);
                // A dropped receiver only means nobody is listening.
                let _ = attempt.events.send(ConnectionEvent::Line(line));
                continue;
            }
            Some(Err(e)) => TransportError::from(e),
            None => TransportError::Io(std::io::ErrorKind::UnexpectedEof.into()),
        };

        if attempt.is_closed() {
            return Ok(());
        }

        match err.disposition() {
            Disposition::Silent => return Ok(()),
            Disposition::Fault => {
                debug!(attempt = attempt.id, "read failed: {}", err);
                attempt.teardown();
                writer.lock().await.take();
                return Ok(());
            }
            Disposition::Fatal => {
                warn!(attempt = attempt.id, "read loop stopped: {}", err);
                attempt.teardown();
                writer.lock().await.take();
                return Err(err);
            }
        }
    }
}

fn enable_keepalive(stream: &TcpStream) -> anyhow::Result<()> {
    use socket2::{SockRef, TcpKeepalive};

    let sock = SockRef::from(stream);
    let keepalive = TcpKeepalive::new()
        .with_time(Duration::from_secs(120))
        .with_interval(Duration::from_secs(30));

    sock.set_tcp_keepalive(&keepalive)?;
    Ok(())
}
