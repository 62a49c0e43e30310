//! A single TCP control connection to the viewer.
//!
//! The protocol is fire-and-forget: packets are written in call order and
//! nothing is ever read back. Each `send` awaits until the whole packet has
//! been handed to the OS; there is no background writer, queue, retry or
//! reconnect. After an I/O error the session should be closed and discarded.

use std::time::Duration;

use futures::SinkExt;
use tokio::net::TcpStream;
use tokio_util::codec::FramedWrite;
use tracing::{info, trace, warn};

use crate::codec::IpcCodec;
use crate::error::TevError;
use crate::network::info::ConnectionInfo;
use crate::packet::IpcPacket;
use crate::state::SessionPhase;

/// Counters for traffic sent through a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub packets_sent: u64,
    pub bytes_sent: u64,
}

/// Owns the connection to one viewer.
///
/// ```no_run
/// # async fn demo() -> Result<(), tev_ipc_core::TevError> {
/// use tev_ipc_core::{ConnectionInfo, Session};
///
/// Session::scoped(ConnectionInfo::default(), async |tev| {
///     tev.open_image("/data/render.exr", "", true).await
/// })
/// .await
/// # }
/// ```
#[derive(Debug)]
pub struct Session {
    info: ConnectionInfo,
    phase: SessionPhase,
    sink: Option<FramedWrite<TcpStream, IpcCodec>>,
    stats: SessionStats,
}

impl Session {
    /// A closed session targeting `info`. Nothing is connected until [`open`](Self::open).
    pub fn new(info: ConnectionInfo) -> Self {
        Self {
            info,
            phase: SessionPhase::Closed,
            sink: None,
            stats: SessionStats::default(),
        }
    }

    /// Create and open a session in one step.
    pub async fn connect(info: ConnectionInfo) -> Result<Self, TevError> {
        let mut session = Self::new(info);
        session.open().await?;
        Ok(session)
    }

    /// Open a session, run `body`, and close the session again on every
    /// exit path. If the session is dropped during `body` (panic or
    /// cancellation) the socket is still released by `Drop`.
    ///
    /// An error from `body` takes precedence over an error from closing.
    pub async fn scoped<T, F>(info: ConnectionInfo, body: F) -> Result<T, TevError>
    where
        F: AsyncFnOnce(&mut Session) -> Result<T, TevError>,
    {
        let mut session = Self::connect(info).await?;
        let result = body(&mut session).await;
        let closed = if session.is_open() {
            session.close().await
        } else {
            Ok(())
        };
        match (result, closed) {
            (Err(e), _) | (Ok(_), Err(e)) => Err(e),
            (Ok(value), Ok(())) => Ok(value),
        }
    }

    /// Establish the TCP connection.
    ///
    /// Fails with [`TevError::AlreadyOpen`] if a connection is already held.
    /// Dropping the returned future before it completes leaves the session
    /// closed and ready to be opened again.
    pub async fn open(&mut self) -> Result<(), TevError> {
        let pending = PendingConnect::begin(&mut self.phase)?;
        let stream = dial(&self.info).await?;
        pending.complete()?;

        self.sink = Some(FramedWrite::new(stream, IpcCodec::new()));
        info!("connected to tev at {}", self.info);
        Ok(())
    }

    /// Flush and shut down the connection.
    ///
    /// Fails with [`TevError::NotOpen`] if there is nothing to close. The
    /// connection is released even if the final flush fails.
    pub async fn close(&mut self) -> Result<(), TevError> {
        self.phase.close()?;
        let sink = self.sink.take();
        info!(
            packets = self.stats.packets_sent,
            bytes = self.stats.bytes_sent,
            "closing connection to {}",
            self.info
        );
        match sink {
            Some(mut sink) => sink.close().await,
            None => Ok(()),
        }
    }

    /// Write one packet and wait until the transport has accepted it.
    pub async fn send(&mut self, packet: IpcPacket) -> Result<(), TevError> {
        self.phase.ensure_open()?;
        let sink = self.sink.as_mut().ok_or(TevError::NotOpen)?;

        let kind = packet.packet_type();
        let len = packet.len();
        sink.send(packet).await?;

        self.stats.packets_sent += 1;
        self.stats.bytes_sent += len as u64;
        trace!(%kind, len, "packet sent");
        Ok(())
    }

    pub fn info(&self) -> &ConnectionInfo {
        &self.info
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase.is_open()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// How long the current connection has been open.
    pub fn uptime(&self) -> Option<Duration> {
        self.phase.open_duration()
    }

    pub(crate) fn ensure_open(&self) -> Result<(), TevError> {
        self.phase.ensure_open()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.sink.is_some() {
            warn!("session to {} dropped while open; releasing connection", self.info);
        }
    }
}

async fn dial(info: &ConnectionInfo) -> std::io::Result<TcpStream> {
    let stream = TcpStream::connect((info.host(), info.port())).await?;
    stream.set_nodelay(true)?;
    Ok(stream)
}

/// Holds a session in `Connecting` while the dial is in flight and puts it
/// back to `Closed` unless [`complete`](Self::complete) is reached.
struct PendingConnect<'a> {
    phase: &'a mut SessionPhase,
    done: bool,
}

impl<'a> PendingConnect<'a> {
    fn begin(phase: &'a mut SessionPhase) -> Result<Self, TevError> {
        phase.begin_connect()?;
        Ok(Self { phase, done: false })
    }

    fn complete(mut self) -> Result<(), TevError> {
        self.phase.complete_connect()?;
        self.done = true;
        Ok(())
    }
}

impl Drop for PendingConnect<'_> {
    fn drop(&mut self) {
        if !self.done {
            let _ = self.phase.abort_connect();
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
