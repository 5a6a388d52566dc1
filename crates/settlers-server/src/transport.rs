//! Outbound delivery to connections, and the length-prefixed framing used on TCP.
//!
//! Every frame is a big-endian `u32` payload length followed by one MessagePack message.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

/// Largest accepted frame payload.
pub const MAX_FRAME_LEN: usize = 1 << 20;

/// Server-assigned id of one client connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Transport error types
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection {0} is not open")]
    UnknownConnection(ConnectionId),

    #[error("connection {0} closed")]
    Closed(ConnectionId),

    #[error("frame of {0} bytes exceeds the limit")]
    FrameTooLarge(usize),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport state poisoned")]
    Poisoned,
}

/// "Deliver this encoded payload to this connection."
pub trait Transport: Send + Sync {
    fn deliver(&self, connection: ConnectionId, payload: Vec<u8>) -> Result<(), TransportError>;
}

/// One unbounded outbound queue per connection; a writer task drains each queue.
#[derive(Clone, Default)]
pub struct ChannelTransport {
    outboxes: Arc<RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<Vec<u8>>>>>,
}

impl ChannelTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an outbox for `connection`, replacing any previous one.
    pub fn connect(
        &self,
        connection: ConnectionId,
    ) -> Result<mpsc::UnboundedReceiver<Vec<u8>>, TransportError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.outboxes
            .write()
            .map_err(|_| TransportError::Poisoned)?
            .insert(connection, tx);
        Ok(rx)
    }

    pub fn disconnect(&self, connection: ConnectionId) -> Result<(), TransportError> {
        self.outboxes
            .write()
            .map_err(|_| TransportError::Poisoned)?
            .remove(&connection);
        Ok(())
    }

    pub fn is_connected(&self, connection: ConnectionId) -> bool {
        self.outboxes
            .read()
            .map(|outboxes| outboxes.contains_key(&connection))
            .unwrap_or(false)
    }
}

impl Transport for ChannelTransport {
    fn deliver(&self, connection: ConnectionId, payload: Vec<u8>) -> Result<(), TransportError> {
        let outboxes = self.outboxes.read().map_err(|_| TransportError::Poisoned)?;
        let tx = outboxes
            .get(&connection)
            .ok_or(TransportError::UnknownConnection(connection))?;
        tx.send(payload)
            .map_err(|_| TransportError::Closed(connection))
    }
}

/// Read one frame. `Ok(None)` on a clean end of stream before a new frame.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>, TransportError>
where
    R: AsyncRead + Unpin,
{
    let mut len = [0u8; 4];
    match reader.read_exact(&mut len).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(len) as usize;
    if len > MAX_FRAME_LEN {
        return Err(TransportError::FrameTooLarge(len));
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(Some(payload))
}

pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    if payload.len() > MAX_FRAME_LEN {
        return Err(TransportError::FrameTooLarge(payload.len()));
    }
    writer
        .write_all(&(payload.len() as u32).to_be_bytes())
        .await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}
