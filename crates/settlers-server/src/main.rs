//! Settlers table server
//!
//! Accepts TCP connections speaking length-prefixed MessagePack frames. The first frame of a
//! connection must be a `Join`; every later frame goes to that table's queue untouched.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use settlers_protocol::SessionId;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use settlers_server::{
    protocol::{deserialize_client_message, serialize_server_message, ClientMessage},
    transport::{read_frame, write_frame},
    ChannelTransport, ConnectionId, JoinRejectReason, ServerConfig, ServerMessage,
    SessionRegistry, Transport,
};

async fn serve_connection(
    stream: TcpStream,
    connection: ConnectionId,
    registry: Arc<SessionRegistry>,
    transport: ChannelTransport,
) {
    let (read_half, mut write_half) = stream.into_split();
    let mut outbox = match transport.connect(connection) {
        Ok(rx) => rx,
        Err(e) => {
            warn!(%connection, "cannot open outbox: {e}");
            return;
        }
    };
    let writer = tokio::spawn(async move {
        while let Some(payload) = outbox.recv().await {
            if let Err(e) = write_frame(&mut write_half, &payload).await {
                debug!(%connection, "write failed: {e}");
                break;
            }
        }
        let _ = write_half.shutdown().await;
    });

    let mut reader = BufReader::new(read_half);
    let mut table: Option<SessionId> = None;
    loop {
        let frame = match read_frame(&mut reader).await {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                warn!(%connection, "read failed: {e}");
                break;
            }
        };
        let result = match &table {
            Some(id) => registry.submit(id, frame, connection),
            None => match deserialize_client_message(&frame) {
                Ok(ClientMessage::Join { session, seat }) if registry.contains(&session) => {
                    let joined = registry.join(&session, connection, seat);
                    table = Some(session);
                    joined
                }
                Ok(ClientMessage::Join { session, .. }) => {
                    info!(%connection, %session, "join for unknown session");
                    refuse(&transport, connection);
                    Ok(())
                }
                Ok(_) => {
                    warn!(%connection, "first frame was not a join");
                    Ok(())
                }
                Err(e) => {
                    warn!(%connection, "undecodable frame: {e}");
                    Ok(())
                }
            },
        };
        if let Err(e) = result {
            warn!(%connection, "cannot enqueue frame: {e}");
        }
    }

    if let Some(id) = &table {
        if let Err(e) = registry.leave(id, connection) {
            debug!(%connection, "leave not delivered: {e}");
        }
    }
    if let Err(e) = transport.disconnect(connection) {
        warn!(%connection, "disconnect failed: {e}");
    }
    let _ = writer.await;
    info!(%connection, "connection closed");
}

fn refuse(transport: &ChannelTransport, connection: ConnectionId) {
    let message = ServerMessage::JoinRejected {
        reason: JoinRejectReason::UnknownSession,
    };
    match serialize_server_message(&message) {
        Ok(payload) => {
            if let Err(e) = transport.deliver(connection, payload) {
                warn!(%connection, "delivery failed: {e}");
            }
        }
        Err(e) => warn!(%connection, "failed to encode message: {e}"),
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("settlers_server=info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match ServerConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load config {path}: {e}");
                std::process::exit(1);
            }
        },
        None => ServerConfig::default(),
    };
    let layout = match config.board() {
        Ok(layout) => layout,
        Err(e) => {
            error!("Failed to load board: {e}");
            std::process::exit(1);
        }
    };

    let transport = ChannelTransport::new();
    let registry = Arc::new(SessionRegistry::new(
        config.clone(),
        layout,
        Arc::new(transport.clone()),
    ));
    for table in &config.tables {
        if let Err(e) = registry.create(table.id.clone(), &table.players, table.seed) {
            error!("Failed to open table {}: {e}", table.id);
            std::process::exit(1);
        }
    }

    let listener = match TcpListener::bind(config.bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {e}", config.bind_address);
            std::process::exit(1);
        }
    };

    info!("Settlers Server v{}", env!("CARGO_PKG_VERSION"));
    info!("Listening on {}", config.bind_address);
    info!("Observability: {:?}", config.observability);

    let next_connection = AtomicU64::new(1);
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let connection = ConnectionId(next_connection.fetch_add(1, Ordering::Relaxed));
                    info!(%connection, %addr, "client connected");
                    tokio::spawn(serve_connection(
                        stream,
                        connection,
                        Arc::clone(&registry),
                        transport.clone(),
                    ));
                }
                Err(e) => warn!("accept failed: {e}"),
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    if let Err(e) = registry.stop_all().await {
        error!("Failed to stop tables: {e}");
    }
}
