//! Per-table command queue and its single consumer.
//!
//! Producers enqueue raw frames from any task; one worker per table decodes and applies them
//! strictly in arrival order, then fans the resulting events out through the [`Transport`].

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use settlers_core::{route_all, Applied, ObservabilityMode, Recipient, Rejection, Session};
use settlers_protocol::{Phase, PlayerId, SessionSnapshot};
use thiserror::Error;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::protocol::{
    deserialize_client_message, serialize_server_message, ClientMessage, JoinRejectReason,
    ServerMessage,
};
use crate::transport::{ConnectionId, Transport};

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("table worker has stopped")]
    Stopped,
}

/// Work for a table worker.
#[derive(Debug)]
pub enum Job {
    Join {
        connection: ConnectionId,
        seat: Option<PlayerId>,
    },
    Leave {
        connection: ConnectionId,
    },
    /// An undecoded client frame.
    Submit {
        connection: ConnectionId,
        raw: Vec<u8>,
    },
}

/// Producer side of one table's queue.
pub struct TableQueue {
    tx: mpsc::UnboundedSender<Job>,
    stop: Arc<AtomicBool>,
    wake: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl TableQueue {
    /// Start the worker for `session`. Must be called inside a tokio runtime.
    pub fn spawn(
        session: Session,
        transport: Arc<dyn Transport>,
        mode: ObservabilityMode,
        log_dir: Option<PathBuf>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let stop = Arc::new(AtomicBool::new(false));
        let wake = Arc::new(Notify::new());
        let worker = Worker {
            session,
            transport,
            mode,
            log_dir,
            members: Vec::new(),
            next_observer: 0,
        };
        let handle = tokio::spawn(worker.run(rx, Arc::clone(&stop), Arc::clone(&wake)));
        Self {
            tx,
            stop,
            wake,
            handle,
        }
    }

    pub fn push(&self, job: Job) -> Result<(), QueueError> {
        self.tx.send(job).map_err(|_| QueueError::Stopped)
    }

    /// Ask the worker to finish after its current job and wait for it.
    pub async fn stop(self) {
        self.stop.store(true, Ordering::Release);
        self.wake.notify_one();
        if let Err(e) = self.handle.await {
            warn!("table worker ended abnormally: {e}");
        }
    }
}

struct Worker {
    session: Session,
    transport: Arc<dyn Transport>,
    mode: ObservabilityMode,
    log_dir: Option<PathBuf>,
    /// Joined connections in join order.
    members: Vec<(ConnectionId, Recipient)>,
    next_observer: u32,
}

impl Worker {
    async fn run(
        mut self,
        mut rx: mpsc::UnboundedReceiver<Job>,
        stop: Arc<AtomicBool>,
        wake: Arc<Notify>,
    ) {
        info!(session = %self.session.id(), "table worker started");
        loop {
            if stop.load(Ordering::Acquire) {
                break;
            }
            tokio::select! {
                biased;
                _ = wake.notified() => continue,
                job = rx.recv() => {
                    let Some(job) = job else { break };
                    self.handle(job);
                }
            }
        }
        self.save_log();
        info!(session = %self.session.id(), "table worker stopped");
    }

    fn handle(&mut self, job: Job) {
        match job {
            Job::Join { connection, seat } => self.join(connection, seat),
            Job::Leave { connection } => {
                self.members.retain(|(c, _)| *c != connection);
                debug!(session = %self.session.id(), %connection, "connection left");
            }
            Job::Submit { connection, raw } => match deserialize_client_message(&raw) {
                Ok(message) => self.submit(connection, message),
                Err(e) => {
                    warn!(session = %self.session.id(), %connection, "undecodable frame: {e}")
                }
            },
        }
    }

    fn member(&self, connection: ConnectionId) -> Option<Recipient> {
        self.members
            .iter()
            .find(|(c, _)| *c == connection)
            .map(|(_, r)| *r)
    }

    fn join(&mut self, connection: ConnectionId, seat: Option<PlayerId>) {
        let refused = if self.member(connection).is_some() {
            Some(JoinRejectReason::AlreadyJoined)
        } else {
            match seat {
                Some(p) if self.session.player(p).is_none() => Some(JoinRejectReason::NoSuchSeat),
                Some(p) if self.members.iter().any(|(_, r)| *r == Recipient::Seat(p)) => {
                    Some(JoinRejectReason::SeatTaken)
                }
                _ => None,
            }
        };
        if let Some(reason) = refused {
            self.send(connection, &ServerMessage::JoinRejected { reason });
            return;
        }

        let recipient = match seat {
            Some(p) => Recipient::Seat(p),
            None => {
                self.next_observer += 1;
                Recipient::Observer(self.next_observer)
            }
        };
        self.members.push((connection, recipient));
        info!(session = %self.session.id(), %connection, ?recipient, "connection joined");
        let snapshot = self.snapshot_for(recipient);
        self.send(
            connection,
            &ServerMessage::Joined {
                session: self.session.id().clone(),
                seat,
                snapshot,
            },
        );
    }

    fn snapshot_for(&self, recipient: Recipient) -> SessionSnapshot {
        match (recipient, self.mode) {
            (_, ObservabilityMode::Full) => self.session.snapshot(),
            (Recipient::Seat(p), _) => self.session.snapshot_for_player(p),
            (Recipient::Observer(_), _) => self.session.snapshot_for_observer(),
        }
    }

    fn submit(&mut self, connection: ConnectionId, message: ClientMessage) {
        let Some(recipient) = self.member(connection) else {
            warn!(session = %self.session.id(), %connection, "frame from a connection that has not joined");
            return;
        };
        let result = match (message, recipient) {
            (ClientMessage::RequestState, _) => {
                let snapshot = self.snapshot_for(recipient);
                self.send(connection, &ServerMessage::State { snapshot });
                return;
            }
            (ClientMessage::Join { .. }, _) => {
                self.send(
                    connection,
                    &ServerMessage::JoinRejected {
                        reason: JoinRejectReason::AlreadyJoined,
                    },
                );
                return;
            }
            (_, Recipient::Observer(_)) => Err(Rejection::NotCurrentPlayer),
            (ClientMessage::Command { command }, Recipient::Seat(p)) => {
                self.session.apply(p, command)
            }
            (
                ClientMessage::Undo {
                    piece,
                    at,
                    moved_from,
                },
                Recipient::Seat(p),
            ) => self.session.undo(p, piece, at, moved_from),
        };

        match result {
            Ok(applied) => self.broadcast(&applied),
            Err(reason) => self.send(connection, &ServerMessage::Rejected { reason }),
        }
    }

    fn broadcast(&mut self, applied: &Applied) {
        let recipients: Vec<Recipient> = self.members.iter().map(|(_, r)| *r).collect();
        for (recipient, event) in route_all(&applied.events, &recipients, self.mode) {
            let targets: Vec<ConnectionId> = self
                .members
                .iter()
                .filter(|(_, r)| *r == recipient)
                .map(|(c, _)| *c)
                .collect();
            let message = ServerMessage::Event { event };
            for connection in targets {
                self.send(connection, &message);
            }
        }
        if self.session.phase() == Phase::GameOver {
            info!(session = %self.session.id(), "game over");
            self.save_log();
        }
    }

    fn send(&self, connection: ConnectionId, message: &ServerMessage) {
        let payload = match serialize_server_message(message) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(session = %self.session.id(), %connection, "failed to encode message: {e}");
                return;
            }
        };
        if let Err(e) = self.transport.deliver(connection, payload) {
            warn!(session = %self.session.id(), %connection, "delivery failed: {e}");
        }
    }

    fn save_log(&self) {
        let Some(dir) = &self.log_dir else { return };
        let path = dir.join(format!("{}.log", self.session.id()));
        match self.session.event_log().save(&path) {
            Ok(()) => info!(session = %self.session.id(), path = %path.display(), "event log saved"),
            Err(e) => warn!(session = %self.session.id(), path = %path.display(), "failed to save event log: {e}"),
        }
    }
}
