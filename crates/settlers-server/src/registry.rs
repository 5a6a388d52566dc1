//! Tables by id, each with its own queue worker.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use settlers_core::{BoardLayout, Session, SessionOptions, SetupError};
use settlers_protocol::{PlayerId, SessionId};
use thiserror::Error;
use tracing::info;

use crate::config::ServerConfig;
use crate::queue::{Job, QueueError, TableQueue};
use crate::transport::{ConnectionId, Transport};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown session {0}")]
    UnknownSession(SessionId),
    #[error("session {0} already exists")]
    SessionExists(SessionId),
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error("registry state poisoned")]
    Poisoned,
}

pub struct SessionRegistry {
    layout: Arc<BoardLayout>,
    config: ServerConfig,
    transport: Arc<dyn Transport>,
    tables: RwLock<HashMap<SessionId, TableQueue>>,
}

impl SessionRegistry {
    pub fn new(config: ServerConfig, layout: BoardLayout, transport: Arc<dyn Transport>) -> Self {
        Self {
            layout: Arc::new(layout),
            config,
            transport,
            tables: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Open a table and start its worker. Without a seed the table gets a random one.
    pub fn create(
        &self,
        id: SessionId,
        players: &[String],
        seed: Option<u64>,
    ) -> Result<(), RegistryError> {
        let mut tables = self.tables.write().map_err(|_| RegistryError::Poisoned)?;
        if tables.contains_key(&id) {
            return Err(RegistryError::SessionExists(id));
        }
        let options = SessionOptions {
            seed: seed.unwrap_or_else(rand::random),
            ..self.config.session.clone()
        };
        let session = Session::new(id.clone(), Arc::clone(&self.layout), players, options)?;
        let queue = TableQueue::spawn(
            session,
            Arc::clone(&self.transport),
            self.config.observability,
            self.config.event_log_dir.clone(),
        );
        info!(session = %id, players = players.len(), "table opened");
        tables.insert(id, queue);
        Ok(())
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.tables
            .read()
            .map(|tables| tables.contains_key(id))
            .unwrap_or(false)
    }

    pub fn sessions(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self
            .tables
            .read()
            .map(|tables| tables.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    fn push(&self, id: &SessionId, job: Job) -> Result<(), RegistryError> {
        let tables = self.tables.read().map_err(|_| RegistryError::Poisoned)?;
        let queue = tables
            .get(id)
            .ok_or_else(|| RegistryError::UnknownSession(id.clone()))?;
        Ok(queue.push(job)?)
    }

    /// Seat `connection` (or let it watch, with no seat). The worker answers with
    /// `Joined` or `JoinRejected`.
    pub fn join(
        &self,
        id: &SessionId,
        connection: ConnectionId,
        seat: Option<PlayerId>,
    ) -> Result<(), RegistryError> {
        self.push(id, Job::Join { connection, seat })
    }

    pub fn leave(&self, id: &SessionId, connection: ConnectionId) -> Result<(), RegistryError> {
        self.push(id, Job::Leave { connection })
    }

    /// Enqueue a raw client frame; the table worker decodes it.
    pub fn submit(
        &self,
        id: &SessionId,
        raw: Vec<u8>,
        connection: ConnectionId,
    ) -> Result<(), RegistryError> {
        self.push(id, Job::Submit { connection, raw })
    }

    /// Stop every worker, letting each finish its current job.
    pub async fn stop_all(&self) -> Result<(), RegistryError> {
        let tables: Vec<TableQueue> = self
            .tables
            .write()
            .map_err(|_| RegistryError::Poisoned)?
            .drain()
            .map(|(_, queue)| queue)
            .collect();
        for queue in tables {
            queue.stop().await;
        }
        Ok(())
    }
}
