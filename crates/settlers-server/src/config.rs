//! Server configuration

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use settlers_core::{
    load_layout, BoardLayout, LayoutError, LayoutSource, ObservabilityMode, SessionOptions,
};
use settlers_protocol::SessionId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),
    #[error("table {0} has no players")]
    EmptyTable(SessionId),
}

/// Server configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the server
    pub bind_address: SocketAddr,
    /// How much hidden information every connection sees
    pub observability: ObservabilityMode,
    /// Board layout file; the embedded harbor board when unset
    pub layout: Option<PathBuf>,
    /// Rules shared by every table
    pub session: SessionOptions,
    /// Where event logs are written when a game ends or the server stops
    pub event_log_dir: Option<PathBuf>,
    /// Tables opened at startup
    pub tables: Vec<TableConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 7878)),
            observability: ObservabilityMode::Hidden,
            layout: None,
            session: SessionOptions::default(),
            event_log_dir: None,
            tables: vec![TableConfig::default()],
        }
    }
}

/// One game table: its id, seated names in turn order, and an optional fixed seed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    pub id: SessionId,
    pub players: Vec<String>,
    /// Random per table when unset
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            id: SessionId::new("table-1"),
            players: ["Red", "Blue", "White", "Orange"]
                .into_iter()
                .map(String::from)
                .collect(),
            seed: None,
        }
    }
}

impl ServerConfig {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.tables.iter().find(|t| t.players.is_empty()) {
            Some(table) => Err(ConfigError::EmptyTable(table.id.clone())),
            None => Ok(()),
        }
    }

    /// Compile the configured board.
    pub fn board(&self) -> Result<BoardLayout, ConfigError> {
        let source = match &self.layout {
            Some(path) => LayoutSource::Path(path.display().to_string()),
            None => LayoutSource::Embedded,
        };
        Ok(load_layout(source)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = ServerConfig::from_yaml(
            "bind_address: 127.0.0.1:9000\nobservability: dev_cards\nsession:\n  winning_score: 12\n",
        )
        .unwrap();
        assert_eq!(config.bind_address.port(), 9000);
        assert_eq!(config.observability, ObservabilityMode::DevCards);
        assert_eq!(config.session.winning_score, 12);
        assert_eq!(config.session.hand_limit, 7);
        assert_eq!(config.tables, vec![TableConfig::default()]);
    }

    #[test]
    fn tables_need_players() {
        let err = ServerConfig::from_yaml("tables:\n  - { id: empty, players: [] }\n").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyTable(id) if id.as_str() == "empty"));
    }

    #[test]
    fn default_board_is_embedded() {
        let board = ServerConfig::default().board().unwrap();
        assert!(board.has_pirate());
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = ServerConfig::load("/nonexistent/settlers.yaml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/settlers.yaml"));
    }
}
