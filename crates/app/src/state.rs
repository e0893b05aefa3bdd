//! Application state: configuration plus the wired-up debate service

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use agora_core::{
    AgoraConfig, Collaborators, Database, DebateService, Error, FileArchive, OpenRouterOracle,
    Result, SharedDatabase, TopicBank, TopicSource,
};
use tracing::{info, warn};

pub struct AppState {
    pub config: AgoraConfig,
    pub service: Arc<DebateService>,
}

impl AppState {
    /// Open storage and build the service described by `config`
    pub fn new(config: AgoraConfig) -> Result<Self> {
        config.validate()?;

        let db_path = config.storage.database_path()?;
        let db = Database::open(&db_path)?;
        info!(path = %db_path.display(), schema = db.schema_version(), "Player database ready");

        let archive = FileArchive::new(config.storage.archive_dir()?)?;
        info!(path = %archive.base_path().display(), "Debate archive ready");

        let oracle = Arc::new(OpenRouterOracle::from_config(&config.oracle));
        let topics: Arc<dyn TopicSource> = if oracle.has_api_key() {
            info!(model = %config.oracle.model, "Scoring with OpenRouter");
            oracle.clone()
        } else {
            warn!(
                env = %config.oracle.api_key_env,
                "No oracle API key set; arguments get neutral scores and topics come from the built-in bank"
            );
            Arc::new(TopicBank)
        };

        let service = DebateService::new(
            &config,
            Collaborators {
                oracle,
                topics,
                players: Arc::new(SharedDatabase::new(db)),
                archive: Arc::new(archive),
            },
        );

        Ok(Self {
            config,
            service: Arc::new(service),
        })
    }

    /// Resolve the configured listen address
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let server = &self.config.server;
        (server.host.as_str(), server.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| Error::Config(format!("cannot resolve host {}", server.host)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_state_creates_storage() {
        let dir = TempDir::new().unwrap();
        let mut config = AgoraConfig::default();
        config.storage.data_dir = Some(dir.path().join("data"));

        let state = AppState::new(config).unwrap();
        assert!(dir.path().join("data").join("agora.db").exists());
        assert!(dir.path().join("data").join("debates").is_dir());
        assert_eq!(state.bind_addr().unwrap().port(), 7420);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = AgoraConfig::default();
        config.debate.rounds = 0;
        assert!(AppState::new(config).is_err());
    }
}
