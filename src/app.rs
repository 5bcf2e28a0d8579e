//! Wires configuration to the core: store, catalog, sync and authorization.

use std::sync::Arc;

use dadscape_core::{
    rank, AuthorizationGate, DiaryCatalog, DiaryStore, FileStore, MembershipDirectory,
    RemoteApi, SyncCoordinator,
};
use tokio::runtime::Handle;

use crate::commands::CommandError;
use crate::config::Config;

pub struct App {
    pub config: Config,
    pub store: DiaryStore,
    pub catalog: Arc<DiaryCatalog>,
    pub gate: AuthorizationGate,
}

impl App {
    pub fn new(config: Config) -> Result<Self, CommandError> {
        let store = DiaryStore::new(Arc::new(FileStore::new(&config.data_dir.value)));
        let sync = Self::sync_coordinator(&config)?;
        if !config.rsn.value.is_empty() {
            sync.set_actor(config.rsn.value.clone());
        }

        let catalog = Arc::new(DiaryCatalog::new(store.clone(), sync));
        catalog.load();

        Ok(Self {
            gate: AuthorizationGate::new(config.min_edit_rank.value),
            config,
            store,
            catalog,
        })
    }

    fn sync_coordinator(config: &Config) -> Result<SyncCoordinator, CommandError> {
        let api = &config.api;
        match (&api.endpoint, &api.api_key) {
            (Some(endpoint), Some(key)) if api.is_configured() => {
                let client = dadscape_core::ApiClient::new(
                    endpoint.clone(),
                    key.clone(),
                    api.timeout(),
                )?;
                let remote: Arc<dyn RemoteApi> = Arc::new(client);
                Ok(SyncCoordinator::new(remote, Handle::current(), api.timeout()))
            }
            _ => Ok(SyncCoordinator::disabled()),
        }
    }

    /// The configured player name.
    pub fn rsn(&self) -> Result<&str, CommandError> {
        let rsn = self.config.rsn.value.trim();
        if rsn.is_empty() {
            return Err(CommandError::NoPlayer);
        }
        Ok(rsn)
    }

    pub fn rank(&self) -> Option<i32> {
        self.rsn()
            .ok()
            .and_then(|rsn| self.config.members.rank_of(rsn))
    }

    pub fn can_edit(&self) -> bool {
        self.gate.allows(self.rank())
    }

    /// Checks the player may edit diaries and returns their name.
    pub fn require_editor(&self) -> Result<&str, CommandError> {
        let rsn = self.rsn()?;
        if !self.config.enable_diaries {
            return Err(CommandError::DiariesDisabled);
        }
        if !self.gate.can_member_edit(&self.config.members, rsn) {
            let required = self.gate.min_edit_rank();
            return Err(CommandError::NotAuthorized {
                rsn: rsn.to_string(),
                required: format!("{} ({})", rank::title(required), required),
            });
        }
        Ok(rsn)
    }

    /// Waits for background remote calls so a short-lived process does not drop them.
    pub async fn finish(&self) {
        let sync = self.catalog.sync();
        if !sync.is_enabled() {
            return;
        }
        sync.shutdown();
        let succeeded = sync.flush().await;
        tracing::debug!(succeeded, "Remote calls finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, ConfigSource, ConfigValue};
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn config(dir: &TempDir, rsn: &str, min_edit_rank: i32) -> Config {
        let mut members = HashMap::new();
        members.insert("Bob".to_string(), rank::OWNER);
        members.insert("Alice".to_string(), rank::RECRUIT);
        Config {
            data_dir: ConfigValue::new(dir.path().to_path_buf(), ConfigSource::File),
            rsn: ConfigValue::new(rsn.to_string(), ConfigSource::File),
            min_edit_rank: ConfigValue::new(min_edit_rank, ConfigSource::File),
            enable_diaries: true,
            members,
            config_file: None,
            api: ApiConfig::default(),
        }
    }

    #[test]
    fn test_require_editor() {
        let dir = TempDir::new().unwrap();

        let app = App::new(config(&dir, "bob", rank::CAPTAIN)).unwrap();
        assert_eq!(app.rank(), Some(rank::OWNER));
        assert_eq!(app.require_editor().unwrap(), "bob");

        let app = App::new(config(&dir, "Alice", rank::CAPTAIN)).unwrap();
        assert!(!app.can_edit());
        match app.require_editor() {
            Err(CommandError::NotAuthorized { rsn, required }) => {
                assert_eq!(rsn, "Alice");
                assert!(required.contains("50"));
            }
            _ => panic!("expected NotAuthorized"),
        }
    }

    #[test]
    fn test_non_member_cannot_edit() {
        let dir = TempDir::new().unwrap();
        let app = App::new(config(&dir, "Stranger", rank::GUEST)).unwrap();
        assert_eq!(app.rank(), None);
        assert!(matches!(
            app.require_editor(),
            Err(CommandError::NotAuthorized { .. })
        ));
    }

    #[test]
    fn test_missing_rsn_and_disabled_diaries() {
        let dir = TempDir::new().unwrap();
        let app = App::new(config(&dir, "  ", rank::FRIEND)).unwrap();
        assert!(matches!(app.rsn(), Err(CommandError::NoPlayer)));

        let mut cfg = config(&dir, "Bob", rank::FRIEND);
        cfg.enable_diaries = false;
        let app = App::new(cfg).unwrap();
        assert!(matches!(
            app.require_editor(),
            Err(CommandError::DiariesDisabled)
        ));
    }

    #[test]
    fn test_catalog_persists_between_apps() {
        let dir = TempDir::new().unwrap();
        let app = App::new(config(&dir, "Bob", rank::FRIEND)).unwrap();
        let diary = app.catalog.create("Boss Diary", "PvM", "Bob");

        let reopened = App::new(config(&dir, "Bob", rank::FRIEND)).unwrap();
        assert_eq!(reopened.catalog.get_by_id(diary.id).unwrap().name, "Boss Diary");
    }

    #[tokio::test]
    async fn test_finish_without_sync() {
        let dir = TempDir::new().unwrap();
        let app = App::new(config(&dir, "Bob", rank::FRIEND)).unwrap();
        assert!(!app.catalog.sync().is_enabled());
        app.finish().await;
    }
}
