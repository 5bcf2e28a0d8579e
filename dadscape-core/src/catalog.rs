//! The in-memory diary collection.
//!
//! Every mutation writes the whole collection to local storage before a
//! remote push is scheduled. Readers always get owned copies.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use crate::export::{self, ExportError};
use crate::models::{Diary, Task, Tier};
use crate::storage::DiaryStore;
use crate::sync::{PushOp, SyncCoordinator};

#[derive(Debug, Default)]
struct CatalogState {
    diaries: Vec<Diary>,
    motd: String,
}

/// What a pull from the remote changed locally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullReport {
    /// Number of diaries now held, when the remote collection replaced ours.
    pub diaries_replaced: Option<usize>,
    pub motd_replaced: bool,
}

pub struct DiaryCatalog {
    store: DiaryStore,
    sync: SyncCoordinator,
    state: RwLock<CatalogState>,
}

impl DiaryCatalog {
    /// An empty catalog. Call [`load`](Self::load) to read persisted state.
    pub fn new(store: DiaryStore, sync: SyncCoordinator) -> Self {
        Self {
            store,
            sync,
            state: RwLock::new(CatalogState::default()),
        }
    }

    pub fn sync(&self) -> &SyncCoordinator {
        &self.sync
    }

    pub fn store(&self) -> &DiaryStore {
        &self.store
    }

    fn read(&self) -> RwLockReadGuard<'_, CatalogState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CatalogState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the in-memory state with what storage holds.
    pub fn load(&self) {
        let diaries = self.store.load_diaries();
        let motd = self.store.load_motd();
        tracing::info!(count = diaries.len(), "Loaded diaries");

        let mut state = self.write();
        state.diaries = diaries;
        state.motd = motd;
    }

    fn persist(&self, diaries: &[Diary]) {
        match self.store.save_diaries(diaries) {
            Ok(()) => tracing::debug!(count = diaries.len(), "Saved diaries"),
            Err(e) => tracing::error!(error = %e, "Failed to save diaries"),
        }
    }

    pub fn create(
        &self,
        name: impl Into<String>,
        category: impl Into<String>,
        created_by: impl Into<String>,
    ) -> Diary {
        self.add_diary(Diary::new(name, category, created_by))
    }

    /// Appends a diary built by the caller, persisting and pushing it once.
    pub fn add_diary(&self, diary: Diary) -> Diary {
        {
            let mut state = self.write();
            state.diaries.push(diary.clone());
            self.persist(&state.diaries);
        }
        tracing::info!(name = %diary.name, category = %diary.category, "Created diary");
        self.sync.push(PushOp::Create(diary.clone()));
        diary
    }

    /// Replaces the stored diary with the same id. Never inserts.
    pub fn update(&self, mut diary: Diary) -> bool {
        let by = diary.last_modified_by.clone();
        diary.touch(by);
        diary.renumber_tiers();
        {
            let mut state = self.write();
            let Some(slot) = state.diaries.iter_mut().find(|d| d.id == diary.id) else {
                tracing::debug!(id = %diary.id, "Update for unknown diary ignored");
                return false;
            };
            *slot = diary.clone();
            self.persist(&state.diaries);
        }
        tracing::info!(name = %diary.name, "Updated diary");
        self.sync.push(PushOp::Update(diary));
        true
    }

    /// Progress recorded against the diary is left in place.
    pub fn delete(&self, id: Uuid) -> bool {
        {
            let mut state = self.write();
            let before = state.diaries.len();
            state.diaries.retain(|d| d.id != id);
            if state.diaries.len() == before {
                return false;
            }
            self.persist(&state.diaries);
        }
        tracing::info!(%id, "Deleted diary");
        self.sync.push(PushOp::Delete(id));
        true
    }

    /// Replaces the diary with the same id, or appends it. Not pushed remotely.
    pub fn import(&self, diary: Diary) -> bool {
        let mut state = self.write();
        match state.diaries.iter_mut().find(|d| d.id == diary.id) {
            Some(slot) => {
                tracing::info!(name = %diary.name, "Replaced existing diary");
                *slot = diary;
            }
            None => {
                tracing::info!(name = %diary.name, "Imported new diary");
                state.diaries.push(diary);
            }
        }
        self.persist(&state.diaries);
        true
    }

    pub fn get_by_id(&self, id: Uuid) -> Option<Diary> {
        self.read().diaries.iter().find(|d| d.id == id).cloned()
    }

    pub fn list_all(&self) -> Vec<Diary> {
        self.read().diaries.clone()
    }

    pub fn list_by_category(&self, category: &str) -> Vec<Diary> {
        let category = category.to_lowercase();
        self.read()
            .diaries
            .iter()
            .filter(|d| d.category.to_lowercase() == category)
            .cloned()
            .collect()
    }

    pub fn list_active(&self) -> Vec<Diary> {
        self.read()
            .diaries
            .iter()
            .filter(|d| d.active)
            .cloned()
            .collect()
    }

    /// Distinct categories, compared and sorted case-insensitively. The first
    /// spelling seen is kept.
    pub fn list_categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for diary in &self.read().diaries {
            let seen = categories
                .iter()
                .any(|c| c.to_lowercase() == diary.category.to_lowercase());
            if !seen {
                categories.push(diary.category.clone());
            }
        }
        categories.sort_by_key(|c| c.to_lowercase());
        categories
    }

    pub fn motd(&self) -> String {
        self.read().motd.clone()
    }

    pub fn set_motd(&self, motd: impl Into<String>) {
        let motd = motd.into();
        {
            let mut state = self.write();
            state.motd = motd.clone();
            if let Err(e) = self.store.save_motd(&motd) {
                tracing::error!(error = %e, "Failed to save message of the day");
            }
        }
        tracing::info!("Updated message of the day");
        self.sync.push(PushOp::Motd(motd));
    }

    /// Applies `edit` to the diary with `id`; persists and pushes when it returns true.
    fn modify(&self, id: Uuid, edit: impl FnOnce(&mut Diary) -> bool) -> bool {
        let updated = {
            let mut state = self.write();
            let Some(diary) = state.diaries.iter_mut().find(|d| d.id == id) else {
                return false;
            };
            if !edit(diary) {
                return false;
            }
            let by = diary.last_modified_by.clone();
            diary.touch(by);
            let updated = diary.clone();
            self.persist(&state.diaries);
            updated
        };
        self.sync.push(PushOp::Update(updated));
        true
    }

    /// Fails if the diary is missing or already has a tier with that name.
    pub fn add_tier(&self, diary_id: Uuid, tier: Tier) -> bool {
        self.modify(diary_id, |diary| diary.add_tier(tier))
    }

    pub fn remove_tier(&self, diary_id: Uuid, tier_name: &str) -> bool {
        self.modify(diary_id, |diary| diary.remove_tier(tier_name))
    }

    /// Adds `task` to the named tier. Tasks that fail validation, or whose id
    /// already exists in the diary, are refused.
    pub fn add_task(&self, diary_id: Uuid, tier_name: &str, task: Task) -> bool {
        if let Err(e) = task.validate() {
            tracing::warn!(error = %e, "Refusing invalid task");
            return false;
        }
        self.modify(diary_id, |diary| {
            if diary.tasks().any(|(_, t)| t.id == task.id) {
                return false;
            }
            match diary.tier_by_name_mut(tier_name) {
                Some(tier) => {
                    tier.add_task(task);
                    true
                }
                None => false,
            }
        })
    }

    pub fn remove_task(&self, diary_id: Uuid, tier_name: &str, task_id: Uuid) -> bool {
        self.modify(diary_id, |diary| {
            diary
                .tier_by_name_mut(tier_name)
                .is_some_and(|tier| tier.remove_task(task_id))
        })
    }

    /// Removes the task from whichever tier holds it.
    pub fn remove_task_by_id(&self, diary_id: Uuid, task_id: Uuid) -> bool {
        self.modify(diary_id, |diary| {
            diary
                .tiers
                .iter_mut()
                .any(|tier| tier.remove_task(task_id))
        })
    }

    pub fn export_json(&self, id: Uuid) -> Result<String, ExportError> {
        let diary = self
            .get_by_id(id)
            .ok_or_else(|| ExportError::NotFound(id.to_string()))?;
        export::to_json(&diary)
    }

    /// Parses one diary and imports it.
    pub fn import_json(&self, json: &str) -> Result<Diary, ExportError> {
        let diary = export::from_json(json)?;
        self.import(diary.clone());
        Ok(diary)
    }

    pub fn export_to_dir(
        &self,
        id: Uuid,
        dir: &Path,
        file_name: &str,
    ) -> Result<PathBuf, ExportError> {
        let diary = self
            .get_by_id(id)
            .ok_or_else(|| ExportError::NotFound(id.to_string()))?;
        export::write_file(&diary, dir, file_name)
    }

    pub fn import_file(&self, path: &Path) -> Result<Diary, ExportError> {
        let diary = export::read_file(path)?;
        self.import(diary.clone());
        Ok(diary)
    }

    pub fn list_exported(&self, dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
        export::list_files(dir)
    }

    /// Replaces local diaries and the MOTD with the remote's, each only when
    /// the remote returned something non-empty.
    pub async fn pull_from_api(&self) -> PullReport {
        let mut report = PullReport::default();
        if !self.sync.is_enabled() {
            tracing::debug!("API sync not configured, skipping pull");
            return report;
        }
        let snapshot = match self.sync.pull().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to pull from API");
                return report;
            }
        };

        match snapshot.diaries {
            Ok(diaries) if !diaries.is_empty() => {
                let count = diaries.len();
                let mut state = self.write();
                state.diaries = diaries;
                self.persist(&state.diaries);
                report.diaries_replaced = Some(count);
                tracing::info!(count, "Synced diaries from API");
            }
            Ok(_) => tracing::info!("API returned no diaries, keeping local cache"),
            Err(e) => tracing::warn!(error = %e, "Failed to sync diaries from API, using local cache"),
        }

        match snapshot.motd {
            Ok(motd) if !motd.is_empty() => {
                let mut state = self.write();
                state.motd = motd;
                if let Err(e) = self.store.save_motd(&state.motd) {
                    tracing::error!(error = %e, "Failed to save message of the day");
                }
                report.motd_replaced = true;
                tracing::debug!("Synced MOTD from API");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to sync MOTD from API"),
        }

        report
    }

    /// Starts [`pull_from_api`](Self::pull_from_api) in the background.
    pub fn sync_from_api(self: &Arc<Self>) -> bool {
        let catalog = Arc::clone(self);
        self.sync.spawn(async move {
            catalog.pull_from_api().await;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskType;
    use crate::storage::{FileStore, MemoryStore, DIARIES_KEY};
    use crate::sync::testing::FakeRemote;
    use crate::sync::RemoteApi;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::runtime::Handle;

    fn local_catalog() -> DiaryCatalog {
        DiaryCatalog::new(DiaryStore::in_memory(), SyncCoordinator::disabled())
    }

    fn synced_catalog(remote: Arc<FakeRemote>) -> DiaryCatalog {
        let remote: Arc<dyn RemoteApi> = remote;
        let sync = SyncCoordinator::new(remote, Handle::current(), Duration::from_secs(1));
        sync.set_actor("Bob");
        DiaryCatalog::new(DiaryStore::in_memory(), sync)
    }

    #[test]
    fn test_create_assigns_defaults() {
        let catalog = local_catalog();
        let diary = catalog.create("Boss Diary", "PvM", "Bob");

        assert_eq!(diary.version, "1.0");
        assert!(diary.active);
        assert!(diary.tiers.is_empty());
        assert_eq!(catalog.get_by_id(diary.id), Some(diary));
    }

    #[test]
    fn test_update_requires_existing_id() {
        let catalog = local_catalog();
        let mut diary = catalog.create("Boss Diary", "PvM", "Bob");
        diary.name = "Raid Diary".to_string();
        diary.last_modified_by = "Alice".to_string();

        assert!(catalog.update(diary.clone()));
        let stored = catalog.get_by_id(diary.id).unwrap();
        assert_eq!(stored.name, "Raid Diary");
        assert_eq!(stored.last_modified_by, "Alice");

        assert!(!catalog.update(Diary::new("Ghost", "PvM", "Bob")));
        assert_eq!(catalog.list_all().len(), 1);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let catalog = local_catalog();
        let diary = catalog.create("Boss Diary", "PvM", "Bob");

        assert!(catalog.delete(diary.id));
        assert!(!catalog.delete(diary.id));
        assert!(catalog.list_all().is_empty());
    }

    #[test]
    fn test_import_replaces_never_duplicates() {
        let catalog = local_catalog();
        let mut diary = catalog.create("Boss Diary", "PvM", "Bob");
        diary.description = "Imported".to_string();

        assert!(catalog.import(diary.clone()));
        assert!(catalog.import(diary.clone()));
        assert_eq!(catalog.list_all(), vec![diary]);

        assert!(catalog.import(Diary::new("Other", "Skilling", "Alice")));
        assert_eq!(catalog.list_all().len(), 2);
    }

    #[test]
    fn test_readers_get_copies() {
        let catalog = local_catalog();
        let diary = catalog.create("Boss Diary", "PvM", "Bob");

        let mut listed = catalog.list_all();
        listed[0].name = "Changed".to_string();
        assert_eq!(catalog.get_by_id(diary.id).unwrap().name, "Boss Diary");
    }

    #[test]
    fn test_filters_and_categories() {
        let catalog = local_catalog();
        catalog.create("Boss Diary", "PvM", "Bob");
        catalog.create("Slayer Diary", "pvm", "Bob");
        let mut skilling = catalog.create("Skill Diary", "Skilling", "Bob");
        catalog.create("Achievements", "achievements", "Bob");
        skilling.active = false;
        catalog.update(skilling);

        assert_eq!(catalog.list_by_category("PVM").len(), 2);
        assert_eq!(catalog.list_active().len(), 3);
        assert_eq!(
            catalog.list_categories(),
            vec!["achievements", "PvM", "Skilling"]
        );
    }

    #[test]
    fn test_tier_and_task_helpers() {
        let catalog = local_catalog();
        let diary = catalog.create("Boss Diary", "PvM", "Bob");
        let task = Task::kill("Kill 5 goblins", "Goblin", 5);
        let task_id = task.id;

        assert!(catalog.add_tier(diary.id, Tier::new("Easy")));
        assert!(!catalog.add_tier(diary.id, Tier::new("Easy")));
        assert!(!catalog.add_tier(Uuid::new_v4(), Tier::new("Easy")));

        assert!(catalog.add_task(diary.id, "Easy", task.clone()));
        assert!(!catalog.add_task(diary.id, "Easy", task));
        assert!(!catalog.add_task(diary.id, "Missing", Task::kill("x", "Cow", 1)));

        let stored = catalog.get_by_id(diary.id).unwrap();
        assert_eq!(stored.tiers[0].order, 0);
        assert_eq!(stored.total_task_count(), 1);
        assert!(stored.last_modified_at >= diary.last_modified_at);

        assert!(catalog.remove_task_by_id(diary.id, task_id));
        assert!(!catalog.remove_task_by_id(diary.id, task_id));
        assert!(catalog.remove_tier(diary.id, "Easy"));
        assert!(!catalog.remove_tier(diary.id, "Easy"));
    }

    #[test]
    fn test_add_task_refuses_invalid() {
        let catalog = local_catalog();
        let diary = catalog.create("Boss Diary", "PvM", "Bob");
        catalog.add_tier(diary.id, Tier::new("Easy"));

        let missing_count =
            Task::of_type("Kill goblins", TaskType::Kill).with_requirement("npc", "Goblin");
        assert!(!catalog.add_task(diary.id, "Easy", missing_count));
        let bad_count = Task::kill("Kill goblins", "Goblin", 1).with_requirement("count", "five");
        assert!(!catalog.add_task(diary.id, "Easy", bad_count));
        assert!(catalog.add_task(
            diary.id,
            "Easy",
            Task::of_type("Finish Dragon Slayer", TaskType::Quest)
        ));
    }

    #[test]
    fn test_remove_task_scoped_to_tier() {
        let catalog = local_catalog();
        let diary = catalog.create("Boss Diary", "PvM", "Bob");
        catalog.add_tier(diary.id, Tier::new("Easy"));
        catalog.add_tier(diary.id, Tier::new("Hard"));
        let task = Task::kill("Kill cows", "Cow", 3);
        catalog.add_task(diary.id, "Easy", task.clone());

        assert!(!catalog.remove_task(diary.id, "Hard", task.id));
        assert!(catalog.remove_task(diary.id, "Easy", task.id));
    }

    #[test]
    fn test_state_survives_reload() {
        let temp = TempDir::new().unwrap();
        let store = DiaryStore::new(Arc::new(FileStore::new(temp.path())));

        let catalog = DiaryCatalog::new(store.clone(), SyncCoordinator::disabled());
        let diary = catalog.create("Boss Diary", "PvM", "Bob");
        catalog.add_tier(diary.id, Tier::new("Easy"));
        catalog.add_task(diary.id, "Easy", Task::kill("Kill goblins", "Goblin", 5));
        catalog.set_motd("Raid at 8");

        let reloaded = DiaryCatalog::new(store, SyncCoordinator::disabled());
        reloaded.load();
        assert_eq!(reloaded.list_all(), catalog.list_all());
        assert_eq!(reloaded.motd(), "Raid at 8");
    }

    #[test]
    fn test_load_malformed_yields_empty() {
        let kv = Arc::new(MemoryStore::new());
        crate::storage::KeyValueStore::set(kv.as_ref(), DIARIES_KEY, "[{").unwrap();
        let catalog = DiaryCatalog::new(DiaryStore::new(kv), SyncCoordinator::disabled());

        catalog.load();
        assert!(catalog.list_all().is_empty());
    }

    #[test]
    fn test_export_and_import_json() {
        let catalog = local_catalog();
        let diary = catalog.create("Boss Diary", "PvM", "Bob");
        let json = catalog.export_json(diary.id).unwrap();

        let other = local_catalog();
        assert_eq!(other.import_json(&json).unwrap(), diary);
        assert_eq!(other.list_all(), vec![diary]);
        assert!(other.import_json("not json").is_err());
        assert!(matches!(
            other.export_json(Uuid::new_v4()),
            Err(ExportError::NotFound(_))
        ));
    }

    #[test]
    fn test_export_to_dir_and_list() {
        let temp = TempDir::new().unwrap();
        let catalog = local_catalog();
        let diary = catalog.create("Boss Diary", "PvM", "Bob");

        let path = catalog
            .export_to_dir(diary.id, temp.path(), "boss diary!")
            .unwrap();
        assert!(path.ends_with("boss_diary_.json"));
        assert_eq!(catalog.list_exported(temp.path()).unwrap(), vec![path.clone()]);

        let other = local_catalog();
        assert_eq!(other.import_file(&path).unwrap().id, diary.id);
    }

    #[tokio::test]
    async fn test_add_diary_with_description_pushes_once() {
        let remote = Arc::new(FakeRemote::default());
        let catalog = synced_catalog(remote.clone());

        let diary = catalog
            .add_diary(Diary::new("Skilling Diary", "Skilling", "Bob").with_description("Level up"));
        assert_eq!(catalog.get_by_id(diary.id).unwrap().description, "Level up");
        assert_eq!(catalog.sync().flush().await, 1);
        assert_eq!(remote.calls(), vec!["create Skilling Diary by Bob".to_string()]);
    }

    #[tokio::test]
    async fn test_mutations_push_once_each() {
        let remote = Arc::new(FakeRemote::default());
        let catalog = synced_catalog(remote.clone());

        let diary = catalog.create("Boss Diary", "PvM", "Bob");
        catalog.add_tier(diary.id, Tier::new("Easy"));
        catalog.set_motd("Hello");
        catalog.delete(diary.id);
        catalog.import(Diary::new("Imported", "PvM", "Bob"));
        assert_eq!(catalog.sync().flush().await, 4);

        let calls = remote.calls();
        assert_eq!(calls.len(), 4);
        assert!(calls.contains(&"create Boss Diary by Bob".to_string()));
        assert!(calls.contains(&"update Boss Diary by Bob".to_string()));
        assert!(calls.contains(&"motd Hello by Bob".to_string()));
        assert!(calls.contains(&format!("delete {} by Bob", diary.id)));
    }

    #[tokio::test]
    async fn test_failed_push_keeps_local_write() {
        let remote = Arc::new(FakeRemote::failing());
        let catalog = synced_catalog(remote);

        let diary = catalog.create("Boss Diary", "PvM", "Bob");
        assert_eq!(catalog.sync().flush().await, 0);
        assert_eq!(catalog.get_by_id(diary.id), Some(diary.clone()));
        assert_eq!(catalog.store().load_diaries(), vec![diary]);
    }

    #[tokio::test]
    async fn test_pull_with_empty_remote_keeps_local() {
        let remote = Arc::new(FakeRemote::default());
        let catalog = synced_catalog(remote);
        let diary = catalog.create("Boss Diary", "PvM", "Bob");
        catalog.set_motd("Local");

        let report = catalog.pull_from_api().await;
        assert_eq!(report, PullReport::default());
        assert_eq!(catalog.list_all(), vec![diary]);
        assert_eq!(catalog.motd(), "Local");
    }

    #[tokio::test]
    async fn test_pull_failure_keeps_local() {
        let remote = Arc::new(FakeRemote::failing());
        let catalog = synced_catalog(remote);
        let diary = catalog.create("Boss Diary", "PvM", "Bob");

        catalog.pull_from_api().await;
        assert_eq!(catalog.list_all(), vec![diary]);
    }

    #[tokio::test]
    async fn test_pull_replaces_with_remote_snapshot() {
        let remote_diaries = vec![
            Diary::new("Remote A", "PvM", "Alice"),
            Diary::new("Remote B", "Skilling", "Alice"),
        ];
        let remote = Arc::new(FakeRemote::with_diaries(remote_diaries.clone()));
        *remote.motd.lock().unwrap() = "From the server".to_string();
        let catalog = synced_catalog(remote);
        catalog.create("Local", "PvM", "Bob");

        let report = catalog.pull_from_api().await;
        assert_eq!(report.diaries_replaced, Some(2));
        assert!(report.motd_replaced);
        assert_eq!(catalog.list_all(), remote_diaries);
        assert_eq!(catalog.store().load_diaries(), remote_diaries);
        assert_eq!(catalog.motd(), "From the server");
    }

    #[tokio::test]
    async fn test_sync_from_api_runs_in_background() {
        let remote = Arc::new(FakeRemote::with_diaries(vec![Diary::new(
            "Remote", "PvM", "Alice",
        )]));
        let catalog = Arc::new(synced_catalog(remote));

        assert!(catalog.sync_from_api());
        catalog.sync().flush().await;
        assert_eq!(catalog.list_all()[0].name, "Remote");
    }

    #[test]
    fn test_pull_disabled_is_noop() {
        let catalog = local_catalog();
        let diary = catalog.create("Boss Diary", "PvM", "Bob");
        let report = futures::executor::block_on(catalog.pull_from_api());

        assert_eq!(report, PullReport::default());
        assert_eq!(catalog.list_all(), vec![diary]);
    }
}
