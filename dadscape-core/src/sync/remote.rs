use futures::future::BoxFuture;
use uuid::Uuid;

use super::error::SyncError;
use crate::models::Diary;

/// The remote diary authority.
///
/// Futures are boxed so the coordinator can hold any implementation behind
/// `Arc<dyn RemoteApi>`. `rsn` is the player the request is made on behalf of.
pub trait RemoteApi: Send + Sync {
    fn fetch_diaries(&self) -> BoxFuture<'_, Result<Vec<Diary>, SyncError>>;

    /// Returns the record the server stored, which carries its own id.
    fn create_diary<'a>(
        &'a self,
        diary: &'a Diary,
        rsn: &'a str,
    ) -> BoxFuture<'a, Result<Diary, SyncError>>;

    fn update_diary<'a>(
        &'a self,
        diary: &'a Diary,
        rsn: &'a str,
    ) -> BoxFuture<'a, Result<Diary, SyncError>>;

    fn delete_diary<'a>(&'a self, id: Uuid, rsn: &'a str) -> BoxFuture<'a, Result<(), SyncError>>;

    fn fetch_motd(&self) -> BoxFuture<'_, Result<String, SyncError>>;

    fn update_motd<'a>(&'a self, motd: &'a str, rsn: &'a str)
        -> BoxFuture<'a, Result<(), SyncError>>;
}
