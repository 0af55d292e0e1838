use crate::error::ApiError;
use crate::ports::BoxFuture;
use crate::types::{Center, NotificationId, SearchResult};

/// Notification endpoints. `Ok(false)` means the server declined the change.
pub trait NotificationApi: Clone + Send + Sync + 'static {
    fn unread_count(&self) -> BoxFuture<'_, Result<u64, ApiError>>;
    fn mark_read(&self, id: NotificationId) -> BoxFuture<'_, Result<bool, ApiError>>;
    fn delete(&self, id: NotificationId) -> BoxFuture<'_, Result<bool, ApiError>>;
    fn mark_all_read(&self) -> BoxFuture<'_, Result<bool, ApiError>>;
}

pub trait SearchApi: Clone + Send + Sync + 'static {
    fn search<'a>(
        &'a self,
        endpoint: &'a str,
        query: &'a str,
    ) -> BoxFuture<'a, Result<Vec<SearchResult>, ApiError>>;
}

pub trait CentersApi: Clone + Send + Sync + 'static {
    fn centers<'a>(
        &'a self,
        material: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Vec<Center>, ApiError>>;
}
