pub mod center;
pub mod notifications;
pub mod search;

pub use center::{Center, MATERIAL_TYPES, material_label};
pub use notifications::{ActionResponse, NotificationId, UnreadCount};
pub use search::SearchResult;
