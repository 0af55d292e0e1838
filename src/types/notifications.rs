use serde::{Deserialize, Serialize};

pub type NotificationId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCount {
    pub count: u64,
}

/// Body returned by the state-changing notification endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub success: bool,
}
