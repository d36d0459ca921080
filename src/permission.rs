use serde::{Deserialize, Serialize};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Microphone permission capability
///
/// Querying is side-effect free; `request` may show an OS prompt.
#[async_trait::async_trait]
pub trait PermissionGate: Send + Sync {
    async fn status(&self) -> PermissionStatus;

    async fn request(&self) -> PermissionStatus;
}

/// Permission gate with a fixed answer, for hosts that handle prompts elsewhere
///
/// `request` resolves to `on_request`, after which `status` reports that answer.
pub struct StaticPermission {
    status: Mutex<PermissionStatus>,
    on_request: PermissionStatus,
}

impl StaticPermission {
    pub fn granted() -> Self {
        Self::new(PermissionStatus::Granted, PermissionStatus::Granted)
    }

    pub fn denied() -> Self {
        Self::new(PermissionStatus::Denied, PermissionStatus::Denied)
    }

    pub fn new(status: PermissionStatus, on_request: PermissionStatus) -> Self {
        Self {
            status: Mutex::new(status),
            on_request,
        }
    }
}

#[async_trait::async_trait]
impl PermissionGate for StaticPermission {
    async fn status(&self) -> PermissionStatus {
        *self.status.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn request(&self) -> PermissionStatus {
        let mut status = self.status.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *status = self.on_request;
        *status
    }
}
