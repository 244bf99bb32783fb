use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::domain::account::PublicAccount;

/// Client-side belief about the current session.
///
/// `is_authenticated` is derived: it is true exactly when `user` is set.
/// Every mutation below recomputes it rather than trusting callers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub user: Option<PublicAccount>,
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub error: Option<String>,
    pub is_initialized: bool,
}

/// The subset of session state that survives a restart. Loading and error
/// flags are transient by contract and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub user: Option<PublicAccount>,
    pub is_authenticated: bool,
}

#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn load(&self) -> Option<SessionSnapshot>;
    async fn save(&self, snapshot: &SessionSnapshot);
    async fn clear(&self);
}

/// JSON-file-backed session storage. Storage failures are logged and
/// otherwise ignored; a session that fails to persist is still a session.
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SessionStorage for FileSessionStorage {
    async fn load(&self) -> Option<SessionSnapshot> {
        let bytes = tokio::fs::read(&self.path).await.ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable session snapshot");
                None
            }
        }
    }

    async fn save(&self, snapshot: &SessionSnapshot) {
        let bytes = match serde_json::to_vec(snapshot) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode session snapshot");
                return;
            }
        };
        if let Err(e) = tokio::fs::write(&self.path, bytes).await {
            tracing::warn!(error = %e, "Failed to persist session snapshot");
        }
    }

    async fn clear(&self) {
        let _ = tokio::fs::remove_file(&self.path).await;
    }
}

/// Explicit, injectable session state container.
pub struct SessionStore {
    state: RwLock<SessionState>,
    storage: Option<Arc<dyn SessionStorage>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SessionState::default()),
            storage: None,
        }
    }

    pub fn with_storage(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            state: RwLock::new(SessionState::default()),
            storage: Some(storage),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.read().expect("session lock poisoned").clone()
    }

    /// A successful authentication: sets the user, clears error and loading
    pub async fn login(&self, user: PublicAccount) {
        self.mutate(|state| {
            state.user = Some(user);
            state.is_authenticated = true;
            state.error = None;
            state.is_loading = false;
        });
        self.persist().await;
    }

    pub async fn logout(&self) {
        self.mutate(|state| {
            state.user = None;
            state.is_authenticated = false;
            state.error = None;
            state.is_loading = false;
        });
        self.persist().await;
    }

    /// Driven by profile-fetch results; authentication follows the user
    pub async fn set_user(&self, user: Option<PublicAccount>) {
        self.mutate(|state| {
            state.is_authenticated = user.is_some();
            state.user = user;
            state.error = None;
        });
        self.persist().await;
    }

    pub fn set_loading(&self, loading: bool) {
        self.mutate(|state| state.is_loading = loading);
    }

    pub fn set_error(&self, error: Option<String>) {
        self.mutate(|state| {
            state.error = error;
            state.is_loading = false;
        });
    }

    pub fn clear_error(&self) {
        self.mutate(|state| state.error = None);
    }

    /// One-time transition at application start; idempotent
    pub fn initialize(&self) {
        self.mutate(|state| state.is_initialized = true);
    }

    /// Hard session invalidation: back to the initial shape
    pub async fn reset(&self) {
        self.mutate(|state| *state = SessionState::default());
        if let Some(storage) = &self.storage {
            storage.clear().await;
        }
    }

    /// Restore the persisted subset, if any.
    ///
    /// A rehydrated session never appears mid-request or mid-error: loading
    /// and error are force-reset and the store comes up initialized.
    pub async fn rehydrate(&self) {
        let Some(storage) = &self.storage else {
            return;
        };
        let Some(snapshot) = storage.load().await else {
            return;
        };

        self.mutate(|state| {
            state.is_authenticated = snapshot.user.is_some();
            state.user = snapshot.user;
            state.is_loading = false;
            state.error = None;
            state.is_initialized = true;
        });
    }

    fn mutate(&self, f: impl FnOnce(&mut SessionState)) {
        let mut state = self.state.write().expect("session lock poisoned");
        f(&mut state);
    }

    async fn persist(&self) {
        let Some(storage) = &self.storage else {
            return;
        };
        let snapshot = {
            let state = self.state.read().expect("session lock poisoned");
            SessionSnapshot {
                user: state.user.clone(),
                is_authenticated: state.is_authenticated,
            }
        };
        storage.save(&snapshot).await;
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
