use std::sync::RwLock;

/// In-memory slot for the current access token.
///
/// The refresh token never lives here; it stays in the HTTP-only cookie
/// managed by the request cookie jar.
#[derive(Debug, Default)]
pub struct TokenCache {
    access: RwLock<Option<String>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.access.write().expect("token cache lock poisoned") = Some(token.into());
    }

    pub fn get(&self) -> Option<String> {
        self.access
            .read()
            .expect("token cache lock poisoned")
            .clone()
    }

    pub fn clear(&self) {
        *self.access.write().expect("token cache lock poisoned") = None;
    }
}
