//! Client half of the token lifecycle: a typed API client that keeps its
//! session authenticated across access-token expiry.
//!
//! The pieces mirror what a browser client would hold: a [`SessionStore`]
//! for the authenticated-user state, a [`TokenCache`] for the access token,
//! and an [`ApiClient`] that attaches the token to outgoing requests and
//! transparently refreshes it on 401 with single-flight coordination.

pub mod http;
pub mod session;
pub mod tokens;

pub use http::{ApiClient, ClientError};
pub use session::{FileSessionStorage, SessionSnapshot, SessionState, SessionStorage, SessionStore};
pub use tokens::TokenCache;
