pub mod middleware;
pub mod request_id;

pub use middleware::{auth_middleware, AuthAccount};
pub use request_id::{request_id_middleware, RequestId};
