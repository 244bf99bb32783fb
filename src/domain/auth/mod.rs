pub mod dto;
pub mod jwt;
pub mod service;

pub use dto::{AuthResponse, LoginRequest, RefreshTokenRequest, RegisterRequest};
pub use jwt::{Claims, TokenCodec};
pub use service::{AuthService, IssuedSession};
