pub mod account_repository;
pub mod refresh_token_repository;

pub use account_repository::AccountRepository;
pub use refresh_token_repository::{RefreshTokenRecord, RefreshTokenRepository};
