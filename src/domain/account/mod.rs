pub mod dto;
pub mod model;
pub mod service;

pub use dto::UpdateProfileRequest;
pub use model::{Account, PublicAccount};
pub use service::AccountService;
