mod dto;
pub mod password;
mod repo;
mod repo_types;

pub use dto::{LoginRequest, PublicUser};
pub use repo::{AuthDb, AuthStore};
pub use repo_types::User;
