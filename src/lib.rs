//! User authentication store on top of a MongoDB collection: sparse user
//! records, uniqueness indexes, lookup by uuid and password login.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod storage;

pub use auth::{AuthDb, AuthStore, LoginRequest, PublicUser, User};
pub use config::AuthDbConfig;
pub use error::{AuthError, Result};
