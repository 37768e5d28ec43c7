//! Business logic services layer

pub mod auth_service;

pub use auth_service::{AuthService, LoginFlow, LookupBy, Registration, ADMIN_LOGIN, USER_LOGIN};
