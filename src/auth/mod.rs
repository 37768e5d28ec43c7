//! Authentication and authorization module

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod role;

pub use error::{AuthError, Rejection};
pub use jwt::{Claims, IssueClaims, JwtService};
pub use middleware::{
    authenticate, extract_token, get_auth_context, require_roles, AccessGate, AuthContext,
};
pub use password::PasswordHasher;
pub use role::{Role, RoleSet, ADMIN_ONLY, STAFF, USER_ONLY};
