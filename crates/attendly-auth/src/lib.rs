//! # Attendly Auth
//!
//! JWT access tokens. A token names the user and carries the role tag that
//! was set on the identity when the token was issued (`None` while a role
//! assignment is pending).

pub mod claims;
pub mod jwt;

pub use claims::Claims;
pub use jwt::{create_access_token, verify_token};
