//! Middleware and extractors for authentication and role gates.
//!
//! - [`auth`]: [`AuthUser`](auth::AuthUser) validates the bearer token;
//!   [`CurrentProfile`](auth::CurrentProfile) also resolves the caller's
//!   profile for scoped reads
//! - [`role`]: role checks for staff-only routes and handlers
//!
//! ```ignore
//! async fn roster(CurrentProfile(_caller, profile): CurrentProfile) -> Result<..., AppError> {
//!     let scope = visible_scope(&profile, ResourceKind::Students);
//!     // ...
//! }
//! ```

pub mod auth;
pub mod role;
