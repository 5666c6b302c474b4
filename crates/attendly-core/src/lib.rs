//! # Attendly Core
//!
//! Foundational types shared by every Attendly crate:
//!
//! - [`errors`]: [`AppError`], the HTTP-mapped error returned by services and handlers
//! - [`pagination`]: list pagination parameters and metadata
//! - [`password`]: bcrypt hashing and verification
//! - [`serde`]: lenient deserializers for query-string filters

pub mod errors;
pub mod pagination;
pub mod password;
pub mod serde;

pub use errors::AppError;
pub use pagination::{PaginationMeta, PaginationParams};
pub use password::{hash_password, verify_password};
