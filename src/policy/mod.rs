//! Role-scoped access policy.
//!
//! Every read path resolves the caller's [`Profile`] once and derives a
//! [`Predicate`] for the resource it is about to query:
//!
//! | Profile | Students | Schedules | Attendance |
//! |---|---|---|---|
//! | admin / manager | all | all | all |
//! | teacher | all | slots they instruct or whose subject they own | their subjects |
//! | student | self | own group | own records |
//! | parent | linked children | children's groups | children's records |
//! | unassigned | nothing | nothing | nothing |
//!
//! Out-of-scope rows are reported as missing, never as forbidden.

pub mod profile;
pub mod scope;

pub use profile::{LinkedChild, Profile, resolve_profile};
pub use scope::{Predicate, ResourceKind, ScopeColumns, ScopeTarget, visible_scope};
