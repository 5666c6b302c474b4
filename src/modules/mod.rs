pub mod attendance;
pub mod auth;
pub mod catalog;
pub mod leave_requests;
pub mod notifications;
pub mod schedule;
pub mod statistics;
pub mod users;
