pub mod controller;
pub mod model;
pub mod router;
pub mod service;

pub use model::*;
pub use router::{init_profile_router, init_users_router};
pub use service::UserService;
