pub mod controller;
pub mod model;
pub mod planning;
pub mod router;
pub mod service;

pub use model::*;
pub use router::init_leave_requests_router;
pub use service::LeaveRequestService;
