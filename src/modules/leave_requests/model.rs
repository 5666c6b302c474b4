pub use attendly_models::leave_requests::*;
