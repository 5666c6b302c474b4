pub use attendly_models::users::*;
