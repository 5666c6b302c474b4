pub use attendly_models::attendance::*;
