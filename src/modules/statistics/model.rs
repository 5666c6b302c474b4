pub use attendly_models::statistics::*;
