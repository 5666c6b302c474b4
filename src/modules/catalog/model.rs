pub use attendly_models::catalog::*;
