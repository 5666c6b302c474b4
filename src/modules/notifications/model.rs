pub use attendly_models::notifications::*;
