pub use attendly_models::schedule::*;
