pub mod aggregate;
pub mod controller;
pub mod model;
pub mod router;
pub mod service;

pub use model::*;
pub use router::init_statistics_router;
pub use service::StatisticsService;
