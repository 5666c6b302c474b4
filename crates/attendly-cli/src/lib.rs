//! # Attendly CLI
//!
//! Database seeding utilities for Attendly development and demos.
//!
//! ```ignore
//! use attendly_cli::seeder::{seed_all, SeedConfig};
//!
//! let config = SeedConfig::new(3).with_students_per_group(20);
//! seed_all(&pool, &config).await?;
//! ```

pub mod seeder;
