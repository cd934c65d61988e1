//! API Routes
//!
//! Route handlers organized by functionality.

pub mod assistant;
pub mod contributors;
pub mod features;
pub mod health;
pub mod legal;
pub mod uploads;
pub mod usage;
