pub mod api;
pub mod config;
pub mod error;
pub mod geo;
pub mod jobs;
pub mod marketplace;
pub mod providers;
pub mod server;
pub mod shutdown;
pub mod uploads;

pub use error::{Result, YardworkError};
pub use marketplace::Marketplace;
