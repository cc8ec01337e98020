pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod estimate;
mod http;
pub mod listings;
pub mod notifier;
pub mod sessions;
pub mod telemetry;
pub mod users;

pub use app::HouseFinder;
