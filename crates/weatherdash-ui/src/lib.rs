//! Dashboard front end: services container, view model and text renderer.

pub mod app_services;
pub mod error_mapping;
pub mod models;
pub mod render;
pub mod services;

pub use app_services::AppServices;
pub use models::{CurrentPanel, DashboardModel, ForecastCard, FORECAST_SLOTS};
pub use render::render;
