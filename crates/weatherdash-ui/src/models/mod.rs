pub mod dashboard_model;

pub use dashboard_model::{CurrentPanel, DashboardModel, ForecastCard, FORECAST_SLOTS};
