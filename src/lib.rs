pub mod activity;
pub mod app;
pub mod config;
pub mod connection;
pub mod errors;
pub mod fetcher;
pub mod handlers;
pub mod models;
pub mod pipeline;
pub mod push;
pub mod render;
pub mod scheduler;
pub mod state;
pub mod storage;
pub mod ui;

pub use app::router;
pub use config::DashboardConfig;
pub use state::AppState;
pub use storage::{load_settings, resolve_data_path};
