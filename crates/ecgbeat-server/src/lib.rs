pub mod app;
pub mod config;

pub use app::{router, AppState};
pub use config::{ServerArgs, ServerConfig};
