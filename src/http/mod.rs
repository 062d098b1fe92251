pub mod models;
mod handlers;
mod render;
pub mod server;
pub mod main;

// Re-export commonly used types
pub use models::*;
pub use handlers::AppState;
