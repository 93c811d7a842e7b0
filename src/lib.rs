pub mod analysis;
pub mod app;
pub mod auth;
pub mod challenges;
pub mod errors;
pub mod habits;
pub mod journal;
pub mod models;
pub mod stats;
pub mod storage;
pub mod state;

pub use app::router;
pub use state::AppState;
pub use storage::{load_data, resolve_data_path};
