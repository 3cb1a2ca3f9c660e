pub mod config;
pub mod error;
pub mod routes;

pub use crate::config::ServerConfig;
pub use crate::error::{ApiError, ApiResult};
pub use crate::routes::{router, AppState};
