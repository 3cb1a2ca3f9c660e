//! Interchangeable `PromotionStore` adapters.

mod http;
mod memory;
mod sqlite;

pub use crate::http::HttpStore;
pub use crate::memory::MemoryStore;
pub use crate::sqlite::SqliteStore;
