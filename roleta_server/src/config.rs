use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use roleta_core::derive_hash_hex;
use roleta_store::{MemoryStore, SqliteStore};

use crate::routes::AppState;

/// Backend name that selects the in-process store instead of SQLite.
pub const MEMORY_BACKEND: &str = "memory";

#[derive(Parser, Debug, Clone)]
#[command(name = "roleta-server", about = "REST service for prize wheel promotions")]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "BIND", default_value = "127.0.0.1:8080")]
    pub bind: String,
    /// SQLite url, or `memory` for a throwaway in-process store
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://roleta.db")]
    pub database_url: String,
    /// Bearer token required by operator endpoints
    #[arg(long, env = "API_KEY", default_value = "dev-key", hide_env_values = true)]
    pub api_key: String,
    /// Pin the provably-fair server seed; kept from the database when unset
    #[arg(long, env = "SERVER_SEED", hide_env_values = true)]
    pub server_seed: Option<String>,
    /// Prefix for uploaded asset urls, e.g. https://wheels.example.com
    #[arg(long, env = "PUBLIC_URL", default_value = "")]
    pub public_url: String,
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = 5 * 1024 * 1024)]
    pub max_upload_bytes: usize,
    /// tracing filter directives
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log: String,
}

impl ServerConfig {
    pub async fn build_state(&self) -> anyhow::Result<Arc<AppState>> {
        let state = if self.database_url == MEMORY_BACKEND {
            info!("using in-memory store");
            let store = Arc::new(MemoryStore::new(self.public_url.clone()));
            AppState::new(store.clone(), store, self.api_key.clone())
        } else {
            info!(url = %self.database_url, "using sqlite store");
            let store = Arc::new(
                SqliteStore::connect(&self.database_url, self.public_url.clone())
                    .await
                    .context("opening database")?,
            );
            AppState::new(store.clone(), store, self.api_key.clone())
        };

        if let Some(seed) = &self.server_seed {
            let current = state.seeds.server_seed_hash().await?;
            if current != derive_hash_hex(seed.as_bytes()) {
                let hash = state.seeds.rotate(seed).await?;
                info!(server_seed_hash = %hash, "installed configured server seed");
            }
        }
        Ok(Arc::new(state.with_max_upload(self.max_upload_bytes)))
    }
}
