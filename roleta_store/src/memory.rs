use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use roleta_core::{
    derive_hash_hex, generate_server_seed,
    store::{asset_id, asset_url, free_duplicate_slug},
    Asset, PromotionStore, PromotionSummary, Promotion, SeedLedger, Session, SpinTicket, WheelError,
    WheelResult,
};

struct Entry {
    promotion: Promotion,
    created_at: DateTime<Utc>,
}

struct Seeds {
    server_seed: String,
    server_seed_hash: String,
    nonce: u64,
}

/// Process-local store. Nothing survives a restart; used for demos and tests.
pub struct MemoryStore {
    base_url: String,
    // insertion order is listing order
    promotions: RwLock<Vec<Entry>>,
    assets: RwLock<HashMap<String, Asset>>,
    seeds: Mutex<Seeds>,
}

impl MemoryStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_seed(base_url, generate_server_seed())
    }

    pub fn with_seed(base_url: impl Into<String>, server_seed: impl Into<String>) -> Self {
        let server_seed = server_seed.into();
        Self {
            base_url: base_url.into(),
            promotions: RwLock::new(Vec::new()),
            assets: RwLock::new(HashMap::new()),
            seeds: Mutex::new(Seeds {
                server_seed_hash: derive_hash_hex(server_seed.as_bytes()),
                server_seed,
                nonce: 0,
            }),
        }
    }
}

fn position(entries: &[Entry], slug: &str) -> Option<usize> {
    entries.iter().position(|e| e.promotion.slug == slug)
}

#[async_trait]
impl PromotionStore for MemoryStore {
    async fn list(&self, _session: &Session, limit: usize, offset: usize) -> WheelResult<Vec<PromotionSummary>> {
        let entries = self.promotions.read().await;
        Ok(entries
            .iter()
            .skip(offset)
            .take(limit)
            .map(|e| PromotionSummary::of(&e.promotion, e.created_at))
            .collect())
    }

    async fn get(&self, slug: &str) -> WheelResult<Promotion> {
        let entries = self.promotions.read().await;
        position(&entries, slug)
            .map(|i| entries[i].promotion.clone())
            .ok_or_else(|| WheelError::NotFound(slug.to_string()))
    }

    async fn create(&self, _session: &Session, promotion: Promotion) -> WheelResult<String> {
        promotion.validate()?;
        let mut entries = self.promotions.write().await;
        if position(&entries, &promotion.slug).is_some() {
            return Err(WheelError::Conflict(promotion.slug));
        }
        let slug = promotion.slug.clone();
        entries.push(Entry {
            promotion,
            created_at: Utc::now(),
        });
        debug!(%slug, "promotion created");
        Ok(slug)
    }

    async fn update(&self, _session: &Session, slug: &str, promotion: Promotion) -> WheelResult<String> {
        promotion.validate()?;
        let mut entries = self.promotions.write().await;
        let index = position(&entries, slug).ok_or_else(|| WheelError::NotFound(slug.to_string()))?;
        if promotion.slug != slug && position(&entries, &promotion.slug).is_some() {
            return Err(WheelError::Conflict(promotion.slug));
        }
        let new_slug = promotion.slug.clone();
        entries[index].promotion = promotion;
        debug!(%slug, %new_slug, "promotion updated");
        Ok(new_slug)
    }

    async fn duplicate(&self, _session: &Session, slug: &str) -> WheelResult<String> {
        let mut entries = self.promotions.write().await;
        let index = position(&entries, slug).ok_or_else(|| WheelError::NotFound(slug.to_string()))?;
        let new_slug = free_duplicate_slug(slug, |candidate| position(&entries, candidate).is_some())?;
        let mut copy = entries[index].promotion.clone();
        copy.slug = new_slug.clone();
        entries.push(Entry {
            promotion: copy,
            created_at: Utc::now(),
        });
        debug!(%slug, %new_slug, "promotion duplicated");
        Ok(new_slug)
    }

    async fn delete(&self, _session: &Session, slug: &str) -> WheelResult<()> {
        let mut entries = self.promotions.write().await;
        let index = position(&entries, slug).ok_or_else(|| WheelError::NotFound(slug.to_string()))?;
        entries.remove(index);
        debug!(%slug, "promotion deleted");
        Ok(())
    }

    async fn upload_asset(&self, _session: &Session, bytes: Vec<u8>, content_type: &str) -> WheelResult<String> {
        let id = asset_id(&bytes);
        self.assets.write().await.entry(id.clone()).or_insert_with(|| Asset {
            content_type: content_type.to_string(),
            bytes,
        });
        Ok(asset_url(&self.base_url, &id))
    }

    async fn fetch_asset(&self, id: &str) -> WheelResult<Asset> {
        self.assets
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| WheelError::NotFound(format!("asset {id}")))
    }
}

#[async_trait]
impl SeedLedger for MemoryStore {
    async fn commit_spin(&self) -> WheelResult<SpinTicket> {
        let mut seeds = self.seeds.lock().await;
        seeds.nonce += 1;
        Ok(SpinTicket {
            server_seed: seeds.server_seed.clone(),
            server_seed_hash: seeds.server_seed_hash.clone(),
            nonce: seeds.nonce,
        })
    }

    async fn server_seed_hash(&self) -> WheelResult<String> {
        Ok(self.seeds.lock().await.server_seed_hash.clone())
    }

    async fn rotate(&self, new_seed: &str) -> WheelResult<String> {
        let mut seeds = self.seeds.lock().await;
        seeds.server_seed = new_seed.to_string();
        seeds.server_seed_hash = derive_hash_hex(new_seed.as_bytes());
        seeds.nonce = 0;
        Ok(seeds.server_seed_hash.clone())
    }
}
