//! Persistence seams. The resolver never touches these; servers and tools
//! pick an adapter and hand it around as `Arc<dyn PromotionStore>`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

use crate::{
    error::{WheelError, WheelResult},
    rng::derive_hash_hex,
    wheel::Promotion,
};

/// Caller credentials, passed explicitly into every operator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

/// One row of the operator dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionSummary {
    pub slug: String,
    pub title: String,
    pub favicon_url: String,
    pub created_at: DateTime<Utc>,
    pub prize_list: Vec<String>,
}

impl PromotionSummary {
    pub fn of(promotion: &Promotion, created_at: DateTime<Utc>) -> Self {
        Self {
            slug: promotion.slug.clone(),
            title: promotion.title.clone(),
            favicon_url: promotion.favicon_url.clone(),
            created_at,
            prize_list: promotion.prize_list(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Everything needed to derive, and later verify, one spin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpinTicket {
    pub server_seed: String,
    pub server_seed_hash: String,
    pub nonce: u64,
}

#[async_trait]
pub trait PromotionStore: Send + Sync {
    async fn list(&self, session: &Session, limit: usize, offset: usize) -> WheelResult<Vec<PromotionSummary>>;

    async fn get(&self, slug: &str) -> WheelResult<Promotion>;

    /// Returns the slug it was stored under.
    async fn create(&self, session: &Session, promotion: Promotion) -> WheelResult<String>;

    /// Last write wins. `promotion.slug` may differ from `slug` to rename.
    async fn update(&self, session: &Session, slug: &str, promotion: Promotion) -> WheelResult<String>;

    /// Deep copy under a freshly generated slug, which is returned.
    async fn duplicate(&self, session: &Session, slug: &str) -> WheelResult<String>;

    async fn delete(&self, session: &Session, slug: &str) -> WheelResult<()>;

    /// Returns a retrievable url.
    async fn upload_asset(&self, session: &Session, bytes: Vec<u8>, content_type: &str) -> WheelResult<String>;

    async fn fetch_asset(&self, id: &str) -> WheelResult<Asset>;
}

#[async_trait]
pub trait SeedLedger: Send + Sync {
    /// Advance the nonce by one and hand out the seed it pairs with.
    async fn commit_spin(&self) -> WheelResult<SpinTicket>;

    async fn server_seed_hash(&self) -> WheelResult<String>;

    /// Install a new server seed and restart the nonce at zero.
    async fn rotate(&self, new_seed: &str) -> WheelResult<String>;
}

/// Content address of an uploaded asset.
pub fn asset_id(bytes: &[u8]) -> String {
    derive_hash_hex(bytes)
}

pub fn asset_url(base_url: &str, id: &str) -> String {
    format!("{}/api/assets/{id}", base_url.trim_end_matches('/'))
}

/// `<slug>-copy-xxxxx` with five random lowercase alphanumerics.
pub fn duplicate_slug(slug: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(5)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{slug}-copy-{suffix}")
}

/// Copy slugs drawn before `duplicate` gives up.
pub const DUPLICATE_ATTEMPTS: usize = 8;

/// Draw copy slugs until `taken` rejects none; a wheel whose copies keep
/// colliding reports `Conflict`.
pub fn free_duplicate_slug(slug: &str, mut taken: impl FnMut(&str) -> bool) -> WheelResult<String> {
    for _ in 0..DUPLICATE_ATTEMPTS {
        let candidate = duplicate_slug(slug);
        if !taken(&candidate) {
            return Ok(candidate);
        }
    }
    Err(WheelError::Conflict(format!("no free copy slug for {slug}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wheel::validate_slug;

    #[test]
    fn duplicate_slug_shape() {
        let s = duplicate_slug("summer");
        let suffix = s.strip_prefix("summer-copy-").unwrap();
        assert_eq!(suffix.len(), 5);
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert_eq!(validate_slug(&s), Ok(()));
    }

    #[test]
    fn duplicate_slug_retries_then_conflicts() {
        let mut calls = 0;
        let s = free_duplicate_slug("summer", |_| {
            calls += 1;
            calls < 3
        })
        .unwrap();
        assert!(s.starts_with("summer-copy-"));
        assert_eq!(calls, 3);

        let mut calls = 0;
        let err = free_duplicate_slug("summer", |_| {
            calls += 1;
            true
        });
        assert!(matches!(err, Err(WheelError::Conflict(_))));
        assert_eq!(calls, DUPLICATE_ATTEMPTS);
    }

    #[test]
    fn asset_ids_are_content_addressed() {
        assert_eq!(asset_id(b"logo"), asset_id(b"logo"));
        assert_ne!(asset_id(b"logo"), asset_id(b"logo2"));
        assert_eq!(
            asset_url("http://localhost:8080/", "abc"),
            "http://localhost:8080/api/assets/abc"
        );
        assert_eq!(asset_url("", "abc"), "/api/assets/abc");
    }

    #[test]
    fn summary_lists_prizes_in_order() {
        let p = Promotion::starter("s", "S");
        let summary = PromotionSummary::of(&p, Utc::now());
        assert_eq!(summary.prize_list.first().map(String::as_str), Some("No Prize"));
        assert_eq!(summary.prize_list.len(), 8);
    }
}
