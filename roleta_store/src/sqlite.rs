use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use tracing::{debug, info};

use roleta_core::{
    derive_hash_hex, generate_server_seed,
    store::{asset_id, asset_url, duplicate_slug, DUPLICATE_ATTEMPTS},
    Asset, PromotionStore, PromotionSummary, Promotion, SeedLedger, Session, SpinTicket, WheelError,
    WheelResult,
};

// Schema lives in migrations/ and is embedded at build time.

#[derive(sqlx::FromRow)]
struct PromotionRow {
    document: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct AssetRow {
    content_type: String,
    bytes: Vec<u8>,
}

#[derive(sqlx::FromRow)]
struct ParamsRow {
    server_seed: String,
    server_seed_hash: String,
    nonce: i64,
}

/// Promotions as JSON documents keyed by slug, plus assets and seed state.
#[derive(Clone)]
pub struct SqliteStore {
    db: SqlitePool,
    base_url: String,
}

fn db_err(e: sqlx::Error) -> WheelError {
    WheelError::upstream(e)
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

impl SqliteStore {
    pub async fn connect(url: &str, base_url: impl Into<String>) -> WheelResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(db_err)?
            .create_if_missing(true);
        let db = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(db_err)?;
        Self::init(db, base_url.into()).await
    }

    /// Private in-memory database. One connection, kept alive for the pool's life.
    pub async fn in_memory(base_url: impl Into<String>) -> WheelResult<Self> {
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(db_err)?;
        Self::init(db, base_url.into()).await
    }

    async fn init(db: SqlitePool, base_url: String) -> WheelResult<Self> {
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .map_err(WheelError::upstream)?;
        let store = Self { db, base_url };
        store.ensure_params().await?;
        Ok(store)
    }

    /// Seed the params row on first start and repair a stale hash.
    async fn ensure_params(&self) -> WheelResult<()> {
        match self.params().await? {
            None => {
                let seed = generate_server_seed();
                sqlx::query(
                    "INSERT INTO params (id, server_seed, server_seed_hash, nonce) VALUES (1, ?, ?, 0)",
                )
                .bind(&seed)
                .bind(derive_hash_hex(seed.as_bytes()))
                .execute(&self.db)
                .await
                .map_err(db_err)?;
                info!("generated initial server seed");
            }
            Some(p) => {
                let hash = derive_hash_hex(p.server_seed.as_bytes());
                if p.server_seed_hash != hash {
                    sqlx::query("UPDATE params SET server_seed_hash = ? WHERE id = 1")
                        .bind(hash)
                        .execute(&self.db)
                        .await
                        .map_err(db_err)?;
                }
            }
        }
        Ok(())
    }

    async fn params(&self) -> WheelResult<Option<ParamsRow>> {
        sqlx::query_as::<_, ParamsRow>("SELECT server_seed, server_seed_hash, nonce FROM params WHERE id = 1")
            .fetch_optional(&self.db)
            .await
            .map_err(db_err)
    }

    async fn insert(&self, promotion: &Promotion) -> Result<(), sqlx::Error> {
        let now = Utc::now();
        let document = serde_json::to_string(promotion).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        sqlx::query(
            "INSERT INTO promotions (slug, title, document, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&promotion.slug)
        .bind(&promotion.title)
        .bind(document)
        .bind(now)
        .bind(now)
        .execute(&self.db)
        .await?;
        Ok(())
    }
}

fn decode(row: &PromotionRow) -> WheelResult<Promotion> {
    serde_json::from_str(&row.document).map_err(WheelError::upstream)
}

#[async_trait]
impl PromotionStore for SqliteStore {
    async fn list(&self, _session: &Session, limit: usize, offset: usize) -> WheelResult<Vec<PromotionSummary>> {
        let rows = sqlx::query_as::<_, PromotionRow>(
            "SELECT document, created_at FROM promotions ORDER BY created_at ASC, rowid ASC LIMIT ? OFFSET ?",
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.db)
        .await
        .map_err(db_err)?;
        rows.iter()
            .map(|row| decode(row).map(|p| PromotionSummary::of(&p, row.created_at)))
            .collect()
    }

    async fn get(&self, slug: &str) -> WheelResult<Promotion> {
        let row = sqlx::query_as::<_, PromotionRow>("SELECT document, created_at FROM promotions WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| WheelError::NotFound(slug.to_string()))?;
        decode(&row)
    }

    async fn create(&self, _session: &Session, promotion: Promotion) -> WheelResult<String> {
        promotion.validate()?;
        match self.insert(&promotion).await {
            Ok(()) => {
                debug!(slug = %promotion.slug, "promotion created");
                Ok(promotion.slug)
            }
            Err(e) if is_unique_violation(&e) => Err(WheelError::Conflict(promotion.slug)),
            Err(e) => Err(db_err(e)),
        }
    }

    async fn update(&self, _session: &Session, slug: &str, promotion: Promotion) -> WheelResult<String> {
        promotion.validate()?;
        let document = serde_json::to_string(&promotion).map_err(WheelError::upstream)?;
        let result = sqlx::query(
            "UPDATE promotions SET slug = ?, title = ?, document = ?, updated_at = ? WHERE slug = ?",
        )
        .bind(&promotion.slug)
        .bind(&promotion.title)
        .bind(document)
        .bind(Utc::now())
        .bind(slug)
        .execute(&self.db)
        .await;
        match result {
            Ok(done) if done.rows_affected() == 0 => Err(WheelError::NotFound(slug.to_string())),
            Ok(_) => {
                debug!(%slug, new_slug = %promotion.slug, "promotion updated");
                Ok(promotion.slug)
            }
            Err(e) if is_unique_violation(&e) => Err(WheelError::Conflict(promotion.slug)),
            Err(e) => Err(db_err(e)),
        }
    }

    async fn duplicate(&self, _session: &Session, slug: &str) -> WheelResult<String> {
        let mut copy = self.get(slug).await?;
        for _ in 0..DUPLICATE_ATTEMPTS {
            copy.slug = duplicate_slug(slug);
            match self.insert(&copy).await {
                Ok(()) => {
                    debug!(%slug, new_slug = %copy.slug, "promotion duplicated");
                    return Ok(copy.slug);
                }
                Err(e) if is_unique_violation(&e) => continue,
                Err(e) => return Err(db_err(e)),
            }
        }
        Err(WheelError::Conflict(format!("no free copy slug for {slug}")))
    }

    async fn delete(&self, _session: &Session, slug: &str) -> WheelResult<()> {
        let done = sqlx::query("DELETE FROM promotions WHERE slug = ?")
            .bind(slug)
            .execute(&self.db)
            .await
            .map_err(db_err)?;
        if done.rows_affected() == 0 {
            return Err(WheelError::NotFound(slug.to_string()));
        }
        debug!(%slug, "promotion deleted");
        Ok(())
    }

    async fn upload_asset(&self, _session: &Session, bytes: Vec<u8>, content_type: &str) -> WheelResult<String> {
        let id = asset_id(&bytes);
        sqlx::query("INSERT OR IGNORE INTO assets (id, content_type, bytes, created_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(content_type)
            .bind(bytes)
            .bind(Utc::now())
            .execute(&self.db)
            .await
            .map_err(db_err)?;
        Ok(asset_url(&self.base_url, &id))
    }

    async fn fetch_asset(&self, id: &str) -> WheelResult<Asset> {
        let row = sqlx::query_as::<_, AssetRow>("SELECT content_type, bytes FROM assets WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| WheelError::NotFound(format!("asset {id}")))?;
        Ok(Asset {
            content_type: row.content_type,
            bytes: row.bytes,
        })
    }
}

#[async_trait]
impl SeedLedger for SqliteStore {
    async fn commit_spin(&self) -> WheelResult<SpinTicket> {
        let row = sqlx::query_as::<_, ParamsRow>(
            "UPDATE params SET nonce = nonce + 1 WHERE id = 1 RETURNING server_seed, server_seed_hash, nonce",
        )
        .fetch_one(&self.db)
        .await
        .map_err(db_err)?;
        Ok(SpinTicket {
            server_seed: row.server_seed,
            server_seed_hash: row.server_seed_hash,
            nonce: row.nonce as u64,
        })
    }

    async fn server_seed_hash(&self) -> WheelResult<String> {
        self.params()
            .await?
            .map(|p| p.server_seed_hash)
            .ok_or_else(|| WheelError::UpstreamFailure("seed params missing".into()))
    }

    async fn rotate(&self, new_seed: &str) -> WheelResult<String> {
        let hash = derive_hash_hex(new_seed.as_bytes());
        sqlx::query("UPDATE params SET server_seed = ?, server_seed_hash = ?, nonce = 0 WHERE id = 1")
            .bind(new_seed)
            .bind(&hash)
            .execute(&self.db)
            .await
            .map_err(db_err)?;
        info!(server_seed_hash = %hash, "server seed rotated");
        Ok(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roleta_core::PrizeOption;

    fn session() -> Session {
        Session::new("token")
    }

    async fn store() -> SqliteStore {
        SqliteStore::in_memory("http://localhost:8080").await.unwrap()
    }

    #[tokio::test]
    async fn round_trip_preserves_options() {
        let store = store().await;
        let p = Promotion::starter("launch", "Launch");
        store.create(&session(), p.clone()).await.unwrap();
        assert_eq!(store.get("launch").await.unwrap(), p);
    }

    #[tokio::test]
    async fn conflict_and_not_found() {
        let store = store().await;
        store.create(&session(), Promotion::new("x", "X")).await.unwrap();
        assert!(matches!(
            store.create(&session(), Promotion::new("x", "X")).await,
            Err(WheelError::Conflict(_))
        ));
        assert!(matches!(store.get("y").await, Err(WheelError::NotFound(_))));
        assert!(matches!(
            store.update(&session(), "y", Promotion::new("y", "Y")).await,
            Err(WheelError::NotFound(_))
        ));
        assert!(matches!(store.delete(&session(), "y").await, Err(WheelError::NotFound(_))));
    }

    #[tokio::test]
    async fn rename_keeps_listing_position() {
        let store = store().await;
        store.create(&session(), Promotion::new("first", "First")).await.unwrap();
        store.create(&session(), Promotion::new("second", "Second")).await.unwrap();

        let mut renamed = Promotion::new("first-v2", "First v2");
        renamed.push_option(PrizeOption::new("Only", 1.0, "#000"));
        store.update(&session(), "first", renamed).await.unwrap();
        assert!(matches!(
            store.update(&session(), "first-v2", Promotion::new("second", "S")).await,
            Err(WheelError::Conflict(_))
        ));

        let listed = store.list(&session(), 10, 0).await.unwrap();
        let slugs: Vec<_> = listed.iter().map(|s| s.slug.as_str()).collect();
        assert_eq!(slugs, vec!["first-v2", "second"]);
        assert_eq!(listed[0].prize_list, vec!["Only"]);
    }

    #[tokio::test]
    async fn duplicate_and_delete() {
        let store = store().await;
        store.create(&session(), Promotion::starter("s", "S")).await.unwrap();
        let copy = store.duplicate(&session(), "s").await.unwrap();
        assert_eq!(store.get(&copy).await.unwrap().options, store.get("s").await.unwrap().options);
        store.delete(&session(), "s").await.unwrap();
        assert!(store.get(&copy).await.is_ok());
    }

    #[tokio::test]
    async fn assets_round_trip() {
        let store = store().await;
        let url = store.upload_asset(&session(), vec![1, 2, 3], "image/png").await.unwrap();
        assert_eq!(url, store.upload_asset(&session(), vec![1, 2, 3], "image/png").await.unwrap());
        let id = url.rsplit('/').next().unwrap();
        assert_eq!(store.fetch_asset(id).await.unwrap().bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn seed_ledger() {
        let store = store().await;
        let first = store.commit_spin().await.unwrap();
        let second = store.commit_spin().await.unwrap();
        assert_eq!(second.nonce, first.nonce + 1);
        assert_eq!(first.server_seed_hash, derive_hash_hex(first.server_seed.as_bytes()));

        let hash = store.rotate("fresh").await.unwrap();
        assert_eq!(store.server_seed_hash().await.unwrap(), hash);
        let t = store.commit_spin().await.unwrap();
        assert_eq!((t.nonce, t.server_seed.as_str()), (1, "fresh"));
    }
}
