use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use roleta_core::{
    resolve, Promotion, PromotionStore, PromotionSummary, ProvablyFairRng, SeedLedger, Session, WheelError,
};
use roleta_shared::{ListQuery, SlugResponse, SpinQuery, SpinResponse, UploadResponse, VerifyResponse};

use crate::error::{ApiError, ApiResult};

const DEFAULT_MAX_UPLOAD: usize = 5 * 1024 * 1024;

pub struct AppState {
    pub store: Arc<dyn PromotionStore>,
    pub seeds: Arc<dyn SeedLedger>,
    api_key: String,
    max_upload_bytes: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn PromotionStore>, seeds: Arc<dyn SeedLedger>, api_key: impl Into<String>) -> Self {
        Self {
            store,
            seeds,
            api_key: api_key.into(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD,
        }
    }

    pub fn with_max_upload(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Turn the bearer header into the session handed to the store.
    fn authorize(&self, header: Option<TypedHeader<Authorization<Bearer>>>) -> ApiResult<Session> {
        match header {
            Some(TypedHeader(Authorization(bearer))) if tokens_match(bearer.token(), &self.api_key) => {
                Ok(Session::new(bearer.token()))
            }
            _ => Err(ApiError::Unauthorized),
        }
    }
}

/// Compare without an early exit on the first differing byte.
fn tokens_match(given: &str, expected: &str) -> bool {
    let (a, b) = (given.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

type Shared = State<Arc<AppState>>;
type BearerHeader = Option<TypedHeader<Authorization<Bearer>>>;

async fn route_verify(State(state): Shared) -> ApiResult<Json<VerifyResponse>> {
    Ok(Json(VerifyResponse {
        server_seed_hash: state.seeds.server_seed_hash().await?,
    }))
}

async fn route_list(
    State(state): Shared,
    auth: BearerHeader,
    Query(page): Query<ListQuery>,
) -> ApiResult<Json<Vec<PromotionSummary>>> {
    let session = state.authorize(auth)?;
    Ok(Json(state.store.list(&session, page.limit, page.offset).await?))
}

async fn route_get(State(state): Shared, Path(slug): Path<String>) -> ApiResult<Json<Promotion>> {
    Ok(Json(state.store.get(&slug).await?))
}

async fn route_create(
    State(state): Shared,
    auth: BearerHeader,
    Json(promotion): Json<Promotion>,
) -> ApiResult<(StatusCode, Json<SlugResponse>)> {
    let session = state.authorize(auth)?;
    let slug = state.store.create(&session, promotion).await?;
    info!(%slug, "created promotion");
    Ok((StatusCode::CREATED, Json(SlugResponse { slug })))
}

async fn route_update(
    State(state): Shared,
    auth: BearerHeader,
    Path(slug): Path<String>,
    Json(promotion): Json<Promotion>,
) -> ApiResult<Json<SlugResponse>> {
    let session = state.authorize(auth)?;
    let slug = state.store.update(&session, &slug, promotion).await?;
    Ok(Json(SlugResponse { slug }))
}

async fn route_delete(State(state): Shared, auth: BearerHeader, Path(slug): Path<String>) -> ApiResult<StatusCode> {
    let session = state.authorize(auth)?;
    state.store.delete(&session, &slug).await?;
    info!(%slug, "deleted promotion");
    Ok(StatusCode::NO_CONTENT)
}

async fn route_duplicate(
    State(state): Shared,
    auth: BearerHeader,
    Path(slug): Path<String>,
) -> ApiResult<(StatusCode, Json<SlugResponse>)> {
    let session = state.authorize(auth)?;
    let copy = state.store.duplicate(&session, &slug).await?;
    info!(%slug, %copy, "duplicated promotion");
    Ok((StatusCode::CREATED, Json(SlugResponse { slug: copy })))
}

async fn route_spin(
    State(state): Shared,
    Path(slug): Path<String>,
    Query(query): Query<SpinQuery>,
) -> ApiResult<Json<SpinResponse>> {
    let promotion = state.store.get(&slug).await?;
    if promotion.options.is_empty() {
        return Err(WheelError::invalid(format!("{slug} has no options to spin")).into());
    }
    let ticket = state.seeds.commit_spin().await?;
    let client_seed = query.client_seed.unwrap_or_else(|| slug.clone());
    let rng = ProvablyFairRng::new(&ticket.server_seed, &client_seed, ticket.nonce);
    let result = resolve(&promotion.options, &rng)?;
    info!(%slug, result, nonce = ticket.nonce, "spin");
    Ok(Json(SpinResponse {
        result,
        nonce: ticket.nonce,
        server_seed_hash: ticket.server_seed_hash,
        client_seed,
    }))
}

async fn route_upload(
    State(state): Shared,
    auth: BearerHeader,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let session = state.authorize(auth)?;
    if body.is_empty() {
        return Err(WheelError::invalid("empty upload").into());
    }
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream");
    let url = state.store.upload_asset(&session, body.to_vec(), content_type).await?;
    info!(%url, bytes = body.len(), "asset uploaded");
    Ok((StatusCode::CREATED, Json(UploadResponse { url })))
}

async fn route_asset(State(state): Shared, Path(id): Path<String>) -> ApiResult<impl IntoResponse> {
    let asset = state.store.fetch_asset(&id).await?;
    Ok(([(CONTENT_TYPE, asset.content_type)], asset.bytes))
}

pub fn router(state: Arc<AppState>) -> Router {
    let max_upload = state.max_upload_bytes;
    Router::new()
        .route("/api/verify", get(route_verify))
        .route("/api/roulettes", get(route_list).post(route_create))
        .route(
            "/api/roulettes/:slug",
            get(route_get).put(route_update).delete(route_delete),
        )
        .route("/api/roulettes/:slug/duplicate", post(route_duplicate))
        .route("/api/roulettes/:slug/spin", post(route_spin))
        .route("/api/assets", post(route_upload))
        .route("/api/assets/:id", get(route_asset))
        .layer(DefaultBodyLimit::max(max_upload))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use roleta_core::{verify_spin, PrizeOption};
    use roleta_shared::ErrorBody;
    use roleta_store::MemoryStore;
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    const KEY: &str = "test-key";

    fn app() -> Router {
        let store = Arc::new(MemoryStore::with_seed("", "test-seed"));
        router(Arc::new(AppState::new(store.clone(), store, KEY).with_max_upload(1024)))
    }

    fn request(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {KEY}"));
        match body {
            Some(json) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn read<T: DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn ab_wheel(slug: &str) -> serde_json::Value {
        let mut p = Promotion::new(slug, "A or B");
        p.push_option(PrizeOption::new("A", 70.0, "#f00"));
        p.push_option(PrizeOption::new("B", 30.0, "#0f0"));
        serde_json::to_value(p).unwrap()
    }

    #[tokio::test]
    async fn create_get_and_spin() {
        let app = app();
        let res = app.clone().oneshot(request("POST", "/api/roulettes", Some(ab_wheel("ab")))).await.unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(read::<SlugResponse>(res).await.slug, "ab");

        let res = app.clone().oneshot(request("GET", "/api/roulettes/ab", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let promotion: Promotion = read(res).await;
        assert_eq!(promotion.options.len(), 2);

        let res = app
            .clone()
            .oneshot(request("POST", "/api/roulettes/ab/spin?clientSeed=player", None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let spin: SpinResponse = read(res).await;
        assert_eq!(spin.nonce, 1);
        assert_eq!(spin.client_seed, "player");
        assert!(verify_spin("test-seed", "player", 1, &promotion.options, spin.result));

        let res = app.oneshot(request("POST", "/api/roulettes/ab/spin", None)).await.unwrap();
        let spin: SpinResponse = read(res).await;
        assert_eq!((spin.nonce, spin.client_seed.as_str()), (2, "ab"));
    }

    #[tokio::test]
    async fn error_statuses() {
        let app = app();
        let res = app.clone().oneshot(request("GET", "/api/roulettes/nope", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(read::<ErrorBody>(res).await.error, "not_found");

        app.clone().oneshot(request("POST", "/api/roulettes", Some(ab_wheel("taken")))).await.unwrap();
        let res = app.clone().oneshot(request("POST", "/api/roulettes", Some(ab_wheel("taken")))).await.unwrap();
        assert_eq!(res.status(), StatusCode::CONFLICT);

        let res = app
            .clone()
            .oneshot(request("POST", "/api/roulettes", Some(ab_wheel("bad slug"))))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = app
            .clone()
            .oneshot(request("POST", "/api/roulettes", Some(ab_wheel("promo%20x"))))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let mut huge = Promotion::new("huge", "Huge");
        huge.push_option(PrizeOption::new("A", 1e308, "#f00"));
        huge.push_option(PrizeOption::new("B", 1e308, "#0f0"));
        let res = app
            .clone()
            .oneshot(request("POST", "/api/roulettes", Some(serde_json::to_value(huge).unwrap())))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let empty = serde_json::to_value(Promotion::new("empty", "Empty")).unwrap();
        app.clone().oneshot(request("POST", "/api/roulettes", Some(empty))).await.unwrap();
        let res = app.oneshot(request("POST", "/api/roulettes/empty/spin", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read::<ErrorBody>(res).await.error, "invalid_input");
    }

    #[test]
    fn token_comparison() {
        assert!(tokens_match(KEY, KEY));
        assert!(!tokens_match("test-kez", KEY));
        assert!(!tokens_match("test", KEY));
        assert!(!tokens_match("", KEY));
    }

    #[tokio::test]
    async fn operator_routes_need_the_key() {
        let app = app();
        let anonymous = Request::builder()
            .method("POST")
            .uri("/api/roulettes")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(ab_wheel("x").to_string()))
            .unwrap();
        let res = app.clone().oneshot(anonymous).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let wrong = Request::builder()
            .uri("/api/roulettes")
            .header("authorization", "Bearer nope")
            .body(Body::empty())
            .unwrap();
        assert_eq!(app.clone().oneshot(wrong).await.unwrap().status(), StatusCode::UNAUTHORIZED);

        // public view stays open
        let res = app.oneshot(Request::get("/api/verify").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn duplicate_update_delete() {
        let app = app();
        app.clone().oneshot(request("POST", "/api/roulettes", Some(ab_wheel("base")))).await.unwrap();

        let res = app.clone().oneshot(request("POST", "/api/roulettes/base/duplicate", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let copy = read::<SlugResponse>(res).await.slug;
        assert!(copy.starts_with("base-copy-"));

        let res = app
            .clone()
            .oneshot(request("PUT", &format!("/api/roulettes/{copy}"), Some(ab_wheel("renamed"))))
            .await
            .unwrap();
        assert_eq!(read::<SlugResponse>(res).await.slug, "renamed");

        let res = app.clone().oneshot(request("GET", "/api/roulettes?limit=10", None)).await.unwrap();
        let listed: Vec<PromotionSummary> = read(res).await;
        let slugs: Vec<_> = listed.iter().map(|s| s.slug.as_str()).collect();
        assert_eq!(slugs, vec!["base", "renamed"]);

        let res = app.clone().oneshot(request("DELETE", "/api/roulettes/renamed", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        let res = app.oneshot(request("DELETE", "/api/roulettes/renamed", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn upload_and_serve_asset() {
        let app = app();
        let upload = Request::builder()
            .method("POST")
            .uri("/api/assets")
            .header("authorization", format!("Bearer {KEY}"))
            .header(CONTENT_TYPE, "image/png")
            .body(Body::from(vec![0x89, b'P', b'N', b'G']))
            .unwrap();
        let res = app.clone().oneshot(upload).await.unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let url = read::<UploadResponse>(res).await.url;
        assert!(url.starts_with("/api/assets/"));

        let res = app.clone().oneshot(Request::get(url.as_str()).body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[CONTENT_TYPE], "image/png");
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], &[0x89, b'P', b'N', b'G']);

        let too_big = Request::builder()
            .method("POST")
            .uri("/api/assets")
            .header("authorization", format!("Bearer {KEY}"))
            .body(Body::from(vec![0u8; 4096]))
            .unwrap();
        assert_eq!(app.oneshot(too_big).await.unwrap().status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
