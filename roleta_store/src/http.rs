use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use roleta_core::{Asset, PromotionStore, PromotionSummary, Promotion, Session, WheelError, WheelResult};
use roleta_shared::{ErrorBody, SlugResponse, SpinResponse, UploadResponse, VerifyResponse};

/// Client for a remote roleta server; the store lives on the other side.
#[derive(Clone)]
pub struct HttpStore {
    client: Client,
    base_url: String,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// `{base}/api/{segments..}`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> WheelResult<Url> {
        let mut url = Url::parse(&self.base_url).map_err(WheelError::upstream)?;
        url.path_segments_mut()
            .map_err(|()| WheelError::upstream(format!("{} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> WheelResult<Response> {
        let response = request.send().await.map_err(WheelError::upstream)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.json::<ErrorBody>().await.ok();
        debug!(%status, ?body, "request rejected");
        Err(status_error(status, body))
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> WheelResult<T> {
        self.send(request).await?.json::<T>().await.map_err(WheelError::upstream)
    }

    /// Ask the server to draw; the result index points into `get(slug).options`.
    pub async fn spin(&self, slug: &str, client_seed: Option<&str>) -> WheelResult<SpinResponse> {
        let mut request = self.client.post(self.endpoint(&["roulettes", slug, "spin"])?);
        if let Some(seed) = client_seed {
            request = request.query(&[("clientSeed", seed)]);
        }
        self.json(request).await
    }

    pub async fn server_seed_hash(&self) -> WheelResult<String> {
        let verify: VerifyResponse = self.json(self.client.get(self.endpoint(&["verify"])?)).await?;
        Ok(verify.server_seed_hash)
    }
}

/// The server's own error kind wins; bare statuses (extractor rejections,
/// proxies) are mapped by code.
fn status_error(status: StatusCode, body: Option<ErrorBody>) -> WheelError {
    if let Some(body) = body {
        return body.into_wheel();
    }
    let reason = status.canonical_reason().unwrap_or("request failed").to_string();
    match status {
        StatusCode::NOT_FOUND => WheelError::NotFound(reason),
        StatusCode::CONFLICT => WheelError::Conflict(reason),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => WheelError::InvalidInput(reason),
        _ => WheelError::UpstreamFailure(status.to_string()),
    }
}

#[async_trait]
impl PromotionStore for HttpStore {
    async fn list(&self, session: &Session, limit: usize, offset: usize) -> WheelResult<Vec<PromotionSummary>> {
        let request = self
            .client
            .get(self.endpoint(&["roulettes"])?)
            .bearer_auth(session.token())
            .query(&[("limit", limit), ("offset", offset)]);
        self.json(request).await
    }

    async fn get(&self, slug: &str) -> WheelResult<Promotion> {
        self.json(self.client.get(self.endpoint(&["roulettes", slug])?)).await
    }

    async fn create(&self, session: &Session, promotion: Promotion) -> WheelResult<String> {
        let request = self
            .client
            .post(self.endpoint(&["roulettes"])?)
            .bearer_auth(session.token())
            .json(&promotion);
        let created: SlugResponse = self.json(request).await?;
        Ok(created.slug)
    }

    async fn update(&self, session: &Session, slug: &str, promotion: Promotion) -> WheelResult<String> {
        let request = self
            .client
            .put(self.endpoint(&["roulettes", slug])?)
            .bearer_auth(session.token())
            .json(&promotion);
        let updated: SlugResponse = self.json(request).await?;
        Ok(updated.slug)
    }

    async fn duplicate(&self, session: &Session, slug: &str) -> WheelResult<String> {
        let request = self
            .client
            .post(self.endpoint(&["roulettes", slug, "duplicate"])?)
            .bearer_auth(session.token());
        let created: SlugResponse = self.json(request).await?;
        Ok(created.slug)
    }

    async fn delete(&self, session: &Session, slug: &str) -> WheelResult<()> {
        let request = self
            .client
            .delete(self.endpoint(&["roulettes", slug])?)
            .bearer_auth(session.token());
        self.send(request).await?;
        Ok(())
    }

    async fn upload_asset(&self, session: &Session, bytes: Vec<u8>, content_type: &str) -> WheelResult<String> {
        let request = self
            .client
            .post(self.endpoint(&["assets"])?)
            .bearer_auth(session.token())
            .header(CONTENT_TYPE, content_type)
            .body(bytes);
        let uploaded: UploadResponse = self.json(request).await?;
        Ok(uploaded.url)
    }

    async fn fetch_asset(&self, id: &str) -> WheelResult<Asset> {
        let response = self.send(self.client.get(self.endpoint(&["assets", id])?)).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = response.bytes().await.map_err(WheelError::upstream)?;
        Ok(Asset {
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}
