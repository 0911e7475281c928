//! Media and post endpoints of the LinkedIn v2 API

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Response};
use serde_json::{json, Value};
use socialpub_core::{MediaApi, PostApi};
use socialpub_domain::{
    CreatedPost, MediaKind, MediaPayload, PlatformAssetStatus, PlatformError, PostRequest,
    UploadRegistration, UploadTarget, Visibility,
};
use tracing::{debug, instrument};

use super::types::{
    AssetResponse, CreatedPostBody, RegisterUploadRequest, RegisterUploadResponse,
    UPLOAD_MECHANISM_KEY,
};
use super::{
    error_from_response, LinkedInEndpoints, IDEMPOTENCY_HEADER, RESTLI_ID_HEADER,
    RESTLI_PROTOCOL_HEADER, RESTLI_PROTOCOL_VERSION,
};
use crate::http::HttpClient;

const REGISTER_UPLOAD_PATH: &str = "v2/assets?action=registerUpload";
const ASSETS_PATH: &str = "v2/assets";
const UGC_POSTS_PATH: &str = "v2/ugcPosts";

/// REST client for media registration, upload, status and post creation
pub struct LinkedInClient {
    http: HttpClient,
    endpoints: LinkedInEndpoints,
}

impl LinkedInClient {
    pub fn new(http: HttpClient, endpoints: LinkedInEndpoints) -> Self {
        Self { http, endpoints }
    }

    fn api_request(&self, method: Method, path: &str, access_token: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.endpoints.api(path))
            .bearer_auth(access_token)
            .header(RESTLI_PROTOCOL_HEADER, RESTLI_PROTOCOL_VERSION)
    }
}

#[async_trait]
impl MediaApi for LinkedInClient {
    #[instrument(skip(self, access_token))]
    async fn register_upload(
        &self,
        access_token: &str,
        owner_urn: &str,
        kind: MediaKind,
    ) -> Result<UploadRegistration, PlatformError> {
        let request = self
            .api_request(Method::POST, REGISTER_UPLOAD_PATH, access_token)
            .json(&RegisterUploadRequest::new(owner_urn, kind.recipe()));

        let response = ensure_success(self.http.send(request).await?).await?;
        let body: RegisterUploadResponse = response
            .json()
            .await
            .map_err(|err| PlatformError::InvalidResponse(format!("registerUpload: {err}")))?;

        let mut mechanisms = body.value.upload_mechanism;
        let mechanism = match mechanisms.remove(UPLOAD_MECHANISM_KEY) {
            Some(mechanism) => mechanism,
            None => mechanisms.into_values().next().ok_or_else(|| {
                PlatformError::InvalidResponse("registerUpload returned no upload mechanism".into())
            })?,
        };

        debug!(asset_id = %body.value.asset, "upload registered");
        Ok(UploadRegistration {
            asset_id: body.value.asset,
            upload_target: UploadTarget { url: mechanism.upload_url, headers: mechanism.headers },
        })
    }

    #[instrument(skip_all, fields(bytes = payload.bytes.len()))]
    async fn upload(&self, target: &UploadTarget, payload: MediaPayload) -> Result<(), PlatformError> {
        let headers = header_map(target)?;
        let mut request = self.http.request(Method::PUT, &target.url).headers(headers);
        if !target.has_header(CONTENT_TYPE.as_str()) {
            request = request.header(CONTENT_TYPE, payload.content_type);
        }

        ensure_success(self.http.send_once(request.body(payload.bytes)).await?).await?;
        Ok(())
    }

    #[instrument(skip(self, access_token))]
    async fn asset_status(
        &self,
        access_token: &str,
        asset_id: &str,
    ) -> Result<PlatformAssetStatus, PlatformError> {
        let path = format!("{ASSETS_PATH}/{}", urlencoding::encode(asset_key(asset_id)));
        let request = self.api_request(Method::GET, &path, access_token);

        let response = ensure_success(self.http.send(request).await?).await?;
        let body: AssetResponse = response
            .json()
            .await
            .map_err(|err| PlatformError::InvalidResponse(format!("asset status: {err}")))?;
        Ok(body.into_status(asset_id))
    }
}

#[async_trait]
impl PostApi for LinkedInClient {
    #[instrument(skip_all, fields(media = request.media.len()))]
    async fn create_post(
        &self,
        access_token: &str,
        request: &PostRequest,
    ) -> Result<CreatedPost, PlatformError> {
        let mut builder = self
            .api_request(Method::POST, UGC_POSTS_PATH, access_token)
            .json(&ugc_post_body(request));
        if let Some(key) = request.idempotency_key.as_deref() {
            builder = builder.header(IDEMPOTENCY_HEADER, key);
        }

        let response = ensure_success(self.http.send(builder).await?).await?;
        let header_id = response
            .headers()
            .get(RESTLI_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .filter(|id| !id.is_empty());

        let post_id = match header_id {
            Some(id) => id,
            None => {
                let body: CreatedPostBody = response.json().await.unwrap_or_default();
                body.id.filter(|id| !id.is_empty()).ok_or_else(|| {
                    PlatformError::InvalidResponse("post created without an id".into())
                })?
            }
        };

        debug!(%post_id, "post created");
        Ok(CreatedPost { post_id })
    }
}

async fn ensure_success(response: Response) -> Result<Response, PlatformError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(error_from_response(response).await)
    }
}

fn header_map(target: &UploadTarget) -> Result<HeaderMap, PlatformError> {
    let mut headers = HeaderMap::with_capacity(target.headers.len());
    for (name, value) in &target.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| PlatformError::Config(format!("invalid upload header name: {err}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|err| PlatformError::Config(format!("invalid upload header value: {err}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// Path key of an asset: the id after the last `:` of its URN.
fn asset_key(asset_id: &str) -> &str {
    asset_id.rsplit(':').next().unwrap_or(asset_id)
}

const fn visibility_code(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::Public => "PUBLIC",
        Visibility::ConnectionsOnly => "CONNECTIONS",
    }
}

/// Build the `ugcPosts` creation payload.
fn ugc_post_body(request: &PostRequest) -> Value {
    let category = request.media.first().map_or("NONE", |m| m.kind.share_category());
    let media: Vec<Value> = request
        .media
        .iter()
        .map(|item| json!({ "status": "READY", "media": item.asset_id }))
        .collect();

    let mut share = json!({
        "shareCommentary": { "text": request.commentary },
        "shareMediaCategory": category,
    });
    if !media.is_empty() {
        share["media"] = Value::Array(media);
    }

    json!({
        "author": request.author_urn,
        "lifecycleState": "PUBLISHED",
        "specificContent": { "com.linkedin.ugc.ShareContent": share },
        "visibility": {
            "com.linkedin.ugc.MemberNetworkVisibility": visibility_code(request.visibility)
        }
    })
}
