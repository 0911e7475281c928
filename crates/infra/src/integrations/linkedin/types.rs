//! Wire types for the LinkedIn REST endpoints

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use socialpub_domain::{PlatformAssetStatus, TokenGrant};

/// Upload mechanism key inside a register-upload response.
pub(crate) const UPLOAD_MECHANISM_KEY: &str =
    "com.linkedin.digitalmedia.uploading.MediaUploadHttpRequest";

/// Body returned by `/oauth/v2/accessToken`
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl From<TokenResponse> for TokenGrant {
    fn from(value: TokenResponse) -> Self {
        Self {
            access_token: value.access_token,
            refresh_token: value.refresh_token.filter(|t| !t.is_empty()),
            expires_in_secs: value.expires_in,
            scope: value.scope,
        }
    }
}

/// Error body of the OAuth endpoints, e.g. `{"error":"invalid_grant"}`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct OAuthErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Error body of the REST API, e.g. `{"message":"...","status":403}`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub service_error_code: Option<i64>,
}

/// Body returned by `/v2/userinfo`
#[derive(Debug, Deserialize)]
pub(crate) struct UserInfoResponse {
    pub sub: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterUploadRequest {
    pub register_upload_request: RegisterUploadBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterUploadBody {
    pub recipes: Vec<String>,
    pub owner: String,
    pub service_relationships: Vec<ServiceRelationship>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ServiceRelationship {
    pub relationship_type: String,
    pub identifier: String,
}

impl RegisterUploadRequest {
    pub(crate) fn new(owner_urn: &str, recipe: &str) -> Self {
        Self {
            register_upload_request: RegisterUploadBody {
                recipes: vec![recipe.to_string()],
                owner: owner_urn.to_string(),
                service_relationships: vec![ServiceRelationship {
                    relationship_type: "OWNER".to_string(),
                    identifier: "urn:li:userGeneratedContent".to_string(),
                }],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterUploadResponse {
    pub value: RegisterUploadValue,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterUploadValue {
    pub asset: String,
    pub upload_mechanism: BTreeMap<String, UploadHttpRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UploadHttpRequest {
    pub upload_url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Body returned by `/v2/assets/{id}`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct AssetResponse {
    #[serde(default)]
    pub recipes: Vec<AssetRecipe>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssetRecipe {
    pub status: String,
}

impl AssetResponse {
    /// Collapse recipe states into one processing status.
    ///
    /// Any failed recipe fails the asset; the asset is ready once every
    /// recipe is available.
    pub(crate) fn into_status(self, asset_urn: &str) -> PlatformAssetStatus {
        let mut states: Vec<String> = self.recipes.into_iter().map(|r| r.status).collect();
        if states.is_empty() {
            if let Some(status) = self.status {
                states.push(status);
            }
        }

        if let Some(failed) = states.iter().find(|s| is_failed_state(s)) {
            return PlatformAssetStatus::Failed { reason: failed.clone() };
        }
        if !states.is_empty() && states.iter().all(|s| is_ready_state(s)) {
            return PlatformAssetStatus::Ready { asset_id: asset_urn.to_string() };
        }
        let status = states
            .into_iter()
            .find(|s| !is_ready_state(s))
            .unwrap_or_else(|| "UNKNOWN".to_string());
        PlatformAssetStatus::Pending { status }
    }
}

fn is_ready_state(state: &str) -> bool {
    matches!(state.to_ascii_uppercase().as_str(), "AVAILABLE" | "READY" | "ALLOWED")
}

fn is_failed_state(state: &str) -> bool {
    matches!(
        state.to_ascii_uppercase().as_str(),
        "FAILED" | "PROCESSING_FAILED" | "CLIENT_ERROR" | "INCOMPLETE"
    )
}

/// Body returned by `/v2/ugcPosts` when the id header is absent
#[derive(Debug, Default, Deserialize)]
pub(crate) struct CreatedPostBody {
    #[serde(default)]
    pub id: Option<String>,
}
