//! OAuth 2.0 token endpoint and identity lookup

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Method;
use socialpub_core::OAuthClient;
use socialpub_domain::{PlatformError, PlatformIdentity, TokenGrant};
use tracing::{debug, instrument};
use url::Url;

use super::types::{TokenResponse, UserInfoResponse};
use super::{error_from_response, LinkedInEndpoints};
use crate::http::HttpClient;

const TOKEN_PATH: &str = "oauth/v2/accessToken";
const AUTHORIZATION_PATH: &str = "oauth/v2/authorization";
const USERINFO_PATH: &str = "v2/userinfo";

/// Authorization-code client for the LinkedIn OAuth endpoints
///
/// Token requests are form encoded and sent through the retrying client.
/// Token values never appear in log output.
pub struct LinkedInOAuthClient {
    http: HttpClient,
    endpoints: LinkedInEndpoints,
}

impl LinkedInOAuthClient {
    pub fn new(http: HttpClient, endpoints: LinkedInEndpoints) -> Self {
        Self { http, endpoints }
    }

    /// Build the URL the subject visits to grant access.
    ///
    /// # Errors
    /// Returns `PlatformError::Config` if the OAuth base URL is unusable.
    pub fn authorization_url(&self, state: &str) -> Result<Url, PlatformError> {
        let mut url = Url::parse(&self.endpoints.oauth(AUTHORIZATION_PATH))
            .map_err(|err| PlatformError::Config(format!("invalid authorization URL: {err}")))?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", self.endpoints.client_id())
            .append_pair("redirect_uri", self.endpoints.redirect_uri())
            .append_pair("state", state)
            .append_pair("scope", &self.endpoints.scopes().join(" "));
        Ok(url)
    }

    async fn token_request(
        &self,
        grant_type: &str,
        params: &[(&str, &str)],
    ) -> Result<TokenGrant, PlatformError> {
        let mut form: Vec<(&str, &str)> = Vec::with_capacity(params.len() + 3);
        form.push(("grant_type", grant_type));
        form.extend_from_slice(params);
        form.push(("client_id", self.endpoints.client_id()));
        if let Some(secret) = self.endpoints.client_secret() {
            form.push(("client_secret", secret));
        }

        let request = self
            .http
            .request(Method::POST, self.endpoints.oauth(TOKEN_PATH))
            .header(ACCEPT, "application/json")
            .form(&form);

        let response = self.http.send(request).await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|err| PlatformError::InvalidResponse(format!("token response: {err}")))?;
        debug!(grant_type, expires_in = token.expires_in, "token endpoint issued grant");
        Ok(token.into())
    }
}

#[async_trait]
impl OAuthClient for LinkedInOAuthClient {
    #[instrument(skip_all)]
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenGrant, PlatformError> {
        self.token_request("refresh_token", &[("refresh_token", refresh_token)]).await
    }

    #[instrument(skip_all)]
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, PlatformError> {
        let redirect_uri = self.endpoints.redirect_uri().to_string();
        self.token_request("authorization_code", &[("code", code), ("redirect_uri", &redirect_uri)])
            .await
    }

    #[instrument(skip_all)]
    async fn fetch_identity(&self, access_token: &str) -> Result<PlatformIdentity, PlatformError> {
        let request = self
            .http
            .request(Method::GET, self.endpoints.api(USERINFO_PATH))
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json");

        let response = self.http.send(request).await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let info: UserInfoResponse = response
            .json()
            .await
            .map_err(|err| PlatformError::InvalidResponse(format!("userinfo response: {err}")))?;
        if info.sub.trim().is_empty() {
            return Err(PlatformError::InvalidResponse("userinfo response has empty sub".into()));
        }

        Ok(PlatformIdentity { member_id: info.sub, name: info.name, email: info.email })
    }
}
