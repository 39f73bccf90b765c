use crate::infrastructure::credential_store::ServiceAccountKey;
use crate::infrastructure::error::InfraError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECONDS: i64 = 3600;

#[derive(Debug, Clone)]
pub struct ServiceAccountTokenRequest {
    pub key: ServiceAccountKey,
    pub scopes: Vec<String>,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct OAuthTokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub token_type: Option<String>,
}

#[async_trait]
pub trait OAuthHttpClient: Send + Sync {
    async fn exchange_service_account_assertion(
        &self,
        request: ServiceAccountTokenRequest,
    ) -> Result<OAuthTokenResponse, InfraError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestOAuthClient {
    client: Client,
}

#[derive(Debug, serde::Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, serde::Deserialize)]
struct GoogleTokenResponsePayload {
    access_token: Option<String>,
    expires_in: Option<i64>,
    token_type: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Builds the RS256-signed JWT that Google trades for a service-account access token.
pub fn sign_assertion(request: &ServiceAccountTokenRequest) -> Result<String, InfraError> {
    if request.scopes.is_empty() {
        return Err(InfraError::OAuth("at least one scope is required".to_string()));
    }
    let key = &request.key;
    let iat = request.issued_at.timestamp();
    let claims = AssertionClaims {
        iss: &key.client_email,
        scope: request.scopes.join(" "),
        aud: &key.token_uri,
        iat,
        exp: iat + ASSERTION_LIFETIME_SECONDS,
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|error| InfraError::Credential(format!("invalid service account private key: {error}")))?;
    jsonwebtoken::encode(&header, &claims, &encoding_key)
        .map_err(|error| InfraError::OAuth(format!("failed signing token assertion: {error}")))
}

impl ReqwestOAuthClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    async fn post_form(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<OAuthTokenResponse, InfraError> {
        let response = self
            .client
            .post(endpoint)
            .form(params)
            .send()
            .await
            .map_err(|error| InfraError::OAuth(format!("request failed: {error}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| InfraError::OAuth(format!("failed reading token response: {error}")))?;

        let parsed = serde_json::from_str::<GoogleTokenResponsePayload>(&body).map_err(|error| {
            InfraError::OAuth(format!("invalid token response payload: {error}; body={body}"))
        })?;

        if !status.is_success() || parsed.error.is_some() {
            let code = parsed.error.unwrap_or_else(|| format!("http_{}", status.as_u16()));
            let detail = parsed.error_description.unwrap_or_else(|| body.clone());
            return Err(InfraError::OAuth(format!("token endpoint error: {code}; {detail}")));
        }

        let access_token = parsed
            .access_token
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| InfraError::OAuth("token response did not include access_token".to_string()))?;

        Ok(OAuthTokenResponse {
            access_token,
            expires_in: parsed.expires_in.unwrap_or(0).max(0),
            token_type: parsed.token_type,
        })
    }
}

#[async_trait]
impl OAuthHttpClient for ReqwestOAuthClient {
    async fn exchange_service_account_assertion(
        &self,
        request: ServiceAccountTokenRequest,
    ) -> Result<OAuthTokenResponse, InfraError> {
        let assertion = sign_assertion(&request)?;
        self.post_form(
            &request.key.token_uri,
            &[
                ("grant_type", JWT_BEARER_GRANT.to_string()),
                ("assertion", assertion),
            ],
        )
        .await
    }
}
