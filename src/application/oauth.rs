use crate::domain::models::OAuthToken;
use crate::infrastructure::credential_store::CredentialStore;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::oauth_client::{
    OAuthHttpClient, OAuthTokenResponse, ServiceAccountTokenRequest,
};
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};

const TOKEN_EXPIRY_SKEW_SECONDS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnsureTokenResult {
    Cached(OAuthToken),
    Issued(OAuthToken),
}

impl EnsureTokenResult {
    pub fn into_token(self) -> OAuthToken {
        match self {
            Self::Cached(token) | Self::Issued(token) => token,
        }
    }
}

type NowProvider = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Trades the stored service-account key for short-lived access tokens and caches them.
pub struct ServiceAccountAuthenticator<S, C>
where
    S: CredentialStore + ?Sized,
    C: OAuthHttpClient + ?Sized,
{
    scopes: Vec<String>,
    credential_store: Arc<S>,
    oauth_client: Arc<C>,
    cached_token: Mutex<Option<OAuthToken>>,
    now_provider: NowProvider,
}

impl<S, C> ServiceAccountAuthenticator<S, C>
where
    S: CredentialStore + ?Sized,
    C: OAuthHttpClient + ?Sized,
{
    pub fn new(scopes: Vec<String>, credential_store: Arc<S>, oauth_client: Arc<C>) -> Self {
        Self {
            scopes,
            credential_store,
            oauth_client,
            cached_token: Mutex::new(None),
            now_provider: Arc::new(Utc::now),
        }
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    pub fn is_token_valid(&self, token: &OAuthToken) -> bool {
        token.is_valid_at((self.now_provider)(), TOKEN_EXPIRY_SKEW_SECONDS)
    }

    pub async fn ensure_access_token(&self) -> Result<EnsureTokenResult, InfraError> {
        if let Some(token) = self.cached()? {
            if self.is_token_valid(&token) {
                return Ok(EnsureTokenResult::Cached(token));
            }
        }

        if self.scopes.is_empty() {
            return Err(InfraError::OAuth("at least one scope is required".to_string()));
        }
        let key = self.credential_store.load_service_account()?.ok_or_else(|| {
            InfraError::Credential("google service account credentials are not configured".to_string())
        })?;

        let issued_at = (self.now_provider)();
        let response = self
            .oauth_client
            .exchange_service_account_assertion(ServiceAccountTokenRequest {
                key,
                scopes: self.scopes.clone(),
                issued_at,
            })
            .await?;

        let token = Self::token_from_response(response, issued_at);
        let mut guard = self
            .cached_token
            .lock()
            .map_err(|error| InfraError::OAuth(format!("token cache lock poisoned: {error}")))?;
        *guard = Some(token.clone());
        Ok(EnsureTokenResult::Issued(token))
    }

    pub fn clear_cached_token(&self) -> Result<(), InfraError> {
        let mut guard = self
            .cached_token
            .lock()
            .map_err(|error| InfraError::OAuth(format!("token cache lock poisoned: {error}")))?;
        *guard = None;
        Ok(())
    }

    fn cached(&self) -> Result<Option<OAuthToken>, InfraError> {
        let guard = self
            .cached_token
            .lock()
            .map_err(|error| InfraError::OAuth(format!("token cache lock poisoned: {error}")))?;
        Ok(guard.clone())
    }

    fn token_from_response(response: OAuthTokenResponse, issued_at: DateTime<Utc>) -> OAuthToken {
        OAuthToken {
            access_token: response.access_token,
            expires_at: issued_at + Duration::seconds(response.expires_in.max(0)),
            token_type: response.token_type.unwrap_or_else(|| "Bearer".to_string()),
        }
    }
}
