use crate::application::oauth::ServiceAccountAuthenticator;
use crate::domain::models::WateringEvent;
use crate::infrastructure::credential_store::CredentialStore;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::oauth_client::OAuthHttpClient;
use crate::infrastructure::row_mapper::encode_watering_row;
use crate::infrastructure::sheets_client::GoogleSheetsClient;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait RemoteMirror: Send + Sync {
    async fn publish(&self, event: &WateringEvent) -> Result<(), InfraError>;
}

pub struct GoogleSheetsMirror<S, C, K>
where
    S: CredentialStore + ?Sized,
    C: OAuthHttpClient + ?Sized,
    K: GoogleSheetsClient + ?Sized,
{
    authenticator: ServiceAccountAuthenticator<S, C>,
    sheets_client: Arc<K>,
    spreadsheet_id: String,
    sheet_name: String,
}

impl<S, C, K> GoogleSheetsMirror<S, C, K>
where
    S: CredentialStore + ?Sized,
    C: OAuthHttpClient + ?Sized,
    K: GoogleSheetsClient + ?Sized,
{
    pub fn new(
        authenticator: ServiceAccountAuthenticator<S, C>,
        sheets_client: Arc<K>,
        spreadsheet_id: impl Into<String>,
        sheet_name: impl Into<String>,
    ) -> Self {
        Self {
            authenticator,
            sheets_client,
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: sheet_name.into(),
        }
    }
}

#[async_trait]
impl<S, C, K> RemoteMirror for GoogleSheetsMirror<S, C, K>
where
    S: CredentialStore + ?Sized,
    C: OAuthHttpClient + ?Sized,
    K: GoogleSheetsClient + ?Sized,
{
    async fn publish(&self, event: &WateringEvent) -> Result<(), InfraError> {
        let token = self.authenticator.ensure_access_token().await?.into_token();

        let titles = self
            .sheets_client
            .list_worksheet_titles(&token.access_token, &self.spreadsheet_id)
            .await?;
        if !titles.iter().any(|title| title == &self.sheet_name) {
            return Err(InfraError::WorksheetNotFound(self.sheet_name.clone()));
        }

        let response = self
            .sheets_client
            .append_row(
                &token.access_token,
                &self.spreadsheet_id,
                &self.sheet_name,
                encode_watering_row(event),
            )
            .await?;
        tracing::info!(
            spreadsheet_id = %self.spreadsheet_id,
            range = response.updated_range.as_deref().unwrap_or("-"),
            rows = response.updated_rows,
            "mirrored watering schedule"
        );
        Ok(())
    }
}
