use crate::infrastructure::error::InfraError;
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendRowResponse {
    pub updated_range: Option<String>,
    pub updated_rows: u32,
}

#[async_trait]
pub trait GoogleSheetsClient: Send + Sync {
    async fn list_worksheet_titles(
        &self,
        access_token: &str,
        spreadsheet_id: &str,
    ) -> Result<Vec<String>, InfraError>;

    async fn append_row(
        &self,
        access_token: &str,
        spreadsheet_id: &str,
        worksheet: &str,
        row: Vec<serde_json::Value>,
    ) -> Result<AppendRowResponse, InfraError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestGoogleSheetsClient {
    client: Client,
}

impl ReqwestGoogleSheetsClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    fn ensure_non_empty(value: &str, field: &str) -> Result<(), InfraError> {
        if value.trim().is_empty() {
            return Err(InfraError::Sheets(format!("{field} must not be empty")));
        }
        Ok(())
    }

    fn http_error(status: reqwest::StatusCode, body: &str) -> InfraError {
        let message = if body.trim().is_empty() {
            format!("google sheets api error: http {}", status.as_u16())
        } else {
            format!("google sheets api error: http {}; body={body}", status.as_u16())
        };
        InfraError::Sheets(message)
    }

    fn spreadsheet_endpoint(spreadsheet_id: &str) -> Result<Url, InfraError> {
        let mut url = Url::parse(SHEETS_API_BASE)
            .map_err(|error| InfraError::Sheets(format!("invalid sheets api base url: {error}")))?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                InfraError::Sheets("sheets api base URL cannot be a base".to_string())
            })?;
            segments.pop_if_empty();
            segments.push("spreadsheets");
            segments.push(spreadsheet_id);
        }
        Ok(url)
    }

    /// `A1` range covering the whole worksheet, quoted so titles with spaces or CJK survive.
    fn worksheet_range(worksheet: &str) -> String {
        format!("'{}'", worksheet.replace('\'', "''"))
    }

    fn append_endpoint(spreadsheet_id: &str, worksheet: &str) -> Result<Url, InfraError> {
        let mut url = Self::spreadsheet_endpoint(spreadsheet_id)?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                InfraError::Sheets("spreadsheet URL cannot be a base".to_string())
            })?;
            segments.push("values");
            segments.push(&format!("{}:append", Self::worksheet_range(worksheet)));
        }
        Ok(url)
    }
}

#[derive(Debug, serde::Deserialize)]
struct SpreadsheetMetadata {
    sheets: Option<Vec<SheetEntry>>,
}

#[derive(Debug, serde::Deserialize)]
struct SheetEntry {
    properties: Option<SheetProperties>,
}

#[derive(Debug, serde::Deserialize)]
struct SheetProperties {
    title: Option<String>,
}

#[derive(Debug, serde::Serialize)]
struct ValueRange<'a> {
    #[serde(rename = "majorDimension")]
    major_dimension: &'a str,
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, serde::Deserialize)]
struct AppendValuesResponse {
    updates: Option<AppendUpdates>,
}

#[derive(Debug, serde::Deserialize)]
struct AppendUpdates {
    #[serde(rename = "updatedRange")]
    updated_range: Option<String>,
    #[serde(rename = "updatedRows")]
    updated_rows: Option<u32>,
}

#[async_trait]
impl GoogleSheetsClient for ReqwestGoogleSheetsClient {
    async fn list_worksheet_titles(
        &self,
        access_token: &str,
        spreadsheet_id: &str,
    ) -> Result<Vec<String>, InfraError> {
        Self::ensure_non_empty(access_token, "access token")?;
        Self::ensure_non_empty(spreadsheet_id, "spreadsheet id")?;

        let endpoint = Self::spreadsheet_endpoint(spreadsheet_id)?;
        let response = self
            .client
            .get(endpoint)
            .query(&[("fields", "sheets.properties.title")])
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|error| InfraError::Sheets(format!("network error while opening spreadsheet: {error}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| InfraError::Sheets(format!("failed reading spreadsheet response: {error}")))?;

        if !status.is_success() {
            return Err(Self::http_error(status, &body));
        }

        let parsed: SpreadsheetMetadata = serde_json::from_str(&body).map_err(|error| {
            InfraError::Sheets(format!("invalid spreadsheet payload: {error}; body={body}"))
        })?;

        Ok(parsed
            .sheets
            .unwrap_or_default()
            .into_iter()
            .filter_map(|sheet| sheet.properties.and_then(|properties| properties.title))
            .collect())
    }

    async fn append_row(
        &self,
        access_token: &str,
        spreadsheet_id: &str,
        worksheet: &str,
        row: Vec<serde_json::Value>,
    ) -> Result<AppendRowResponse, InfraError> {
        Self::ensure_non_empty(access_token, "access token")?;
        Self::ensure_non_empty(spreadsheet_id, "spreadsheet id")?;
        Self::ensure_non_empty(worksheet, "worksheet name")?;

        let endpoint = Self::append_endpoint(spreadsheet_id, worksheet)?;
        let request = ValueRange {
            major_dimension: "ROWS",
            values: vec![row],
        };
        let response = self
            .client
            .post(endpoint)
            .query(&[("valueInputOption", "RAW")])
            .bearer_auth(access_token)
            .json(&request)
            .send()
            .await
            .map_err(|error| InfraError::Sheets(format!("network error while appending row: {error}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| InfraError::Sheets(format!("failed reading append response: {error}")))?;

        if !status.is_success() {
            return Err(Self::http_error(status, &body));
        }

        let parsed: AppendValuesResponse = serde_json::from_str(&body).map_err(|error| {
            InfraError::Sheets(format!("invalid append payload: {error}; body={body}"))
        })?;
        let updates = parsed.updates;
        Ok(AppendRowResponse {
            updated_range: updates.as_ref().and_then(|updates| updates.updated_range.clone()),
            updated_rows: updates.and_then(|updates| updates.updated_rows).unwrap_or(0),
        })
    }
}
