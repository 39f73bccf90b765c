use crate::application::bootstrap::bootstrap_workspace;
use crate::application::controller::{
    FormController, FormDefaults, MirrorStatus, SubmissionOutcome, SubmitRequest,
};
use crate::application::oauth::ServiceAccountAuthenticator;
use crate::application::remote_mirror::GoogleSheetsMirror;
use crate::domain::models::{PlantType, parse_date, validate_interval, validate_repeat};
use crate::infrastructure::config::JsonFileConfigRepository;
use crate::infrastructure::credential_store::TomlSecretsCredentialStore;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::oauth_client::ReqwestOAuthClient;
use crate::infrastructure::record_log::FileLogSink;
use crate::infrastructure::settings::AppSettings;
use crate::infrastructure::sheets_client::ReqwestGoogleSheetsClient;
use crate::ui::page::render_page;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const COMMAND_LOG: &str = "commands.log";

pub struct AppState {
    settings: AppSettings,
    logs_dir: PathBuf,
    controller: FormController,
    log_guard: Mutex<()>,
}

impl AppState {
    pub fn new(settings: AppSettings) -> Result<Self, InfraError> {
        let bootstrap = bootstrap_workspace(&settings.workspace_root)?;

        let config_repository = Arc::new(JsonFileConfigRepository::new(bootstrap.config_path));
        let log_sink = Arc::new(FileLogSink::new(bootstrap.records_path));
        let authenticator = ServiceAccountAuthenticator::new(
            settings.scopes.clone(),
            Arc::new(TomlSecretsCredentialStore::new(settings.secrets_path.clone())),
            Arc::new(ReqwestOAuthClient::new()),
        );
        let remote_mirror = Arc::new(GoogleSheetsMirror::new(
            authenticator,
            Arc::new(ReqwestGoogleSheetsClient::new()),
            settings.spreadsheet_id.clone(),
            settings.sheet_name.clone(),
        ));
        let controller = FormController::new(config_repository, log_sink, remote_mirror);

        Ok(Self::with_controller(settings, bootstrap.logs_dir, controller))
    }

    pub fn with_controller(settings: AppSettings, logs_dir: PathBuf, controller: FormController) -> Self {
        Self {
            settings,
            logs_dir,
            controller,
            log_guard: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    pub fn controller(&self) -> &FormController {
        &self.controller
    }

    pub fn command_error(&self, command: &str, error: &InfraError) -> String {
        self.log_error(command, &error.to_string());
        error.to_string()
    }

    pub fn log_info(&self, command: &str, message: &str) {
        tracing::info!(command, message, "command completed");
        self.append_log("info", command, message);
    }

    pub fn log_error(&self, command: &str, message: &str) {
        tracing::error!(command, message, "command failed");
        self.append_log("error", command, message);
    }

    fn append_log(&self, level: &str, command: &str, message: &str) {
        let Ok(_guard) = self.log_guard.lock() else {
            return;
        };
        if fs::create_dir_all(&self.logs_dir).is_err() {
            return;
        }
        let path = self.logs_dir.join(COMMAND_LOG);
        let payload = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level,
            "command": command,
            "message": message,
        });

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{}", payload);
        }
    }
}

/// Query string of `GET /`, reflecting the rain-override widgets between renders.
#[derive(Debug, Default, Deserialize)]
pub struct FormQuery {
    pub rain_override: Option<String>,
    pub rain_date: Option<String>,
}

/// `POST /submit` body. Missing selects arrive as empty strings and fail parsing as `InvalidForm`.
#[derive(Debug, Default, Deserialize)]
pub struct WateringForm {
    pub rain_override: Option<String>,
    pub rain_date: Option<String>,
    #[serde(default)]
    pub plant_type: String,
    #[serde(default)]
    pub interval: String,
    #[serde(default)]
    pub repeat: String,
}

fn is_checked(value: Option<&str>) -> bool {
    matches!(
        value.map(str::trim),
        Some("on" | "true" | "1" | "yes")
    )
}

fn parse_rain_date(rain_override: Option<&str>, rain_date: Option<&str>) -> Result<Option<NaiveDate>, InfraError> {
    if !is_checked(rain_override) {
        return Ok(None);
    }
    rain_date
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| parse_date(value, "rain_date").map_err(InfraError::InvalidForm))
        .transpose()
}

fn parse_option(raw: &str, field: &str) -> Result<u32, InfraError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|error| InfraError::InvalidForm(format!("{field} must be a number: {error}")))
}

/// Resolves a ticked override box with no date to the persisted default date.
fn resolve_rain_date(
    controller: &FormController,
    rain_override: Option<&str>,
    rain_date: Option<&str>,
) -> Result<Option<NaiveDate>, InfraError> {
    match parse_rain_date(rain_override, rain_date)? {
        Some(date) => Ok(Some(date)),
        None if is_checked(rain_override) => Ok(Some(controller.prefill(None).start_date)),
        None => Ok(None),
    }
}

pub fn parse_submit_request(controller: &FormController, form: &WateringForm) -> Result<SubmitRequest, InfraError> {
    let plant_type = PlantType::parse(&form.plant_type).ok_or_else(|| {
        InfraError::InvalidForm(format!("unknown plant type '{}'", form.plant_type.trim()))
    })?;
    let interval = parse_option(&form.interval, "interval")?;
    validate_interval(interval).map_err(InfraError::InvalidForm)?;
    let repeat = parse_option(&form.repeat, "repeat")?;
    validate_repeat(repeat).map_err(InfraError::InvalidForm)?;
    let rain_date = resolve_rain_date(controller, form.rain_override.as_deref(), form.rain_date.as_deref())?;

    Ok(SubmitRequest {
        plant_type,
        interval,
        repeat,
        rain_date,
    })
}

pub fn render_form_impl(state: &AppState, query: FormQuery) -> Result<String, InfraError> {
    let rain_date = resolve_rain_date(
        state.controller(),
        query.rain_override.as_deref(),
        query.rain_date.as_deref(),
    )?;
    let defaults = state.controller().prefill(rain_date);
    Ok(render_page(&defaults, None, None))
}

pub fn render_invalid_form_impl(state: &AppState, command: &str, error: &InfraError) -> String {
    let message = state.command_error(command, error);
    let defaults: FormDefaults = state.controller().prefill(None);
    render_page(&defaults, None, Some(&message))
}

pub async fn submit_watering_impl(state: &AppState, form: WateringForm) -> Result<String, InfraError> {
    let request = parse_submit_request(state.controller(), &form)?;
    let outcome = state.controller().submit(request.clone()).await;

    match &outcome {
        SubmissionOutcome::Displayed { report, mirror, .. } => {
            state.log_info("submit", &report.header.replace('\n', " | "));
            if let MirrorStatus::Failed(failure) = mirror {
                state.log_error("mirror", &failure.message);
            }
        }
        SubmissionOutcome::Failed { failure, .. } => {
            state.log_error(&format!("submit:{}", failure.step), &failure.message);
        }
    }

    let mut defaults = state.controller().prefill(request.rain_date);
    defaults.plant_type = request.plant_type;
    defaults.interval = request.interval;
    defaults.repeat = request.repeat;
    Ok(render_page(&defaults, Some(&outcome), None))
}
