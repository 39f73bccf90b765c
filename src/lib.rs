pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ui;

use application::commands::{
    AppState, FormQuery, WateringForm, render_form_impl, render_invalid_form_impl,
    submit_watering_impl,
};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use infrastructure::error::InfraError;
use infrastructure::settings::AppSettings;
use std::sync::Arc;
use tokio::net::TcpListener;

pub use infrastructure::error::InfraError as Error;

type SharedState = Arc<AppState>;

async fn ping() -> &'static str {
    "pong"
}

async fn show_form(State(state): State<SharedState>, Query(query): Query<FormQuery>) -> Response {
    match render_form_impl(&state, query) {
        Ok(html) => Html(html).into_response(),
        Err(error) => {
            (StatusCode::BAD_REQUEST, Html(render_invalid_form_impl(&state, "render_form", &error))).into_response()
        }
    }
}

async fn submit_watering(State(state): State<SharedState>, Form(form): Form<WateringForm>) -> Response {
    match submit_watering_impl(&state, form).await {
        Ok(html) => Html(html).into_response(),
        Err(error) => (StatusCode::BAD_REQUEST, Html(render_invalid_form_impl(&state, "submit", &error))).into_response(),
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(show_form))
        .route("/submit", post(submit_watering))
        .route("/ping", get(ping))
        .with_state(state)
}

pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub async fn run() -> Result<(), InfraError> {
    let settings = AppSettings::from_env()?;
    let bind_addr = settings.bind_addr;
    let state = Arc::new(AppState::new(settings)?);

    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!(
        %bind_addr,
        workspace = %state.settings().workspace_root.display(),
        spreadsheet_id = %state.settings().spreadsheet_id,
        "watering planner listening"
    );
    axum::serve(listener, router(state)).await?;
    Ok(())
}
