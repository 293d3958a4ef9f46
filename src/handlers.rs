use crate::errors::{AppError, DashboardError};
use crate::models::{ConfigRequest, ConnectRequest, Settings, VisibilityRequest};
use crate::pipeline;
use crate::state::{AppState, DashboardView};
use crate::ui::render_index;
use axum::{extract::State, http::StatusCode, response::Html, Json};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let view = state.snapshot().await;
    Html(render_index(&view, state.config.refresh_interval))
}

pub async fn get_view(State(state): State<AppState>) -> Json<DashboardView> {
    Json(state.snapshot().await)
}

pub async fn save_config(
    State(state): State<AppState>,
    Json(payload): Json<ConfigRequest>,
) -> Result<Json<Settings>, AppError> {
    let api_url = pipeline::save_api_url(&state, &payload.api_url).await?;
    Ok(Json(Settings {
        api_url: Some(api_url),
    }))
}

pub async fn connect(
    State(state): State<AppState>,
    payload: Option<Json<ConnectRequest>>,
) -> Result<Json<DashboardView>, AppError> {
    let requested = payload.and_then(|Json(body)| body.api_url);
    let api_url = match requested {
        Some(url) => url,
        None => state.api_url().await.ok_or(DashboardError::MissingUrl)?,
    };

    pipeline::spawn_connect(state.clone(), api_url).await?;
    Ok(Json(state.snapshot().await))
}

pub async fn retry(State(state): State<AppState>) -> Result<Json<DashboardView>, AppError> {
    pipeline::retry(&state).await?;
    Ok(Json(state.snapshot().await))
}

pub async fn set_visibility(
    State(state): State<AppState>,
    Json(payload): Json<VisibilityRequest>,
) -> StatusCode {
    state.set_visible(payload.visible);
    StatusCode::NO_CONTENT
}
