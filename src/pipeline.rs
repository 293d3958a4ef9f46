use crate::connection::{resolve_ws_url, ConnectionEvent, ConnectionManager, ConnectionState};
use crate::errors::DashboardError;
use crate::fetcher::{DataFetcher, Section};
use crate::models::{ActivityEvent, ActivityLevel};
use crate::push::{self, PushMessage};
use crate::scheduler::{Trigger, UpdateScheduler};
use crate::state::{AppState, Session};
use crate::storage::persist_settings;
use futures_util::future::join_all;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub async fn connect(state: &AppState, api_url: &str) -> Result<(), DashboardError> {
    let base = normalize_base_url(api_url)?;
    let ws_url = resolve_ws_url(&base)?;
    let fetcher = DataFetcher::new(state.http.clone(), &base, state.config.endpoints.clone());

    let generation = state.generation.advance();
    state.clear_session().await;
    state.set_api_url(&base).await;
    state.set_connection(generation, ConnectionState::Connecting).await;

    let stats = match fetcher.probe().await {
        Ok(stats) => stats,
        Err(err) => {
            warn!(url = %base, error = %err, "bot API did not answer");
            state.set_connection(generation, ConnectionState::Failed).await;
            state
                .push_activity(
                    generation,
                    ActivityEvent::now(format!("Failed to connect: {err}"), ActivityLevel::Danger),
                )
                .await;
            return Err(err);
        }
    };

    info!(url = %base, generation, "connected to bot API");
    if let Err(err) = remember_url(state, &base).await {
        error!("failed to save bot API URL: {err}");
    }
    state.apply_stats(generation, &stats).await;

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let manager = ConnectionManager::new(ws_url, generation, state.config.reconnect_tracker(), events_tx);

    let tasks = vec![
        tokio::spawn(async move {
            let last = manager.run().await;
            debug!(?last, "push channel manager finished");
        }),
        tokio::spawn(consume_events(state.clone(), events_rx)),
        tokio::spawn(bootstrap(state.clone(), fetcher.clone(), generation)),
        tokio::spawn(run_scheduler(state.clone(), fetcher, generation)),
    ];
    state.replace_session(Session { generation, tasks }).await;
    Ok(())
}

/// Runs `connect` on its own task. The session switch completes even if the
/// caller is dropped while the probe is in flight.
pub async fn spawn_connect(state: AppState, api_url: String) -> Result<(), DashboardError> {
    tokio::spawn(async move { connect(&state, &api_url).await }).await?
}

pub async fn retry(state: &AppState) -> Result<(), DashboardError> {
    let url = match state.api_url().await {
        Some(url) => url,
        None => state.config.api_url.clone().ok_or(DashboardError::MissingUrl)?,
    };
    spawn_connect(state.clone(), url).await
}

pub async fn save_api_url(state: &AppState, api_url: &str) -> Result<String, DashboardError> {
    let base = normalize_base_url(api_url)?;
    remember_url(state, &base).await?;
    state.set_api_url(&base).await;
    Ok(base)
}

/// URL to connect to at startup: the environment wins over the saved slot.
pub async fn startup_url(state: &AppState) -> Option<String> {
    if let Some(url) = state.config.api_url.clone() {
        return Some(url);
    }
    state.settings.lock().await.api_url.clone()
}

pub fn normalize_base_url(raw: &str) -> Result<String, DashboardError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(DashboardError::MissingUrl);
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(DashboardError::InvalidUrl(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Fetches `sections` concurrently. A failing section keeps its previous
/// rendering; the others are still applied. Returns the failed sections.
pub async fn refresh(
    state: &AppState,
    fetcher: &DataFetcher,
    generation: u64,
    sections: &[Section],
) -> Vec<Section> {
    let jobs = sections.iter().map(|&section| async move {
        (section, refresh_section(state, fetcher, generation, section).await)
    });

    let mut failed = Vec::new();
    for (section, result) in join_all(jobs).await {
        if let Err(err) = result {
            warn!(?section, error = %err, "refresh failed, keeping previous values");
            failed.push(section);
        }
    }
    failed
}

async fn refresh_section(
    state: &AppState,
    fetcher: &DataFetcher,
    generation: u64,
    section: Section,
) -> Result<bool, DashboardError> {
    let applied = match section {
        Section::Stats => state.apply_stats(generation, &fetcher.fetch_stats().await?).await,
        Section::Guilds => state.apply_servers(generation, &fetcher.fetch_guilds().await?).await,
        Section::Commands => {
            state
                .apply_commands(generation, &fetcher.fetch_commands().await?)
                .await
        }
        Section::Database => {
            state
                .apply_database(generation, &fetcher.fetch_database_status().await?)
                .await
        }
    };
    Ok(applied)
}

async fn bootstrap(state: AppState, fetcher: DataFetcher, generation: u64) {
    refresh(
        &state,
        &fetcher,
        generation,
        &[Section::Guilds, Section::Commands, Section::Database],
    )
    .await;
}

async fn run_scheduler(state: AppState, fetcher: DataFetcher, generation: u64) {
    let tick_sections = state.config.profile.tick_sections();
    let visibility = state.visibility.subscribe();
    let scheduler = UpdateScheduler::new(state.config.refresh_interval);

    scheduler
        .run(visibility, |trigger| {
            let state = state.clone();
            let fetcher = fetcher.clone();
            async move {
                let sections = match trigger {
                    Trigger::Tick => tick_sections,
                    Trigger::Resumed => Section::all(),
                };
                debug!(?trigger, "scheduled refresh");
                refresh(&state, &fetcher, generation, sections).await;
            }
        })
        .await;
}

async fn consume_events(state: AppState, mut events: mpsc::UnboundedReceiver<(u64, ConnectionEvent)>) {
    while let Some((generation, event)) = events.recv().await {
        handle_event(&state, generation, event).await;
    }
}

pub async fn handle_event(state: &AppState, generation: u64, event: ConnectionEvent) {
    match event {
        ConnectionEvent::StateChanged(connection) => {
            if !state.set_connection(generation, connection).await {
                return;
            }
            let note = match connection {
                ConnectionState::Open => Some(("WebSocket connection established", ActivityLevel::Success)),
                ConnectionState::Closed => Some(("WebSocket connection lost", ActivityLevel::Warning)),
                ConnectionState::Failed => Some(("Reconnection attempts exhausted", ActivityLevel::Danger)),
                ConnectionState::Connecting | ConnectionState::Disconnected => None,
            };
            if let Some((message, level)) = note {
                state.push_activity(generation, ActivityEvent::now(message, level)).await;
            }
        }
        ConnectionEvent::Message(text) => handle_push(state, generation, &text).await,
        ConnectionEvent::Error(detail) => {
            debug!(%detail, "push channel error");
            state
                .push_activity(
                    generation,
                    ActivityEvent::now("WebSocket error occurred", ActivityLevel::Danger),
                )
                .await;
        }
    }
}

pub async fn handle_push(state: &AppState, generation: u64, text: &str) {
    match push::parse(text) {
        Ok(PushMessage::Stats(stats)) => {
            state.apply_stats(generation, &stats).await;
        }
        Ok(PushMessage::Activity(event)) => {
            state.push_activity(generation, event).await;
        }
        Ok(PushMessage::DatabaseUpdate(status)) => {
            state.apply_database(generation, &status).await;
        }
        Ok(PushMessage::Pong) => {}
        Ok(PushMessage::Unknown(kind)) => info!(%kind, "ignoring unknown push message type"),
        Err(err) => warn!("dropping push message: {err}"),
    }
}

async fn remember_url(state: &AppState, base: &str) -> Result<(), DashboardError> {
    let mut settings = state.settings.lock().await;
    settings.api_url = Some(base.to_string());
    persist_settings(&state.data_path, &settings).await
}
