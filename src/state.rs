use crate::activity::ActivityLog;
use crate::config::DashboardConfig;
use crate::connection::ConnectionState;
use crate::models::{ActivityEvent, CommandUsageEntry, DatabaseStatus, ServerSummary, Settings, StatsSnapshot};
use crate::render::{self, Badge, ChartBar, DatabaseView, StatsView};
use serde::Serialize;
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};
use tracing::debug;

/// Monotonic session counter. Anything issued under an older value is stale.
#[derive(Debug, Clone, Default)]
pub struct Generation(Arc<AtomicU64>);

impl Generation {
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}

/// What the page currently shows. Each section is replaced wholesale on
/// every update.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub connection: ConnectionState,
    pub badge: Badge,
    pub api_url: Option<String>,
    pub stats: StatsView,
    pub servers_html: String,
    pub commands_html: String,
    pub command_chart: Vec<ChartBar>,
    pub database: DatabaseView,
    pub activity: ActivityLog,
    pub activity_html: String,
}

impl DashboardView {
    pub fn new(activity_capacity: usize, api_url: Option<String>) -> Self {
        let activity = ActivityLog::new(activity_capacity);
        Self {
            connection: ConnectionState::Disconnected,
            badge: render::connection_badge(ConnectionState::Disconnected),
            api_url,
            stats: StatsView::default(),
            servers_html: render::render_servers(&[]),
            commands_html: render::render_commands(&[]),
            command_chart: Vec::new(),
            database: DatabaseView::default(),
            activity_html: render::render_activity(&activity),
            activity,
        }
    }
}

pub struct Session {
    pub generation: u64,
    pub tasks: Vec<JoinHandle<()>>,
}

impl Drop for Session {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<DashboardConfig>,
    pub data_path: PathBuf,
    pub http: reqwest::Client,
    pub generation: Generation,
    pub view: Arc<Mutex<DashboardView>>,
    pub settings: Arc<Mutex<Settings>>,
    pub session: Arc<Mutex<Option<Session>>>,
    pub visibility: Arc<watch::Sender<bool>>,
}

impl AppState {
    pub fn new(config: DashboardConfig, data_path: PathBuf, settings: Settings) -> Self {
        let view = DashboardView::new(config.activity_capacity, settings.api_url.clone());
        let (visibility, _) = watch::channel(true);
        Self {
            config: Arc::new(config),
            data_path,
            http: reqwest::Client::new(),
            generation: Generation::default(),
            view: Arc::new(Mutex::new(view)),
            settings: Arc::new(Mutex::new(settings)),
            session: Arc::new(Mutex::new(None)),
            visibility: Arc::new(visibility),
        }
    }

    pub async fn snapshot(&self) -> DashboardView {
        self.view.lock().await.clone()
    }

    /// Swaps in a new session; the previous one's tasks are aborted. A
    /// session that was superseded while it was being set up is dropped.
    pub async fn replace_session(&self, session: Session) {
        let mut slot = self.session.lock().await;
        if self.generation.is_current(session.generation) {
            let previous = slot.replace(session);
            drop(previous);
        } else {
            debug!(generation = session.generation, "dropping superseded session");
        }
    }

    pub async fn clear_session(&self) {
        let previous = self.session.lock().await.take();
        drop(previous);
    }

    pub async fn api_url(&self) -> Option<String> {
        self.view.lock().await.api_url.clone()
    }

    pub async fn set_api_url(&self, api_url: &str) {
        self.view.lock().await.api_url = Some(api_url.to_string());
    }

    /// Only an actual change wakes the scheduler.
    pub fn set_visible(&self, visible: bool) {
        self.visibility.send_if_modified(|current| {
            let changed = *current != visible;
            *current = visible;
            changed
        });
    }

    pub async fn set_connection(&self, generation: u64, state: ConnectionState) -> bool {
        let Some(mut view) = self.lock_current(generation, "connection state").await else {
            return false;
        };
        view.connection = state;
        view.badge = render::connection_badge(state);
        true
    }

    pub async fn apply_stats(&self, generation: u64, stats: &StatsSnapshot) -> bool {
        let Some(mut view) = self.lock_current(generation, "stats").await else {
            return false;
        };
        view.stats = render::render_stats(stats);
        true
    }

    pub async fn apply_servers(&self, generation: u64, servers: &[ServerSummary]) -> bool {
        let Some(mut view) = self.lock_current(generation, "servers").await else {
            return false;
        };
        view.servers_html = render::render_servers(servers);
        true
    }

    pub async fn apply_commands(&self, generation: u64, commands: &[CommandUsageEntry]) -> bool {
        let Some(mut view) = self.lock_current(generation, "commands").await else {
            return false;
        };
        view.commands_html = render::render_commands(commands);
        view.command_chart = render::command_chart(commands);
        true
    }

    pub async fn apply_database(&self, generation: u64, status: &DatabaseStatus) -> bool {
        let Some(mut view) = self.lock_current(generation, "database status").await else {
            return false;
        };
        view.database = render::render_database(status);
        true
    }

    pub async fn push_activity(&self, generation: u64, event: ActivityEvent) -> bool {
        let Some(mut view) = self.lock_current(generation, "activity").await else {
            return false;
        };
        append_activity(&mut view, event);
        true
    }

    async fn lock_current(
        &self,
        generation: u64,
        what: &str,
    ) -> Option<tokio::sync::MutexGuard<'_, DashboardView>> {
        let view = self.view.lock().await;
        if self.generation.is_current(generation) {
            Some(view)
        } else {
            debug!(
                generation,
                current = self.generation.current(),
                "discarding stale {what}"
            );
            None
        }
    }
}

fn append_activity(view: &mut DashboardView, event: ActivityEvent) {
    view.activity.push(event);
    view.activity_html = render::render_activity(&view.activity);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActivityLevel;

    fn state() -> AppState {
        AppState::new(DashboardConfig::default(), PathBuf::from("unused.json"), Settings::default())
    }

    #[tokio::test]
    async fn stale_generation_is_discarded() {
        let state = state();
        let old = state.generation.advance();
        let new = state.generation.advance();

        let stale = StatsSnapshot {
            guild_count: Some(1),
            ..Default::default()
        };
        assert!(!state.apply_stats(old, &stale).await);
        assert_eq!(state.snapshot().await.stats.guild_count, "-");

        let fresh = StatsSnapshot {
            guild_count: Some(7),
            ..Default::default()
        };
        assert!(state.apply_stats(new, &fresh).await);
        assert_eq!(state.snapshot().await.stats.guild_count, "7");
    }

    #[tokio::test]
    async fn activity_entries_from_the_push_channel_are_capped() {
        let state = state();
        let generation = state.generation.advance();
        for n in 0..15 {
            state
                .push_activity(generation, ActivityEvent::now(format!("n{n}"), ActivityLevel::Info))
                .await;
        }
        let view = state.snapshot().await;
        assert_eq!(view.activity.len(), 10);
        assert_eq!(view.activity.iter().next().map(|e| e.message.as_str()), Some("n14"));
    }

    #[tokio::test]
    async fn connection_badge_tracks_state() {
        let state = state();
        let generation = state.generation.advance();
        state.set_connection(generation, ConnectionState::Failed).await;
        let view = state.snapshot().await;
        assert_eq!(view.connection, ConnectionState::Failed);
        assert_eq!(view.badge.label, "Failed");
    }

    #[tokio::test]
    async fn replacing_a_session_aborts_its_tasks() {
        let state = state();
        let (alive, dropped) = tokio::sync::oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let _alive = alive;
            std::future::pending::<()>().await
        });
        let first = state.generation.advance();
        state
            .replace_session(Session {
                generation: first,
                tasks: vec![task],
            })
            .await;

        let next = state.generation.advance();
        state
            .replace_session(Session {
                generation: next,
                tasks: Vec::new(),
            })
            .await;
        assert!(dropped.await.is_err());
    }

    #[tokio::test]
    async fn repeated_visibility_reports_do_not_wake_the_scheduler() {
        let state = state();
        let mut visibility = state.visibility.subscribe();

        state.set_visible(true);
        assert!(!visibility.has_changed().unwrap());

        state.set_visible(false);
        assert!(visibility.has_changed().unwrap());
        assert!(!*visibility.borrow_and_update());

        state.set_visible(false);
        assert!(!visibility.has_changed().unwrap());
        state.set_visible(true);
        assert!(visibility.has_changed().unwrap());
    }

    #[tokio::test]
    async fn superseded_session_is_not_installed() {
        let state = state();
        let stale = state.generation.advance();
        state.generation.advance();
        state
            .replace_session(Session {
                generation: stale,
                tasks: Vec::new(),
            })
            .await;
        assert!(state.session.lock().await.is_none());
    }
}
