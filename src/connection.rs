use crate::errors::DashboardError;
use crate::push::OutboundMessage;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Open,
    Closed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Flat(Duration),
    /// `step × attempt`.
    Linear(Duration),
}

impl Backoff {
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Flat(step) => step,
            Backoff::Linear(step) => step.saturating_mul(attempt.max(1)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Reconnect { attempt: u32, delay: Duration },
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct ReconnectTracker {
    backoff: Backoff,
    max_attempts: u32,
    attempts: u32,
    state: ConnectionState,
}

impl ReconnectTracker {
    pub fn new(backoff: Backoff, max_attempts: u32) -> Self {
        Self {
            backoff,
            max_attempts,
            attempts: 0,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn on_connecting(&mut self) {
        self.state = ConnectionState::Connecting;
    }

    pub fn on_open(&mut self) {
        self.attempts = 0;
        self.state = ConnectionState::Open;
    }

    pub fn on_close(&mut self) -> CloseOutcome {
        if self.attempts >= self.max_attempts {
            self.state = ConnectionState::Failed;
            return CloseOutcome::Exhausted;
        }
        self.attempts += 1;
        self.state = ConnectionState::Closed;
        CloseOutcome::Reconnect {
            attempt: self.attempts,
            delay: self.backoff.delay(self.attempts),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    StateChanged(ConnectionState),
    Message(String),
    Error(String),
}

pub type EventSender = mpsc::UnboundedSender<(u64, ConnectionEvent)>;

pub struct ConnectionManager {
    url: String,
    generation: u64,
    tracker: ReconnectTracker,
    events: EventSender,
}

impl ConnectionManager {
    pub fn new(url: impl Into<String>, generation: u64, tracker: ReconnectTracker, events: EventSender) -> Self {
        Self {
            url: url.into(),
            generation,
            tracker,
            events,
        }
    }

    pub async fn run(mut self) -> ConnectionState {
        self.transition_connecting();

        loop {
            info!(url = %self.url, generation = self.generation, "opening push channel");
            match connect_async(self.url.as_str()).await {
                Ok((stream, _)) => {
                    self.tracker.on_open();
                    self.emit(ConnectionEvent::StateChanged(ConnectionState::Open));

                    let (mut write, mut read) = stream.split();
                    if let Err(err) = write.send(Message::text(OutboundMessage::GetStats.to_json())).await {
                        warn!(error = %err, "failed to request stats over push channel");
                    }

                    while let Some(frame) = read.next().await {
                        match frame {
                            Ok(Message::Text(text)) => {
                                if !self.emit(ConnectionEvent::Message(text.as_str().to_owned())) {
                                    return self.tracker.state();
                                }
                            }
                            Ok(Message::Close(frame)) => {
                                let reason = frame
                                    .map(|f| f.reason.as_str().to_owned())
                                    .unwrap_or_else(|| "no reason".to_string());
                                info!(%reason, "push channel closed by server");
                                break;
                            }
                            Ok(_) => {}
                            Err(err) => {
                                warn!(error = %err, "push channel error");
                                self.emit(ConnectionEvent::Error(err.to_string()));
                                break;
                            }
                        }
                    }
                }
                Err(err) => {
                    let err = DashboardError::from(err);
                    warn!(error = %err, "push channel handshake failed");
                    self.emit(ConnectionEvent::Error(err.to_string()));
                }
            }

            match self.tracker.on_close() {
                CloseOutcome::Reconnect { attempt, delay } => {
                    if !self.emit(ConnectionEvent::StateChanged(ConnectionState::Closed)) {
                        return self.tracker.state();
                    }
                    info!(attempt, delay_ms = delay.as_millis() as u64, "scheduling reconnect");
                    self.transition_connecting();
                    sleep(delay).await;
                }
                CloseOutcome::Exhausted => {
                    warn!(url = %self.url, "reconnect attempts exhausted");
                    self.emit(ConnectionEvent::StateChanged(ConnectionState::Closed));
                    self.emit(ConnectionEvent::StateChanged(ConnectionState::Failed));
                    return ConnectionState::Failed;
                }
            }
        }
    }

    fn transition_connecting(&mut self) {
        self.tracker.on_connecting();
        self.emit(ConnectionEvent::StateChanged(ConnectionState::Connecting));
    }

    fn emit(&self, event: ConnectionEvent) -> bool {
        let sent = self.events.send((self.generation, event)).is_ok();
        if !sent {
            debug!(generation = self.generation, "connection event receiver dropped");
        }
        sent
    }
}

/// `http://host` → `ws://host/ws`, `https://host` → `wss://host/ws`.
pub fn resolve_ws_url(base: &str) -> Result<String, DashboardError> {
    let base = base.trim().trim_end_matches('/');
    let rest = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if base.starts_with("ws://") || base.starts_with("wss://") {
        base.to_string()
    } else {
        return Err(DashboardError::InvalidUrl(base.to_string()));
    };
    Ok(format!("{rest}/ws"))
}
