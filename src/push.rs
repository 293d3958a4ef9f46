use crate::errors::DashboardError;
use crate::models::{ActivityEvent, ActivityLevel, DatabaseStatus, StatsSnapshot};
use serde::de::Error as _;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum PushMessage {
    Stats(StatsSnapshot),
    Activity(ActivityEvent),
    DatabaseUpdate(DatabaseStatus),
    Pong,
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    GetStats,
}

impl OutboundMessage {
    pub fn to_json(self) -> String {
        serde_json::to_string(&self).unwrap_or_else(|_| String::from("{}"))
    }
}

/// Older bots send activity flat on the envelope instead of under `data`.
pub fn parse(text: &str) -> Result<PushMessage, DashboardError> {
    let envelope: Value = serde_json::from_str(text).map_err(DashboardError::Push)?;
    let kind = envelope
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let message = match kind.as_str() {
        "stats" | "stats_update" => PushMessage::Stats(payload(&envelope, &kind)?),
        "database_update" => PushMessage::DatabaseUpdate(payload(&envelope, &kind)?),
        "activity" => PushMessage::Activity(activity_from(&envelope)?),
        "pong" => PushMessage::Pong,
        _ => PushMessage::Unknown(kind),
    };
    Ok(message)
}

fn malformed(reason: String) -> DashboardError {
    DashboardError::Push(serde_json::Error::custom(reason))
}

fn payload<T: serde::de::DeserializeOwned>(envelope: &Value, kind: &str) -> Result<T, DashboardError> {
    match envelope.get("data") {
        Some(data) if data.is_object() => serde_json::from_value(data.clone()).map_err(DashboardError::Push),
        _ => Err(malformed(format!("{kind} message without a data object"))),
    }
}

fn activity_from(envelope: &Value) -> Result<ActivityEvent, DashboardError> {
    let data = envelope.get("data").filter(|data| data.is_object());
    let field = |name: &str| data.and_then(|d| d.get(name)).or_else(|| envelope.get(name));

    let message = field("message")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("activity message without a message".to_string()))?
        .to_string();
    let level = data
        .and_then(|d| d.get("level").or_else(|| d.get("type")))
        .or_else(|| envelope.get("level"))
        .and_then(Value::as_str)
        .map(ActivityLevel::parse)
        .unwrap_or_default();
    let timestamp = field("timestamp")
        .and_then(|ts| ts.as_i64().or_else(|| ts.as_f64().map(|v| v as i64)))
        .or_else(|| Some(chrono::Utc::now().timestamp_millis()));

    Ok(ActivityEvent {
        message,
        level,
        timestamp,
    })
}
