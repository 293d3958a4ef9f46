use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    #[serde(default, deserialize_with = "lenient::count")]
    pub guild_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub user_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub latency: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub uptime: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub bot_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub command_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerSummary {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub member_count: Option<u64>,
    #[serde(default, alias = "owner_name", deserialize_with = "lenient::text")]
    pub owner: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub created_at: Option<String>,
    #[serde(default, alias = "icon", deserialize_with = "lenient::text")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandUsageEntry {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(default, alias = "usage", alias = "uses", deserialize_with = "lenient::count")]
    pub usage_count: Option<u64>,
}

impl CommandUsageEntry {
    pub fn usage(&self) -> u64 {
        self.usage_count.unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseStatus {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub connected: bool,
    #[serde(default, deserialize_with = "lenient::count")]
    pub total_commands: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub total_errors: Option<u64>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub pool_size: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Success,
    #[default]
    Info,
    Warning,
    Danger,
}

impl ActivityLevel {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "success" => Self::Success,
            "warning" | "warn" => Self::Warning,
            "danger" | "error" => Self::Danger,
            _ => Self::Info,
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::Success => "text-success",
            Self::Info => "text-info",
            Self::Warning => "text-warning",
            Self::Danger => "text-danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub message: String,
    pub level: ActivityLevel,
    /// Milliseconds since the Unix epoch.
    pub timestamp: Option<i64>,
}

impl ActivityEvent {
    pub fn now(message: impl Into<String>, level: ActivityLevel) -> Self {
        Self {
            message: message.into(),
            level,
            timestamp: Some(chrono::Utc::now().timestamp_millis()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConfigRequest {
    pub api_url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConnectRequest {
    #[serde(default)]
    pub api_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    pub visible: bool,
}

/// Ids and counts arrive as numbers or strings; anything unusable is `None`.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        })
    }

    pub fn count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64)),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Bool(b)) => b,
            Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
            Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
            _ => false,
        })
    }

    pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_tolerates_missing_and_mistyped_fields() {
        let stats: StatsSnapshot =
            serde_json::from_str(r#"{"guild_count": 5, "latency": 50, "user_count": "1200", "uptime": 3600}"#)
                .unwrap();
        assert_eq!(stats.guild_count, Some(5));
        assert_eq!(stats.latency, Some(50.0));
        assert_eq!(stats.user_count, Some(1200));
        assert_eq!(stats.uptime.as_deref(), Some("3600"));
        assert_eq!(stats.bot_name, None);
        assert_eq!(stats.status, None);
    }

    #[test]
    fn server_summary_accepts_owner_name_alias_and_numeric_id() {
        let server: ServerSummary = serde_json::from_str(
            r#"{"id": 1234567890123456789, "name": "Lounge", "member_count": 42, "owner_name": "ana"}"#,
        )
        .unwrap();
        assert_eq!(server.id.as_deref(), Some("1234567890123456789"));
        assert_eq!(server.owner.as_deref(), Some("ana"));
        assert_eq!(server.icon_url, None);
    }

    #[test]
    fn null_fields_become_none() {
        let db: DatabaseStatus =
            serde_json::from_str(r#"{"connected": true, "total_commands": null}"#).unwrap();
        assert!(db.connected);
        assert_eq!(db.total_commands, None);
    }

    #[test]
    fn database_connected_flag_is_lenient() {
        let db: DatabaseStatus = serde_json::from_str(r#"{"connected": null, "pool_size": 4}"#).unwrap();
        assert!(!db.connected);
        assert_eq!(db.pool_size, Some(4));

        let db: DatabaseStatus = serde_json::from_str(r#"{"connected": "true"}"#).unwrap();
        assert!(db.connected);
        let db: DatabaseStatus = serde_json::from_str(r#"{"connected": 0}"#).unwrap();
        assert!(!db.connected);
    }

    #[test]
    fn activity_level_maps_error_to_danger() {
        assert_eq!(ActivityLevel::parse("error"), ActivityLevel::Danger);
        assert_eq!(ActivityLevel::parse("Warning"), ActivityLevel::Warning);
        assert_eq!(ActivityLevel::parse("whatever"), ActivityLevel::Info);
    }
}
