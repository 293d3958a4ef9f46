use crate::activity::ActivityLog;
use crate::connection::ConnectionState;
use crate::models::{CommandUsageEntry, DatabaseStatus, ServerSummary, StatsSnapshot};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt::Write as _;

pub const MISSING: &str = "-";
pub const UNKNOWN: &str = "Unknown";
const CHART_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsView {
    pub guild_count: String,
    pub user_count: String,
    pub latency: String,
    pub latency_class: &'static str,
    pub uptime: String,
    pub bot_name: String,
    pub command_count: String,
    pub status_label: &'static str,
    pub status_class: &'static str,
}

impl Default for StatsView {
    fn default() -> Self {
        render_stats(&StatsSnapshot::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseView {
    pub status_label: &'static str,
    pub status_class: &'static str,
    pub total_commands: String,
    pub total_errors: String,
    pub pool_size: String,
}

impl Default for DatabaseView {
    fn default() -> Self {
        render_database(&DatabaseStatus::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub label: &'static str,
    pub class: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartBar {
    pub label: String,
    pub value: u64,
}

pub fn render_stats(stats: &StatsSnapshot) -> StatsView {
    let latency = stats.latency.filter(|ms| ms.is_finite() && *ms != 0.0);
    let online = stats
        .status
        .as_deref()
        .is_some_and(|status| status.eq_ignore_ascii_case("online"));

    StatsView {
        guild_count: stats.guild_count.map(format_count).unwrap_or_else(|| MISSING.into()),
        user_count: stats.user_count.map(format_count).unwrap_or_else(|| MISSING.into()),
        latency: latency.map(|ms| format!("{ms}ms")).unwrap_or_else(|| MISSING.into()),
        latency_class: latency.map(latency_class).unwrap_or(""),
        uptime: text_or(stats.uptime.as_deref(), MISSING),
        bot_name: text_or(stats.bot_name.as_deref(), MISSING),
        command_count: stats
            .command_count
            .filter(|count| *count > 0)
            .map(|count| count.to_string())
            .unwrap_or_else(|| MISSING.into()),
        status_label: if online { "Online" } else { "Offline" },
        status_class: if online { "bg-success" } else { "bg-danger" },
    }
}

pub fn latency_class(ms: f64) -> &'static str {
    if ms < 100.0 {
        "text-success"
    } else if ms < 200.0 {
        "text-warning"
    } else {
        "text-danger"
    }
}

pub fn render_database(status: &DatabaseStatus) -> DatabaseView {
    let count = |value: Option<u64>| value.map(format_count).unwrap_or_else(|| "0".into());
    DatabaseView {
        status_label: if status.connected { "Connected" } else { "Disconnected" },
        status_class: if status.connected { "text-success" } else { "text-danger" },
        total_commands: count(status.total_commands),
        total_errors: count(status.total_errors),
        pool_size: status
            .pool_size
            .map(|size| size.to_string())
            .unwrap_or_else(|| "0".into()),
    }
}

pub fn connection_badge(state: ConnectionState) -> Badge {
    let (label, class) = match state {
        ConnectionState::Disconnected | ConnectionState::Closed => ("Disconnected", "bg-danger"),
        ConnectionState::Connecting => ("Connecting...", "bg-warning"),
        ConnectionState::Open => ("Connected", "bg-success"),
        ConnectionState::Failed => ("Failed", "bg-secondary"),
    };
    Badge { label, class }
}

pub fn render_servers(servers: &[ServerSummary]) -> String {
    if servers.is_empty() {
        return r#"<tr><td colspan="4" class="text-center text-muted">No servers found</td></tr>"#.into();
    }

    let mut html = String::new();
    for server in servers {
        let name = escape_html(server.name.as_deref().unwrap_or(UNKNOWN));
        let icon = match server.icon_url.as_deref().filter(|url| !url.is_empty()) {
            Some(url) => format!(
                r#"<img src="{}" alt="{name}" class="icon" width="32" height="32">"#,
                escape_html(url)
            ),
            None => r#"<div class="icon icon-fallback"></div>"#.to_string(),
        };
        let _ = write!(
            html,
            "<tr><td><div class=\"server\">{icon}<div><strong>{name}</strong><br><small class=\"text-muted\">{id}</small></div></div></td>\
             <td><span class=\"badge bg-primary\">{members}</span></td><td>{owner}</td><td>{created}</td></tr>",
            id = escape_html(server.id.as_deref().unwrap_or(MISSING)),
            members = server.member_count.map(format_count).unwrap_or_else(|| "0".into()),
            owner = escape_html(&text_or(server.owner.as_deref(), UNKNOWN)),
            created = format_date(server.created_at.as_deref()),
        );
    }
    html
}

/// Stable sort, most used first; equal counts keep their input order.
pub fn sort_commands(commands: &[CommandUsageEntry]) -> Vec<CommandUsageEntry> {
    let mut sorted = commands.to_vec();
    sorted.sort_by(|a, b| b.usage().cmp(&a.usage()));
    sorted
}

pub fn render_commands(commands: &[CommandUsageEntry]) -> String {
    if commands.is_empty() {
        return r#"<tr><td colspan="3" class="text-center text-muted">No commands found</td></tr>"#.into();
    }

    let mut html = String::new();
    for command in sort_commands(commands) {
        let _ = write!(
            html,
            "<tr><td><code>/{name}</code></td><td>{description}</td><td><span class=\"badge bg-info\">{usage}</span></td></tr>",
            name = escape_html(command.name.as_deref().unwrap_or(UNKNOWN)),
            description = escape_html(&text_or(command.description.as_deref(), MISSING)),
            usage = command.usage(),
        );
    }
    html
}

pub fn command_chart(commands: &[CommandUsageEntry]) -> Vec<ChartBar> {
    sort_commands(commands)
        .into_iter()
        .filter(|command| command.usage() > 0)
        .take(CHART_LIMIT)
        .map(|command| ChartBar {
            label: command.name.clone().unwrap_or_else(|| UNKNOWN.into()),
            value: command.usage(),
        })
        .collect()
}

pub fn render_activity(log: &ActivityLog) -> String {
    if log.is_empty() {
        return r#"<div class="text-muted">No recent activity</div>"#.into();
    }

    let mut html = String::new();
    for event in log.iter() {
        let _ = write!(
            html,
            "<div class=\"activity-item\"><span class=\"{class}\">{message}</span><small class=\"activity-time\">{time}</small></div>",
            class = event.level.css_class(),
            message = escape_html(&event.message),
            time = format_timestamp(event.timestamp),
        );
    }
    html
}

/// `1234567` → `1,234,567`.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Creation dates come as RFC 3339, Python's `str(datetime)`, or a bare date.
pub fn format_date(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return UNKNOWN.into();
    };

    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z").map(|dt| dt.date_naive()))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date()))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"));

    match date {
        Ok(date) => date.format("%b %-d, %Y").to_string(),
        Err(_) => "Invalid Date".into(),
    }
}

pub fn format_timestamp(millis: Option<i64>) -> String {
    let Some(millis) = millis.filter(|ms| *ms != 0) else {
        return UNKNOWN.into();
    };
    match DateTime::from_timestamp_millis(millis) {
        Some(utc) => utc.with_timezone(&Local).format("%I:%M:%S %p").to_string(),
        None => "Invalid Time".into(),
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn text_or(value: Option<&str>, placeholder: &str) -> String {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => placeholder.to_string(),
    }
}
