use crate::render::escape_html;
use crate::state::DashboardView;
use std::time::Duration;

pub fn render_index(view: &DashboardView, refresh_interval: Duration) -> String {
    let stats = &view.stats;
    let database = &view.database;
    let fields = [
        ("API_URL", escape_html(view.api_url.as_deref().unwrap_or(""))),
        ("BADGE_CLASS", view.badge.class.to_string()),
        ("BADGE_LABEL", view.badge.label.to_string()),
        ("BOT_NAME", escape_html(&stats.bot_name)),
        ("STATUS_CLASS", stats.status_class.to_string()),
        ("STATUS_LABEL", stats.status_label.to_string()),
        ("GUILD_COUNT", stats.guild_count.clone()),
        ("USER_COUNT", stats.user_count.clone()),
        ("LATENCY_CLASS", stats.latency_class.to_string()),
        ("LATENCY", stats.latency.clone()),
        ("UPTIME", escape_html(&stats.uptime)),
        ("COMMAND_COUNT", stats.command_count.clone()),
        ("DB_CLASS", database.status_class.to_string()),
        ("DB_LABEL", database.status_label.to_string()),
        ("DB_COMMANDS", database.total_commands.clone()),
        ("DB_ERRORS", database.total_errors.clone()),
        ("DB_POOL", database.pool_size.clone()),
        ("REFRESH_SECS", refresh_interval.as_secs().to_string()),
        ("SERVERS", view.servers_html.clone()),
        ("COMMANDS", view.commands_html.clone()),
        ("ACTIVITY", view.activity_html.clone()),
    ];
    fill_template(INDEX_HTML, &fields)
}

/// Single pass over `template`; substituted text is never scanned again.
fn fill_template(template: &str, fields: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = &after[..end];
        match fields.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + end + 4]),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Bot Dashboard</title>
  <style>
    :root {
      --bg: #10141c;
      --card: #1a202b;
      --ink: #e8ebf0;
      --muted: #8a93a3;
      --accent: #5865f2;
      --success: #3ba55d;
      --warning: #faa81a;
      --danger: #ed4245;
      --info: #3aa3e3;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Segoe UI", "Helvetica Neue", sans-serif;
      padding: 24px 18px 48px;
    }

    .app {
      width: min(1180px, 100%);
      margin: 0 auto;
      display: grid;
      gap: 20px;
    }

    header {
      display: flex;
      flex-wrap: wrap;
      align-items: center;
      justify-content: space-between;
      gap: 12px;
    }

    h1 {
      margin: 0;
      font-size: 1.8rem;
    }

    h2 {
      margin: 0 0 12px;
      font-size: 1.1rem;
    }

    .card {
      background: var(--card);
      border-radius: 14px;
      padding: 18px;
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
      gap: 14px;
    }

    .stat .label {
      display: block;
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: var(--muted);
    }

    .stat .value {
      display: block;
      font-size: 1.6rem;
      font-weight: 600;
    }

    .columns {
      display: grid;
      grid-template-columns: 2fr 1fr;
      gap: 20px;
    }

    table {
      width: 100%;
      border-collapse: collapse;
    }

    th, td {
      text-align: left;
      padding: 8px;
      border-bottom: 1px solid rgba(255, 255, 255, 0.06);
    }

    .badge {
      display: inline-block;
      padding: 4px 10px;
      border-radius: 999px;
      font-size: 0.8rem;
      font-weight: 600;
      color: white;
    }

    .bg-success { background: var(--success); }
    .bg-warning { background: var(--warning); color: #222; }
    .bg-danger { background: var(--danger); }
    .bg-secondary { background: #4f5660; }
    .bg-primary { background: var(--accent); }
    .bg-info { background: var(--info); }
    .text-success { color: var(--success); }
    .text-warning { color: var(--warning); }
    .text-danger { color: var(--danger); }
    .text-info { color: var(--info); }
    .text-muted { color: var(--muted); }
    .text-center { text-align: center; }

    .server {
      display: flex;
      align-items: center;
      gap: 10px;
    }

    .icon {
      width: 32px;
      height: 32px;
      border-radius: 50%;
    }

    .icon-fallback {
      background: #4f5660;
    }

    .activity-item {
      display: flex;
      justify-content: space-between;
      gap: 12px;
      padding: 6px 0;
      border-bottom: 1px solid rgba(255, 255, 255, 0.06);
    }

    .activity-time {
      color: var(--muted);
      white-space: nowrap;
    }

    .bar {
      display: grid;
      grid-template-columns: 120px 1fr 48px;
      align-items: center;
      gap: 8px;
      margin-bottom: 6px;
      font-size: 0.9rem;
    }

    .bar .fill {
      height: 12px;
      border-radius: 6px;
      background: var(--accent);
    }

    form {
      display: flex;
      flex-wrap: wrap;
      gap: 8px;
    }

    input {
      flex: 1;
      min-width: 220px;
      padding: 10px 12px;
      border-radius: 8px;
      border: 1px solid #2c3442;
      background: #0c1017;
      color: var(--ink);
    }

    button {
      appearance: none;
      border: none;
      border-radius: 8px;
      padding: 10px 16px;
      font-weight: 600;
      cursor: pointer;
      background: var(--accent);
      color: white;
    }

    button.secondary {
      background: #4f5660;
    }

    .status {
      min-height: 1.2em;
      font-size: 0.9rem;
      color: var(--muted);
    }

    .status[data-type="error"] {
      color: var(--danger);
    }

    @media (max-width: 800px) {
      .columns {
        grid-template-columns: 1fr;
      }
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <div>
        <h1 id="bot-name">{{BOT_NAME}}</h1>
        <span id="bot-status" class="badge {{STATUS_CLASS}}">{{STATUS_LABEL}}</span>
      </div>
      <span id="connection" class="badge {{BADGE_CLASS}}">{{BADGE_LABEL}}</span>
    </header>

    <section class="card">
      <form id="connect-form">
        <input id="api-url" type="url" placeholder="http://localhost:8000" value="{{API_URL}}" />
        <button type="submit">Connect</button>
        <button id="save-btn" class="secondary" type="button">Save</button>
        <button id="retry-btn" class="secondary" type="button">Retry</button>
      </form>
      <div class="status" id="status"></div>
    </section>

    <section class="panel">
      <div class="card stat">
        <span class="label">Servers</span>
        <span id="guild-count" class="value">{{GUILD_COUNT}}</span>
      </div>
      <div class="card stat">
        <span class="label">Users</span>
        <span id="user-count" class="value">{{USER_COUNT}}</span>
      </div>
      <div class="card stat">
        <span class="label">Latency</span>
        <span id="latency" class="value {{LATENCY_CLASS}}">{{LATENCY}}</span>
      </div>
      <div class="card stat">
        <span class="label">Uptime</span>
        <span id="uptime" class="value">{{UPTIME}}</span>
      </div>
      <div class="card stat">
        <span class="label">Commands</span>
        <span id="command-count" class="value">{{COMMAND_COUNT}}</span>
      </div>
    </section>

    <section class="columns">
      <div class="card">
        <h2>Servers</h2>
        <table>
          <thead><tr><th>Server</th><th>Members</th><th>Owner</th><th>Created</th></tr></thead>
          <tbody id="servers">{{SERVERS}}</tbody>
        </table>
      </div>
      <div class="card">
        <h2>Database <span id="db-status" class="badge {{DB_CLASS}}">{{DB_LABEL}}</span></h2>
        <div class="stat"><span class="label">Total commands</span><span id="db-commands" class="value">{{DB_COMMANDS}}</span></div>
        <div class="stat"><span class="label">Total errors</span><span id="db-errors" class="value">{{DB_ERRORS}}</span></div>
        <div class="stat"><span class="label">Pool size</span><span id="db-pool" class="value">{{DB_POOL}}</span></div>
      </div>
    </section>

    <section class="columns">
      <div class="card">
        <h2>Command usage</h2>
        <div id="chart"></div>
        <table>
          <thead><tr><th>Command</th><th>Description</th><th>Uses</th></tr></thead>
          <tbody id="commands">{{COMMANDS}}</tbody>
        </table>
      </div>
      <div class="card">
        <h2>Recent activity</h2>
        <div id="activity">{{ACTIVITY}}</div>
      </div>
    </section>

    <p class="text-muted">Data refreshes every {{REFRESH_SECS}}s while this page is visible.</p>
  </main>

  <script>
    const statusEl = document.getElementById('status');
    const urlEl = document.getElementById('api-url');
    const chartEl = document.getElementById('chart');

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const setBadge = (id, label, cls) => {
      const el = document.getElementById(id);
      el.textContent = label;
      el.className = `badge ${cls}`;
    };

    const setText = (id, value) => {
      document.getElementById(id).textContent = value;
    };

    const renderChart = (bars) => {
      if (!bars.length) {
        chartEl.innerHTML = '';
        return;
      }
      const max = Math.max(...bars.map((bar) => bar.value));
      chartEl.replaceChildren(...bars.map((bar) => {
        const row = document.createElement('div');
        row.className = 'bar';
        const label = document.createElement('span');
        label.textContent = bar.label;
        const fill = document.createElement('div');
        fill.className = 'fill';
        fill.style.width = `${Math.max(2, (bar.value / max) * 100)}%`;
        const value = document.createElement('span');
        value.textContent = bar.value;
        row.append(label, fill, value);
        return row;
      }));
    };

    const updateUI = (view) => {
      setBadge('connection', view.badge.label, view.badge.class);
      setText('bot-name', view.stats.bot_name);
      setBadge('bot-status', view.stats.status_label, view.stats.status_class);
      setText('guild-count', view.stats.guild_count);
      setText('user-count', view.stats.user_count);
      setText('latency', view.stats.latency);
      document.getElementById('latency').className = `value ${view.stats.latency_class}`;
      setText('uptime', view.stats.uptime);
      setText('command-count', view.stats.command_count);
      setBadge('db-status', view.database.status_label, view.database.status_class);
      setText('db-commands', view.database.total_commands);
      setText('db-errors', view.database.total_errors);
      setText('db-pool', view.database.pool_size);
      document.getElementById('servers').innerHTML = view.servers_html;
      document.getElementById('commands').innerHTML = view.commands_html;
      document.getElementById('activity').innerHTML = view.activity_html;
      renderChart(view.command_chart);
      if (document.activeElement !== urlEl && view.api_url) {
        urlEl.value = view.api_url;
      }
    };

    const loadView = async () => {
      const res = await fetch('/api/view');
      if (!res.ok) {
        throw new Error('Unable to load dashboard');
      }
      updateUI(await res.json());
    };

    const post = async (path, body) => {
      const res = await fetch(path, {
        method: 'POST',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify(body || {})
      });
      if (!res.ok) {
        const msg = await res.text();
        throw new Error(msg || 'Request failed');
      }
      return res;
    };

    document.getElementById('connect-form').addEventListener('submit', (event) => {
      event.preventDefault();
      setStatus('Connecting...', 'info');
      post('/api/connect', { api_url: urlEl.value })
        .then((res) => res.json())
        .then((view) => {
          updateUI(view);
          setStatus('', '');
        })
        .catch((err) => setStatus(err.message, 'error'));
    });

    document.getElementById('save-btn').addEventListener('click', () => {
      post('/api/config', { api_url: urlEl.value })
        .then(() => setStatus('Saved', 'ok'))
        .catch((err) => setStatus(err.message, 'error'));
    });

    document.getElementById('retry-btn').addEventListener('click', () => {
      setStatus('Retrying...', 'info');
      post('/api/retry')
        .then((res) => res.json())
        .then((view) => {
          updateUI(view);
          setStatus('', '');
        })
        .catch((err) => setStatus(err.message, 'error'));
    });

    document.addEventListener('visibilitychange', () => {
      post('/api/visibility', { visible: !document.hidden }).catch(() => {});
    });

    setInterval(() => {
      if (!document.hidden) {
        loadView().catch((err) => setStatus(err.message, 'error'));
      }
    }, 2000);
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_fills_every_placeholder() {
        let view = DashboardView::new(10, Some("http://bot\"x".into()));
        let html = render_index(&view, Duration::from_secs(30));
        assert!(!html.contains("{{"));
        assert!(html.contains("value=\"http://bot&quot;x\""));
        assert!(html.contains("No servers found"));
        assert!(html.contains("every 30s"));
    }

    #[test]
    fn substituted_values_are_not_expanded_again() {
        let mut view = DashboardView::new(10, None);
        view.stats.bot_name = "{{GUILD_COUNT}}".into();
        view.servers_html = "<tr><td>{{COMMANDS}}</td></tr>".into();
        let html = render_index(&view, Duration::from_secs(30));
        assert!(html.contains(r#"<h1 id="bot-name">{{GUILD_COUNT}}</h1>"#));
        assert!(html.contains("<td>{{COMMANDS}}</td>"));
        assert!(html.contains("No commands found"));
    }

    #[test]
    fn unknown_keys_are_left_in_place() {
        let fields = [("A", "1".to_string())];
        assert_eq!(fill_template("{{A}}-{{B}}-{{", &fields), "1-{{B}}-{{");
    }
}
