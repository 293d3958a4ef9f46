use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct Badge {
    label: String,
}

#[derive(Debug, Deserialize)]
struct ViewResponse {
    connection: String,
    badge: Badge,
    api_url: Option<String>,
    activity_html: String,
}

struct TestServer {
    base_url: String,
    data_path: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("bot_dashboard_http_{}_{}", std::process::id(), nanos));
    path.push("settings.json");
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/view")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_bot_dashboard"))
        .env("PORT", port.to_string())
        .env("DASHBOARD_DATA_PATH", &data_path)
        .env_remove("DASHBOARD_API_URL")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer {
        base_url,
        data_path,
        child,
    }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn view(client: &Client, server: &TestServer) -> ViewResponse {
    client
        .get(format!("{}/api/view", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_index_renders_dashboard() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;

    let response = Client::new().get(format!("{}/", server.base_url)).send().await.unwrap();
    assert!(response.status().is_success());
    let body = response.text().await.unwrap();
    assert!(body.contains("Bot Dashboard"));
    assert!(!body.contains("{{"));
}

#[tokio::test]
async fn http_config_persists_api_url() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/config", server.base_url))
        .json(&serde_json::json!({ "api_url": " http://127.0.0.1:9/ " }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let current = view(&client, &server).await;
    assert_eq!(current.api_url.as_deref(), Some("http://127.0.0.1:9"));

    let saved = std::fs::read_to_string(&server.data_path).unwrap();
    assert!(saved.contains("http://127.0.0.1:9"));
}

#[tokio::test]
async fn http_config_rejects_non_http_url() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;

    let response = Client::new()
        .post(format!("{}/api/config", server.base_url))
        .json(&serde_json::json!({ "api_url": "ftp://bot" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_connect_to_unreachable_bot_reports_failure() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let dead = format!("http://127.0.0.1:{}", pick_free_port());

    let response = client
        .post(format!("{}/api/connect", server.base_url))
        .json(&serde_json::json!({ "api_url": dead }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let current = view(&client, &server).await;
    assert_eq!(current.connection, "failed");
    assert_eq!(current.badge.label, "Failed");
    assert!(current.activity_html.contains("Failed to connect"));
}

#[tokio::test]
async fn http_visibility_is_accepted() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;

    let response = Client::new()
        .post(format!("{}/api/visibility", server.base_url))
        .json(&serde_json::json!({ "visible": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
