use crate::errors::DashboardError;
use crate::models::Settings;
use std::{env, path::Path, path::PathBuf};
use tokio::fs;
use tracing::error;

pub fn resolve_data_path() -> Result<PathBuf, std::io::Error> {
    if let Ok(path) = env::var("DASHBOARD_DATA_PATH") {
        return Ok(PathBuf::from(path));
    }

    Ok(PathBuf::from("data/settings.json"))
}

pub async fn load_settings(path: &Path) -> Settings {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(settings) => settings,
            Err(err) => {
                error!("failed to parse settings file: {err}");
                Settings::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Settings::default(),
        Err(err) => {
            error!("failed to read settings file: {err}");
            Settings::default()
        }
    }
}

pub async fn persist_settings(path: &Path, settings: &Settings) -> Result<(), DashboardError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let payload = serde_json::to_vec_pretty(settings).map_err(DashboardError::Encode)?;
    fs::write(path, payload).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(tag: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        env::temp_dir()
            .join(format!("bot_dashboard_{tag}_{}_{nanos}", std::process::id()))
            .join("settings.json")
    }

    #[tokio::test]
    async fn missing_file_loads_defaults() {
        let settings = load_settings(&temp_path("missing")).await;
        assert_eq!(settings, Settings::default());
    }

    #[tokio::test]
    async fn saved_url_survives_a_reload() {
        let path = temp_path("roundtrip");
        let settings = Settings {
            api_url: Some("http://bot.local:8000".into()),
        };
        persist_settings(&path, &settings).await.unwrap();
        assert_eq!(load_settings(&path).await, settings);
    }

    #[tokio::test]
    async fn corrupt_file_falls_back_to_defaults() {
        let path = temp_path("corrupt");
        fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        fs::write(&path, b"{ not json").await.unwrap();
        assert_eq!(load_settings(&path).await, Settings::default());
    }
}
