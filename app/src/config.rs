//! Configuration loading, resolution, and persistence.
//!
//! Handles the TOML config file (~/.config/clashboard/config.toml). The stored
//! clash id lives in a sibling file of the same directory.

use std::path::{Path, PathBuf};

use clashboard::{ClashboardConfig, websocket_url_for};

/// Returns `~/.config/clashboard/config.toml`.
pub fn default_config_path() -> PathBuf {
    let dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("clashboard");
    dir.join("config.toml")
}

/// Load persisted config from disk. If the file does not exist, creates it
/// with all-defaults and returns that. Never panics.
pub fn load(path: &Path) -> ClashboardConfig {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str::<ClashboardConfig>(&contents) {
            Ok(config) => {
                tracing::info!("loaded config from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!("failed to parse {}: {e}", path.display());
                ClashboardConfig::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let defaults = ClashboardConfig::default();
            tracing::info!("no config file found, creating {}", path.display());
            save_to(path, &defaults);
            defaults
        }
        Err(e) => {
            tracing::warn!("failed to read {}: {e}", path.display());
            ClashboardConfig::default()
        }
    }
}

/// Write config to a specific path. Creates parent dirs if needed. Never panics.
pub fn save_to(path: &Path, config: &ClashboardConfig) {
    if let Some(dir) = path.parent()
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        tracing::warn!("failed to create config dir {}: {e}", dir.display());
        return;
    }
    match toml::to_string_pretty(config) {
        Ok(contents) => {
            if let Err(e) = std::fs::write(path, contents) {
                tracing::warn!("failed to write {}: {e}", path.display());
            }
        }
        Err(e) => {
            tracing::warn!("failed to serialize config: {e}");
        }
    }
}

/// Apply command-line overrides. A backend URL given without a channel URL
/// moves the channel along with it.
pub fn resolve(
    mut config: ClashboardConfig,
    backend_url: Option<String>,
    websocket_url: Option<String>,
) -> ClashboardConfig {
    if let Some(base) = backend_url {
        config.backend_url = base.trim_end_matches('/').to_string();
        if websocket_url.is_none() {
            config.websocket_url = websocket_url_for(&config.backend_url);
        }
    }
    if let Some(url) = websocket_url {
        config.websocket_url = url;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("clashboard-config-{}-{name}", std::process::id()))
            .join("config.toml")
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let path = scratch("missing");
        let config = load(&path);
        assert_eq!(config, ClashboardConfig::default());
        assert!(path.exists());
        assert_eq!(load(&path), ClashboardConfig::default());
        cleanup(&path);
    }

    #[test]
    fn partial_and_broken_files_fall_back() {
        let path = scratch("partial");
        save_to(&path, &ClashboardConfig::default());

        std::fs::write(&path, "backend_url = \"http://scores.lan:8080\"\n").unwrap();
        let config = load(&path);
        assert_eq!(config.backend_url, "http://scores.lan:8080");
        assert_eq!(config.websocket_url, "ws://localhost:3001/ws");

        std::fs::write(&path, "backend_url = [").unwrap();
        assert_eq!(load(&path), ClashboardConfig::default());
        cleanup(&path);
    }

    #[test]
    fn overrides() {
        let base = ClashboardConfig::default();

        let config = resolve(base.clone(), Some("https://clash.example.org/".into()), None);
        assert_eq!(config.backend_url, "https://clash.example.org");
        assert_eq!(config.websocket_url, "wss://clash.example.org/ws");

        let config = resolve(
            base.clone(),
            Some("http://10.0.0.2:3001".into()),
            Some("ws://10.0.0.3:9000/live".into()),
        );
        assert_eq!(config.backend_url, "http://10.0.0.2:3001");
        assert_eq!(config.websocket_url, "ws://10.0.0.3:9000/live");

        assert_eq!(resolve(base.clone(), None, None), base);
    }
}
