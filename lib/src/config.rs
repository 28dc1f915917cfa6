use serde::{Deserialize, Serialize};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3001";

/// Where the dashboard finds its backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClashboardConfig {
    /// Base URL of the REST API, without a trailing slash.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// WebSocket URL of the broadcast channel.
    #[serde(default = "default_websocket_url")]
    pub websocket_url: String,
}

impl Default for ClashboardConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            websocket_url: default_websocket_url(),
        }
    }
}

impl ClashboardConfig {
    /// Config for a backend at `base`, with the channel URL derived from it.
    pub fn for_backend(base: &str) -> Self {
        let backend_url = base.trim_end_matches('/').to_string();
        Self {
            websocket_url: websocket_url_for(&backend_url),
            backend_url,
        }
    }
}

/// `http://host:port` -> `ws://host:port/ws` (and `https` -> `wss`).
pub fn websocket_url_for(base: &str) -> String {
    let ws_base = base
        .trim_end_matches('/')
        .replace("http://", "ws://")
        .replace("https://", "wss://");
    format!("{ws_base}/ws")
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_websocket_url() -> String {
    websocket_url_for(DEFAULT_BACKEND_URL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_channel_url() {
        let config = ClashboardConfig::for_backend("https://clash.example.org/");
        assert_eq!(config.backend_url, "https://clash.example.org");
        assert_eq!(config.websocket_url, "wss://clash.example.org/ws");
        assert_eq!(
            ClashboardConfig::default().websocket_url,
            "ws://localhost:3001/ws"
        );
    }
}
