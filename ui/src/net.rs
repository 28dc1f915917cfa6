//! Networking: ehttp REST + ewebsock WebSocket.
//!
//! `HttpBackend` and `WsChannel` are the real implementations of the engine's
//! `Backend` and `Channel` seams. Completion callbacks may run on a background
//! thread; the engine queues their results and applies them on the frame loop.

use crate::engine::{Backend, Channel, ResponseHandler};
use crate::types::{ApiRequest, ClashError, ErrorResponse};

// ---------------------------------------------------------------------------
// Helpers: platform-specific URL resolution
// ---------------------------------------------------------------------------

/// Backend config derived from the page origin (the page is served by the backend).
#[cfg(target_arch = "wasm32")]
pub fn browser_config() -> crate::types::ClashboardConfig {
    let origin = web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_default();
    if origin.is_empty() || origin == "null" {
        crate::types::ClashboardConfig::default()
    } else {
        crate::types::ClashboardConfig::for_backend(&origin)
    }
}

// ---------------------------------------------------------------------------
// REST
// ---------------------------------------------------------------------------

pub struct HttpBackend {
    base: String,
}

impl HttpBackend {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    fn build(&self, request: &ApiRequest) -> ehttp::Request {
        let url = format!("{}{}", self.base, request.path());
        let mut req = match request.body() {
            Some(body) => {
                let mut req = ehttp::Request::post(&url, body);
                // `post` defaults to text/plain; replace rather than append.
                req.headers = ehttp::Headers::new(&[
                    ("Accept", "*/*"),
                    ("Content-Type", "application/json"),
                ]);
                req
            }
            None => ehttp::Request::get(&url),
        };
        req.method = request.method().to_string();
        req
    }
}

impl Backend for HttpBackend {
    fn send(&self, request: ApiRequest, on_done: ResponseHandler) {
        let req = self.build(&request);
        ehttp::fetch(req, move |result| on_done(into_result(result)));
    }
}

/// Non-2xx responses become `ClashError::Status`, using the backend's
/// `{"error": ...}` text when it sends one.
fn into_result(result: ehttp::Result<ehttp::Response>) -> Result<Vec<u8>, ClashError> {
    let resp = result.map_err(ClashError::Transport)?;
    if resp.ok {
        return Ok(resp.bytes);
    }
    let reason = serde_json::from_slice::<ErrorResponse>(&resp.bytes)
        .map(|e| e.error)
        .unwrap_or(resp.status_text);
    Err(ClashError::Status {
        status: resp.status,
        reason,
    })
}

// ---------------------------------------------------------------------------
// WebSocket
// ---------------------------------------------------------------------------

pub struct WsChannel(ewebsock::WsSender);

impl WsChannel {
    pub fn new(tx: ewebsock::WsSender) -> Self {
        Self(tx)
    }
}

impl Channel for WsChannel {
    fn send(&mut self, text: String) {
        self.0.send(ewebsock::WsMessage::Text(text));
    }
}

pub fn connect_ws(url: &str) -> Option<(ewebsock::WsSender, ewebsock::WsReceiver)> {
    // In WASM the socket is still CONNECTING here; nothing may be sent
    // until WsEvent::Opened.
    match ewebsock::connect(url, ewebsock::Options::default()) {
        Ok(pair) => Some(pair),
        Err(e) => {
            log::error!("WebSocket connect to {url} failed: {e}");
            None
        }
    }
}

/// Result from polling the WebSocket.
#[derive(Debug)]
pub enum WsPollEvent {
    Opened,
    /// A text frame, handed to the engine unparsed.
    Text(String),
    Error(String),
    Disconnected,
}

pub fn poll_ws(rx: &mut ewebsock::WsReceiver) -> Vec<WsPollEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.try_recv() {
        match event {
            ewebsock::WsEvent::Opened => {
                log::info!("WebSocket opened");
                events.push(WsPollEvent::Opened);
            }
            ewebsock::WsEvent::Message(ewebsock::WsMessage::Text(text)) => {
                events.push(WsPollEvent::Text(text));
            }
            ewebsock::WsEvent::Error(e) => {
                log::error!("WebSocket error: {e}");
                events.push(WsPollEvent::Error(e));
            }
            ewebsock::WsEvent::Closed => {
                log::warn!("WebSocket closed");
                events.push(WsPollEvent::Disconnected);
                break;
            }
            _ => {}
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MapStatUpdate, NewPlayerRequest};

    fn response(status: u16, body: &str) -> ehttp::Response {
        ehttp::Response {
            url: "http://localhost:3001/clash".into(),
            ok: (200..300).contains(&status),
            status,
            status_text: "Status Text".into(),
            headers: Default::default(),
            bytes: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn builds_requests_against_base() {
        let backend = HttpBackend::new("http://localhost:3001/");

        let req = backend.build(&ApiRequest::GetClash(4));
        assert_eq!(req.method, "GET");
        assert_eq!(req.url, "http://localhost:3001/clash/4");

        let req = backend.build(&ApiRequest::UpdateMapStat {
            clash_id: 4,
            player_id: 9,
            map_index: 2,
            update: MapStatUpdate::Kills(3.0),
        });
        assert_eq!(req.method, "PUT");
        assert_eq!(req.url, "http://localhost:3001/clash/4/player/9/map/2");
        let content_types: Vec<&str> = req
            .headers
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(content_types, vec!["application/json"]);

        let req = backend.build(&ApiRequest::CreatePlayer(NewPlayerRequest {
            id: 0,
            name: "Nova".into(),
        }));
        assert_eq!(req.method, "POST");
        assert!(!req.body.is_empty());

        let req = backend.build(&ApiRequest::DeleteAllClashes);
        assert_eq!(req.method, "DELETE");
    }

    #[test]
    fn status_errors_carry_the_server_reason() {
        assert_eq!(into_result(Ok(response(201, "{}"))).unwrap(), b"{}".to_vec());

        match into_result(Ok(response(404, r#"{"error":"Clash not found"}"#))) {
            Err(ClashError::Status { status, reason }) => {
                assert_eq!(status, 404);
                assert_eq!(reason, "Clash not found");
            }
            other => panic!("unexpected {other:?}"),
        }

        match into_result(Ok(response(502, "<html>"))) {
            Err(ClashError::Status { reason, .. }) => assert_eq!(reason, "Status Text"),
            other => panic!("unexpected {other:?}"),
        }

        assert!(matches!(
            into_result(Err("connection refused".into())),
            Err(ClashError::Transport(_))
        ));
    }
}
