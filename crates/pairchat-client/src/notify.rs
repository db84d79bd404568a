//! Notification socket: a per-user stream of "something changed" hints.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use pairchat_proto::{ClientFrame, NotificationEvent, Participant};
use tokio::net::TcpStream;
use tokio_tungstenite::{tungstenite::Message as WsMessage, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use crate::error::SyncError;

/// An open notification channel.
#[async_trait]
pub trait NotificationChannel: Send {
    /// Next event, or `None` once the server has closed the channel.
    async fn next_event(&mut self) -> Option<Result<NotificationEvent, SyncError>>;

    async fn send_keepalive(&mut self) -> Result<(), SyncError>;

    async fn close(&mut self);
}

/// Opens notification channels scoped to one participant.
#[async_trait]
pub trait NotificationSource: Send + Sync + 'static {
    async fn connect(&self, user: Participant) -> Result<Box<dyn NotificationChannel>, SyncError>;
}

/// WebSocket notifications at `{ws_base}/api/ws/{user}`.
#[derive(Debug, Clone)]
pub struct WsNotificationSource {
    ws_base_url: String,
}

impl WsNotificationSource {
    pub fn new(ws_base_url: &str) -> Self {
        Self {
            ws_base_url: ws_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, user: Participant) -> String {
        format!("{}/api/ws/{}", self.ws_base_url, user)
    }
}

/// `http(s)://host` → `ws(s)://host`; anything else is returned unchanged.
pub fn ws_url_from_http(api_base_url: &str) -> String {
    let base = api_base_url.trim_end_matches('/');
    if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_string()
    }
}

#[async_trait]
impl NotificationSource for WsNotificationSource {
    async fn connect(&self, user: Participant) -> Result<Box<dyn NotificationChannel>, SyncError> {
        let url = self.url_for(user);
        let (stream, _) = tokio_tungstenite::connect_async(url.as_str()).await?;
        debug!(%url, "notification socket open");
        Ok(Box::new(WsChannel { stream }))
    }
}

struct WsChannel {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl NotificationChannel for WsChannel {
    async fn next_event(&mut self) -> Option<Result<NotificationEvent, SyncError>> {
        loop {
            match self.stream.next().await? {
                Ok(WsMessage::Text(text)) => match serde_json::from_str(&text) {
                    Ok(event) => return Some(Ok(event)),
                    Err(err) => warn!(error = %err, "undecodable notification frame"),
                },
                Ok(WsMessage::Close(_)) => return None,
                // Pings are answered by tungstenite while reading.
                Ok(_) => continue,
                Err(err) => return Some(Err(err.into())),
            }
        }
    }

    async fn send_keepalive(&mut self) -> Result<(), SyncError> {
        let frame = ClientFrame::Ping {
            data: "keepalive".into(),
        };
        let text = serde_json::to_string(&frame)
            .map_err(|e| SyncError::Protocol(e.to_string()))?;
        self.stream.send(WsMessage::Text(text)).await?;
        Ok(())
    }

    async fn close(&mut self) {
        if let Err(err) = self.stream.close(None).await {
            debug!(error = %err, "notification socket close");
        }
    }
}
