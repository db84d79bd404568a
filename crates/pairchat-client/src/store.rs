use async_trait::async_trait;
use pairchat_proto::{LoginRequest, LoginResponse, Message, Participant, SendMessageRequest};
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::error::SyncError;

/// The message store the engine reads from and the client writes to.
///
/// Implementations only ever see ciphertext envelopes.
#[async_trait]
pub trait MessageStore: Send + Sync + 'static {
    /// Every message `user` sent or received, in any order.
    async fn fetch_messages(&self, user: Participant) -> Result<Vec<Message>, SyncError>;

    async fn send_message(
        &self,
        sender: Participant,
        request: &SendMessageRequest,
    ) -> Result<Message, SyncError>;

    /// Wipes the whole history for both participants.
    async fn clear_messages(&self) -> Result<(), SyncError>;

    async fn login(&self, password: &str) -> Result<LoginResponse, SyncError>;
}

/// `MessageStore` over the store's HTTP API.
#[derive(Clone)]
pub struct HttpMessageStore {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpMessageStore {
    pub fn new(api_base_url: &str) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pairchat/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: api_base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Attach the session token issued at login to every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.is_empty()).then_some(token);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

fn expect_success(res: Response, what: &str) -> Result<Response, SyncError> {
    if res.status().is_success() {
        return Ok(res);
    }
    Err(SyncError::Transport(format!("{what} failed with status {}", res.status())))
}

async fn decode<T: DeserializeOwned>(res: Response, what: &str) -> Result<T, SyncError> {
    let body = res.bytes().await?;
    serde_json::from_slice(&body)
        .map_err(|e| SyncError::Protocol(format!("{what}: unexpected response body: {e}")))
}

/// Convert a listing record by record. Records that do not decode are
/// logged and dropped; the rest of the listing is kept.
fn messages_from_listing(listing: Vec<Value>) -> Vec<Message> {
    listing
        .into_iter()
        .filter_map(|record| {
            let id = record
                .get("id")
                .map(|id| id.to_string())
                .unwrap_or_default();
            match serde_json::from_value::<Message>(record) {
                Ok(message) => Some(message),
                Err(err) => {
                    warn!(%id, error = %err, "skipping malformed store record");
                    None
                }
            }
        })
        .collect()
}

#[async_trait]
impl MessageStore for HttpMessageStore {
    async fn fetch_messages(&self, user: Participant) -> Result<Vec<Message>, SyncError> {
        let url = self.url(&format!("/messages/{user}"));
        let res = self.authorize(self.client.get(url)).send().await?;
        let res = expect_success(res, "message fetch")?;
        let listing: Vec<Value> = decode(res, "message fetch").await?;
        Ok(messages_from_listing(listing))
    }

    async fn send_message(
        &self,
        sender: Participant,
        request: &SendMessageRequest,
    ) -> Result<Message, SyncError> {
        let res = self
            .authorize(self.client.post(self.url("/messages")))
            .query(&[("sender", sender.as_str())])
            .json(request)
            .send()
            .await?;
        let res = expect_success(res, "message send")?;
        decode(res, "message send").await
    }

    async fn clear_messages(&self) -> Result<(), SyncError> {
        let res = self
            .authorize(self.client.delete(self.url("/messages/clear")))
            .send()
            .await?;
        expect_success(res, "history clear")?;
        Ok(())
    }

    async fn login(&self, password: &str) -> Result<LoginResponse, SyncError> {
        let res = self
            .client
            .post(self.url("/login"))
            .json(&LoginRequest {
                password: password.to_string(),
            })
            .send()
            .await?;
        let res = expect_success(res, "login")?;
        decode(res, "login").await
    }
}
