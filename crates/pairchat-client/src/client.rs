//! ChatClient: the operations a UI calls, on top of the sync engine.

use std::sync::Arc;

use pairchat_crypto::{CipherEngine, Key};
use pairchat_proto::{Message, Participant, SendMessageRequest};
use tokio::sync::watch;
use tracing::info;

use crate::error::ClientError;
use crate::notify::NotificationSource;
use crate::store::MessageStore;
use crate::sync::{SyncConfig, SyncEngine};
use crate::view::{ConnectionState, ConversationView};

/// A logged-in participant's session. Dropping it (or `logout`) releases the key.
pub struct ChatClient<S, N> {
    user: Participant,
    cipher: Arc<CipherEngine>,
    store: Arc<S>,
    sync: SyncEngine<S, N>,
}

impl<S: MessageStore, N: NotificationSource> ChatClient<S, N> {
    pub fn new(
        user: Participant,
        key: Key,
        store: Arc<S>,
        notifications: Arc<N>,
        config: SyncConfig,
    ) -> Self {
        let cipher = Arc::new(CipherEngine::new(key));
        let sync = SyncEngine::new(store.clone(), notifications, cipher.clone(), config);
        Self {
            user,
            cipher,
            store,
            sync,
        }
    }

    pub fn user(&self) -> Participant {
        self.user
    }

    pub fn sync(&self) -> &SyncEngine<S, N> {
        &self.sync
    }

    pub fn view(&self) -> watch::Receiver<ConversationView> {
        self.sync.subscribe_view()
    }

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.sync.subscribe_connection()
    }

    pub async fn start(&self) {
        self.sync.start_for_user(self.user).await;
    }

    /// Encrypt `text` and store it for the peer. The view refreshes on the
    /// following poll, which is requested immediately.
    pub async fn send(&self, text: &str) -> Result<Message, ClientError> {
        if text.trim().is_empty() {
            return Err(ClientError::EmptyMessage);
        }
        let request = SendMessageRequest {
            receiver: self.user.peer(),
            encrypted_content: self.cipher.encrypt(text)?,
        };
        let stored = self.store.send_message(self.user, &request).await?;
        self.sync.request_poll();
        Ok(stored)
    }

    /// Wipe the history for both participants.
    pub async fn clear_history(&self) -> Result<(), ClientError> {
        self.store.clear_messages().await?;
        info!(user = %self.user, "history cleared");
        self.sync.request_poll();
        Ok(())
    }

    /// Stop syncing and release the key.
    pub async fn logout(self) -> Result<(), ClientError> {
        self.sync.stop_for_user().await;
        info!(user = %self.user, "logged out");
        Ok(())
    }
}
