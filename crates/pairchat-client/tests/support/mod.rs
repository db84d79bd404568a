//! In-memory stand-ins for the message store and the notification socket.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use pairchat_client::{MessageStore, NotificationChannel, NotificationSource, SyncError};
use pairchat_proto::{LoginResponse, Message, NotificationEvent, Participant, SendMessageRequest};
use parking_lot::Mutex;
use tokio::sync::{mpsc, OwnedRwLockWriteGuard, RwLock};

#[derive(Default)]
pub struct HubStats {
    pub connects: AtomicUsize,
    pub keepalives: AtomicUsize,
    pub closes: AtomicUsize,
}

/// Notification server fake: one channel per connected participant.
#[derive(Default)]
pub struct FakeHub {
    senders: Mutex<HashMap<Participant, mpsc::UnboundedSender<NotificationEvent>>>,
    refuse: AtomicBool,
    pub stats: Arc<HubStats>,
}

impl FakeHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Deliver `event` to `user` if connected.
    pub fn push(&self, user: Participant, event: NotificationEvent) -> bool {
        match self.senders.lock().get(&user) {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    pub fn new_message(&self, user: Participant) -> bool {
        self.push(user, NotificationEvent::NewMessage { message: None })
    }

    /// Server-side close of `user`'s channel.
    pub fn disconnect(&self, user: Participant) {
        self.senders.lock().remove(&user);
    }

    pub fn refuse_connections(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    pub fn connects(&self) -> usize {
        self.stats.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.stats.closes.load(Ordering::SeqCst)
    }

    pub fn keepalives(&self) -> usize {
        self.stats.keepalives.load(Ordering::SeqCst)
    }
}

struct FakeChannel {
    rx: mpsc::UnboundedReceiver<NotificationEvent>,
    stats: Arc<HubStats>,
}

#[async_trait]
impl NotificationChannel for FakeChannel {
    async fn next_event(&mut self) -> Option<Result<NotificationEvent, SyncError>> {
        self.rx.recv().await.map(Ok)
    }

    async fn send_keepalive(&mut self) -> Result<(), SyncError> {
        self.stats.keepalives.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&mut self) {
        self.stats.closes.fetch_add(1, Ordering::SeqCst);
        self.rx.close();
    }
}

#[async_trait]
impl NotificationSource for FakeHub {
    async fn connect(
        &self,
        user: Participant,
    ) -> Result<Box<dyn NotificationChannel>, SyncError> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(SyncError::Transport("connection refused".into()));
        }
        self.stats.connects.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.lock().insert(user, tx);
        Ok(Box::new(FakeChannel {
            rx,
            stats: self.stats.clone(),
        }))
    }
}

/// Message store fake with the same visibility rules as the real one.
pub struct FakeStore {
    messages: Mutex<Vec<Message>>,
    /// Per-user listing that replaces the shared log when set.
    scripted: Mutex<HashMap<Participant, Vec<Message>>>,
    gates: HashMap<Participant, Arc<RwLock<()>>>,
    fetches: AtomicUsize,
    fail_fetches: AtomicBool,
    fail_sends: AtomicBool,
    hub: Option<Arc<FakeHub>>,
}

impl FakeStore {
    pub fn new(hub: Option<Arc<FakeHub>>) -> Arc<Self> {
        Arc::new(Self {
            messages: Mutex::new(Vec::new()),
            scripted: Mutex::new(HashMap::new()),
            gates: Participant::ALL
                .into_iter()
                .map(|p| (p, Arc::new(RwLock::new(()))))
                .collect(),
            fetches: AtomicUsize::new(0),
            fail_fetches: AtomicBool::new(false),
            fail_sends: AtomicBool::new(false),
            hub,
        })
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Fetches for `user` block until the returned guard is dropped.
    pub async fn hold(&self, user: Participant) -> OwnedRwLockWriteGuard<()> {
        self.gates[&user].clone().write_owned().await
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn script(&self, user: Participant, listing: Vec<Message>) {
        self.scripted.lock().insert(user, listing);
    }

    pub fn insert_raw(&self, message: Message) {
        self.messages.lock().push(message);
    }

    pub fn raw_messages(&self) -> Vec<Message> {
        self.messages.lock().clone()
    }

    fn record(&self, sender: Participant, receiver: Participant, envelope: String) -> Message {
        let mut messages = self.messages.lock();
        let message = Message {
            id: format!("{:08}", messages.len() + 1),
            sender,
            receiver,
            encrypted_content: envelope,
            timestamp: Utc::now(),
        };
        messages.push(message.clone());
        message
    }

    pub fn seed(&self, sender: Participant, envelope: String) -> Message {
        self.record(sender, sender.peer(), envelope)
    }
}

#[async_trait]
impl MessageStore for FakeStore {
    async fn fetch_messages(&self, user: Participant) -> Result<Vec<Message>, SyncError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let _gate = self.gates[&user].read().await;
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(SyncError::Transport("store unavailable".into()));
        }
        if let Some(listing) = self.scripted.lock().get(&user) {
            return Ok(listing.clone());
        }
        Ok(self
            .messages
            .lock()
            .iter()
            .filter(|m| m.sender == user || m.receiver == user)
            .cloned()
            .collect())
    }

    async fn send_message(
        &self,
        sender: Participant,
        request: &SendMessageRequest,
    ) -> Result<Message, SyncError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(SyncError::Transport("send failed with status 500".into()));
        }
        let message = self.record(sender, request.receiver, request.encrypted_content.clone());
        if let Some(hub) = &self.hub {
            hub.new_message(request.receiver);
        }
        Ok(message)
    }

    async fn clear_messages(&self) -> Result<(), SyncError> {
        self.messages.lock().clear();
        Ok(())
    }

    async fn login(&self, password: &str) -> Result<LoginResponse, SyncError> {
        let user = match password {
            "alphabravocharlie" => Some(Participant::Alpha),
            "bravoalphacharlie" => Some(Participant::Bravo),
            _ => None,
        };
        Ok(LoginResponse {
            success: user.is_some(),
            user,
            token: user.map(|_| "token".to_string()).unwrap_or_default(),
            message: String::new(),
        })
    }
}
