//! SyncEngine: keeps a `ConversationView` consistent with the message store.
//!
//! Two signal sources feed one reconciliation step:
//! - a fixed-interval poll timer (the source of truth), and
//! - the notification socket, whose `new_message` events arm one extra poll
//!   shortly after the event.
//!
//! Every poll fetches the full list for the active user, decrypts each
//! record, and publishes a freshly built view. A poll requested while another
//! is in flight is dropped, not queued; the next tick catches up.
//!
//! Each `start_for_user` creates a session with its own cancellation token and
//! single-flight flag. Results are only published while their session is still
//! the current one, so a slow poll from a previous user can never land in the
//! next user's view.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pairchat_crypto::CipherEngine;
use pairchat_proto::{NotificationEvent, Participant};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::notify::NotificationSource;
use crate::store::MessageStore;
use crate::view::{ConnectionState, ConversationView};

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Period of the poll timer.
    pub poll_interval: Duration,
    /// Delay between a `new_message` event and the extra poll it triggers.
    pub notify_delay: Duration,
    /// Wait before reopening a failed notification channel.
    pub reconnect_delay: Duration,
    pub keepalive_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            notify_delay: Duration::from_millis(250),
            reconnect_delay: Duration::from_secs(3),
            keepalive_interval: Duration::from_secs(25),
        }
    }
}

/// What a single `poll()` call ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// A new view with this many messages was published.
    Published { messages: usize },
    /// Another poll was already in flight for this session.
    Coalesced,
    /// The session ended or switched before the fetch completed; result dropped.
    Stale,
    /// No session is running.
    Idle,
}

struct Session {
    user: Participant,
    cancel: CancellationToken,
    in_flight: AtomicBool,
    extra_poll_armed: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    fn new(user: Participant) -> Self {
        Self {
            user,
            cancel: CancellationToken::new(),
            in_flight: AtomicBool::new(false),
            extra_poll_armed: AtomicBool::new(false),
            tasks: Mutex::new(Vec::new()),
            listener: Mutex::new(None),
        }
    }

    fn track(&self, handle: JoinHandle<()>) {
        let mut tasks = self.tasks.lock();
        tasks.retain(|h| !h.is_finished());
        tasks.push(handle);
    }
}

/// Clears the single-flight flag when the poll finishes or is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct Inner<S, N> {
    store: Arc<S>,
    notifications: Arc<N>,
    cipher: Arc<CipherEngine>,
    config: SyncConfig,
    current: Mutex<Option<Arc<Session>>>,
    view_tx: watch::Sender<ConversationView>,
    state_tx: watch::Sender<ConnectionState>,
}

/// Cheap to clone; all clones drive the same engine.
pub struct SyncEngine<S, N> {
    inner: Arc<Inner<S, N>>,
}

impl<S, N> Clone for SyncEngine<S, N> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: MessageStore, N: NotificationSource> SyncEngine<S, N> {
    pub fn new(
        store: Arc<S>,
        notifications: Arc<N>,
        cipher: Arc<CipherEngine>,
        config: SyncConfig,
    ) -> Self {
        let (view_tx, _) = watch::channel(ConversationView::default());
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(Inner {
                store,
                notifications,
                cipher,
                config,
                current: Mutex::new(None),
                view_tx,
                state_tx,
            }),
        }
    }

    pub fn subscribe_view(&self) -> watch::Receiver<ConversationView> {
        self.inner.view_tx.subscribe()
    }

    pub fn subscribe_connection(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// Latest published view.
    pub fn view(&self) -> ConversationView {
        self.inner.view_tx.borrow().clone()
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.inner.state_tx.borrow()
    }

    pub fn active_user(&self) -> Option<Participant> {
        self.inner.current.lock().as_ref().map(|s| s.user)
    }

    /// Begin syncing for `user`: open its notification channel, start the
    /// poll timer, and poll once immediately.
    ///
    /// A no-op if already running for `user`; a running session for the
    /// other user is fully stopped first. Must be called inside a tokio runtime.
    pub async fn start_for_user(&self, user: Participant) {
        if self.active_user() == Some(user) {
            debug!(%user, "sync already running");
            return;
        }
        self.stop_for_user().await;

        let session = Arc::new(Session::new(user));
        {
            let mut current = self.inner.current.lock();
            *current = Some(session.clone());
            self.inner.view_tx.send_replace(ConversationView {
                user: Some(user),
                entries: Vec::new(),
            });
        }

        let timer = tokio::spawn(run_poll_timer(self.inner.clone(), session.clone()));
        session.track(timer);
        let listener = tokio::spawn(run_listener(self.inner.clone(), session.clone()));
        *session.listener.lock() = Some(listener);

        info!(%user, "sync started");
    }

    /// Stop the timer, close the notification channel, and drop in-flight
    /// work. The published view is cleared. Safe to call when never started.
    pub async fn stop_for_user(&self) {
        let session = {
            let mut current = self.inner.current.lock();
            let session = current.take();
            if session.is_some() {
                self.inner.view_tx.send_replace(ConversationView::default());
            }
            session
        };
        let Some(session) = session else {
            return;
        };

        session.cancel.cancel();
        for handle in session.tasks.lock().drain(..) {
            handle.abort();
        }
        // The listener closes its channel on cancellation; wait for that.
        let listener = session.listener.lock().take();
        if let Some(listener) = listener {
            if let Err(err) = listener.await {
                if !err.is_cancelled() {
                    warn!(error = %err, "notification listener ended abnormally");
                }
            }
        }
        self.inner.state_tx.send_replace(ConnectionState::Disconnected);
        info!(user = %session.user, "sync stopped");
    }

    /// Fetch, decrypt, order, and publish. Single-flight per session.
    ///
    /// On failure the previous view stays published.
    pub async fn poll(&self) -> Result<PollOutcome, SyncError> {
        let session = self.inner.current.lock().clone();
        match session {
            Some(session) => self.inner.poll_session(&session).await,
            None => Ok(PollOutcome::Idle),
        }
    }

    /// React to a notification event as if it had arrived on the channel.
    pub fn on_notification(&self, event: &NotificationEvent) {
        let session = self.inner.current.lock().clone();
        if let Some(session) = session {
            self.inner.handle_notification(&session, event);
        }
    }

    /// Poll now in the background, e.g. right after a local write.
    pub fn request_poll(&self) {
        let session = self.inner.current.lock().clone();
        let Some(session) = session else {
            return;
        };
        let inner = self.inner.clone();
        let task_session = session.clone();
        let handle = tokio::spawn(async move {
            let _ = inner.poll_session(&task_session).await;
        });
        session.track(handle);
    }
}

impl<S: MessageStore, N: NotificationSource> Inner<S, N> {
    fn is_current(&self, session: &Arc<Session>) -> bool {
        matches!(self.current.lock().as_ref(), Some(s) if Arc::ptr_eq(s, session))
    }

    async fn poll_session(&self, session: &Arc<Session>) -> Result<PollOutcome, SyncError> {
        if session.cancel.is_cancelled() {
            return Ok(PollOutcome::Stale);
        }
        let Some(_flight) = InFlight::acquire(&session.in_flight) else {
            debug!(user = %session.user, "poll already in flight");
            return Ok(PollOutcome::Coalesced);
        };

        let records = match self.store.fetch_messages(session.user).await {
            Ok(records) => records,
            Err(err) => {
                warn!(user = %session.user, error = %err, "poll failed; keeping previous view");
                return Err(err);
            }
        };
        let view = ConversationView::build(session.user, records, &self.cipher);
        let messages = view.len();

        let current = self.current.lock();
        match current.as_ref() {
            Some(s) if Arc::ptr_eq(s, session) => {}
            _ => {
                debug!(user = %session.user, "discarding poll result from ended session");
                return Ok(PollOutcome::Stale);
            }
        }
        self.view_tx.send_if_modified(|published| {
            if *published == view {
                return false;
            }
            *published = view;
            true
        });
        drop(current);
        Ok(PollOutcome::Published { messages })
    }

    fn set_connection_state(&self, session: &Arc<Session>, state: ConnectionState) {
        let current = self.current.lock();
        if !matches!(current.as_ref(), Some(s) if Arc::ptr_eq(s, session)) {
            return;
        }
        self.state_tx.send_if_modified(|published| {
            if *published == state {
                return false;
            }
            *published = state;
            true
        });
    }
}

impl<S: MessageStore, N: NotificationSource> Inner<S, N> {
    fn handle_notification(self: &Arc<Self>, session: &Arc<Session>, event: &NotificationEvent) {
        if !event.is_new_message() {
            return;
        }
        if session.extra_poll_armed.swap(true, Ordering::AcqRel) {
            debug!(user = %session.user, "extra poll already scheduled this interval");
            return;
        }
        let inner = self.clone();
        let task_session = session.clone();
        let delay = self.config.notify_delay;
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = task_session.cancel.cancelled() => return,
                _ = time::sleep(delay) => {}
            }
            let _ = inner.poll_session(&task_session).await;
        });
        session.track(handle);
    }
}

async fn run_poll_timer<S: MessageStore, N: NotificationSource>(
    inner: Arc<Inner<S, N>>,
    session: Arc<Session>,
) {
    let mut ticker = time::interval(inner.config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = session.cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        session.extra_poll_armed.store(false, Ordering::Release);
        let _ = inner.poll_session(&session).await;
    }
}

async fn run_listener<S: MessageStore, N: NotificationSource>(
    inner: Arc<Inner<S, N>>,
    session: Arc<Session>,
) {
    let user = session.user;
    loop {
        inner.set_connection_state(&session, ConnectionState::Connecting);
        let connected = tokio::select! {
            _ = session.cancel.cancelled() => break,
            res = inner.notifications.connect(user) => res,
        };

        match connected {
            Ok(mut channel) => {
                inner.set_connection_state(&session, ConnectionState::Connected);
                info!(%user, "notification channel connected");
                let period = inner.config.keepalive_interval;
                let mut keepalive = time::interval_at(Instant::now() + period, period);
                let ended = loop {
                    tokio::select! {
                        _ = session.cancel.cancelled() => {
                            channel.close().await;
                            return;
                        }
                        _ = keepalive.tick() => {
                            if let Err(err) = channel.send_keepalive().await {
                                break Some(err);
                            }
                        }
                        event = channel.next_event() => match event {
                            Some(Ok(event)) => inner.handle_notification(&session, &event),
                            Some(Err(err)) => break Some(err),
                            None => break None,
                        }
                    }
                };
                match ended {
                    Some(err) => warn!(%user, error = %err, "notification channel failed"),
                    None => info!(%user, "notification channel closed by server"),
                }
            }
            Err(err) => warn!(%user, error = %err, "notification channel connect failed"),
        }

        inner.set_connection_state(&session, ConnectionState::Disconnected);
        tokio::select! {
            _ = session.cancel.cancelled() => break,
            _ = time::sleep(inner.config.reconnect_delay) => {}
        }
    }
    debug!(%user, current = inner.is_current(&session), "notification listener exiting");
}
