//! Route guarding on top of the session check.
//!
//! A [`RouteGuard`] is shared by every mount of a protected route. Each
//! [`RouteGuard::mount`] returns a [`GuardHandle`] that starts in
//! [`GuardState::Pending`], kicks off its checks on the first observation
//! (render, `changed`, `settled`), and stops applying results once dropped.

pub mod state;

pub use state::{
    GuardContext, GuardEffect, GuardEvent, GuardMode, GuardState, Redirect, Rendered,
};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bon::Builder;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::auth::{ProfileFetcher, TokenAuthenticator};
use crate::config::KeywardConfig;
use crate::util::retry::RetryPolicy;
use crate::util::timeout::with_timeout;

pub const DEFAULT_RESTRICTED_MESSAGE: &str =
    "This section is restricted to administrators and managers.";

/// Session check a guard waits on.
#[async_trait]
pub trait SessionCheck: Send + Sync {
    async fn check_authenticated(&self) -> bool;
}

#[async_trait]
impl SessionCheck for TokenAuthenticator {
    async fn check_authenticated(&self) -> bool {
        TokenAuthenticator::check_authenticated(self).await
    }
}

/// Receives the blocking restricted-access notification.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Notifier that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str) {
        tracing::warn!(notification = message, "Restricted route blocked");
    }
}

/// Per-guard settings.
#[derive(Debug, Clone, Builder)]
pub struct GuardOptions {
    #[builder(default = GuardMode::TokenOnly)]
    pub mode: GuardMode,
    #[builder(default = "/".to_string(), into)]
    pub login_route: String,
    #[builder(default = "/home".to_string(), into)]
    pub landing_route: String,
    #[builder(default = DEFAULT_RESTRICTED_MESSAGE.to_string(), into)]
    pub restricted_message: String,
    /// Upper bound on the whole session check, refresh included.
    #[builder(default = Duration::from_secs(30))]
    pub check_timeout: Duration,
    /// Upper bound on a single profile fetch attempt.
    #[builder(default = Duration::from_secs(10))]
    pub profile_timeout: Duration,
    #[builder(default = 2)]
    pub profile_attempts: u32,
}

impl GuardOptions {
    /// Token-only options with routes and timeouts taken from `config`.
    pub fn token_only(config: &KeywardConfig) -> Self {
        // Every probe and refresh the budget allows, plus one request of slack.
        let requests = config
            .max_refresh_attempts
            .saturating_mul(2)
            .saturating_add(2);
        Self {
            mode: GuardMode::TokenOnly,
            login_route: config.login_route.clone(),
            landing_route: config.landing_route.clone(),
            restricted_message: DEFAULT_RESTRICTED_MESSAGE.to_string(),
            check_timeout: config.request_timeout.saturating_mul(requests),
            profile_timeout: config.request_timeout,
            profile_attempts: config.profile_attempts,
        }
    }

    /// Role-gated options restricting `config.restricted_role`.
    pub fn role_gated(config: &KeywardConfig) -> Self {
        Self {
            mode: GuardMode::RoleGated {
                restricted_role: config.restricted_role.clone(),
            },
            ..Self::token_only(config)
        }
    }
}

/// Gate for one protected route.
pub struct RouteGuard {
    session: Arc<dyn SessionCheck>,
    profile: Option<Arc<dyn ProfileFetcher>>,
    notifier: Arc<dyn Notifier>,
    options: GuardOptions,
}

impl RouteGuard {
    pub fn new(session: Arc<dyn SessionCheck>, options: GuardOptions) -> Self {
        Self {
            session,
            profile: None,
            notifier: Arc::new(TracingNotifier),
            options,
        }
    }

    /// Profile source for role-gated guards.
    pub fn with_profile(mut self, profile: Arc<dyn ProfileFetcher>) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn options(&self) -> &GuardOptions {
        &self.options
    }

    /// Mount the guard for `location`. Must be called inside a tokio runtime.
    ///
    /// The returned handle stays in [`GuardState::Pending`] and performs no
    /// I/O until it is first observed through [`GuardHandle::render`],
    /// [`GuardHandle::changed`] or [`GuardHandle::settled`]. Reading
    /// [`GuardHandle::state`] alone never starts the checks.
    pub fn mount(&self, location: impl Into<String>) -> GuardHandle {
        let location = location.into();
        let mount_id = Uuid::new_v4();
        let (state_tx, state_rx) = watch::channel(GuardState::Pending);
        let (start_tx, start_rx) = oneshot::channel();
        let mounted = Arc::new(AtomicBool::new(true));

        let run = GuardRun {
            session: self.session.clone(),
            profile: self.profile.clone(),
            notifier: self.notifier.clone(),
            ctx: GuardContext {
                mode: self.options.mode.clone(),
                location: location.clone(),
                login_route: self.options.login_route.clone(),
                landing_route: self.options.landing_route.clone(),
                restricted_message: self.options.restricted_message.clone(),
            },
            check_timeout: self.options.check_timeout,
            profile_timeout: self.options.profile_timeout,
            profile_attempts: self.options.profile_attempts,
            mounted: mounted.clone(),
            state_tx,
        };
        let span = tracing::debug_span!("route_guard", %mount_id, location = %location);
        let task = tokio::spawn(
            async move {
                // Checks start after the first observation, like an effect after paint.
                if start_rx.await.is_err() {
                    return;
                }
                run.drive().await;
            }
            .instrument(span),
        );

        GuardHandle {
            mount_id,
            state: state_rx,
            start: Mutex::new(Some(start_tx)),
            mounted,
            task,
        }
    }
}

/// One live mount of a [`RouteGuard`]. Dropping it unmounts.
pub struct GuardHandle {
    mount_id: Uuid,
    state: watch::Receiver<GuardState>,
    start: Mutex<Option<oneshot::Sender<()>>>,
    mounted: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl GuardHandle {
    pub fn mount_id(&self) -> Uuid {
        self.mount_id
    }

    /// Current state without starting the checks.
    pub fn state(&self) -> GuardState {
        self.state.borrow().clone()
    }

    /// Render `children` for the current state, starting the checks on first use.
    pub fn render<T>(&self, children: T) -> Rendered<T> {
        let rendered = self.state.borrow().render(children);
        self.start();
        rendered
    }

    /// Wait for the next state change. `None` once no further change can happen.
    pub async fn changed(&mut self) -> Option<GuardState> {
        self.start();
        self.state.changed().await.ok()?;
        Some(self.state.borrow_and_update().clone())
    }

    /// Wait until the guard leaves the loading states.
    pub async fn settled(&mut self) -> GuardState {
        self.start();
        loop {
            let current = self.state.borrow_and_update().clone();
            if !current.is_loading() {
                return current;
            }
            if self.state.changed().await.is_err() {
                return self.state.borrow().clone();
            }
        }
    }

    /// Stop the checks; late results are discarded.
    pub fn unmount(self) {}

    fn start(&self) {
        if let Ok(mut start) = self.start.lock() {
            if let Some(tx) = start.take() {
                let _ = tx.send(());
            }
        }
    }
}

impl Drop for GuardHandle {
    fn drop(&mut self) {
        self.mounted.store(false, Ordering::SeqCst);
        self.task.abort();
    }
}

struct GuardRun {
    session: Arc<dyn SessionCheck>,
    profile: Option<Arc<dyn ProfileFetcher>>,
    notifier: Arc<dyn Notifier>,
    ctx: GuardContext,
    check_timeout: Duration,
    profile_timeout: Duration,
    profile_attempts: u32,
    mounted: Arc<AtomicBool>,
    state_tx: watch::Sender<GuardState>,
}

impl GuardRun {
    async fn drive(self) {
        let authenticated =
            match tokio::time::timeout(self.check_timeout, self.session.check_authenticated())
                .await
            {
                Ok(authenticated) => authenticated,
                Err(_) => {
                    tracing::warn!(
                        timeout_ms = self.check_timeout.as_millis() as u64,
                        "Session check timed out"
                    );
                    false
                }
            };
        let Some(state) = self.advance(&GuardState::Pending, GuardEvent::Authenticated(authenticated))
        else {
            return;
        };
        if state != GuardState::ResolvingRole {
            return;
        }

        let event = self.resolve_role().await;
        self.advance(&state, event);
    }

    async fn resolve_role(&self) -> GuardEvent {
        let Some(profile) = self.profile.clone() else {
            return GuardEvent::ProfileFailed("no profile source configured".to_string());
        };
        let policy = RetryPolicy::with_attempts(self.profile_attempts);
        let timeout = self.profile_timeout;
        let result = policy
            .execute("fetch_profile", || {
                let profile = profile.clone();
                async move { with_timeout(timeout, profile.fetch_profile()).await }
            })
            .await;
        match result {
            Ok(profile) => GuardEvent::RoleResolved(profile.role().to_string()),
            Err(err) => {
                tracing::warn!(error = %err, "Profile lookup failed");
                GuardEvent::ProfileFailed(err.to_string())
            }
        }
    }

    /// Apply `event` if still mounted; returns the new state when applied.
    fn advance(&self, from: &GuardState, event: GuardEvent) -> Option<GuardState> {
        if !self.mounted.load(Ordering::SeqCst) {
            tracing::debug!("Guard unmounted; discarding result");
            return None;
        }
        let (next, effect) = from.apply(event, &self.ctx)?;
        if let Some(GuardEffect::Notify(message)) = effect {
            self.notifier.notify(&message);
        }
        tracing::debug!(state = %next, "Guard state changed");
        self.state_tx.send_replace(next.clone());
        Some(next)
    }
}
