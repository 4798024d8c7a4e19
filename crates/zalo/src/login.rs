//! QR login-flow state machine.
//!
//! Drives the external handshake: start a session, poll its status, and on
//! success persist the new linked account. State transitions:
//!
//! ```text
//! Initializing -> QrRequired -> LoggedIn            (success)
//! QrRequired -> QrExpired -> Initializing           (fresh QR code)
//! any -> Failed                                      (terminal)
//! ```
//!
//! Polling is serialized: each tick awaits the status call before the next
//! tick is scheduled, so ticks never overlap. The task is cancelled through
//! a [`CancellationToken`] on [`LoginFlow::stop`] and exits on its own on a
//! terminal transition, so no timer outlives the flow.

use std::{sync::Arc, time::Duration};

use {
    tokio::sync::watch,
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
};

use {
    crate::{client::ZaloClient, types::LoginStatus},
    ztool_accounts::{AccountRegistry, LinkedAccount},
    ztool_member::MemberClient,
    ztool_store::{RecordStore, records},
};

/// Observable state of a login flow.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginState {
    Initializing,
    /// A QR code is waiting to be scanned; `qr_data` is a base64 PNG.
    QrRequired { qr_data: Option<String> },
    QrExpired,
    LoggedIn { account: LinkedAccount },
    /// Terminal until the caller starts a new flow.
    Failed { message: String },
}

#[derive(Debug, Clone)]
pub struct LoginFlowConfig {
    /// Status poll cadence.
    pub poll_interval: Duration,
    /// Pause between an expired QR and requesting a fresh session.
    pub retry_delay: Duration,
    /// Pause after a successful (or force-logout) save before reporting.
    pub settle_delay: Duration,
}

impl Default for LoginFlowConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            retry_delay: Duration::from_secs(2),
            settle_delay: Duration::from_secs(2),
        }
    }
}

/// Handle to a running login flow.
pub struct LoginFlow {
    state_rx: watch::Receiver<LoginState>,
    cancel: CancellationToken,
    handle: tokio::task::JoinHandle<()>,
}

impl LoginFlow {
    /// Start the handshake in a background task. At most one poll loop runs
    /// per flow; dropping or stopping the handle cancels it.
    pub fn spawn(
        zalo: ZaloClient,
        member: MemberClient,
        registry: Arc<AccountRegistry>,
        store: Arc<dyn RecordStore>,
        config: LoginFlowConfig,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(LoginState::Initializing);
        let cancel = CancellationToken::new();
        let worker = Worker {
            zalo,
            member,
            registry,
            store,
            config,
            state: state_tx,
        };

        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {},
                () = worker.run() => {},
            }
        });

        Self {
            state_rx,
            cancel,
            handle,
        }
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<LoginState> {
        self.state_rx.clone()
    }

    pub fn state(&self) -> LoginState {
        self.state_rx.borrow().clone()
    }

    /// Cancel the poll loop.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the flow to reach a terminal state or be cancelled.
    pub async fn join(mut self) {
        let _ = (&mut self.handle).await;
    }
}

impl Drop for LoginFlow {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Worker {
    zalo: ZaloClient,
    member: MemberClient,
    registry: Arc<AccountRegistry>,
    store: Arc<dyn RecordStore>,
    config: LoginFlowConfig,
    state: watch::Sender<LoginState>,
}

impl Worker {
    async fn run(&self) {
        // Outer loop: one iteration per handshake session. A fresh session
        // is requested after every expired QR code.
        loop {
            self.set(LoginState::Initializing);

            let Some(session_id) = self.start_session().await else {
                return;
            };

            match self.poll_session(&session_id).await {
                PollOutcome::Terminal => return,
                PollOutcome::RestartSession => {
                    tokio::time::sleep(self.config.retry_delay).await;
                },
            }
        }
    }

    /// Request a new handshake. Proxy settings are read fresh from the
    /// record store at call time, never cached across calls.
    async fn start_session(&self) -> Option<String> {
        let proxy = records::load_proxy(self.store.as_ref());
        match self.zalo.start_login(proxy.as_ref()).await {
            Ok(resp) if resp.success => match resp.session_id {
                Some(id) => {
                    info!(session_id = %id, "login handshake started");
                    Some(id)
                },
                None => {
                    self.fail("start-login response missing sessionId");
                    None
                },
            },
            Ok(resp) => {
                let message = resp
                    .message
                    .unwrap_or_else(|| "login service refused to start a session".into());
                self.fail(message);
                None
            },
            Err(e) => {
                self.fail(format!("{e:#}"));
                None
            },
        }
    }

    async fn poll_session(&self, session_id: &str) -> PollOutcome {
        loop {
            tokio::time::sleep(self.config.poll_interval).await;

            let proxy = records::load_proxy(self.store.as_ref());
            let status = match self.zalo.login_status(session_id, proxy.as_ref()).await {
                Ok(s) => s,
                Err(e) => {
                    self.fail(format!("{e:#}"));
                    return PollOutcome::Terminal;
                },
            };

            match status.status {
                LoginStatus::LoggedIn => {
                    let (Some(profile), Some(session)) = (status.profile, status.session) else {
                        // Payload not ready yet; keep polling.
                        continue;
                    };
                    self.complete(LinkedAccount { profile, session }).await;
                    return PollOutcome::Terminal;
                },
                LoginStatus::QrExpired => {
                    info!(session_id, "QR code expired, requesting a fresh one");
                    self.set(LoginState::QrExpired);
                    return PollOutcome::RestartSession;
                },
                LoginStatus::Failed => {
                    let message = status
                        .message
                        .unwrap_or_else(|| "login handshake failed".into());
                    self.fail(message);
                    return PollOutcome::Terminal;
                },
                LoginStatus::QrRequired => {
                    self.set(LoginState::QrRequired {
                        qr_data: status.qr_data,
                    });
                },
                LoginStatus::Initializing | LoginStatus::Unknown => {},
            }
        }
    }

    /// Persist the freshly linked account server-side and locally.
    async fn complete(&self, account: LinkedAccount) {
        let token = records::load_auth_token(self.store.as_ref()).unwrap_or_default();
        let outcome = match self
            .member
            .save_account(&token, &account.profile, &account.session)
            .await
        {
            Ok(o) => o,
            Err(e) => {
                self.fail(format!("saving linked account: {e}"));
                return;
            },
        };

        if outcome.is_success() {
            if let Err(e) = self.registry.add(account.clone()) {
                self.fail(format!("storing linked account: {e}"));
                return;
            }
            info!(account_id = %account.id(), "zalo account linked");
            tokio::time::sleep(self.config.settle_delay).await;
            self.set(LoginState::LoggedIn { account });
            return;
        }

        if outcome.is_force_logout() {
            warn!("member backend requested forced logout");
            tokio::time::sleep(self.config.settle_delay).await;
            if let Err(e) = records::clear_auth_token(self.store.as_ref()) {
                warn!(error = %e, "clearing auth token failed");
            }
            if let Err(e) = self.registry.clear() {
                warn!(error = %e, "clearing account registry failed");
            }
        }

        let message = if outcome.message.is_empty() {
            "account save rejected".to_string()
        } else {
            outcome.message
        };
        self.fail(message);
    }

    fn set(&self, state: LoginState) {
        let _ = self.state.send(state);
    }

    fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "login flow failed");
        self.set(LoginState::Failed { message });
    }
}

enum PollOutcome {
    /// Flow ended (logged in or failed); the task exits.
    Terminal,
    /// QR expired; start a fresh handshake session.
    RestartSession,
}
