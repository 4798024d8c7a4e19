//! Session validity guard.
//!
//! Whenever the selected account changes, ask the automation service whether
//! its session material is still valid and evict the account if not. A
//! failure of the check itself means "could not determine" and leaves the
//! account in place.

use std::sync::Arc;

use {
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
};

use {
    crate::client::ZaloClient,
    ztool_accounts::{AccountRegistry, LinkedAccount},
    ztool_member::MemberClient,
    ztool_store::{RecordStore, records},
};

/// User-visible notice callback (the CLI prints these synchronously).
pub type NoticeFn = Arc<dyn Fn(String) + Send + Sync>;

/// Background watcher that validates the selected account.
pub struct SessionGuard {
    cancel: CancellationToken,
    handle: tokio::task::JoinHandle<()>,
}

impl SessionGuard {
    pub fn spawn(
        zalo: ZaloClient,
        member: MemberClient,
        registry: Arc<AccountRegistry>,
        store: Arc<dyn RecordStore>,
        notice: NoticeFn,
    ) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        // Subscribe before the task is spawned so a selection made in the
        // window before the task first runs is still observed.
        let mut rx = registry.watch_selected();

        let handle = tokio::spawn(async move {
            // An account selected before the guard started gets one check.
            let initial = rx.borrow_and_update().clone();
            if let Some(account) = initial {
                check_account(&zalo, &member, &registry, store.as_ref(), &account, &notice).await;
            }
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    },
                }
                let selected = rx.borrow_and_update().clone();
                if let Some(account) = selected {
                    check_account(&zalo, &member, &registry, store.as_ref(), &account, &notice)
                        .await;
                }
            }
        });

        Self { cancel, handle }
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub async fn join(mut self) {
        let _ = (&mut self.handle).await;
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Run one validity check against an account.
///
/// An invalid session evicts the account locally, best-effort deletes the
/// server-side copy, and notifies the user. An inconclusive check (transport
/// error) only logs.
pub async fn check_account(
    zalo: &ZaloClient,
    member: &MemberClient,
    registry: &AccountRegistry,
    store: &dyn RecordStore,
    account: &LinkedAccount,
    notice: &NoticeFn,
) {
    let account_id = account.id().to_string();
    match zalo.check_session(&account.session).await {
        Ok(true) => {},
        Ok(false) => {
            info!(account_id = %account_id, "session no longer valid, evicting account");
            if let Err(e) = registry.remove(&account_id) {
                warn!(account_id = %account_id, error = %e, "failed to remove account");
            }
            if let Some(token) = records::load_auth_token(store) {
                if let Err(e) = member.delete_account(&token, &account_id).await {
                    warn!(account_id = %account_id, error = %e, "server-side delete failed");
                }
            }
            notice(format!(
                "Zalo account {} ({account_id}) has been logged out elsewhere and was removed.",
                account.profile.display_name
            ));
        },
        Err(e) => {
            // Could not determine; keep the account rather than evicting on
            // an ambiguous failure.
            warn!(account_id = %account_id, error = %e, "session check inconclusive");
        },
    }
}
