//! In-memory mirror of the persisted linked-account list.
//!
//! Invariant: a non-empty registry always has exactly one selected entry;
//! an empty registry has none. Every mutation persists the full list and
//! the selection id before the in-memory mirror is updated, so a failed
//! store write leaves memory and disk consistent with each other.

use std::sync::{Arc, RwLock};

use {
    anyhow::Result,
    tokio::sync::watch,
    tracing::{debug, warn},
};

use {
    crate::types::LinkedAccount,
    ztool_store::{RecordStore, records},
};

struct Inner {
    accounts: Vec<LinkedAccount>,
    selected: Option<String>,
}

pub struct AccountRegistry {
    store: Arc<dyn RecordStore>,
    inner: RwLock<Inner>,
    // Observers (the session guard, the CLI) follow selection changes here.
    selection_tx: watch::Sender<Option<LinkedAccount>>,
}

impl AccountRegistry {
    /// Load the persisted list and selection.
    ///
    /// If the persisted selection id is still present it wins, otherwise the
    /// first entry is selected. Read or parse failures fall back to an empty
    /// registry rather than failing the caller.
    pub fn load(store: Arc<dyn RecordStore>) -> Self {
        let accounts: Vec<LinkedAccount> = store
            .get(records::ZALO_ACCOUNTS)
            .ok()
            .flatten()
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(list) => Some(list),
                Err(e) => {
                    warn!(error = %e, "zaloAccounts record parse failed, starting empty");
                    None
                },
            })
            .unwrap_or_default();

        let persisted_id = store.get(records::SELECTED_ACCOUNT_ID).ok().flatten();
        let selected = persisted_id
            .filter(|id| accounts.iter().any(|a| a.id() == id))
            .or_else(|| accounts.first().map(|a| a.id().to_string()));

        debug!(count = accounts.len(), selected = ?selected, "account registry loaded");

        let initial = selected
            .as_deref()
            .and_then(|id| accounts.iter().find(|a| a.id() == id).cloned());
        let (selection_tx, _) = watch::channel(initial);

        Self {
            store,
            inner: RwLock::new(Inner { accounts, selected }),
            selection_tx,
        }
    }

    /// Subscribe to selection changes. The current value is the selected
    /// account (or `None` when the registry is empty).
    pub fn watch_selected(&self) -> watch::Receiver<Option<LinkedAccount>> {
        self.selection_tx.subscribe()
    }

    pub fn list(&self) -> Vec<LinkedAccount> {
        self.inner.read().unwrap().accounts.clone()
    }

    pub fn selected(&self) -> Option<LinkedAccount> {
        let inner = self.inner.read().unwrap();
        inner
            .selected
            .as_deref()
            .and_then(|id| inner.accounts.iter().find(|a| a.id() == id).cloned())
    }

    pub fn get(&self, id: &str) -> Option<LinkedAccount> {
        let inner = self.inner.read().unwrap();
        inner.accounts.iter().find(|a| a.id() == id).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().accounts.is_empty()
    }

    /// Upsert by profile id: an existing entry is replaced in place
    /// (preserving position), a new one is appended. The added account
    /// becomes the selection.
    pub fn add(&self, account: LinkedAccount) -> Result<()> {
        let id = account.id().to_string();
        {
            let mut inner = self.inner.write().unwrap();
            let mut accounts = inner.accounts.clone();
            match accounts.iter().position(|a| a.id() == id) {
                Some(pos) => accounts[pos] = account,
                None => accounts.push(account),
            }
            self.persist(&accounts, Some(&id))?;
            inner.accounts = accounts;
            inner.selected = Some(id.clone());
        }
        debug!(account_id = %id, "linked account added");
        self.publish_selection();
        Ok(())
    }

    /// Select an account by id. Unknown ids are a no-op.
    pub fn select(&self, id: &str) -> Result<()> {
        {
            let mut inner = self.inner.write().unwrap();
            if !inner.accounts.iter().any(|a| a.id() == id) {
                return Ok(());
            }
            if inner.selected.as_deref() == Some(id) {
                return Ok(());
            }
            self.persist_selection(Some(id))?;
            inner.selected = Some(id.to_string());
        }
        self.publish_selection();
        Ok(())
    }

    /// Remove an account. If it was selected, the first remaining entry is
    /// selected, or the selection is cleared when the registry is now empty.
    pub fn remove(&self, id: &str) -> Result<()> {
        {
            let mut inner = self.inner.write().unwrap();
            if !inner.accounts.iter().any(|a| a.id() == id) {
                return Ok(());
            }
            let accounts: Vec<LinkedAccount> = inner
                .accounts
                .iter()
                .filter(|a| a.id() != id)
                .cloned()
                .collect();
            let selected = if inner.selected.as_deref() == Some(id) {
                accounts.first().map(|a| a.id().to_string())
            } else {
                inner.selected.clone()
            };
            self.persist(&accounts, selected.as_deref())?;
            inner.accounts = accounts;
            inner.selected = selected;
        }
        debug!(account_id = %id, "linked account removed");
        self.publish_selection();
        Ok(())
    }

    /// Replace the whole list (bulk reconciliation). The previous contents
    /// are discarded, not merged; selection falls on the first entry.
    pub fn replace_all(&self, accounts: Vec<LinkedAccount>) -> Result<()> {
        {
            let mut inner = self.inner.write().unwrap();
            let selected = accounts.first().map(|a| a.id().to_string());
            self.persist(&accounts, selected.as_deref())?;
            inner.accounts = accounts;
            inner.selected = selected;
        }
        self.publish_selection();
        Ok(())
    }

    /// Drop every account and the selection (operator logout).
    pub fn clear(&self) -> Result<()> {
        self.replace_all(Vec::new())
    }

    /// Write a candidate state to the store. Callers commit to memory only
    /// after this succeeds.
    fn persist(&self, accounts: &[LinkedAccount], selected: Option<&str>) -> Result<()> {
        let raw = serde_json::to_string(accounts)?;
        self.store.set(records::ZALO_ACCOUNTS, &raw)?;
        self.persist_selection(selected)
    }

    fn persist_selection(&self, selected: Option<&str>) -> Result<()> {
        match selected {
            Some(id) => self.store.set(records::SELECTED_ACCOUNT_ID, id),
            None => self.store.remove(records::SELECTED_ACCOUNT_ID),
        }
    }

    fn publish_selection(&self) {
        let next = self.selected();
        self.selection_tx.send_if_modified(|value| {
            if *value == next {
                false
            } else {
                *value = next.clone();
                true
            }
        });
    }
}
