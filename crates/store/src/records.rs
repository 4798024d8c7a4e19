//! Named records and typed helpers over the raw key/value port.
//!
//! Record names match the vocabulary the backend uses, so a data dir can be
//! inspected with the same terms that appear in API payloads.

use {anyhow::Result, tracing::warn, ztool_common::ProxyConfig};

use crate::RecordStore;

/// Operator auth token issued by the member backend.
pub const AUTH_TOKEN: &str = "authToken";
/// JSON array of linked accounts (owned by the account registry).
pub const ZALO_ACCOUNTS: &str = "zaloAccounts";
/// Profile id of the currently selected linked account.
pub const SELECTED_ACCOUNT_ID: &str = "selectedZaloAccountId";
/// Proxy configuration derived from the member-info proxy field.
pub const USER_PROXY: &str = "userProxy";

pub fn load_auth_token(store: &dyn RecordStore) -> Option<String> {
    store.get(AUTH_TOKEN).ok().flatten()
}

pub fn save_auth_token(store: &dyn RecordStore, token: &str) -> Result<()> {
    store.set(AUTH_TOKEN, token)
}

pub fn clear_auth_token(store: &dyn RecordStore) -> Result<()> {
    store.remove(AUTH_TOKEN)
}

/// Read the persisted proxy configuration.
///
/// Callers read this fresh at call time rather than caching it, so a proxy
/// change made elsewhere takes effect on the next request. A malformed
/// record reads as `None` with a warning.
pub fn load_proxy(store: &dyn RecordStore) -> Option<ProxyConfig> {
    let raw = store.get(USER_PROXY).ok().flatten()?;
    match serde_json::from_str(&raw) {
        Ok(proxy) => Some(proxy),
        Err(e) => {
            warn!(error = %e, "userProxy record parse failed");
            None
        },
    }
}

pub fn save_proxy(store: &dyn RecordStore, proxy: &ProxyConfig) -> Result<()> {
    store.set(USER_PROXY, &serde_json::to_string(proxy)?)
}

pub fn clear_proxy(store: &dyn RecordStore) -> Result<()> {
    store.remove(USER_PROXY)
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::MemoryStore};

    #[test]
    fn auth_token_roundtrip() {
        let store = MemoryStore::new();
        assert!(load_auth_token(&store).is_none());
        save_auth_token(&store, "tok").unwrap();
        assert_eq!(load_auth_token(&store).as_deref(), Some("tok"));
        clear_auth_token(&store).unwrap();
        assert!(load_auth_token(&store).is_none());
    }

    #[test]
    fn proxy_roundtrip() {
        let store = MemoryStore::new();
        let proxy = ProxyConfig {
            id: "p1".into(),
            host: "1.2.3.4".into(),
            port: 8080,
            ..Default::default()
        };
        save_proxy(&store, &proxy).unwrap();
        assert_eq!(load_proxy(&store), Some(proxy));
    }

    #[test]
    fn malformed_proxy_reads_as_none() {
        let store = MemoryStore::new();
        store.set(USER_PROXY, "{broken").unwrap();
        assert!(load_proxy(&store).is_none());
    }
}
