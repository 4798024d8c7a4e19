use std::collections::HashMap;

use {
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

/// `saveInfoZaloAPI` code that requires the client to force-log-out the
/// operator (stale or invalid auth token).
pub const FORCE_LOGOUT_CODE: i64 = 3;

/// Outcome of `saveInfoZaloAPI`, carried as a value because the caller
/// branches on the code instead of treating non-zero as a plain error.
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub code: i64,
    pub message: String,
}

impl SaveOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    #[must_use]
    pub fn is_force_logout(&self) -> bool {
        self.code == FORCE_LOGOUT_CODE
    }
}

/// Operator profile returned by `getInfoMemberAPI`.
#[derive(Debug, Clone, Deserialize)]
pub struct MemberInfo {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub point: i64,
    /// Raw proxy field; string-encoded JSON on the wire. Parsed by
    /// [`MemberInfo::proxy_config`].
    #[serde(default)]
    pub proxy: Option<Value>,
}

impl MemberInfo {
    /// Parse the proxy field, tolerating both an embedded object and a
    /// string-encoded one. Malformed content reads as `None`.
    #[must_use]
    pub fn proxy_config(&self) -> Option<ztool_common::ProxyConfig> {
        let value = self.proxy.as_ref()?;
        match value {
            Value::String(raw) if !raw.trim().is_empty() => serde_json::from_str(raw).ok(),
            Value::Object(_) => serde_json::from_value(value.clone()).ok(),
            _ => None,
        }
    }
}

/// One stored account from `getListInfoZaloAPI`: profile and session arrive
/// string-encoded and are parsed per-record during reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAccountRecord {
    pub profile: String,
    pub session: String,
}

// ── Wire shapes ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub code: i64,
    #[serde(default, rename = "infoUser")]
    pub info_user: Option<InfoUser>,
    #[serde(default)]
    pub messages: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InfoUser {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MemberInfoResponse {
    pub code: i64,
    #[serde(default)]
    pub data: Option<MemberInfo>,
    #[serde(default)]
    pub messages: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SaveResponse {
    pub code: i64,
    #[serde(default)]
    pub mess: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse {
    #[serde(default)]
    pub data: HashMap<String, StoredAccountRecord>,
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_config_from_string_encoded_field() {
        let info: MemberInfo = serde_json::from_str(
            r#"{"full_name": "An", "point": 50,
                "proxy": "{\"id\":\"p1\",\"host\":\"1.2.3.4\",\"port\":8080,\"protocol\":\"http\"}"}"#,
        )
        .unwrap();
        let proxy = info.proxy_config().unwrap();
        assert_eq!(proxy.host, "1.2.3.4");
        assert_eq!(proxy.port, 8080);
    }

    #[test]
    fn proxy_config_from_embedded_object() {
        let info: MemberInfo = serde_json::from_str(
            r#"{"proxy": {"id": "p2", "host": "5.6.7.8", "port": 1080, "protocol": "socks5"}}"#,
        )
        .unwrap();
        assert_eq!(info.proxy_config().unwrap().protocol, "socks5");
    }

    #[test]
    fn proxy_config_tolerates_garbage() {
        let info: MemberInfo =
            serde_json::from_str(r#"{"proxy": "not json at all"}"#).unwrap();
        assert!(info.proxy_config().is_none());

        let info: MemberInfo = serde_json::from_str(r#"{"proxy": ""}"#).unwrap();
        assert!(info.proxy_config().is_none());

        let info: MemberInfo = serde_json::from_str("{}").unwrap();
        assert!(info.proxy_config().is_none());
    }

    #[test]
    fn save_outcome_codes() {
        assert!(SaveOutcome { code: 0, message: String::new() }.is_success());
        assert!(SaveOutcome { code: 3, message: String::new() }.is_force_logout());
        let dup = SaveOutcome { code: 2, message: "duplicate".into() };
        assert!(!dup.is_success() && !dup.is_force_logout());
    }
}
