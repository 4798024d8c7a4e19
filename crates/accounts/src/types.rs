use {
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

/// Public profile of a linked Zalo account.
///
/// The automation service returns more fields than we model; they are kept
/// through `extra` so re-serialized profiles round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZaloProfile {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(default, rename = "displayName")]
    pub display_name: String,
    #[serde(default, rename = "avatar")]
    pub avatar_url: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Opaque session material needed to act as a linked account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZaloSession {
    /// Cookie material as issued by the login handshake (shape varies).
    pub cookie: Value,
    pub imei: String,
    #[serde(rename = "userAgent")]
    pub user_agent: String,
}

/// One Zalo account linked to the operator, keyed by `profile.user_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedAccount {
    pub profile: ZaloProfile,
    pub session: ZaloSession,
}

impl LinkedAccount {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.profile.user_id
    }
}
