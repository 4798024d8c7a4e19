use {
    serde::Deserialize,
    ztool_accounts::{ZaloProfile, ZaloSession},
};

/// Handshake status reported by the automation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginStatus {
    Initializing,
    QrRequired,
    QrExpired,
    LoggedIn,
    Failed,
    /// Forward compatibility: an unrecognized tag is treated as "still in
    /// progress" rather than a parse error.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartLoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, rename = "sessionId")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub status: LoginStatus,
    #[serde(default, rename = "qrData")]
    pub qr_data: Option<String>,
    #[serde(default)]
    pub profile: Option<ZaloProfile>,
    #[serde(default)]
    pub session: Option<ZaloSession>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CheckSessionResponse {
    #[serde(rename = "isValid")]
    pub is_valid: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FindUserResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, rename = "userId")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddFriendResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}
