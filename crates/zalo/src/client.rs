use {
    anyhow::{Context, Result},
    serde_json::json,
    ztool_accounts::ZaloSession,
    ztool_common::ProxyConfig,
};

use crate::types::*;

const START_LOGIN: &str = "/start-login";
const LOGIN_STATUS: &str = "/zalo-status";
const CHECK_SESSION: &str = "/check-session";
const FIND_USER: &str = "/find-user";
const ADD_FRIEND: &str = "/add-friend";

/// Client for the Zalo automation service.
///
/// Login and status calls take the proxy configuration per call: callers
/// read it fresh from the record store each time so a proxy change takes
/// effect mid-handshake.
#[derive(Debug, Clone)]
pub struct ZaloClient {
    base: String,
    // Used for calls without egress proxying; proxied calls build their own.
    http: reqwest::Client,
}

impl ZaloClient {
    pub fn new(base: impl Into<String>) -> Self {
        let base: String = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    fn http_for(&self, proxy: Option<&ProxyConfig>) -> Result<reqwest::Client> {
        let Some(proxy) = proxy else {
            return Ok(self.http.clone());
        };
        let mut p = reqwest::Proxy::all(proxy.url())
            .with_context(|| format!("invalid proxy {}", proxy.url()))?;
        if let (Some(user), Some(pass)) = (&proxy.user, &proxy.pass) {
            p = p.basic_auth(user, pass);
        }
        Ok(reqwest::Client::builder().proxy(p).build()?)
    }

    /// Request a new login handshake.
    pub async fn start_login(&self, proxy: Option<&ProxyConfig>) -> Result<StartLoginResponse> {
        let resp = self
            .http_for(proxy)?
            .post(self.url(START_LOGIN))
            .json(&json!({ "proxy": proxy }))
            .send()
            .await?;
        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("start-login failed: {body}");
        }
        Ok(resp.json().await?)
    }

    /// Poll the current status of a handshake.
    pub async fn login_status(
        &self,
        session_id: &str,
        proxy: Option<&ProxyConfig>,
    ) -> Result<StatusResponse> {
        let resp = self
            .http_for(proxy)?
            .post(self.url(LOGIN_STATUS))
            .json(&json!({ "sessionId": session_id, "proxy": proxy }))
            .send()
            .await?;
        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("zalo-status failed: {body}");
        }
        Ok(resp.json().await?)
    }

    /// Ask whether the session material is still accepted by Zalo.
    pub async fn check_session(&self, session: &ZaloSession) -> Result<bool> {
        let resp = self
            .http
            .post(self.url(CHECK_SESSION))
            .json(&json!({
                "cookie": session.cookie,
                "imei": session.imei,
                "userAgent": session.user_agent,
            }))
            .send()
            .await?;
        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("check-session failed: {body}");
        }
        let body: CheckSessionResponse = resp.json().await?;
        Ok(body.is_valid)
    }

    /// Look up a Zalo user id by phone number, acting as the given account.
    pub async fn find_user(&self, session: &ZaloSession, phone: &str) -> Result<FindUserResponse> {
        let resp = self
            .http
            .post(self.url(FIND_USER))
            .json(&json!({
                "cookie": session.cookie,
                "imei": session.imei,
                "userAgent": session.user_agent,
                "phone": phone,
            }))
            .send()
            .await?;
        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("find-user failed: {body}");
        }
        Ok(resp.json().await?)
    }

    /// Send a friend request with an invite message.
    pub async fn add_friend(
        &self,
        session: &ZaloSession,
        user_id: &str,
        message: &str,
    ) -> Result<AddFriendResponse> {
        let resp = self
            .http
            .post(self.url(ADD_FRIEND))
            .json(&json!({
                "cookie": session.cookie,
                "imei": session.imei,
                "userAgent": session.user_agent,
                "userId": user_id,
                "message": message,
            }))
            .send()
            .await?;
        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("add-friend failed: {body}");
        }
        Ok(resp.json().await?)
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        axum::{Json, Router, routing::post},
        serde_json::json,
    };

    async fn start_mock(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn session() -> ZaloSession {
        ZaloSession {
            cookie: json!([{"name": "zpw", "value": "x"}]),
            imei: "imei-1".into(),
            user_agent: "UA".into(),
        }
    }

    #[tokio::test]
    async fn start_login_returns_session_id() {
        let app = Router::new().route(
            "/start-login",
            post(|| async { Json(json!({"success": true, "sessionId": "s-1"})) }),
        );
        let base = start_mock(app).await;

        let client = ZaloClient::new(base);
        let resp = client.start_login(None).await.unwrap();
        assert!(resp.success);
        assert_eq!(resp.session_id.as_deref(), Some("s-1"));
    }

    #[tokio::test]
    async fn start_login_server_error() {
        let app = Router::new().route(
            "/start-login",
            post(|| async { (axum::http::StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let base = start_mock(app).await;

        let client = ZaloClient::new(base);
        let err = client.start_login(None).await.unwrap_err();
        assert!(err.to_string().contains("start-login failed"));
    }

    #[tokio::test]
    async fn check_session_reads_is_valid() {
        let app = Router::new().route(
            "/check-session",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["imei"], "imei-1");
                assert_eq!(body["userAgent"], "UA");
                Json(json!({"isValid": false}))
            }),
        );
        let base = start_mock(app).await;

        let client = ZaloClient::new(base);
        assert!(!client.check_session(&session()).await.unwrap());
    }

    #[tokio::test]
    async fn login_status_sends_session_id() {
        let app = Router::new().route(
            "/zalo-status",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["sessionId"], "s-9");
                Json(json!({"status": "qr_required", "qrData": "QUJD"}))
            }),
        );
        let base = start_mock(app).await;

        let client = ZaloClient::new(base);
        let resp = client.login_status("s-9", None).await.unwrap();
        assert_eq!(resp.status, LoginStatus::QrRequired);
    }

    #[tokio::test]
    async fn find_user_and_add_friend() {
        let app = Router::new()
            .route(
                "/find-user",
                post(|Json(body): Json<serde_json::Value>| async move {
                    assert_eq!(body["phone"], "0901234567");
                    Json(json!({"success": true, "userId": "u-77"}))
                }),
            )
            .route(
                "/add-friend",
                post(|Json(body): Json<serde_json::Value>| async move {
                    assert_eq!(body["userId"], "u-77");
                    Json(json!({"success": true}))
                }),
            );
        let base = start_mock(app).await;

        let client = ZaloClient::new(base);
        let found = client.find_user(&session(), "0901234567").await.unwrap();
        assert_eq!(found.user_id.as_deref(), Some("u-77"));

        let added = client
            .add_friend(&session(), "u-77", "ket ban nhe")
            .await
            .unwrap();
        assert!(added.success);
    }
}
