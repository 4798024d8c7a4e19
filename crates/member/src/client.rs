use std::collections::HashMap;

use {serde_json::json, tracing::debug};

use {
    crate::{
        error::{Context, Error, Result},
        types::*,
    },
    ztool_accounts::{ZaloProfile, ZaloSession},
};

const CHECK_LOGIN: &str = "/apis/checkLoginMemberAPI";
const GET_INFO_MEMBER: &str = "/apis/getInfoMemberAPI";
const GET_POINT_ACTION: &str = "/apis/getPointActionAPI";
const SAVE_INFO_ZALO: &str = "/apis/saveInfoZaloAPI";
const DELETE_INFO_ZALO: &str = "/apis/deleteInfoZaloAPI";
const GET_LIST_INFO_ZALO: &str = "/apis/getListInfoZaloAPI";

/// Client for the member backend: operator auth, billing points, and the
/// server-side copy of linked accounts.
#[derive(Debug, Clone)]
pub struct MemberClient {
    base: String,
    http: reqwest::Client,
}

impl MemberClient {
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

    /// Credential login. Returns the operator auth token on `code == 1`,
    /// otherwise the server-supplied message as a business error.
    pub async fn login(&self, phone: &str, pass: &str) -> Result<String> {
        let resp = self
            .http
            .post(self.url(CHECK_LOGIN))
            .json(&json!({ "phone": phone, "pass": pass }))
            .send()
            .await?;
        let body: LoginResponse = resp.json().await?;

        if body.code != 1 {
            let message = body
                .messages
                .unwrap_or_else(|| "login rejected".to_string());
            return Err(Error::business(body.code, message));
        }
        let token = body
            .info_user
            .map(|u| u.token)
            .context("login response missing infoUser.token")?;
        debug!("operator login accepted");
        Ok(token)
    }

    pub async fn member_info(&self, token: &str) -> Result<MemberInfo> {
        let resp = self
            .http
            .post(self.url(GET_INFO_MEMBER))
            .json(&json!({ "token": token }))
            .send()
            .await?;
        let body: MemberInfoResponse = resp.json().await?;

        if body.code != 1 {
            let message = body
                .messages
                .unwrap_or_else(|| "member info unavailable".to_string());
            return Err(Error::business(body.code, message));
        }
        body.data.context("member info response missing data")
    }

    /// Point cost per automation action. Tolerates both a bare map and a
    /// `{data: {...}}` wrapper.
    pub async fn action_points(&self) -> Result<HashMap<String, i64>> {
        let resp = self.http.get(self.url(GET_POINT_ACTION)).send().await?;
        let body: serde_json::Value = resp.json().await?;

        let map = body
            .get("data")
            .and_then(|d| d.as_object())
            .or_else(|| body.as_object())
            .context("point action response is not an object")?;

        Ok(map
            .iter()
            .filter_map(|(action, cost)| cost.as_i64().map(|c| (action.clone(), c)))
            .collect())
    }

    /// Persist a newly linked account server-side. Profile and session are
    /// string-encoded, matching the shape `getListInfoZaloAPI` hands back.
    pub async fn save_account(
        &self,
        token: &str,
        profile: &ZaloProfile,
        session: &ZaloSession,
    ) -> Result<SaveOutcome> {
        let resp = self
            .http
            .post(self.url(SAVE_INFO_ZALO))
            .json(&json!({
                "token": token,
                "profile": serde_json::to_string(profile)?,
                "session": serde_json::to_string(session)?,
            }))
            .send()
            .await?;
        let body: SaveResponse = resp.json().await?;
        Ok(SaveOutcome {
            code: body.code,
            message: body.mess.unwrap_or_default(),
        })
    }

    /// Delete the server-side copy of a linked account. Callers treat this
    /// as best-effort and only log failures.
    pub async fn delete_account(&self, token: &str, user_id: &str) -> Result<()> {
        let resp = self
            .http
            .post(self.url(DELETE_INFO_ZALO))
            .json(&json!({ "token": token, "userId": user_id }))
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Message(format!(
                "deleteInfoZalo failed with {status}: {body}"
            )));
        }
        Ok(())
    }

    /// Fetch the operator's stored account map.
    pub async fn get_accounts(&self, token: &str) -> Result<HashMap<String, StoredAccountRecord>> {
        let resp = self
            .http
            .post(self.url(GET_LIST_INFO_ZALO))
            .json(&json!({ "token": token }))
            .send()
            .await?;
        let body: ListResponse = resp.json().await?;
        Ok(body.data)
    }
}
