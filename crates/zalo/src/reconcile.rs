//! Bulk account import and reconciliation, run after credential login.
//!
//! The member backend holds the operator's linked accounts; each one is
//! revalidated against Zalo before it lands in the local registry. One bad
//! record never aborts the rest.

use {
    anyhow::Result,
    tracing::{debug, info, warn},
};

use {
    crate::client::ZaloClient,
    ztool_accounts::{AccountRegistry, LinkedAccount, ZaloProfile, ZaloSession},
    ztool_member::{MemberClient, StoredAccountRecord},
};

/// Fetch, validate, and import the operator's stored accounts.
///
/// The resulting valid list fully replaces the local registry; there is no
/// merge with whatever was persisted before. Returns the number of accounts
/// kept.
pub async fn reconcile_accounts(
    zalo: &ZaloClient,
    member: &MemberClient,
    registry: &AccountRegistry,
    token: &str,
) -> Result<usize> {
    let stored = member.get_accounts(token).await?;
    debug!(count = stored.len(), "reconciling stored accounts");

    let mut valid = Vec::new();
    for (user_id, record) in stored {
        let account = match parse_record(&user_id, &record) {
            Ok(account) => account,
            Err(e) => {
                warn!(account_id = %user_id, error = %e, "skipping unparsable stored account");
                continue;
            },
        };

        match zalo.check_session(&account.session).await {
            Ok(true) => valid.push(account),
            Ok(false) => {
                info!(account_id = %user_id, "stored session invalid, deleting server-side");
                if let Err(e) = member.delete_account(token, &user_id).await {
                    warn!(account_id = %user_id, error = %e, "server-side delete failed");
                }
            },
            Err(e) => {
                // Inconclusive: leave the server-side copy alone, but do not
                // import an unverified session.
                warn!(account_id = %user_id, error = %e, "session check failed during reconcile");
            },
        }
    }

    let kept = valid.len();
    registry.replace_all(valid)?;
    info!(kept, "account reconciliation finished");
    Ok(kept)
}

fn parse_record(user_id: &str, record: &StoredAccountRecord) -> Result<LinkedAccount> {
    let profile: ZaloProfile = serde_json::from_str(&record.profile)?;
    let session: ZaloSession = serde_json::from_str(&record.session)?;
    anyhow::ensure!(
        profile.user_id == user_id,
        "stored profile id {} does not match key {user_id}",
        profile.user_id
    );
    Ok(LinkedAccount { profile, session })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use {
        super::*,
        axum::{Json, Router, routing::post},
        serde_json::json,
        ztool_store::{MemoryStore, RecordStore},
    };

    async fn start_mock(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn stored(id: &str) -> serde_json::Value {
        json!({
            "profile": format!("{{\"userId\":\"{id}\",\"displayName\":\"A\"}}"),
            "session": format!(
                "{{\"cookie\":[],\"imei\":\"imei-{id}\",\"userAgent\":\"UA\"}}"
            ),
        })
    }

    fn registry() -> (Arc<MemoryStore>, AccountRegistry) {
        let store = Arc::new(MemoryStore::new());
        let registry = AccountRegistry::load(store.clone() as Arc<dyn RecordStore>);
        (store, registry)
    }

    #[tokio::test]
    async fn keeps_valid_and_deletes_invalid() {
        let member_app = Router::new()
            .route(
                "/apis/getListInfoZaloAPI",
                post(|| async {
                    Json(json!({"code": 0, "data": {
                        "u1": stored("u1"),
                        "u2": stored("u2"),
                    }}))
                }),
            )
            .route(
                "/apis/deleteInfoZaloAPI",
                post(|Json(body): Json<serde_json::Value>| async move {
                    assert_eq!(body["userId"], "u2");
                    Json(json!({"code": 0}))
                }),
            );
        // u1 stays valid, u2 does not.
        let zalo_app = Router::new().route(
            "/check-session",
            post(|Json(body): Json<serde_json::Value>| async move {
                Json(json!({"isValid": body["imei"] == "imei-u1"}))
            }),
        );

        let (_store, registry) = registry();
        let kept = reconcile_accounts(
            &ZaloClient::new(start_mock(zalo_app).await),
            &MemberClient::new(start_mock(member_app).await),
            &registry,
            "tok",
        )
        .await
        .unwrap();

        assert_eq!(kept, 1);
        let list = registry.list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id(), "u1");
    }

    #[tokio::test]
    async fn bad_record_is_skipped_not_fatal() {
        let member_app = Router::new().route(
            "/apis/getListInfoZaloAPI",
            post(|| async {
                Json(json!({"code": 0, "data": {
                    "u1": stored("u1"),
                    "u2": {"profile": "{not json", "session": "{}"},
                }}))
            }),
        );
        let zalo_app = Router::new().route(
            "/check-session",
            post(|| async { Json(json!({"isValid": true})) }),
        );

        let (_store, registry) = registry();
        let kept = reconcile_accounts(
            &ZaloClient::new(start_mock(zalo_app).await),
            &MemberClient::new(start_mock(member_app).await),
            &registry,
            "tok",
        )
        .await
        .unwrap();

        assert_eq!(kept, 1);
        assert_eq!(registry.list()[0].id(), "u1");
    }

    #[tokio::test]
    async fn valid_list_replaces_previous_registry_contents() {
        let member_app = Router::new().route(
            "/apis/getListInfoZaloAPI",
            post(|| async { Json(json!({"code": 0, "data": {"u9": stored("u9")}})) }),
        );
        let zalo_app = Router::new().route(
            "/check-session",
            post(|| async { Json(json!({"isValid": true})) }),
        );

        let (_store, registry) = registry();
        // Pre-existing local account that the backend no longer knows about.
        registry
            .add(parse_record("u1", &StoredAccountRecord {
                profile: "{\"userId\":\"u1\"}".into(),
                session: "{\"cookie\":[],\"imei\":\"i\",\"userAgent\":\"UA\"}".into(),
            })
            .unwrap())
            .unwrap();

        reconcile_accounts(
            &ZaloClient::new(start_mock(zalo_app).await),
            &MemberClient::new(start_mock(member_app).await),
            &registry,
            "tok",
        )
        .await
        .unwrap();

        let list = registry.list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id(), "u9");
    }
}
