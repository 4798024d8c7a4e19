//! Operator (ZTOOL member) login and logout.
//!
//! Logging in exchanges credentials for an auth token, persists it together
//! with the operator's assigned proxy, then pulls and revalidates the stored
//! Zalo accounts through [`reconcile_accounts`].

use {
    anyhow::{Context, Result},
    tracing::{info, warn},
};

use {
    crate::{client::ZaloClient, reconcile::reconcile_accounts},
    ztool_accounts::AccountRegistry,
    ztool_member::{MemberClient, MemberInfo},
    ztool_store::{RecordStore, records},
};

/// Authenticate the operator and bring the local registry in line with the
/// backend. Returns the fetched member profile.
pub async fn login_operator(
    store: &dyn RecordStore,
    registry: &AccountRegistry,
    member: &MemberClient,
    zalo: &ZaloClient,
    phone: &str,
    pass: &str,
) -> Result<MemberInfo> {
    let token = member.login(phone, pass).await?;
    records::save_auth_token(store, &token).context("persisting auth token")?;

    let info = member.member_info(&token).await?;
    match info.proxy_config() {
        Some(proxy) => {
            records::save_proxy(store, &proxy).context("persisting proxy")?;
        },
        None => {
            records::clear_proxy(store).context("clearing proxy")?;
        },
    }

    let kept = reconcile_accounts(zalo, member, registry, &token).await?;
    info!(member = %info.full_name, accounts = kept, "operator logged in");
    Ok(info)
}

/// Drop the operator's local state: token, proxy, and every linked account.
///
/// Purely local: the backend keeps its copy of the stored accounts, so the
/// next login reimports them.
pub fn logout_operator(store: &dyn RecordStore, registry: &AccountRegistry) -> Result<()> {
    records::clear_auth_token(store)?;
    records::clear_proxy(store)?;
    if let Err(e) = registry.clear() {
        warn!(error = %e, "clearing account registry failed");
    }
    info!("operator logged out");
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use {
        super::*,
        axum::{Json, Router, routing::post},
        serde_json::json,
        ztool_member::Error as MemberError,
        ztool_store::MemoryStore,
    };

    async fn start_mock(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn member_app(login_code: i64) -> Router {
        Router::new()
            .route(
                "/apis/checkLoginMemberAPI",
                post(move || async move {
                    Json(json!({
                        "code": login_code,
                        "infoUser": {"token": "tok-1"},
                        "messages": "Sai tai khoan hoac mat khau",
                    }))
                }),
            )
            .route(
                "/apis/getInfoMemberAPI",
                post(|| async {
                    Json(json!({"code": 1, "data": {
                        "full_name": "Nguyen Van A",
                        "email": "a@example.com",
                        "phone": "0901234567",
                        "point": 120,
                        "proxy": "{\"id\":\"p1\",\"host\":\"10.0.0.1\",\"port\":1080,\
                                  \"user\":\"u\",\"pass\":\"p\",\"protocol\":\"socks5\"}",
                    }}))
                }),
            )
            .route(
                "/apis/getListInfoZaloAPI",
                post(|| async {
                    Json(json!({"code": 0, "data": {
                        "z1": {
                            "profile": "{\"userId\":\"z1\",\"displayName\":\"Z\"}",
                            "session": "{\"cookie\":[],\"imei\":\"i1\",\"userAgent\":\"UA\"}",
                        },
                    }}))
                }),
            )
    }

    fn zalo_app() -> Router {
        Router::new().route(
            "/check-session",
            post(|| async { Json(json!({"isValid": true})) }),
        )
    }

    #[tokio::test]
    async fn login_persists_token_proxy_and_imports_accounts() {
        let store = Arc::new(MemoryStore::new());
        let registry = AccountRegistry::load(store.clone() as Arc<dyn RecordStore>);
        let member = MemberClient::new(start_mock(member_app(1)).await);
        let zalo = ZaloClient::new(start_mock(zalo_app()).await);

        let info = login_operator(store.as_ref(), &registry, &member, &zalo, "0901234567", "pw")
            .await
            .unwrap();

        assert_eq!(info.point, 120);
        assert_eq!(records::load_auth_token(store.as_ref()).as_deref(), Some("tok-1"));
        assert_eq!(records::load_proxy(store.as_ref()).unwrap().host, "10.0.0.1");
        assert_eq!(registry.list().len(), 1);
        assert_eq!(registry.selected().unwrap().id(), "z1");
    }

    #[tokio::test]
    async fn rejected_login_stores_nothing_and_surfaces_message() {
        let store = Arc::new(MemoryStore::new());
        let registry = AccountRegistry::load(store.clone() as Arc<dyn RecordStore>);
        let member = MemberClient::new(start_mock(member_app(0)).await);
        let zalo = ZaloClient::new("http://127.0.0.1:9");

        let err = login_operator(store.as_ref(), &registry, &member, &zalo, "0901234567", "bad")
            .await
            .unwrap_err();

        let business = err.downcast_ref::<MemberError>().expect("member error");
        assert!(business.to_string().contains("Sai tai khoan"));
        assert!(records::load_auth_token(store.as_ref()).is_none());
        assert!(registry.list().is_empty());
    }

    #[tokio::test]
    async fn logout_clears_token_proxy_and_registry() {
        let store = Arc::new(MemoryStore::new());
        let registry = AccountRegistry::load(store.clone() as Arc<dyn RecordStore>);
        records::save_auth_token(store.as_ref(), "tok").unwrap();

        logout_operator(store.as_ref(), &registry).unwrap();

        assert!(records::load_auth_token(store.as_ref()).is_none());
        assert!(records::load_proxy(store.as_ref()).is_none());
        assert!(registry.list().is_empty());
    }
}
