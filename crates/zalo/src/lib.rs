//! Zalo automation service integration: the login-flow state machine, the
//! session validity guard, bulk reconciliation, and operator login/logout
//! orchestration.

pub mod client;
pub mod guard;
pub mod login;
pub mod operator;
pub mod reconcile;
pub mod types;

pub use {
    client::ZaloClient,
    guard::{NoticeFn, SessionGuard},
    login::{LoginFlow, LoginFlowConfig, LoginState},
    operator::{login_operator, logout_operator},
    reconcile::reconcile_accounts,
    types::LoginStatus,
};
