//! HTTP client for the ZTOOL member backend (`/apis/*`).

pub mod client;
pub mod error;
pub mod types;

pub use {
    client::MemberClient,
    error::{Error, Result},
    types::{FORCE_LOGOUT_CODE, MemberInfo, SaveOutcome, StoredAccountRecord},
};
