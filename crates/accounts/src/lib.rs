//! Linked Zalo accounts and the local account registry.

pub mod registry;
pub mod types;

pub use {
    registry::AccountRegistry,
    types::{LinkedAccount, ZaloProfile, ZaloSession},
};
