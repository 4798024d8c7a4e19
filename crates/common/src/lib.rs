//! Shared types, error plumbing, and text utilities used across all ztool crates.

pub mod error;
pub mod text;
pub mod types;

pub use {
    error::{Error, FromMessage, Result, ZtoolError},
    types::ProxyConfig,
};
