//! External membership service boundary.
//!
//! The gate only needs an active/inactive answer per email. Status is
//! fetched per request; caching is deliberately left to the service side.

pub mod client;

use async_trait::async_trait;

pub use client::HttpMembershipClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipStatus {
    Active,
    Inactive,
    NotFound,
}

#[derive(Debug, thiserror::Error)]
pub enum MembershipError {
    #[error("membership service request failed: {0}")]
    Http(String),
    #[error("membership service returned an unexpected payload: {0}")]
    UnexpectedPayload(String),
}

#[async_trait]
pub trait MembershipClient: Send + Sync {
    async fn status_for(&self, email: &str) -> Result<MembershipStatus, MembershipError>;
}
