use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{MembershipClient, MembershipError, MembershipStatus};

/// HTTP client for the membership service. Looks a member up by email and
/// reads a single `active` flag out of the response.
pub struct HttpMembershipClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct MemberResponse {
    active: bool,
}

impl HttpMembershipClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl MembershipClient for HttpMembershipClient {
    async fn status_for(&self, email: &str) -> Result<MembershipStatus, MembershipError> {
        let url = format!("{}/members", self.base_url.trim_end_matches('/'));

        let response = self
            .http
            .get(&url)
            .query(&[("email", email)])
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| MembershipError::Http(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(MembershipStatus::NotFound);
        }

        if !response.status().is_success() {
            return Err(MembershipError::Http(format!(
                "unexpected status {}",
                response.status()
            )));
        }

        let member: MemberResponse = response
            .json()
            .await
            .map_err(|e| MembershipError::UnexpectedPayload(e.to_string()))?;

        Ok(if member.active {
            MembershipStatus::Active
        } else {
            MembershipStatus::Inactive
        })
    }
}
