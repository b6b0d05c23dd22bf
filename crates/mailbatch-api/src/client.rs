//! HTTP client for the provider API.

use std::time::Duration;

use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::endpoints::Endpoints;
use crate::envelope::{data_message, interpret};
use crate::error::{ApiError, Result};
use crate::types::{
    BuyEmailsRequest, ChangePasswordRequest, EmailType, Letter, LetterFilter, LettersData,
    LettersRequest, Profile,
};

/// Default timeout for lightweight calls (`me`, `change-password`).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for heavier calls (`letters`, `buy-emails`).
pub const DEFAULT_EXTENDED_TIMEOUT: Duration = Duration::from_secs(15);

/// Per-call deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Deadline for `me` and `change-password`.
    pub standard: Duration,
    /// Deadline for `letters` and `buy-emails`.
    pub extended: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            standard: DEFAULT_TIMEOUT,
            extended: DEFAULT_EXTENDED_TIMEOUT,
        }
    }
}

/// Client for one provider deployment, authorized with a bearer token.
///
/// Cloning is cheap: the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// Endpoint configuration.
    pub endpoints: Endpoints,
    /// Per-call deadlines.
    pub timeouts: Timeouts,
    token: String,
    http_client: Client,
}

impl ApiClient {
    /// Creates a new client.
    #[must_use]
    pub fn new(endpoints: Endpoints, token: impl Into<String>) -> Self {
        Self {
            endpoints,
            timeouts: Timeouts::default(),
            token: token.into(),
            http_client: Client::new(),
        }
    }

    /// Sets the per-call deadlines.
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Fetches account information and balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn me(&self) -> Result<Profile> {
        let data = self
            .send::<()>(Method::GET, &self.endpoints.me, None, self.timeouts.standard)
            .await?;
        decode(data)
    }

    /// Changes the password of one mailbox.
    ///
    /// Returns the provider's confirmation message.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn change_password(
        &self,
        email: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<String> {
        let request = ChangePasswordRequest {
            email,
            new_password,
            old_password,
        };
        let data = self
            .send(
                Method::POST,
                &self.endpoints.change_password,
                Some(&request),
                self.timeouts.standard,
            )
            .await?;
        Ok(data_message(&data, "Password changed successfully."))
    }

    /// Lists the letters of one mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or is rejected.
    pub async fn letters(
        &self,
        email: &str,
        password: &str,
        filter: &LetterFilter,
    ) -> Result<Vec<Letter>> {
        let request = LettersRequest {
            email,
            password,
            filters: filter,
        };
        let data = self
            .send(
                Method::POST,
                &self.endpoints.letters,
                Some(&request),
                self.timeouts.extended,
            )
            .await?;

        if data.is_null() {
            return Ok(Vec::new());
        }
        let listing: LettersData = decode(data)?;
        Ok(listing.letters)
    }

    /// Purchases mailboxes.
    ///
    /// Returns the purchased `email:password` combinations.
    ///
    /// # Errors
    ///
    /// Returns an error if `count` is zero, or the request fails or is rejected.
    pub async fn buy_emails(&self, count: u32, email_type: EmailType) -> Result<Vec<String>> {
        if count == 0 {
            return Err(ApiError::InvalidConfig(
                "purchase count must be at least 1".to_string(),
            ));
        }

        let request = BuyEmailsRequest {
            count,
            type_email: email_type.code(),
        };
        let data = self
            .send(
                Method::POST,
                &self.endpoints.buy_emails,
                Some(&request),
                self.timeouts.extended,
            )
            .await?;

        if data.is_null() {
            return Ok(Vec::new());
        }
        decode(data)
    }

    /// Checks that the deployment's base URL answers at all.
    ///
    /// Returns the HTTP status; any status counts as reachable.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or timeout.
    pub async fn reachable(&self) -> Result<u16> {
        let response = self
            .http_client
            .get(self.endpoints.base.clone())
            .timeout(self.timeouts.standard)
            .send()
            .await?;
        Ok(response.status().as_u16())
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &Url,
        body: Option<&B>,
        timeout: Duration,
    ) -> Result<Value> {
        let mut request = self
            .http_client
            .request(method, url.clone())
            .bearer_auth(&self.token)
            .timeout(timeout);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        debug!(url = %url, status = status.as_u16(), len = bytes.len(), "provider response");

        interpret(status, &bytes)
    }
}

fn decode<T: DeserializeOwned>(data: Value) -> Result<T> {
    serde_json::from_value(data).map_err(ApiError::malformed)
}
