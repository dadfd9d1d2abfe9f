//! HTTP transport shared by every provider adapter
//!
//! A [`Transport`] owns one `reqwest::Client` and the [`ErrorContext`] of its
//! provider. Every request goes through [`Transport::send`], which checks the
//! status against the provider's success range and turns anything else into
//! an [`ApiError::Transport`] carrying the raw response body.

use apiwrap_core::error::{ApiError, ErrorContext, Provider};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;

use crate::prelude::Error;

#[derive(Debug, Clone)]
pub struct Transport {
    client: reqwest::Client,
    errors: ErrorContext,
}

impl Transport {
    /// Client with a JSON content type and, when given, a Bearer token.
    pub fn new(provider: Provider, bearer_token: Option<&str>) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = bearer_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| Error::InvalidHeader(e.to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Self::with_headers(provider, headers)
    }

    /// Client without default headers, for form-encoded APIs.
    pub fn plain(provider: Provider) -> Result<Self, Error> {
        Self::with_headers(provider, HeaderMap::new())
    }

    fn with_headers(provider: Provider, headers: HeaderMap) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Client(e.to_string()))?;

        Ok(Self {
            client,
            errors: ErrorContext::new(provider),
        })
    }

    /// Client that bypasses any system proxy, for servers on the loopback interface.
    #[cfg(test)]
    pub fn local(provider: Provider) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .map_err(|e| Error::Client(e.to_string()))?;

        Ok(Self {
            client,
            errors: ErrorContext::new(provider),
        })
    }

    pub fn errors(&self) -> ErrorContext {
        self.errors
    }

    pub fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.get(url)
    }

    pub fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.post(url)
    }

    pub fn delete(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.delete(url)
    }

    /// Send `request` and fail unless the status is in the provider's success range.
    ///
    /// `context` names the operation ("get task", "mark item as read") and ends
    /// up in the error message.
    pub async fn send(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<reqwest::Response, ApiError> {
        let request = request
            .build()
            .map_err(|e| self.errors.network(context, e))?;

        log::debug!(
            "[{}] {} {}",
            self.errors.provider,
            request.method(),
            request.url()
        );

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| self.errors.network(context, e))?;

        let status = response.status().as_u16();
        log::debug!("[{}] {} -> {}", self.errors.provider, context, status);

        if !self.errors.success.accepts(status) {
            let body = response.text().await.unwrap_or_default();
            return Err(self.errors.transport(context, status, body));
        }

        Ok(response)
    }

    /// Send and decode the body as `T`.
    pub async fn json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<T, ApiError> {
        let body = self.text(request, context).await?;
        serde_json::from_str(&body).map_err(|e| self.errors.decode(context, e))
    }

    /// Send and decode the body as JSON, treating an empty body as `null`.
    pub async fn json_or_null(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<serde_json::Value, ApiError> {
        let body = self.text(request, context).await?;
        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| self.errors.decode(context, e))
    }

    /// Send and return the raw body.
    pub async fn text(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<String, ApiError> {
        let response = self.send(request, context).await?;
        response
            .text()
            .await
            .map_err(|e| self.errors.network(context, e))
    }
}

/// Percent-encode one path segment.
pub fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_carries_provider_context() {
        let transport = Transport::new(Provider::TickTick, Some("token")).unwrap();
        assert_eq!(transport.errors().provider, Provider::TickTick);
        assert!(transport.errors().success.accepts(204));
    }

    #[test]
    fn test_transport_rejects_invalid_token() {
        let err = Transport::new(Provider::Hass, Some("bad\ntoken")).unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(_)));
    }

    #[test]
    fn test_segment_encodes_path_characters() {
        assert_eq!(segment("light.kitchen"), "light.kitchen");
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
    }
}
