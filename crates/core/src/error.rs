//! Error taxonomy shared by every provider adapter
//!
//! Each adapter owns an [`ErrorContext`] that stamps its provider tag on every
//! error it raises. The context is a plain `Copy` value held by the adapter
//! instance, so two adapters with different configurations never share naming
//! state.

use std::fmt;

/// The external service an adapter talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    FreshRss,
    TickTick,
    Pocket,
    Hass,
    Groq,
}

impl Provider {
    /// Tag used as the prefix of every error message.
    pub fn tag(self) -> &'static str {
        match self {
            Provider::FreshRss => "FreshRssAPI",
            Provider::TickTick => "TickTickAPI",
            Provider::Pocket => "PocketAPI",
            Provider::Hass => "HassAPI",
            Provider::Groq => "GroqAPI",
        }
    }

    /// Status codes the provider documents as success.
    pub fn success_policy(self) -> SuccessPolicy {
        match self {
            Provider::FreshRss | Provider::Hass | Provider::Groq => SuccessPolicy::Ok200,
            Provider::TickTick | Provider::Pocket => SuccessPolicy::Below300,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// How a provider signals success through the HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessPolicy {
    /// Only `200 OK` counts as success.
    Ok200,
    /// Anything below `300` counts as success.
    Below300,
}

impl SuccessPolicy {
    pub fn accepts(self, status: u16) -> bool {
        match self {
            SuccessPolicy::Ok200 => status == 200,
            SuccessPolicy::Below300 => status < 300,
        }
    }
}

/// Errors raised by the adapters and the normalization functions behind them.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// The provider answered with a status outside its success range.
    #[error("[{provider}] Failed to {context} [{status}]: {body}")]
    Transport {
        provider: Provider,
        context: String,
        status: u16,
        body: String,
    },

    /// The request never produced a response.
    #[error("[{provider}] Failed to {context}: {message}")]
    Network {
        provider: Provider,
        context: String,
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("[{provider}] Failed to decode response to {context}: {message}")]
    Decode {
        provider: Provider,
        context: String,
        message: String,
    },

    #[error("[{provider}] Please provide an access token. You can get one by using the '{flow}' command.")]
    MissingAccessToken { provider: Provider, flow: String },

    /// A caller-side precondition failed before any request was sent.
    #[error("[{provider}] {message}")]
    Precondition { provider: Provider, message: String },

    /// Normalization could not establish a relation the caller relies on.
    #[error("[{provider}] {message}")]
    Resolution { provider: Provider, message: String },

    /// The read step of a read-then-write sequence failed.
    #[error("[{provider}] Failed to {action}: {source}")]
    Reconciliation {
        provider: Provider,
        action: String,
        #[source]
        source: Box<ApiError>,
    },
}

impl ApiError {
    pub fn provider(&self) -> Provider {
        match self {
            ApiError::Transport { provider, .. }
            | ApiError::Network { provider, .. }
            | ApiError::Decode { provider, .. }
            | ApiError::MissingAccessToken { provider, .. }
            | ApiError::Precondition { provider, .. }
            | ApiError::Resolution { provider, .. }
            | ApiError::Reconciliation { provider, .. } => *provider,
        }
    }

    /// HTTP status of a transport failure, if the failure carried one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Transport { status, .. } => Some(*status),
            ApiError::Reconciliation { source, .. } => source.status(),
            _ => None,
        }
    }
}

/// Per-adapter error factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorContext {
    pub provider: Provider,
    pub success: SuccessPolicy,
}

impl ErrorContext {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            success: provider.success_policy(),
        }
    }

    pub fn transport(&self, context: &str, status: u16, body: impl Into<String>) -> ApiError {
        ApiError::Transport {
            provider: self.provider,
            context: context.to_string(),
            status,
            body: body.into(),
        }
    }

    pub fn network(&self, context: &str, message: impl fmt::Display) -> ApiError {
        ApiError::Network {
            provider: self.provider,
            context: context.to_string(),
            message: message.to_string(),
        }
    }

    pub fn decode(&self, context: &str, message: impl fmt::Display) -> ApiError {
        ApiError::Decode {
            provider: self.provider,
            context: context.to_string(),
            message: message.to_string(),
        }
    }

    pub fn missing_access_token(&self, flow: &str) -> ApiError {
        ApiError::MissingAccessToken {
            provider: self.provider,
            flow: flow.to_string(),
        }
    }

    pub fn precondition(&self, message: impl Into<String>) -> ApiError {
        ApiError::Precondition {
            provider: self.provider,
            message: message.into(),
        }
    }

    pub fn resolution(&self, message: impl Into<String>) -> ApiError {
        ApiError::Resolution {
            provider: self.provider,
            message: message.into(),
        }
    }

    /// Wrap the failure of a read step with the write it was preparing.
    pub fn reconciliation(&self, action: &str, source: ApiError) -> ApiError {
        ApiError::Reconciliation {
            provider: self.provider,
            action: action.to_string(),
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_policy_ok200() {
        let policy = Provider::FreshRss.success_policy();
        assert!(policy.accepts(200));
        assert!(!policy.accepts(201));
        assert!(!policy.accepts(404));
    }

    #[test]
    fn test_success_policy_below300() {
        let policy = Provider::TickTick.success_policy();
        assert!(policy.accepts(200));
        assert!(policy.accepts(204));
        assert!(!policy.accepts(300));
        assert!(!policy.accepts(500));
    }

    #[test]
    fn test_transport_error_message_carries_tag() {
        let ctx = ErrorContext::new(Provider::Hass);
        let err = ctx.transport("get state of \"light.kitchen\"", 401, "Unauthorized");
        assert_eq!(
            err.to_string(),
            "[HassAPI] Failed to get state of \"light.kitchen\" [401]: Unauthorized"
        );
        assert_eq!(err.provider(), Provider::Hass);
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn test_reconciliation_wraps_source() {
        let ctx = ErrorContext::new(Provider::TickTick);
        let inner = ctx.transport("get task", 404, "not found");
        let err = ctx.reconciliation("complete checklist items", inner);

        let message = err.to_string();
        assert!(message.starts_with("[TickTickAPI] Failed to complete checklist items:"));
        assert!(message.contains("[404]"));
        assert_eq!(err.status(), Some(404));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_contexts_are_independent() {
        let pocket = ErrorContext::new(Provider::Pocket);
        let groq = ErrorContext::new(Provider::Groq);

        assert!(pocket.precondition("x").to_string().starts_with("[PocketAPI]"));
        assert!(groq.precondition("x").to_string().starts_with("[GroqAPI]"));
    }

    #[test]
    fn test_missing_access_token_message() {
        let err = ErrorContext::new(Provider::TickTick).missing_access_token("apiwrap ticktick auth");
        assert!(matches!(err, ApiError::MissingAccessToken { .. }));
        assert!(err.to_string().contains("'apiwrap ticktick auth'"));
    }
}
