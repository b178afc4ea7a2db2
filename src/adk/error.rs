// SPDX-License-Identifier: MIT

//! Typed error handling for meteo-agent
//!
//! Only two kinds of failure may end a user turn: language model failures
//! and the reasoning-step ceiling. Everything a tool does is absorbed into
//! an observation string, so tool-level errors never show up here except
//! for the HTTP collaborator's [`FetchError`].

use thiserror::Error;

/// Top-level error type for meteo-agent
#[derive(Debug, Error)]
pub enum MeteoError {
    /// Configuration errors (missing credentials, invalid values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Two tools registered under the same name
    #[error("Tool '{name}' is already registered")]
    DuplicateTool { name: String },

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP client construction errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl MeteoError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a duplicate tool error
    pub fn duplicate_tool(name: impl Into<String>) -> Self {
        Self::DuplicateTool { name: name.into() }
    }
}

/// Model/LLM-specific errors
#[derive(Debug, Error)]
pub enum ModelError {
    /// The credential was rejected
    #[error("Authentication failed for {provider}: {message}")]
    Authentication { provider: String, message: String },

    /// Rate limit or quota exhausted
    #[error("Quota exceeded for {provider}: {message}")]
    QuotaExceeded { provider: String, message: String },

    /// The provider refused to answer (safety filters)
    #[error("Response blocked by {provider}: {reason}")]
    Blocked { provider: String, reason: String },

    /// Any other non-success status
    #[error("API error from {provider} (status {status}): {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    /// Invalid response from model
    #[error("Invalid response from model: {0}")]
    InvalidResponse(String),

    /// Transport errors (connection, timeout)
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors that terminate a single agent turn
#[derive(Debug, Error)]
pub enum AgentError {
    /// The model never produced a final answer
    #[error("Max reasoning steps reached: {limit}")]
    ReasoningLimitExceeded { limit: u32 },

    /// The model call failed
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl AgentError {
    /// Human-readable explanation shown in the conversation in place of an
    /// answer.
    pub fn user_message(&self) -> String {
        match self {
            AgentError::ReasoningLimitExceeded { limit } => format!(
                "I could not reach a final answer within {} reasoning steps. \
                 Please try rephrasing the question or asking something more specific.",
                limit
            ),
            AgentError::Model(ModelError::Authentication { provider, message }) => format!(
                "The {} API rejected the configured credential ({}). \
                 Check that your API key is valid and has access to the selected model.",
                provider, message
            ),
            AgentError::Model(ModelError::QuotaExceeded { provider, .. }) => format!(
                "The {} API quota has been exceeded. \
                 Wait a moment before asking again, or switch to another model.",
                provider
            ),
            AgentError::Model(ModelError::Blocked { provider, reason }) => format!(
                "The {} API declined to answer this request ({}). Try asking in a different way.",
                provider, reason
            ),
            AgentError::Model(other) => format!(
                "Sorry, the language model could not be reached right now ({}). Please try again.",
                other
            ),
        }
    }
}

/// Errors from the HTTP collaborator
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The per-call timeout elapsed
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// Connection, TLS, body decoding or URL errors
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
}

impl FetchError {
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_message_mentions_limit() {
        let msg = AgentError::ReasoningLimitExceeded { limit: 4 }.user_message();
        assert!(msg.contains("4 reasoning steps"));
    }

    #[test]
    fn test_auth_and_quota_messages_are_distinct() {
        let auth = AgentError::Model(ModelError::Authentication {
            provider: "Gemini".to_string(),
            message: "API key not valid".to_string(),
        })
        .user_message();
        let quota = AgentError::Model(ModelError::QuotaExceeded {
            provider: "Gemini".to_string(),
            message: "RESOURCE_EXHAUSTED".to_string(),
        })
        .user_message();

        assert!(auth.contains("API key"));
        assert!(quota.contains("quota"));
        assert_ne!(auth, quota);
    }

    #[test]
    fn test_duplicate_tool_display() {
        let err = MeteoError::duplicate_tool("get_weather");
        assert_eq!(err.to_string(), "Tool 'get_weather' is already registered");
    }
}
