// SPDX-License-Identifier: MIT

//! Agent module - the reasoning-and-acting loop and its pieces
//!
//! - `ReActAgent` - text-driven Thought → Action → Observation loop
//! - `parser` - turns a model continuation into an `AgentDecision`
//! - `scratchpad` - the turn-local record fed back into each prompt

pub mod parser;
mod react;
pub mod scratchpad;

pub use parser::{parse_decision, AgentDecision};
pub use react::ReActAgent;
pub use scratchpad::{Scratchpad, ScratchpadEntry};

use crate::adk::error::AgentError;
use crate::adk::memory::ConversationMemory;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Intermediate steps a front end may want to display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentEvent {
    Thought(String),
    ToolCall { name: String, input: String },
    ToolResult { name: String, observation: String },
    Answer(String),
    Error(String),
}

/// Core agent trait
#[async_trait]
pub trait Agent: Send + Sync {
    /// Returns the agent name
    fn name(&self) -> &str;

    /// Run one user turn against the given conversation memory
    async fn run(&self, input: &str, memory: &ConversationMemory) -> Result<String, AgentError>;

    /// Run one user turn with streaming events
    async fn run_stream(
        &self,
        input: &str,
        memory: &ConversationMemory,
        tx: mpsc::Sender<AgentEvent>,
    ) -> Result<String, AgentError> {
        // Default implementation falls back to run()
        match self.run(input, memory).await {
            Ok(res) => {
                let _ = tx.send(AgentEvent::Answer(res.clone())).await;
                Ok(res)
            }
            Err(e) => {
                let _ = tx.send(AgentEvent::Error(e.user_message())).await;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple mock agent that transforms input (used in tests)
    pub struct MockAgent {
        name: String,
        transform: fn(&str) -> String,
    }

    impl MockAgent {
        pub fn new(name: &str, transform: fn(&str) -> String) -> Self {
            Self {
                name: name.to_string(),
                transform,
            }
        }
    }

    #[async_trait]
    impl Agent for MockAgent {
        fn name(&self) -> &str {
            &self.name
        }

        async fn run(
            &self,
            input: &str,
            _memory: &ConversationMemory,
        ) -> Result<String, AgentError> {
            Ok((self.transform)(input))
        }
    }

    #[tokio::test]
    async fn test_default_run_stream_emits_answer() {
        let agent = MockAgent::new("test", |s| format!("{}-transformed", s));
        let (tx, mut rx) = mpsc::channel(4);

        let result = agent
            .run_stream("input", &ConversationMemory::new(), tx)
            .await
            .unwrap();
        assert_eq!(result, "input-transformed");
        assert_eq!(
            rx.recv().await,
            Some(AgentEvent::Answer("input-transformed".to_string()))
        );
    }

    struct LimitAgent;

    #[async_trait]
    impl Agent for LimitAgent {
        fn name(&self) -> &str {
            "limit"
        }

        async fn run(
            &self,
            _input: &str,
            _memory: &ConversationMemory,
        ) -> Result<String, AgentError> {
            Err(AgentError::ReasoningLimitExceeded { limit: 3 })
        }
    }

    #[tokio::test]
    async fn test_default_run_stream_emits_user_message_on_error() {
        let (tx, mut rx) = mpsc::channel(4);

        let err = LimitAgent
            .run_stream("input", &ConversationMemory::new(), tx)
            .await
            .unwrap_err();
        assert_eq!(rx.recv().await, Some(AgentEvent::Error(err.user_message())));
    }
}
