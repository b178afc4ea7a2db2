// SPDX-License-Identifier: MIT

//! Model module - defines the language model trait and implementations
//!
//! The agent treats the model as an opaque text continuation capability:
//! a prompt goes in, a continuation comes out. Implementations live in
//! their own submodules:
//! - [gemini] - Google's Gemini API

pub mod gemini;

use crate::adk::error::ModelError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Configuration for model generation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    /// Sequences at which the provider should cut the continuation
    #[serde(default)]
    pub stop_sequences: Vec<String>,
}

/// Core trait for LLM model implementations
#[async_trait]
pub trait Model: Send + Sync {
    /// Returns the model identifier used for requests
    fn model_name(&self) -> &str;

    /// Continue the given prompt
    async fn generate(&self, prompt: &str, config: &GenerationConfig)
        -> Result<String, ModelError>;
}
