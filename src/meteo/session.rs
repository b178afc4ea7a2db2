// SPDX-License-Identifier: MIT

//! Conversation session
//!
//! A session is the explicit context one conversation runs in: the agent,
//! its memory and an id for log correlation. Sessions share nothing, so a
//! host can run several side by side.

use crate::adk::agent::{Agent, AgentEvent, ReActAgent};
use crate::adk::error::{AgentError, MeteoError};
use crate::adk::memory::ConversationMemory;
use crate::adk::model::gemini::GeminiModel;
use crate::adk::model::{GenerationConfig, Model};
use crate::meteo::config::SessionConfig;
use crate::meteo::http::{HttpFetcher, ReqwestFetcher};
use crate::meteo::tools::build_registry;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

pub const AGENT_NAME: &str = "meteo_agent";

pub const INSTRUCTION: &str = "You are a friendly weather assistant. You answer questions about \
the current time, the current weather of any city and active weather alerts. Always use a tool \
to get live data instead of guessing. When the alerts come from a web search, say that they are \
unofficial and should be checked with the official weather service. Answer concisely in the \
language of the question.";

pub const GREETING: &str = "Hello! I am your weather assistant. Ask me the time, the weather \
in any city, or whether there are weather alerts.";

/// Outcome of one turn as the user sees it
#[derive(Debug)]
pub struct Reply {
    /// Final answer, or the explanatory message when the turn aborted
    pub text: String,
    /// Why the turn aborted, if it did
    pub error: Option<AgentError>,
}

impl Reply {
    pub fn is_answer(&self) -> bool {
        self.error.is_none()
    }
}

/// Wire a ReAct agent from configuration and collaborators
pub fn build_agent(
    config: &SessionConfig,
    model: Arc<dyn Model>,
    fetcher: Arc<dyn HttpFetcher>,
) -> Result<ReActAgent, MeteoError> {
    let registry = build_registry(config, fetcher)?;
    let agent = ReActAgent::new(
        AGENT_NAME.to_string(),
        INSTRUCTION.to_string(),
        model,
        Arc::new(registry),
        config.max_iterations,
    )
    .with_generation_config(GenerationConfig {
        temperature: Some(config.temperature),
        ..Default::default()
    });
    Ok(agent)
}

pub struct Session {
    id: Uuid,
    agent: Arc<dyn Agent>,
    memory: ConversationMemory,
}

impl Session {
    pub fn new(agent: Arc<dyn Agent>, memory_capacity: Option<usize>) -> Self {
        let memory = match memory_capacity {
            Some(capacity) => ConversationMemory::with_capacity(capacity),
            None => ConversationMemory::new(),
        };
        Self {
            id: Uuid::new_v4(),
            agent,
            memory,
        }
    }

    /// Validate the configuration and connect to Gemini and the live data
    /// sources
    pub fn connect(config: &SessionConfig) -> Result<Self, MeteoError> {
        config.validate()?;
        let api_key = config.google_api_key.clone().unwrap_or_default();

        let mut model = GeminiModel::new(api_key, config.model.clone(), config.model_timeout())?;
        if let Some(base_url) = &config.model_base_url {
            model = model.with_base_url(base_url.clone());
        }
        let fetcher: Arc<dyn HttpFetcher> = Arc::new(ReqwestFetcher::new()?);

        let agent = build_agent(config, Arc::new(model), fetcher)?;
        let session = Self::new(Arc::new(agent), config.memory_capacity);
        log::info!(
            "Session {} started with model {} (alerts credential {})",
            session.id,
            config.model,
            if config.aemet_api_key.is_some() {
                "configured"
            } else {
                "not configured"
            }
        );
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn clear(&mut self) {
        log::info!("Session {} memory cleared", self.id);
        self.memory.clear();
    }

    /// Run one turn
    pub async fn ask(&mut self, input: &str) -> Reply {
        let result = self.agent.run(input, &self.memory).await;
        self.finish_turn(input, result)
    }

    /// Run one turn, streaming intermediate steps to `tx`
    pub async fn ask_stream(&mut self, input: &str, tx: mpsc::Sender<AgentEvent>) -> Reply {
        let result = self.agent.run_stream(input, &self.memory, tx).await;
        self.finish_turn(input, result)
    }

    // Memory only ever holds completed exchanges; an aborted turn leaves it
    // untouched and its explanation lives in the reply alone
    fn finish_turn(&mut self, input: &str, result: Result<String, AgentError>) -> Reply {
        match result {
            Ok(text) => {
                self.memory.record_user(input);
                self.memory.record_assistant(text.clone());
                Reply { text, error: None }
            }
            Err(e) => {
                log::warn!("Session {} turn aborted: {}", self.id, e);
                Reply {
                    text: e.user_message(),
                    error: Some(e),
                }
            }
        }
    }
}
