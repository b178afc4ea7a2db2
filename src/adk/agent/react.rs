//! ReAct Agent - Reasoning + Acting pattern
//!
//! The model writes free text in a Thought / Action / Action Input / Final
//! Answer grammar. Each step the agent renders the full prompt (preamble,
//! tool catalog, conversation memory, scratchpad), asks the model to continue
//! it, parses the continuation and either calls a tool, nudges the model
//! back into format, or returns the final answer.

use super::parser::{parse_decision, AgentDecision};
use super::scratchpad::{Scratchpad, ScratchpadEntry};
use super::{Agent, AgentEvent};
use crate::adk::error::AgentError;
use crate::adk::memory::ConversationMemory;
use crate::adk::model::{GenerationConfig, Model};
use crate::adk::registry::ToolRegistry;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Providers cut the continuation here so the model cannot invent its own
/// observations.
pub const OBSERVATION_STOP: &str = "\nObservation:";

/// ReAct (Reasoning + Acting) Agent
pub struct ReActAgent {
    pub name: String,
    pub instruction: String,
    pub model: Arc<dyn Model>,
    pub tools: Arc<ToolRegistry>,
    pub generation: GenerationConfig,
    /// Maximum number of model calls per turn
    pub max_iterations: u32,
}

impl ReActAgent {
    pub fn new(
        name: String,
        instruction: String,
        model: Arc<dyn Model>,
        tools: Arc<ToolRegistry>,
        max_iterations: u32,
    ) -> Self {
        Self {
            name,
            instruction,
            model,
            tools,
            generation: GenerationConfig {
                stop_sequences: vec![OBSERVATION_STOP.to_string()],
                ..Default::default()
            },
            max_iterations,
        }
    }

    pub fn with_generation_config(mut self, mut config: GenerationConfig) -> Self {
        if !config.stop_sequences.iter().any(|s| s == OBSERVATION_STOP) {
            config.stop_sequences.push(OBSERVATION_STOP.to_string());
        }
        self.generation = config;
        self
    }

    /// Build the full prompt for the next step
    fn build_prompt(
        &self,
        input: &str,
        memory: &ConversationMemory,
        scratchpad: &Scratchpad,
    ) -> String {
        let tool_section = if self.tools.is_empty() {
            "No tools are available. You must answer based on your knowledge.".to_string()
        } else {
            self.tools.catalog()
        };
        let history = if memory.is_empty() {
            "(none)".to_string()
        } else {
            memory.render()
        };

        format!(
            r#"{}

Answer the following questions as best you can. You have access to the following tools:

{}

Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question

Begin!

Previous conversation:
{}

Question: {}
Thought:{}"#,
            self.instruction,
            tool_section,
            self.tools.names().join(", "),
            history,
            input,
            scratchpad.render()
        )
    }

    /// Run a tool by name. Unknown names become an observation so the model
    /// can correct itself on the next step.
    async fn execute_tool(&self, tool_name: &str, input: &str) -> String {
        match self.tools.get(tool_name) {
            Some(tool) => tool.invoke(input).await,
            None => {
                log::warn!("ReActAgent {} asked for unknown tool '{}'", self.name, tool_name);
                format!(
                    "{} is not a valid tool, try one of [{}].",
                    tool_name,
                    self.tools.names().join(", ")
                )
            }
        }
    }

    async fn run_turn(
        &self,
        input: &str,
        memory: &ConversationMemory,
        tx: Option<&mpsc::Sender<AgentEvent>>,
    ) -> Result<String, AgentError> {
        let mut scratchpad = Scratchpad::new();

        for iteration in 0..self.max_iterations {
            log::info!(
                "ReActAgent {} iteration {}/{} ({})",
                self.name,
                iteration + 1,
                self.max_iterations,
                self.model.model_name()
            );

            let prompt = self.build_prompt(input, memory, &scratchpad);
            let continuation = match self.model.generate(&prompt, &self.generation).await {
                Ok(text) => text,
                Err(e) => {
                    log::error!("ReActAgent {} model call failed: {}", self.name, e);
                    let err = AgentError::from(e);
                    emit(tx, AgentEvent::Error(err.user_message())).await;
                    return Err(err);
                }
            };

            let decision = parse_decision(&continuation);
            log::debug!("ReActAgent decision: {:?}", decision);

            match decision {
                AgentDecision::Final { thought, answer } => {
                    if !thought.is_empty() {
                        emit(tx, AgentEvent::Thought(thought)).await;
                    }
                    log::info!("Final Answer: {}", answer);
                    emit(tx, AgentEvent::Answer(answer.clone())).await;
                    return Ok(answer);
                }
                AgentDecision::Invoke {
                    thought,
                    tool_name,
                    tool_input,
                } => {
                    if !thought.is_empty() {
                        emit(tx, AgentEvent::Thought(thought.clone())).await;
                    }
                    log::info!("Action: {}({})", tool_name, tool_input);
                    emit(
                        tx,
                        AgentEvent::ToolCall {
                            name: tool_name.clone(),
                            input: tool_input.clone(),
                        },
                    )
                    .await;

                    let observation = self.execute_tool(&tool_name, &tool_input).await;
                    log::info!("Observation: {}", observation);
                    emit(
                        tx,
                        AgentEvent::ToolResult {
                            name: tool_name.clone(),
                            observation: observation.clone(),
                        },
                    )
                    .await;

                    scratchpad.push_action(ScratchpadEntry {
                        thought,
                        action_name: tool_name,
                        action_input: tool_input,
                        observation,
                    });
                }
                AgentDecision::ContinueReasoning { thought } => {
                    log::info!("Thought without action: {}", thought);
                    if !thought.is_empty() {
                        emit(tx, AgentEvent::Thought(thought.clone())).await;
                    }
                    scratchpad.push_reasoning(thought);
                }
            }
        }

        log::warn!(
            "ReActAgent {} reached max iterations ({})",
            self.name,
            self.max_iterations
        );
        let err = AgentError::ReasoningLimitExceeded {
            limit: self.max_iterations,
        };
        emit(tx, AgentEvent::Error(err.user_message())).await;
        Err(err)
    }
}

async fn emit(tx: Option<&mpsc::Sender<AgentEvent>>, event: AgentEvent) {
    if let Some(tx) = tx {
        let _ = tx.send(event).await;
    }
}

#[async_trait]
impl Agent for ReActAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, input: &str, memory: &ConversationMemory) -> Result<String, AgentError> {
        self.run_turn(input, memory, None).await
    }

    async fn run_stream(
        &self,
        input: &str,
        memory: &ConversationMemory,
        tx: mpsc::Sender<AgentEvent>,
    ) -> Result<String, AgentError> {
        self.run_turn(input, memory, Some(&tx)).await
    }
}
