// SPDX-License-Identifier: MIT

//! Turn-local record of reasoning, actions and observations

/// Format reminder fed back when the model produced no usable action
pub const FORMAT_NUDGE: &str = "Invalid Format: your reply had neither an 'Action:' with an \
'Action Input:' nor a 'Final Answer:'. Use one of those formats.";

/// One completed tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchpadEntry {
    pub thought: String,
    pub action_name: String,
    pub action_input: String,
    pub observation: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScratchpadStep {
    /// A step that produced no action
    Reasoning { thought: String },
    /// A step that called a tool and has its observation
    Action(ScratchpadEntry),
}

/// Append-only, discarded when the turn ends
#[derive(Debug, Clone, Default)]
pub struct Scratchpad {
    steps: Vec<ScratchpadStep>,
}

impl Scratchpad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_action(&mut self, entry: ScratchpadEntry) {
        self.steps.push(ScratchpadStep::Action(entry));
    }

    pub fn push_reasoning(&mut self, thought: impl Into<String>) {
        self.steps.push(ScratchpadStep::Reasoning {
            thought: thought.into(),
        });
    }

    pub fn steps(&self) -> &[ScratchpadStep] {
        &self.steps
    }

    /// Completed tool calls, in order
    pub fn entries(&self) -> impl Iterator<Item = &ScratchpadEntry> {
        self.steps.iter().filter_map(|s| match s {
            ScratchpadStep::Action(entry) => Some(entry),
            ScratchpadStep::Reasoning { .. } => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Render as a continuation of a prompt that ends with `Thought:`.
    ///
    /// Every step closes by reopening `Thought:` so the model picks up
    /// exactly where the text leaves off.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for step in &self.steps {
            match step {
                ScratchpadStep::Action(entry) => {
                    out.push_str(&format!(
                        " {}\nAction: {}\nAction Input: {}\nObservation: {}\nThought:",
                        entry.thought, entry.action_name, entry.action_input, entry.observation
                    ));
                }
                ScratchpadStep::Reasoning { thought } => {
                    out.push_str(&format!(
                        " {}\nObservation: {}\nThought:",
                        thought, FORMAT_NUDGE
                    ));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(action: &str, observation: &str) -> ScratchpadEntry {
        ScratchpadEntry {
            thought: format!("use {}", action),
            action_name: action.to_string(),
            action_input: "Madrid".to_string(),
            observation: observation.to_string(),
        }
    }

    #[test]
    fn test_empty_renders_nothing() {
        assert_eq!(Scratchpad::new().render(), "");
    }

    #[test]
    fn test_render_action_step() {
        let mut pad = Scratchpad::new();
        pad.push_action(entry("get_weather", "18°C"));
        assert_eq!(
            pad.render(),
            " use get_weather\nAction: get_weather\nAction Input: Madrid\nObservation: 18°C\nThought:"
        );
    }

    #[test]
    fn test_render_reasoning_step_includes_nudge() {
        let mut pad = Scratchpad::new();
        pad.push_reasoning("hmm");
        let rendered = pad.render();
        assert!(rendered.starts_with(" hmm\nObservation: Invalid Format"));
        assert!(rendered.ends_with("Thought:"));
    }

    #[test]
    fn test_steps_keep_chronological_order() {
        let mut pad = Scratchpad::new();
        pad.push_action(entry("a", "1"));
        pad.push_reasoning("thinking");
        pad.push_action(entry("b", "2"));

        let names: Vec<&str> = pad.entries().map(|e| e.action_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(pad.steps().len(), 3);

        let rendered = pad.render();
        let a = rendered.find("Action: a").unwrap();
        let nudge = rendered.find("Invalid Format").unwrap();
        let b = rendered.find("Action: b").unwrap();
        assert!(a < nudge && nudge < b);
    }
}
