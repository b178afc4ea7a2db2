// SPDX-License-Identifier: MIT

//! Action parser - turns a raw model continuation into an [`AgentDecision`]
//!
//! The grammar is line oriented. A line whose first non-blank characters are
//! one of the case-sensitive keywords `Thought:`, `Action:`, `Action Input:`,
//! `Observation:` or `Final Answer:` opens a section that runs until the next
//! keyword line or the end of the text. Text before the first keyword line is
//! treated as thought, because the prompt itself ends with `Thought:`.
//!
//! Precedence:
//! 1. `Final Answer:` anywhere wins; the answer is everything after the
//!    marker up to the end of the text.
//! 2. `Action:` together with `Action Input:` is a tool invocation.
//! 3. Anything else keeps the agent reasoning. Parsing never fails.

/// What the model asked for on this step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentDecision {
    /// No usable action; the model needs another step
    ContinueReasoning { thought: String },
    /// Call a tool with the given input
    Invoke {
        thought: String,
        tool_name: String,
        tool_input: String,
    },
    /// The turn is over
    Final { thought: String, answer: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    Thought,
    Action,
    ActionInput,
    Observation,
    FinalAnswer,
}

// `Action Input:` must be tried before `Action:`.
const KEYWORDS: [(&str, Keyword); 5] = [
    ("Action Input:", Keyword::ActionInput),
    ("Final Answer:", Keyword::FinalAnswer),
    ("Observation:", Keyword::Observation),
    ("Thought:", Keyword::Thought),
    ("Action:", Keyword::Action),
];

#[derive(Debug)]
struct Section {
    keyword: Keyword,
    /// Byte offset in the source text where the section body starts
    body_start: usize,
    body: String,
}

fn match_keyword(line: &str) -> Option<(Keyword, usize)> {
    let indent = line.len() - line.trim_start().len();
    let rest = &line[indent..];
    KEYWORDS
        .iter()
        .find(|(marker, _)| rest.starts_with(marker))
        .map(|(marker, kw)| (*kw, indent + marker.len()))
}

/// Split text into the leading free text and keyword sections
fn split_sections(text: &str) -> (String, Vec<Section>) {
    let mut preamble: Vec<&str> = Vec::new();
    let mut sections: Vec<Section> = Vec::new();
    let mut offset = 0;

    for raw_line in text.split_inclusive('\n') {
        let line = raw_line.trim_end_matches(&['\n', '\r'][..]);
        match match_keyword(line) {
            Some((keyword, marker_end)) => sections.push(Section {
                keyword,
                body_start: offset + marker_end,
                body: line[marker_end..].to_string(),
            }),
            None => match sections.last_mut() {
                Some(section) => {
                    section.body.push('\n');
                    section.body.push_str(line);
                }
                None => preamble.push(line),
            },
        }
        offset += raw_line.len();
    }

    (preamble.join("\n"), sections)
}

fn first_body(sections: &[Section], keyword: Keyword) -> Option<&Section> {
    sections.iter().find(|s| s.keyword == keyword)
}

fn clean_tool_name(raw: &str) -> String {
    raw.trim_matches(|c: char| c.is_whitespace() || c == '[' || c == ']')
        .to_string()
}

fn clean_tool_input(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
        .to_string()
}

/// Parse a raw model continuation into exactly one decision
pub fn parse_decision(text: &str) -> AgentDecision {
    let (preamble, sections) = split_sections(text);

    let thought = first_body(&sections, Keyword::Thought)
        .map(|s| s.body.trim().to_string())
        .unwrap_or_else(|| preamble.trim().to_string());

    if let Some(final_section) = first_body(&sections, Keyword::FinalAnswer) {
        let answer = text[final_section.body_start..].trim().to_string();
        return AgentDecision::Final { thought, answer };
    }

    if let (Some(action), Some(input)) = (
        first_body(&sections, Keyword::Action),
        first_body(&sections, Keyword::ActionInput),
    ) {
        return AgentDecision::Invoke {
            thought,
            tool_name: clean_tool_name(&action.body),
            tool_input: clean_tool_input(&input.body),
        };
    }

    AgentDecision::ContinueReasoning { thought }
}
