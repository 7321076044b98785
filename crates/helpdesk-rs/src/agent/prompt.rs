//! Prompt assembly for one utterance.
//!
//! [`PromptTemplate`] holds the fixed instruction preamble. For each
//! utterance it produces a [`PromptContext`]: the rendered system prompt, the
//! new user text, a scratch area where the harness accumulates tool calls and
//! observations, and a clarification slot used when re-prompting after a
//! failed model call.

use chrono::{Days, NaiveDate};

use crate::agent::history::Turn;
use crate::clock::format_date;
use crate::{Message, ToolCall};

/// Builder for multi-section system prompts.
///
/// Sections are joined with blank lines. Sections with empty content are
/// skipped.
///
/// ```
/// use helpdesk_rs::agent::prompt::SystemPromptBuilder;
///
/// let prompt = SystemPromptBuilder::new("You answer support requests.")
///     .section("Dates", "Today is 2024-05-01.")
///     .section("Missing", "")
///     .build();
///
/// assert!(prompt.contains("## Dates"));
/// assert!(!prompt.contains("## Missing"));
/// ```
pub struct SystemPromptBuilder {
    sections: Vec<String>,
}

impl SystemPromptBuilder {
    /// Create a builder whose first block is `preamble`, without a heading.
    pub fn new(preamble: impl Into<String>) -> Self {
        Self {
            sections: vec![preamble.into()],
        }
    }

    /// Append a `## heading` section. Skipped if `content` is empty.
    pub fn section(mut self, heading: &str, content: impl Into<String>) -> Self {
        let content = content.into();
        if !content.is_empty() {
            self.sections.push(format!("## {heading}\n\n{content}"));
        }
        self
    }

    pub fn build(self) -> String {
        self.sections
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

const DEFAULT_DATE_HEADING: &str = "Dates";
const DEFAULT_DATE_NOTE: &str = "Today is {today}. Tomorrow is {tomorrow}. \
Resolve relative dates such as \"tomorrow\" to YYYY-MM-DD before calling a tool.";

/// Fixed instruction preamble plus the per-utterance date section.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    preamble: String,
    date_heading: String,
    date_note: String,
}

impl PromptTemplate {
    pub fn new(preamble: impl Into<String>) -> Self {
        Self {
            preamble: preamble.into(),
            date_heading: DEFAULT_DATE_HEADING.to_string(),
            date_note: DEFAULT_DATE_NOTE.to_string(),
        }
    }

    /// Replace the date section. `note` may use `{today}` and `{tomorrow}`.
    pub fn with_date_section(mut self, heading: impl Into<String>, note: impl Into<String>) -> Self {
        self.date_heading = heading.into();
        self.date_note = note.into();
        self
    }

    pub fn preamble(&self) -> &str {
        &self.preamble
    }

    /// The system prompt for a conversation happening on `today`.
    pub fn system_prompt(&self, today: NaiveDate) -> String {
        let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
        let note = self
            .date_note
            .replace("{today}", &format_date(today))
            .replace("{tomorrow}", &format_date(tomorrow));
        SystemPromptBuilder::new(self.preamble.clone())
            .section(&self.date_heading, note)
            .build()
    }

    /// Start the prompt context for one user utterance.
    pub fn context(&self, utterance: impl Into<String>, today: NaiveDate) -> PromptContext {
        PromptContext {
            system: self.system_prompt(today),
            utterance: utterance.into(),
            scratch: Vec::new(),
            clarification: None,
        }
    }
}

/// Everything the model sees for one utterance, apart from prior turns.
#[derive(Debug, Clone)]
pub struct PromptContext {
    system: String,
    utterance: String,
    scratch: Vec<Message>,
    clarification: Option<String>,
}

impl PromptContext {
    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn utterance(&self) -> &str {
        &self.utterance
    }

    /// Messages accumulated by the harness during this utterance.
    pub fn scratch(&self) -> &[Message] {
        &self.scratch
    }

    /// Record one executed tool round: the assistant's calls followed by one
    /// observation per call, keyed by call id.
    pub fn push_tool_round(
        &mut self,
        calls: Vec<ToolCall>,
        text: Option<String>,
        observations: Vec<(String, String)>,
    ) {
        self.scratch.push(Message::assistant_tool_calls(calls, text));
        for (call_id, observation) in observations {
            self.scratch.push(Message::tool_result(call_id, observation));
        }
    }

    pub fn clarification(&self) -> Option<&str> {
        self.clarification.as_deref()
    }

    /// Set the re-prompt appended after everything else on the next call.
    pub fn set_clarification(&mut self, text: impl Into<String>) {
        self.clarification = Some(text.into());
    }

    pub fn clear_clarification(&mut self) {
        self.clarification = None;
    }

    /// Wire messages: system prompt, prior turns, the utterance, the scratch
    /// area, then the clarification if one is set.
    pub fn render(&self, history: &[Turn]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + self.scratch.len() + 3);
        messages.push(Message::system(self.system.clone()));
        messages.extend(history.iter().map(Turn::to_message));
        messages.push(Message::user(self.utterance.clone()));
        messages.extend(self.scratch.iter().cloned());
        if let Some(clarification) = &self.clarification {
            messages.push(Message::user(clarification.clone()));
        }
        messages
    }
}
