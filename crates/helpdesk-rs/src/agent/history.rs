//! Bounded per-session conversation history.
//!
//! A [`ConversationHistory`] is an ordered log of user and assistant
//! [`Turn`]s. The harness reads a snapshot before a run and appends the user
//! utterance and the assistant reply together after it, so an interrupted run
//! leaves no half-written exchange behind.

use std::collections::VecDeque;
use std::fmt;

use crate::Message;

/// Default number of turns kept after trimming (five exchanges).
pub const DEFAULT_HISTORY_WINDOW: usize = 10;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One immutable conversation turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    role: Role,
    text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The wire message for this turn.
    pub fn to_message(&self) -> Message {
        match self.role {
            Role::User => Message::user(self.text.clone()),
            Role::Assistant => Message::assistant_text(self.text.clone()),
        }
    }
}

/// Ordered, append-only turn log with FIFO trimming.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    turns: VecDeque<Turn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push_back(turn);
    }

    /// Append a completed exchange: the user utterance and the reply to it.
    pub fn record_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.append(Turn::user(user));
        self.append(Turn::assistant(assistant));
    }

    /// A copy of the turns, oldest first.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    /// Drop the oldest turns until at most `max_turns` remain.
    pub fn trim(&mut self, max_turns: usize) {
        let excess = self.turns.len().saturating_sub(max_turns);
        if excess > 0 {
            self.turns.drain(..excess);
        }
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }
}
