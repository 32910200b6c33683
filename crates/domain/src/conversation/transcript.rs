//! Bounded, strictly alternating conversation history.
//!
//! A [`Transcript`] only ever stores `user` and `assistant` turns. After every
//! mutation it satisfies:
//!
//! - no two consecutive turns share a role
//! - the first turn, if any, is a `user` turn
//! - it holds at most `max_messages` turns
//! - at most one trailing `user` turn is unanswered
//!
//! Appending a user turn may trim the oldest turns. Until the reply is
//! committed with [`Transcript::append_assistant`], the trimmed history is kept
//! so that [`Transcript::rollback_unanswered`] restores the exact pre-append
//! state.
//!
//! Normalization runs in a fixed order: drop leading non-user turns, filter out
//! turns that break alternation, keep the most recent `max_messages`, then drop
//! leading non-user turns again since trimming can expose an assistant turn.

use serde::{Deserialize, Serialize};

use super::turn::{Role, Turn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
    max_messages: usize,
    /// Turns as they were before the last `append_user`, while it is unanswered.
    #[serde(skip)]
    before_unanswered: Option<Vec<Turn>>,
}

impl Transcript {
    pub fn new(max_messages: usize) -> Self {
        Self {
            turns: Vec::new(),
            max_messages,
            before_unanswered: None,
        }
    }

    /// Build a transcript from arbitrary turns, normalizing them.
    pub fn from_turns(turns: Vec<Turn>, max_messages: usize) -> Self {
        let mut transcript = Self {
            turns,
            max_messages,
            before_unanswered: None,
        };
        transcript.normalize();
        transcript
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last_role(&self) -> Option<Role> {
        self.turns.last().map(|turn| turn.role)
    }

    /// Whether the trailing turn is a user turn still waiting for a reply.
    pub fn has_unanswered(&self) -> bool {
        self.last_role() == Some(Role::User)
    }

    pub fn append_user(&mut self, text: impl Into<String>) {
        self.before_unanswered = Some(self.turns.clone());
        self.turns.push(Turn::user(text));
        self.normalize();
    }

    /// Commits the pending exchange; turns trimmed by the user append are gone for good.
    pub fn append_assistant(&mut self, text: impl Into<String>) {
        self.before_unanswered = None;
        self.turns.push(Turn::assistant(text));
        self.normalize();
    }

    /// Undo the last unanswered `append_user`, restoring any turns it trimmed.
    /// Without a recorded append, a trailing user turn is simply removed.
    ///
    /// Returns whether anything changed. Once the trailing turn is an
    /// assistant turn (or the transcript is empty) this is a no-op.
    pub fn rollback_unanswered(&mut self) -> bool {
        if !self.has_unanswered() {
            return false;
        }
        match self.before_unanswered.take() {
            Some(turns) => self.turns = turns,
            None => {
                self.turns.pop();
            }
        }
        true
    }

    pub fn normalize(&mut self) {
        self.drop_leading_non_user();
        self.enforce_alternation();
        if self.turns.len() > self.max_messages {
            let excess = self.turns.len() - self.max_messages;
            self.turns.drain(..excess);
        }
        self.drop_leading_non_user();
    }

    /// The message list sent to a completion backend: a synthesized system turn
    /// followed by the stored history. Stored state is untouched.
    pub fn render_for_request(&self, system_prompt: &str) -> Vec<Turn> {
        let mut messages = Vec::with_capacity(self.turns.len() + 1);
        messages.push(Turn::system(system_prompt));
        messages.extend(self.turns.iter().cloned());
        messages
    }

    fn drop_leading_non_user(&mut self) {
        let first_user = self
            .turns
            .iter()
            .position(|turn| turn.role == Role::User)
            .unwrap_or(self.turns.len());
        self.turns.drain(..first_user);
    }

    // Keeps a turn only if it carries the expected role; discarded turns do not
    // advance the expectation.
    fn enforce_alternation(&mut self) {
        let mut expected = Role::User;
        self.turns.retain(|turn| {
            if turn.role == expected {
                expected = expected.counterpart();
                true
            } else {
                false
            }
        });
    }
}
