//! Per-target message history for the generator.

use crate::llm::Message;

/// Running context for one target.
///
/// Created fresh when a target's loop starts and dropped when it ends, so
/// nothing leaks between targets. Feedback from attempt `i` is pushed here
/// and is seen by attempt `i + 1` and every later one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    /// Add a correction signal for the next attempt
    pub fn push_feedback(&mut self, feedback: impl Into<String>) {
        self.push_user(feedback);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    #[test]
    fn test_history_accumulates_in_order() {
        let mut conversation = Conversation::new();
        assert!(conversation.is_empty());

        conversation.push_user("improve");
        conversation.push_assistant("class A {}");
        conversation.push_feedback("{\"summary\": \"missing import\"}");

        let roles: Vec<Role> = conversation.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation.messages()[2].content, "{\"summary\": \"missing import\"}");
    }
}
