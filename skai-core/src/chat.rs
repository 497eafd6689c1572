//! Canned-response chat assistant.
//!
//! Replies are chosen by keyword and resolved through the active language.
//! The assistant only keeps the transcript; delivering a reply after the
//! typing delay is the caller's job.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub id: u64,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// What a user message is asking about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Evacuation,
    Shelter,
    Medical,
    Supply,
    General,
}

impl Intent {
    /// First matching keyword group wins; matching is case-insensitive
    /// substring search.
    pub fn detect(text: &str) -> Self {
        let lower = text.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        if has(&["evacuation", "evacuate"]) {
            Intent::Evacuation
        } else if has(&["shelter", "safe"]) {
            Intent::Shelter
        } else if has(&["medical", "hospital"]) {
            Intent::Medical
        } else if has(&["supply", "aid"]) {
            Intent::Supply
        } else {
            Intent::General
        }
    }

    pub fn response_key(self) -> &'static str {
        match self {
            Intent::Evacuation => "botEvacuationResponse",
            Intent::Shelter => "botShelterResponse",
            Intent::Medical => "botMedicalResponse",
            Intent::Supply => "botSupplyResponse",
            Intent::General => "botDefaultResponse",
        }
    }
}

/// Translation keys of the quick-question buttons.
pub const QUICK_QUESTION_KEYS: [&str; 4] = [
    "quickQuestion1",
    "quickQuestion2",
    "quickQuestion3",
    "quickQuestion4",
];

#[derive(Debug, Clone)]
pub struct ChatAssistant {
    messages: Vec<ChatMessage>,
    pending_replies: usize,
    next_id: u64,
}

impl ChatAssistant {
    /// Start a conversation with the bot's welcome line.
    pub fn new(welcome: impl Into<String>) -> Self {
        let mut chat = Self {
            messages: Vec::new(),
            pending_replies: 0,
            next_id: 1,
        };
        chat.push(Sender::Bot, welcome.into());
        chat
    }

    pub fn reset(&mut self, welcome: impl Into<String>) {
        *self = Self::new(welcome);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// A reply is on its way.
    pub fn is_typing(&self) -> bool {
        self.pending_replies > 0
    }

    /// Record a user message. Blank input is ignored and returns `None`;
    /// otherwise returns the intent the reply should answer.
    pub fn submit(&mut self, text: &str) -> Option<Intent> {
        if text.trim().is_empty() {
            return None;
        }
        self.push(Sender::User, text.to_string());
        self.pending_replies += 1;
        Some(Intent::detect(text))
    }

    pub fn receive_reply(&mut self, text: String) {
        self.pending_replies = self.pending_replies.saturating_sub(1);
        self.push(Sender::Bot, text);
    }

    fn push(&mut self, sender: Sender, text: String) {
        self.messages.push(ChatMessage {
            id: self.next_id,
            sender,
            text,
            timestamp: Utc::now(),
        });
        self.next_id += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_keywords() {
        assert_eq!(Intent::detect("Evacuation routes?"), Intent::Evacuation);
        assert_eq!(Intent::detect("where do we EVACUATE to"), Intent::Evacuation);
        assert_eq!(Intent::detect("Nearest shelter?"), Intent::Shelter);
        assert_eq!(Intent::detect("is the bridge safe"), Intent::Shelter);
        assert_eq!(Intent::detect("Medical facilities?"), Intent::Medical);
        assert_eq!(Intent::detect("closest hospital"), Intent::Medical);
        assert_eq!(Intent::detect("Supply distribution?"), Intent::Supply);
        assert_eq!(Intent::detect("first aid kits"), Intent::Supply);
        assert_eq!(Intent::detect("hello"), Intent::General);
    }

    #[test]
    fn test_first_matching_group_wins() {
        assert_eq!(
            Intent::detect("evacuate to the hospital shelter"),
            Intent::Evacuation
        );
        assert_eq!(Intent::detect("safe medical supply"), Intent::Shelter);
    }

    #[test]
    fn test_blank_input_ignored() {
        let mut chat = ChatAssistant::new("welcome");
        assert_eq!(chat.submit("   "), None);
        assert_eq!(chat.submit(""), None);
        assert_eq!(chat.messages().len(), 1);
        assert!(!chat.is_typing());
    }

    #[test]
    fn test_conversation_flow() {
        let mut chat = ChatAssistant::new("welcome");
        assert_eq!(chat.messages()[0].sender, Sender::Bot);

        assert_eq!(chat.submit("nearest shelter?"), Some(Intent::Shelter));
        assert!(chat.is_typing());

        chat.receive_reply("Central High School".to_string());
        assert!(!chat.is_typing());

        let senders: Vec<_> = chat.messages().iter().map(|m| m.sender).collect();
        assert_eq!(senders, vec![Sender::Bot, Sender::User, Sender::Bot]);
        let ids: Vec<_> = chat.messages().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_reset_restores_welcome_only() {
        let mut chat = ChatAssistant::new("hi");
        chat.submit("aid");
        chat.reset("bonjour");
        assert_eq!(chat.messages().len(), 1);
        assert_eq!(chat.messages()[0].text, "bonjour");
        assert!(!chat.is_typing());
    }
}
