use serde::{Deserialize, Serialize};

use crate::llm::ChatMessage;

/// Author of a prompt message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

/// Per-request prompt: one fixed system instruction followed by one user message.
///
/// The shape is enforced by construction; there is no way to add, remove or
/// reorder messages once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    messages: [PromptMessage; 2],
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: [
                PromptMessage {
                    role: Role::System,
                    content: system.into(),
                },
                PromptMessage {
                    role: Role::User,
                    content: user.into(),
                },
            ],
        }
    }

    pub fn messages(&self) -> &[PromptMessage] {
        &self.messages
    }

    pub fn system(&self) -> &str {
        &self.messages[0].content
    }

    pub fn user(&self) -> &str {
        &self.messages[1].content
    }

    /// Render as provider chat messages (system first, then user)
    pub fn to_chat_messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::System {
                content: self.system().to_string(),
            },
            ChatMessage::User {
                content: self.user().to_string(),
            },
        ]
    }
}
