//! Chat message types

use serde::{Deserialize, Serialize};

/// Role of a chat message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A single chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_serialize_lowercase() {
        let message = Message::user("hello");
        let raw = serde_json::to_string(&message).unwrap();
        assert_eq!(raw, r#"{"role":"user","content":"hello"}"#);
    }

    #[test]
    fn test_assistant_roundtrip() {
        let raw = r#"{"role":"assistant","content":"hi there"}"#;
        let message: Message = serde_json::from_str(raw).unwrap();
        assert_eq!(message.role, MessageRole::Assistant);
        assert_eq!(message.content, "hi there");
    }
}
