//! Conversation turns with a closed role tag
//!
//! Sessions are held by the caller; the engine only consumes an
//! already-ordered history slice and must preserve that order.

use serde::{Deserialize, Serialize};

/// Speaker role, resolved at the boundary.
///
/// Free-form role strings from a UI never reach prompt assembly: any
/// tag other than `user` is coerced to `Assistant`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Resolve a free-form tag into the closed role set
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "user" => Self::User,
            _ => Self::Assistant,
        }
    }

    /// Canonical lowercase name, used when rendering prompts
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One turn of a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Convenience constructor for a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Convenience constructor for an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Turns with no visible content are dropped during windowing
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_coercion_is_closed() {
        assert_eq!(Role::from_tag("user"), Role::User);
        assert_eq!(Role::from_tag(" USER "), Role::User);
        assert_eq!(Role::from_tag("assistant"), Role::Assistant);
        // Anything else collapses to assistant
        assert_eq!(Role::from_tag("system"), Role::Assistant);
        assert_eq!(Role::from_tag("tool"), Role::Assistant);
        assert_eq!(Role::from_tag(""), Role::Assistant);
    }

    #[test]
    fn blank_detection() {
        assert!(ConversationTurn::user("   \n\t").is_blank());
        assert!(!ConversationTurn::assistant("hi").is_blank());
    }
}
