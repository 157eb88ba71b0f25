use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry in the conversation. The tail of the sequence may be a `Pending`
/// assistant message while a turn is streaming; everything else is
/// `Finalized` and never mutated again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Finalized { role: Role, content: String },
    Pending { role: Role, partial_content: String },
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::Finalized {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Finalized {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::Finalized { role, .. } | Self::Pending { role, .. } => *role,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::Finalized { content, .. } => content,
            Self::Pending {
                partial_content, ..
            } => partial_content,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    /// Seal a streaming message in place. Already-final messages are left alone.
    pub fn finalize(&mut self) {
        if let Self::Pending {
            role,
            partial_content,
        } = self
        {
            *self = Self::Finalized {
                role: *role,
                content: std::mem::take(partial_content),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finalize_seals_pending_content() {
        let mut message = Message::Pending {
            role: Role::Assistant,
            partial_content: "partial".to_string(),
        };
        assert!(message.is_pending());

        message.finalize();
        assert!(!message.is_pending());
        assert_eq!(message.content(), "partial");
        assert_eq!(message.role(), Role::Assistant);
    }

    #[test]
    fn test_finalize_is_a_noop_on_finalized_messages() {
        let mut message = Message::user("hi");
        message.finalize();
        assert_eq!(message, Message::user("hi"));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"assistant\"").unwrap(),
            Role::Assistant
        );
    }
}
