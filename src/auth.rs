use crate::config::Config;

/// Short-lived credential attached to every authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Build a token from a raw secret; blank secrets are not tokens.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

/// Capability interface over the identity provider's session. The session
/// state is injected into callers instead of being read as ambient globals.
pub trait TokenProvider: Send + Sync {
    fn current_token(&self) -> Option<BearerToken>;

    fn is_signed_in(&self) -> bool {
        self.current_token().is_some()
    }
}

/// Identity session backed by the startup configuration. The real identity
/// provider lives outside this client; all we hold is the issued token.
pub struct EnvSession {
    token: Option<BearerToken>,
}

impl EnvSession {
    pub fn from_config(config: &Config) -> Self {
        Self {
            token: config.api_token.as_deref().and_then(BearerToken::new),
        }
    }

    pub fn signed_in(token: BearerToken) -> Self {
        Self { token: Some(token) }
    }

    pub fn signed_out() -> Self {
        Self { token: None }
    }
}

impl TokenProvider for EnvSession {
    fn current_token(&self) -> Option<BearerToken> {
        self.token.clone()
    }
}
