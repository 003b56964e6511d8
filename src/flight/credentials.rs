use std::collections::HashMap;
use std::fmt;

pub const AUTHORIZATION_KEY: &str = "authorization";

/// Supplies authorization metadata attached to every call on the transport.
pub trait PerRpcCredentials: Send + Sync + fmt::Debug {
    /// Metadata entries to attach to an outgoing call.
    fn request_metadata(&self) -> HashMap<String, String>;

    /// Whether these credentials may only travel over an encrypted channel.
    fn require_transport_security(&self) -> bool;
}

fn bearer_metadata(token: &str) -> HashMap<String, String> {
    HashMap::from([(AUTHORIZATION_KEY.to_string(), format!("Bearer {token}"))])
}

/// Bearer token for TLS channels.
#[derive(Clone)]
pub struct BearerToken {
    token: String,
}

impl BearerToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl PerRpcCredentials for BearerToken {
    fn request_metadata(&self) -> HashMap<String, String> {
        bearer_metadata(&self.token)
    }

    fn require_transport_security(&self) -> bool {
        true
    }
}

/// Bearer token allowed over plaintext channels, for local and dev engines.
#[derive(Clone)]
pub struct InsecureBearerToken {
    token: String,
}

impl InsecureBearerToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl PerRpcCredentials for InsecureBearerToken {
    fn request_metadata(&self) -> HashMap<String, String> {
        bearer_metadata(&self.token)
    }

    fn require_transport_security(&self) -> bool {
        false
    }
}

// Tokens stay out of logs.
impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken").field("token", &"<redacted>").finish()
    }
}

impl fmt::Debug for InsecureBearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsecureBearerToken")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Pick the credential variant matching the transport security mode.
#[must_use]
pub fn credentials_for(secure: bool, token: &str) -> Box<dyn PerRpcCredentials> {
    if secure {
        Box::new(BearerToken::new(token))
    } else {
        Box::new(InsecureBearerToken::new(token))
    }
}
