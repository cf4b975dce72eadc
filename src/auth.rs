//! Bearer-token authentication.

use crate::config::ServerSettings;
use crate::store::UserId;
use std::collections::HashMap;

/// Maps a presented credential to the user it authenticates.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, token: &str) -> Option<UserId>;
}

/// Static token table from the server settings.
#[derive(Debug, Clone, Default)]
pub struct TokenAuthenticator {
    tokens: HashMap<String, UserId>,
}

impl TokenAuthenticator {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self {
            tokens: tokens
                .into_iter()
                .filter(|(token, user)| !token.trim().is_empty() && !user.trim().is_empty())
                .map(|(token, user)| (token, UserId::new(user)))
                .collect(),
        }
    }

    pub fn from_settings(settings: &ServerSettings) -> Self {
        Self::new(settings.tokens.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Authenticator for TokenAuthenticator {
    fn authenticate(&self, token: &str) -> Option<UserId> {
        self.tokens.get(token.trim()).cloned()
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
