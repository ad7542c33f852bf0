use std::fmt;

use crate::msx_api::types::TokenResponse;

/// Lifecycle position of a [`Session`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No token yet
    Unauthenticated,
    /// Token present but not yet confirmed by the platform
    TokenAcquired,
    /// Token confirmed; terminal
    Validated,
}

/// Authenticated identity held by one client
///
/// Only the client's connect sequence mutates it. `validated` moves from
/// false to true once and never back.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    organization_id: Option<String>,
    validated: bool,
}

impl Session {
    pub fn new(token: Option<String>, organization_id: Option<String>) -> Self {
        Self {
            token,
            organization_id,
            validated: false,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn organization_id(&self) -> Option<&str> {
        self.organization_id.as_deref()
    }

    pub fn is_validated(&self) -> bool {
        self.validated
    }

    /// Whether a non-empty token is stored
    pub fn has_token(&self) -> bool {
        self.token.as_deref().is_some_and(|token| !token.is_empty())
    }

    pub fn state(&self) -> SessionState {
        if self.validated {
            SessionState::Validated
        } else if self.has_token() {
            SessionState::TokenAcquired
        } else {
            SessionState::Unauthenticated
        }
    }

    pub(crate) fn store_token(&mut self, response: TokenResponse) {
        self.token = Some(response.token);
        self.organization_id = Some(response.organization_id);
    }

    pub(crate) fn mark_validated(&mut self) {
        self.validated = true;
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("organization_id", &self.organization_id)
            .field("validated", &self.validated)
            .finish()
    }
}
