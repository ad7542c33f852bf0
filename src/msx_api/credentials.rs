use std::fmt;

use crate::config::Configuration;
use crate::msx_api::types::{Credentials, MsxError};

/// Identity used to open a session
///
/// Built from explicit arguments, then completed from the [`Configuration`]
/// by [`Identity::resolve`]. Empty strings count as absent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub email: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
    pub organization_id: Option<String>,
}

impl Identity {
    /// Identity from an email/password pair
    pub fn from_credentials(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            password: Some(password.into()),
            ..Default::default()
        }
    }

    /// Identity from an existing bearer token
    pub fn from_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Default::default()
        }
    }

    pub fn with_organization_id(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }

    /// Fill every field not given explicitly from `config`
    ///
    /// Fails with [`MsxError::MissingCredentials`] when token, email and
    /// password are all absent afterwards.
    pub fn resolve(self, config: &Configuration) -> Result<Self, MsxError> {
        let resolved = Self {
            email: prefer(self.email, &config.email),
            password: prefer(self.password, &config.password),
            token: prefer(self.token, &config.token),
            organization_id: prefer(self.organization_id, &config.org_id),
        };

        if resolved.token.is_none() && resolved.email.is_none() && resolved.password.is_none() {
            tracing::error!("No token, email or password available to connect");
            return Err(MsxError::MissingCredentials(
                "Either a token or email/password is required.".to_string(),
            ));
        }

        Ok(resolved)
    }

    /// The email/password pair for the token request, when both are present
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.email, &self.password) {
            (Some(email), Some(password)) => Some(Credentials {
                email: email.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("organization_id", &self.organization_id)
            .finish()
    }
}

fn prefer(explicit: Option<String>, fallback: &Option<String>) -> Option<String> {
    explicit
        .filter(|value| !value.is_empty())
        .or_else(|| fallback.clone().filter(|value| !value.is_empty()))
}
