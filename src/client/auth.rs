//! Request authentication derived from a resolved connection profile.

use reqwest::RequestBuilder;
use tracing::warn;

use super::constants::API_TOKEN_HEADER;
use crate::config::ConnectionProfile;

/// How requests to the gateway are authenticated.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// `X-Ignition-API-Token` header.
    Token(String),
    /// HTTP Basic; accepted by older gateways only.
    Basic {
        /// Basic auth username.
        username: String,
        /// Basic auth password.
        password: String,
    },
    /// No authentication.
    Anonymous,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Token(***)"),
            Self::Basic { username, .. } => write!(f, "Basic({username}, ***)"),
            Self::Anonymous => f.write_str("Anonymous"),
        }
    }
}

impl Credentials {
    /// Picks the strongest credential the profile carries. Token wins over Basic.
    #[must_use]
    pub fn from_profile(profile: &ConnectionProfile) -> Self {
        if let Some(token) = profile.token.as_deref().filter(|t| !t.is_empty()) {
            return Self::Token(token.to_string());
        }
        if let (Some(username), Some(password)) = (&profile.username, &profile.password) {
            warn!(
                "Using HTTP Basic auth. The gateway REST API only supports API token \
                 authentication ({API_TOKEN_HEADER}); Basic auth will likely fail with 401. \
                 Use 'config add --token' instead."
            );
            return Self::Basic {
                username: username.clone(),
                password: password.clone(),
            };
        }
        Self::Anonymous
    }

    /// Short label for profile listings.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Token(_) => "token",
            Self::Basic { .. } => "basic",
            Self::Anonymous => "none",
        }
    }

    pub(crate) fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            Self::Token(token) => builder.header(API_TOKEN_HEADER, token),
            Self::Basic { username, password } => builder.basic_auth(username, Some(password)),
            Self::Anonymous => builder,
        }
    }
}
