//! Identity verification port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Timestamp, UserId, UserProfile};

/// Claims of a verified sign-in token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    pub uid: UserId,
    pub name: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
}

impl VerifiedIdentity {
    /// Name shown in the UI: the display name, else the email's local part,
    /// else the uid.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        if let Some(local) = self
            .email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty())
        {
            return local.to_string();
        }
        self.uid.to_string()
    }

    /// Profile document to upsert for this login.
    pub fn to_profile(&self, now: Timestamp) -> UserProfile {
        UserProfile {
            uid: self.uid.clone(),
            name: self.display_name(),
            email: self.email.clone(),
            picture: self.picture.clone(),
            last_login: now,
        }
    }
}

/// Failures of token verification.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IdentityError {
    /// The token is malformed, expired or revoked.
    #[error("Invalid identity token: {0}")]
    InvalidToken(String),

    /// The identity service could not be reached.
    #[error("Identity service unavailable: {0}")]
    Unavailable(String),
}

/// Verifies client-issued sign-in tokens.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, IdentityError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(name: Option<&str>, email: Option<&str>) -> VerifiedIdentity {
        VerifiedIdentity {
            uid: UserId::new("u1").unwrap(),
            name: name.map(String::from),
            email: email.map(String::from),
            picture: None,
        }
    }

    #[test]
    fn display_name_falls_back_to_email_then_uid() {
        assert_eq!(identity(Some("Ada"), Some("ada@x.io")).display_name(), "Ada");
        assert_eq!(identity(None, Some("grace@x.io")).display_name(), "grace");
        assert_eq!(identity(Some(" "), None).display_name(), "u1");
    }
}
