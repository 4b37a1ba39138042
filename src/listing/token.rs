//! Personal access token wrapper for authenticated GitHub requests.

use crate::error::DigestError;

/// Personal access token wrapper enforcing presence.
#[derive(Clone, PartialEq, Eq)]
pub struct PersonalAccessToken(String);

impl PersonalAccessToken {
    /// Validates that the token is non-empty and trims whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Configuration`] when the supplied string is
    /// blank.
    pub fn new(token: impl AsRef<str>) -> Result<Self, DigestError> {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(DigestError::Configuration {
                message: "personal access token must not be blank".to_owned(),
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the token value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for PersonalAccessToken {
    fn as_ref(&self) -> &str {
        self.value()
    }
}

impl std::fmt::Debug for PersonalAccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PersonalAccessToken(***)")
    }
}
