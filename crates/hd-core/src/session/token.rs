//! Bearer token handling with zeroization on drop.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

/// Opaque bearer credential proving an authenticated session to the API.
///
/// The backing memory is zeroized when the value is dropped, and the raw
/// token never appears in Debug or Display output.
#[derive(Clone)]
pub struct SessionToken(Zeroizing<String>);

impl SessionToken {
    /// Wraps a raw token string.
    pub fn new(raw: String) -> Self {
        Self(Zeroizing::new(raw))
    }

    /// Exposes the raw token for transport use.
    ///
    /// Avoid copying the returned value; copies are not zeroized.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionToken {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for SessionToken {
    fn from(raw: &str) -> Self {
        Self::new(raw.to_string())
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl PartialEq for SessionToken {
    fn eq(&self, other: &Self) -> bool {
        // Constant-time comparison to avoid leaking token contents.
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl Eq for SessionToken {}

impl Serialize for SessionToken {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SessionToken {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(SessionToken::new(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposes_the_raw_value() {
        let token = SessionToken::from("jwt-abc123");
        assert_eq!(token.expose(), "jwt-abc123");
    }

    #[test]
    fn debug_and_display_are_redacted() {
        let token = SessionToken::from("very-secret");
        assert!(!format!("{:?}", token).contains("very-secret"));
        assert!(!format!("{}", token).contains("very-secret"));
    }

    #[test]
    fn equality_compares_contents() {
        assert_eq!(SessionToken::from("a"), SessionToken::from("a"));
        assert_ne!(SessionToken::from("a"), SessionToken::from("b"));
    }
}
