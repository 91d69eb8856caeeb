use std::fmt::{Debug, Display, Formatter};

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;

/// Opaque marker that lets a target resume without resending matching data.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ResumeToken(Vec<u8>);

impl ResumeToken {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Decodes the base64 form used by the JSON transport.
    pub fn from_base64(encoded: &str) -> Option<Self> {
        BASE64_STANDARD.decode(encoded).ok().map(Self)
    }

    pub fn to_base64(&self) -> String {
        BASE64_STANDARD.encode(&self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for ResumeToken {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for ResumeToken {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<&str> for ResumeToken {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl Debug for ResumeToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ResumeToken({})", self.to_base64())
    }
}

impl Display for ResumeToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_base64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_as_base64() {
        let token = ResumeToken::new(vec![1u8, 2, 3]);
        assert_eq!(token.to_string(), "AQID");
        assert_eq!(ResumeToken::from_base64("AQID"), Some(token));
        assert_eq!(ResumeToken::from_base64("not base64!"), None);
    }

    #[test]
    fn empty_token() {
        assert!(ResumeToken::empty().is_empty());
        assert!(!ResumeToken::from("rt1").is_empty());
    }
}
