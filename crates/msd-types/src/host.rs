//! Host records announced by instances.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ValidationError;
use crate::sizes::HOST_ID_LENGTH;

/// One discoverable peer endpoint.
///
/// Records decoded from the network are only structurally checked; the
/// business rules in [`HostRecord::validate`] apply to the record an instance
/// announces about itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostRecord {
    /// Endpoint URL of the peer.
    pub url: String,
    /// Peer identifier, 8 characters for well-formed instances.
    pub id: String,
}

impl HostRecord {
    /// Create a host record without checking business rules.
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            id: id.into(),
        }
    }

    /// Create a host record, failing if any business rule is violated.
    pub fn validated(id: impl Into<String>, url: impl Into<String>) -> Result<Self, ValidationError> {
        let host = Self::new(id, url);
        host.validate()?;
        Ok(host)
    }

    /// Check the URL syntax and id length, collecting every violation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut violations = Vec::new();

        match Url::parse(&self.url) {
            Ok(url) if !url.cannot_be_a_base() && url.has_host() => {}
            Ok(_) => violations.push(format!("URL invalid: {} has no host", self.url)),
            Err(e) => violations.push(format!("URL invalid: {e}")),
        }

        let id_len = self.id.chars().count();
        if id_len != HOST_ID_LENGTH {
            violations.push(format!(
                "ID length not equal to {HOST_ID_LENGTH} (got {id_len})"
            ));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(violations))
        }
    }
}

impl fmt::Display for HostRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_host() {
        let host = HostRecord::validated("abcd1234", "http://h:8080").unwrap();
        assert_eq!(host.id, "abcd1234");
        assert_eq!(host.url, "http://h:8080");
    }

    #[test]
    fn test_short_id_rejected() {
        let err = HostRecord::validated("abcd123", "http://h:8080").unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert!(err.violations[0].starts_with("ID length not equal to 8"));
    }

    #[test]
    fn test_id_length_counts_characters() {
        // Eight characters, more than eight bytes
        assert!(HostRecord::validated("ééééabcd", "http://h:8080").is_ok());
    }

    #[test]
    fn test_bad_url_rejected() {
        let err = HostRecord::validated("abcd1234", "not a url").unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert!(err.violations[0].starts_with("URL invalid"));

        let err = HostRecord::validated("abcd1234", "mailto:someone@example.com").unwrap_err();
        assert!(err.violations[0].starts_with("URL invalid"));
    }

    #[test]
    fn test_all_violations_collected() {
        let err = HostRecord::validated("short", "::::").unwrap_err();
        assert_eq!(err.violations.len(), 2);
        assert!(err.to_string().contains("URL invalid"));
        assert!(err.to_string().contains("ID length"));
    }
}
