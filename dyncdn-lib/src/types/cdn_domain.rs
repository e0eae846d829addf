use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Scheme;

/// A CDN host that asset references can be rewritten to.
///
/// Domains are normalized when they are created, so `https://cdn1.com/`
/// and `https://cdn1.com` are the same pool entry while `cdn1.com` (no
/// scheme, resolved per request) is a different one.
///
/// # Examples
///
/// ```
/// use dyncdn_lib::{CdnDomain, Scheme};
///
/// let domain = CdnDomain::from("https://cdn1.example.com/");
/// assert_eq!(domain.scheme(), Some(Scheme::Https));
/// assert_eq!(domain.host(), "cdn1.example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CdnDomain {
    scheme: Option<Scheme>,
    host: String,
}

impl CdnDomain {
    /// Scheme the domain was configured with, if any
    #[must_use]
    pub const fn scheme(&self) -> Option<Scheme> {
        self.scheme
    }

    /// Host (and optional port or path prefix) without any scheme
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        let (scheme, mut rest) = match Scheme::strip_prefix(trimmed) {
            Some((scheme, rest)) => (Some(scheme), rest),
            None => (None, trimmed.strip_prefix("//").unwrap_or(trimmed)),
        };

        // Entries like `https://https://cdn.example.com` keep the first scheme
        let mut collapsed = false;
        while let Some((_, inner)) = Scheme::strip_prefix(rest) {
            rest = inner;
            collapsed = true;
        }
        if collapsed {
            warn!("CDN domain `{trimmed}` has a repeated scheme prefix, using `{rest}`");
        }

        CdnDomain {
            scheme,
            host: rest.trim_end_matches('/').to_string(),
        }
    }
}

impl From<&str> for CdnDomain {
    fn from(value: &str) -> Self {
        CdnDomain::parse(value)
    }
}

impl From<String> for CdnDomain {
    fn from(value: String) -> Self {
        CdnDomain::parse(&value)
    }
}

impl From<&String> for CdnDomain {
    fn from(value: &String) -> Self {
        CdnDomain::parse(value)
    }
}

impl From<CdnDomain> for String {
    fn from(domain: CdnDomain) -> Self {
        domain.to_string()
    }
}

impl fmt::Display for CdnDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scheme {
            Some(scheme) => write!(f, "{scheme}://{}", self.host),
            None => write!(f, "{}", self.host),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("cdn1.com", None, "cdn1.com")]
    #[case("  cdn1.com  ", None, "cdn1.com")]
    #[case("//cdn1.com", None, "cdn1.com")]
    #[case("https://cdn1.com", Some(Scheme::Https), "cdn1.com")]
    #[case("http://cdn1.com/", Some(Scheme::Http), "cdn1.com")]
    #[case("https://https://cdn1.com", Some(Scheme::Https), "cdn1.com")]
    #[case("http://https://cdn1.com", Some(Scheme::Http), "cdn1.com")]
    #[case("cdn1.com:8080", None, "cdn1.com:8080")]
    #[case("https://cdn1.com/static", Some(Scheme::Https), "cdn1.com/static")]
    fn test_normalize(
        #[case] input: &str,
        #[case] scheme: Option<Scheme>,
        #[case] host: &str,
    ) {
        let domain = CdnDomain::from(input);
        assert_eq!(domain.scheme(), scheme);
        assert_eq!(domain.host(), host);
    }

    #[test]
    fn test_equality_after_normalization() {
        assert_eq!(CdnDomain::from("https://cdn1.com/"), CdnDomain::from("https://cdn1.com"));
        assert_ne!(CdnDomain::from("https://cdn1.com"), CdnDomain::from("cdn1.com"));
    }

    #[test]
    fn test_display() {
        assert_eq!(CdnDomain::from("https://cdn1.com/").to_string(), "https://cdn1.com");
        assert_eq!(CdnDomain::from("//cdn1.com").to_string(), "cdn1.com");
    }
}
