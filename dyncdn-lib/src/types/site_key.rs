use serde::Deserialize;
use std::fmt;
use url::Url;

use crate::{ErrorKind, Result, Scheme};

/// A normalized site domain, used to key site registries and to match
/// same-host references in content.
///
/// The key is the lower-cased `host[:port]` of the site, followed by its
/// path when the site lives below the web root. Schemes and trailing
/// slashes are dropped, so `http://Example.com/` and `example.com` are the
/// same site.
///
/// # Examples
///
/// ```
/// use dyncdn_lib::SiteKey;
/// use url::Url;
///
/// let url = Url::parse("http://localhost:9001/").unwrap();
/// let key = SiteKey::try_from(&url).unwrap();
/// assert_eq!(key.as_str(), "localhost:9001");
/// assert_eq!(key, SiteKey::from("HTTP://LOCALHOST:9001"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub struct SiteKey(String);

impl SiteKey {
    /// Get the site domain as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the site domain as an owned String
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// The `host[:port]` part of the key, without the site path
    #[must_use]
    pub fn authority(&self) -> &str {
        self.0.split_once('/').map_or(self.0.as_str(), |(authority, _)| authority)
    }

    fn normalize(input: &str) -> Self {
        let trimmed = input.trim();
        let rest = match Scheme::strip_prefix(trimmed) {
            Some((_, rest)) => rest,
            None => trimmed.strip_prefix("//").unwrap_or(trimmed),
        };
        SiteKey(rest.trim_end_matches('/').to_lowercase())
    }
}

impl TryFrom<&Url> for SiteKey {
    type Error = ErrorKind;

    fn try_from(url: &Url) -> Result<Self> {
        let host = url
            .host_str()
            .ok_or_else(|| ErrorKind::InvalidSiteUrl(url.to_string()))?;

        let host = host.to_lowercase();
        let path = url.path().trim_end_matches('/');
        Ok(SiteKey(match url.port() {
            Some(port) => format!("{host}:{port}{path}"),
            None => format!("{host}{path}"),
        }))
    }
}

impl TryFrom<Url> for SiteKey {
    type Error = ErrorKind;

    fn try_from(url: Url) -> Result<Self> {
        SiteKey::try_from(&url)
    }
}

impl fmt::Display for SiteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SiteKey {
    fn from(site: String) -> Self {
        SiteKey::normalize(&site)
    }
}

impl From<&String> for SiteKey {
    fn from(site: &String) -> Self {
        SiteKey::normalize(site)
    }
}

impl From<&str> for SiteKey {
    fn from(site: &str) -> Self {
        SiteKey::normalize(site)
    }
}

impl From<&SiteKey> for SiteKey {
    fn from(site: &SiteKey) -> Self {
        site.clone()
    }
}
