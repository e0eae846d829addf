use serde::{Serialize, Serializer};
use std::hash::Hash;
use std::path::PathBuf;
use thiserror::Error;

use crate::Context;

/// Possible errors when interacting with `dyncdn_lib`
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A domain was requested from a pool that has no entries.
    ///
    /// The rewrite entry points never hit this, they check
    /// [`DomainRegistry::has_domains`](crate::DomainRegistry::has_domains)
    /// once per call. Seeing it means the registry API was used directly
    /// without that guard.
    #[error("No CDN domains registered for the `{0}` context")]
    EmptyPool(Context),
    /// The given string does not name a rewrite context
    #[error("Unknown rewrite context `{0}`, expected `uploads` or `assets`")]
    UnknownContext(String),
    /// The given string is neither `http` nor `https`
    #[error("Unknown scheme `{0}`, expected `http` or `https`")]
    UnknownScheme(String),
    /// An extension pattern could not be compiled as part of a regular expression
    #[error("Invalid extension pattern `{0}`: {1}")]
    InvalidExtension(String, #[source] regex::Error),
    /// The assembled asset pattern could not be compiled
    #[error("Cannot compile asset pattern: {0}")]
    InvalidPattern(#[source] regex::Error),
    /// The site URL has no host to match against
    #[error("Site URL `{0}` is missing a host")]
    InvalidSiteUrl(String),
    /// The configuration file could not be read
    #[error("Failed to read configuration file `{}`: {}", .0.display(), .1)]
    ConfigFile(PathBuf, #[source] std::io::Error),
    /// The configuration could not be parsed
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl PartialEq for ErrorKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::EmptyPool(c1), Self::EmptyPool(c2)) => c1 == c2,
            (Self::UnknownContext(s1), Self::UnknownContext(s2))
            | (Self::UnknownScheme(s1), Self::UnknownScheme(s2))
            | (Self::InvalidSiteUrl(s1), Self::InvalidSiteUrl(s2)) => s1 == s2,
            (Self::InvalidExtension(s1, e1), Self::InvalidExtension(s2, e2)) => {
                s1 == s2 && e1 == e2
            }
            (Self::InvalidPattern(e1), Self::InvalidPattern(e2)) => e1 == e2,
            (Self::ConfigFile(p1, e1), Self::ConfigFile(p2, e2)) => {
                p1 == p2 && e1.kind() == e2.kind()
            }
            (Self::ConfigParse(e1), Self::ConfigParse(e2)) => e1.to_string() == e2.to_string(),
            _ => false,
        }
    }
}

impl Eq for ErrorKind {}

impl Hash for ErrorKind {
    fn hash<H>(&self, state: &mut H)
    where
        H: std::hash::Hasher,
    {
        match self {
            Self::EmptyPool(c) => c.hash(state),
            Self::UnknownContext(s) | Self::UnknownScheme(s) | Self::InvalidSiteUrl(s) => {
                s.hash(state);
            }
            Self::InvalidExtension(s, e) => (s, e.to_string()).hash(state),
            Self::InvalidPattern(e) => e.to_string().hash(state),
            Self::ConfigFile(p, e) => (p, e.kind()).hash(state),
            Self::ConfigParse(e) => e.to_string().hash(state),
        }
    }
}

impl Serialize for ErrorKind {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl From<(PathBuf, std::io::Error)> for ErrorKind {
    fn from(value: (PathBuf, std::io::Error)) -> Self {
        Self::ConfigFile(value.0, value.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pool_message() {
        let err = ErrorKind::EmptyPool(Context::Uploads);
        assert_eq!(
            err.to_string(),
            "No CDN domains registered for the `uploads` context"
        );
    }

    #[test]
    fn test_config_file_message() {
        let err = ErrorKind::ConfigFile(
            PathBuf::from("dyncdn.toml"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert_eq!(
            err.to_string(),
            "Failed to read configuration file `dyncdn.toml`: not found"
        );
    }

    #[test]
    fn test_serialize_as_message() {
        let err = ErrorKind::UnknownContext("media".into());
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(
            json,
            r#""Unknown rewrite context `media`, expected `uploads` or `assets`""#
        );
    }

    #[test]
    fn test_equality_ignores_io_message() {
        let path = PathBuf::from("dyncdn.toml");
        let a = ErrorKind::from((
            path.clone(),
            std::io::Error::new(std::io::ErrorKind::NotFound, "a"),
        ));
        let b = ErrorKind::from((path, std::io::Error::new(std::io::ErrorKind::NotFound, "b")));
        assert_eq!(a, b);
        assert_ne!(a, ErrorKind::UnknownScheme("ftp".into()));
    }
}
