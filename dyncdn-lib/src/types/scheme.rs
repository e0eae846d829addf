use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::ErrorKind;

/// URL scheme of a rewritten asset reference
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase", try_from = "String")]
#[strum(serialize_all = "lowercase")]
pub enum Scheme {
    /// Plain `http`
    #[default]
    Http,
    /// `https`, also chosen for every request served over TLS
    Https,
}

impl Scheme {
    /// The scheme matching the transport of the current request
    #[must_use]
    pub const fn for_request(secure: bool) -> Self {
        if secure { Scheme::Https } else { Scheme::Http }
    }

    /// Split a leading `http://` or `https://` off `input`.
    ///
    /// Matching is case-insensitive. Returns the scheme together with the
    /// remainder after `://`, or `None` if `input` has no such prefix.
    #[must_use]
    pub fn strip_prefix(input: &str) -> Option<(Scheme, &str)> {
        Scheme::iter().find_map(|scheme| {
            let name = scheme.to_string();
            let candidate = input.get(..name.len())?;
            let rest = input[name.len()..].strip_prefix("://")?;
            candidate
                .eq_ignore_ascii_case(&name)
                .then_some((scheme, rest))
        })
    }
}

impl FromStr for Scheme {
    type Err = ErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().trim_end_matches(':');
        Scheme::iter()
            .find(|scheme| scheme.to_string().eq_ignore_ascii_case(name))
            .ok_or_else(|| ErrorKind::UnknownScheme(s.to_string()))
    }
}

impl TryFrom<String> for Scheme {
    type Error = ErrorKind;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://cdn1.com", Some((Scheme::Https, "cdn1.com")))]
    #[case("http://cdn1.com/", Some((Scheme::Http, "cdn1.com/")))]
    #[case("HTTPS://cdn1.com", Some((Scheme::Https, "cdn1.com")))]
    #[case("//cdn1.com", None)]
    #[case("cdn1.com", None)]
    #[case("ftp://cdn1.com", None)]
    #[case("http", None)]
    fn test_strip_prefix(#[case] input: &str, #[case] expected: Option<(Scheme, &str)>) {
        assert_eq!(Scheme::strip_prefix(input), expected);
    }

    #[test]
    fn test_for_request() {
        assert_eq!(Scheme::for_request(true), Scheme::Https);
        assert_eq!(Scheme::for_request(false), Scheme::Http);
    }

    #[test]
    fn test_parse_scheme() {
        assert_eq!("HTTPS".parse::<Scheme>(), Ok(Scheme::Https));
        assert_eq!("http:".parse::<Scheme>(), Ok(Scheme::Http));
        assert_eq!(
            "gopher".parse::<Scheme>(),
            Err(ErrorKind::UnknownScheme("gopher".into()))
        );
    }
}
