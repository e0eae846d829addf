use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, IntoEnumIterator, VariantNames};

use crate::ErrorKind;

/// The purpose a CDN domain pool serves.
///
/// Each site registry keeps one pool per context, so uploaded media and
/// theme assets can be spread over different sets of hosts.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumIter,
    VariantNames,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase", try_from = "String")]
#[strum(serialize_all = "lowercase")]
pub enum Context {
    /// Media library files living under the upload base path
    Uploads,
    /// Everything else served from the site root (themes, scripts, styles)
    Assets,
}

impl FromStr for Context {
    type Err = ErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        Context::iter()
            .find(|context| context.to_string().eq_ignore_ascii_case(key))
            .ok_or_else(|| ErrorKind::UnknownContext(key.to_string()))
    }
}

impl TryFrom<String> for Context {
    type Error = ErrorKind;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
