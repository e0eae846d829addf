//! Asset reference patterns.
//!
//! A reference is a quoted token, optionally preceded by `=`, holding a
//! root-relative or same-host absolute URL that ends in an eligible
//! extension. Content that was escaped for a script string literal
//! (`\"\/wp-content\/uploads\/a.jpg\"`) is matched as well.
//!
//! The closing quote has to be the one that opened the token. Without
//! back-references this is expressed as one alternation branch per quote
//! style, each with its own set of named groups.

use log::debug;
use regex::{Captures, Match, Regex};
use strum::{EnumIter, IntoEnumIterator};

use super::RewriteContext;
use crate::{Context, ErrorKind, Result};

/// The quote styles an asset reference can be wrapped in.
///
/// Escaped variants come first so that `\"` is never read as a bare `"`
/// preceded by an unrelated backslash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub(crate) enum Quote {
    EscapedDouble,
    EscapedSingle,
    Double,
    Single,
}

impl Quote {
    /// The quote as it appears in content
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Quote::EscapedDouble => "\\\"",
            Quote::EscapedSingle => "\\'",
            Quote::Double => "\"",
            Quote::Single => "'",
        }
    }

    /// The quote character without its escape
    const fn bare(self) -> char {
        match self {
            Quote::EscapedDouble | Quote::Double => '"',
            Quote::EscapedSingle | Quote::Single => '\'',
        }
    }

    /// Prefix of this branch's group names
    const fn tag(self) -> &'static str {
        match self {
            Quote::EscapedDouble => "edq",
            Quote::EscapedSingle => "esq",
            Quote::Double => "dq",
            Quote::Single => "sq",
        }
    }

    /// Group `part` of this branch in `captures`
    pub(crate) fn group<'t>(self, captures: &Captures<'t>, part: &str) -> Option<Match<'t>> {
        captures.name(&format!("{}_{part}", self.tag()))
    }

    /// The branch that produced `captures`
    pub(crate) fn of(captures: &Captures<'_>) -> Option<Self> {
        Quote::iter().find(|quote| quote.group(captures, "sep").is_some())
    }
}

/// The compiled patterns of both rewrite passes for one context.
#[derive(Debug)]
pub(crate) struct AssetPatterns {
    uploads: Regex,
    assets: Regex,
}

impl AssetPatterns {
    /// Compile the patterns for `context`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidPattern`] if the combined pattern does not
    /// compile, e.g. because it exceeds the regex size limit.
    pub(crate) fn new(context: &RewriteContext) -> Result<Self> {
        debug!(
            "Compiling asset patterns for {} (uploads at `{}`, extensions `{}`)",
            context.site_domain(),
            context.upload_base_path(),
            context.extensions()
        );
        Ok(Self {
            uploads: compile(&build(context, Context::Uploads))?,
            assets: compile(&build(context, Context::Assets))?,
        })
    }

    /// The pattern of the pass for `context`
    pub(crate) const fn get(&self, context: Context) -> &Regex {
        match context {
            Context::Uploads => &self.uploads,
            Context::Assets => &self.assets,
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(ErrorKind::InvalidPattern)
}

fn build(context: &RewriteContext, pass: Context) -> String {
    let branches = Quote::iter()
        .map(|quote| branch(context, pass, quote))
        .collect::<Vec<_>>()
        .join("|");
    format!("(?P<eq>=)?(?:{branches})")
}

fn branch(context: &RewriteContext, pass: Context, quote: Quote) -> String {
    let t = quote.tag();
    let open = regex::escape(quote.as_str());
    let c = quote.bare();
    let authority = regex::escape(context.site_domain().authority());
    let extensions = context.extensions().alternation();

    let prefix = format!(r"(?P<{t}_prefix>(?:(?i:https?):)?(?://|\\/\\/)(?i:{authority}))?");
    let root = match pass {
        Context::Uploads => {
            let path = context.upload_base_path().as_str();
            if path.is_empty() {
                format!("(?P<{t}_root>)")
            } else {
                format!(
                    "(?P<{t}_root>{}|{})",
                    regex::escape(path),
                    regex::escape(&path.replace('/', "\\/"))
                )
            }
        }
        Context::Assets => format!("(?P<{t}_root>)"),
    };
    // A second slash would turn the rest into a foreign authority, and tag
    // delimiters mean the token ran past the end of its attribute.
    let path = format!(r"(?P<{t}_path>[^/\\{c}?<>\r\n][^{c}?<>\r\n]*)");

    format!(
        r"{open}{prefix}{root}(?P<{t}_sep>/|\\/){path}\.(?P<{t}_ext>{extensions})(?P<{t}_query>\?[^{c}<>\r\n]*)?{open}"
    )
}
