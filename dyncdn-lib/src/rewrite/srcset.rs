//! Image candidates of a `srcset` attribute.
//!
//! A `srcset` is a comma-separated list of image candidate strings. Each
//! candidate is a URL, optionally followed by whitespace and a descriptor
//! such as `320w` or `2x`.
//!
//! URLs may contain unencoded commas (`/img/format=webp,width=640/a.jpg`),
//! so a comma only ends a candidate when it follows the URL directly or
//! terminates the descriptor. Descriptors may contain parenthesized parts
//! whose commas are skipped.

use log::info;
use serde::{Deserialize, Serialize};

/// One image candidate of a `srcset` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrcsetSource {
    /// Image URL
    pub url: String,
    /// Condition descriptor, kept verbatim. Empty if the candidate has none.
    #[serde(default)]
    pub descriptor: String,
}

impl SrcsetSource {
    /// Create a candidate from its URL and descriptor
    pub fn new<U: Into<String>, D: Into<String>>(url: U, descriptor: D) -> Self {
        Self {
            url: url.into(),
            descriptor: descriptor.into(),
        }
    }
}

enum State {
    InsideDescriptor,
    InsideParens,
}

/// Split an input string at the first character for which
/// the predicate returns false.
fn split_at<F>(input: &str, predicate: F) -> (&str, &str)
where
    F: Fn(&char) -> bool,
{
    input
        .char_indices()
        .find(|(_, ch)| !predicate(ch))
        .map_or((input, ""), |(i, _)| input.split_at(i))
}

/// Split off a descriptor, returning it together with the input after the
/// comma that ends it.
fn split_descriptor(input: &str) -> (&str, &str) {
    let mut state = State::InsideDescriptor;

    for (i, c) in input.char_indices() {
        match state {
            State::InsideDescriptor => match c {
                '(' => state = State::InsideParens,
                ',' => return (&input[..i], &input[i + 1..]),
                _ => {}
            },
            State::InsideParens => {
                if c == ')' {
                    state = State::InsideDescriptor;
                }
            }
        }
    }

    (input, "")
}

/// Parse a `srcset` attribute value.
///
/// Malformed values (stray or repeated commas) yield no candidates at all,
/// so callers leave such attributes untouched.
#[must_use]
pub fn parse(input: &str) -> Vec<SrcsetSource> {
    let mut sources = Vec::new();
    let mut rest = input;

    loop {
        let (separator, remaining) = split_at(rest, |c| *c == ',' || c.is_whitespace());
        if separator.contains(',') {
            info!("srcset parse error (empty candidate)");
            return vec![];
        }
        if remaining.is_empty() {
            return sources;
        }

        let (url, remaining) = split_at(remaining, |c| !c.is_whitespace());
        let trimmed = url.trim_end_matches(',');
        match url.len() - trimmed.len() {
            0 => {}
            1 => {
                sources.push(SrcsetSource::new(trimmed, ""));
                rest = remaining;
                continue;
            }
            _ => {
                info!("srcset parse error (trailing commas)");
                return vec![];
            }
        }

        let (_, remaining) = split_at(remaining, |c| c.is_whitespace());
        let (descriptor, remaining) = split_descriptor(remaining);
        sources.push(SrcsetSource::new(url, descriptor.trim()));
        rest = remaining;
    }
}

/// Render candidates back into a `srcset` attribute value
#[must_use]
pub fn render(sources: &[SrcsetSource]) -> String {
    sources
        .iter()
        .map(|source| {
            if source.descriptor.is_empty() {
                source.url.clone()
            } else {
                format!("{} {}", source.url, source.descriptor)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
