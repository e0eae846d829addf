use regex::Captures;

use super::pattern::Quote;
use crate::{CdnDomain, Scheme};

/// One asset reference found in content, split into the parts that are
/// kept when it is moved to a CDN host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MatchedAsset<'t> {
    /// The whole match, used as the domain selection key
    pub(crate) text: &'t str,
    equals: bool,
    quote: Quote,
    root: &'t str,
    separator: &'t str,
    path: &'t str,
    extension: &'t str,
    query: &'t str,
}

impl<'t> MatchedAsset<'t> {
    /// Split a match of the asset patterns.
    ///
    /// Returns `None` for matches with an empty path, which are left alone.
    pub(crate) fn from_captures(captures: &Captures<'t>) -> Option<Self> {
        let text = captures.get(0)?.as_str();
        let quote = Quote::of(captures)?;
        let part = |name: &str| -> &'t str { quote.group(captures, name).map_or("", |m| m.as_str()) };

        let path = part("path");
        if path.is_empty() {
            return None;
        }

        Some(Self {
            text,
            equals: captures.name("eq").is_some(),
            quote,
            root: part("root"),
            separator: part("sep"),
            path,
            extension: part("ext"),
            query: part("query"),
        })
    }

    /// Whether the reference sits in content escaped for a script string,
    /// where every `/` is written as `\/`
    pub(crate) fn escaped_slashes(&self) -> bool {
        self.separator == "\\/"
    }

    /// The reference pointing at `domain` over `scheme`.
    ///
    /// Everything after the host is kept as written, including the upload
    /// base path and the query string.
    pub(crate) fn rewrite(&self, scheme: Scheme, domain: &CdnDomain) -> String {
        let (slashes, host) = if self.escaped_slashes() {
            ("\\/\\/", domain.host().replace('/', "\\/"))
        } else {
            ("//", domain.host().to_string())
        };

        format!(
            "{equals}{quote}{scheme}:{slashes}{host}{root}{separator}{path}.{extension}{query}{quote}",
            equals = if self.equals { "=" } else { "" },
            quote = self.quote.as_str(),
            root = self.root,
            separator = self.separator,
            path = self.path,
            extension = self.extension,
            query = self.query,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::pattern::AssetPatterns;
    use crate::{Context, Extensions, RewriteContext};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn rewrite_first(input: &str, pass: Context, domain: &str) -> Option<String> {
        let context = RewriteContext::builder()
            .site_domain("localhost")
            .extensions(Extensions::new(["jpg", "png"]).unwrap())
            .build();
        let patterns = AssetPatterns::new(&context).unwrap();
        let captures = patterns.get(pass).captures(input)?;
        let asset = MatchedAsset::from_captures(&captures)?;
        Some(asset.rewrite(Scheme::Https, &CdnDomain::from(domain)))
    }

    #[rstest]
    #[case(r#"="/puppy.jpg""#, r#"="https://cdn1.com/puppy.jpg""#)]
    #[case(r#"='http://localhost/a/b.png?v=2'"#, r#"='https://cdn1.com/a/b.png?v=2'"#)]
    #[case(r#""//localhost/puppy.jpg""#, r#""https://cdn1.com/puppy.jpg""#)]
    #[case(r#"=\"\/puppy.jpg\""#, r#"=\"https:\/\/cdn1.com\/puppy.jpg\""#)]
    #[case(r#"=\'\/a\/b.jpg?\'"#, r#"=\'https:\/\/cdn1.com\/a\/b.jpg?\'"#)]
    fn test_rewrite_assets(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(
            rewrite_first(input, Context::Assets, "cdn1.com").as_deref(),
            Some(expected)
        );
    }

    #[rstest]
    #[case(
        r#"="http://localhost/wp-content/uploads/2016/06/puppy.jpg""#,
        r#"="https://cdn1.com/wp-content/uploads/2016/06/puppy.jpg""#
    )]
    #[case(
        r#"=\"\/wp-content\/uploads\/2016\/06\/puppy-2.jpg\""#,
        r#"=\"https:\/\/cdn1.com\/wp-content\/uploads\/2016\/06\/puppy-2.jpg\""#
    )]
    fn test_rewrite_uploads(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(
            rewrite_first(input, Context::Uploads, "cdn1.com").as_deref(),
            Some(expected)
        );
    }

    #[test]
    fn test_escapes_cdn_path_prefix() {
        assert_eq!(
            rewrite_first(r#"=\"\/puppy.jpg\""#, Context::Assets, "https://cdn1.com/static")
                .as_deref(),
            Some(r#"=\"https:\/\/cdn1.com\/static\/puppy.jpg\""#)
        );
    }

    #[test]
    fn test_keeps_cdn_port() {
        assert_eq!(
            rewrite_first(r#"="/puppy.jpg""#, Context::Assets, "cdn1.com:8080").as_deref(),
            Some(r#"="https://cdn1.com:8080/puppy.jpg""#)
        );
    }
}
