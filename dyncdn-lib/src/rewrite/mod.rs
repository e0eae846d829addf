//! Rewriting asset references in content to CDN hosts.
//!
//! [`RewriteEngine`] finds asset references in response bodies and moves
//! them to a domain from the site's [`DomainRegistry`] pools. It runs up to
//! two passes over the text:
//!
//! - The uploads pass rewrites references below the upload base path using
//!   the [`Context::Uploads`] pool
//! - The assets pass rewrites the remaining root-relative and same-host
//!   references using the [`Context::Assets`] pool
//!
//! Only the scheme and host of a reference change. The path, extension,
//! query string, quoting and slash escaping are kept byte for byte.

mod asset;
mod context;
mod pattern;
pub mod srcset;

use dashmap::DashMap;
use log::{debug, trace};
use regex::Captures;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use typed_builder::TypedBuilder;

use crate::registry::{DomainPool, DomainRegistry};
use crate::{CdnDomain, Context, Extensions, Result, Scheme, SiteKey};
use asset::MatchedAsset;
use pattern::AssetPatterns;
use srcset::SrcsetSource;

pub use context::{DEFAULT_UPLOAD_BASE_PATH, RewriteContext, RewriteMode, UploadPath};

/// Callback that gets the final say on the scheme of a rewritten reference.
///
/// It receives the scheme resolved from the [`RewriteContext`] and the
/// selected domain, and returns the scheme to use.
pub type SchemeResolver = Arc<dyn Fn(Scheme, &CdnDomain) -> Scheme + Send + Sync>;

/// Callback that can move single references to a domain of its choice.
///
/// It receives the reference as matched in content (or the URL passed to
/// [`RewriteEngine::rewrite_url`]), the pass it was found in and the domain
/// picked by checksum. Returning `None` keeps the picked domain.
pub type DomainSelector = Arc<dyn Fn(&str, Context, &CdnDomain) -> Option<CdnDomain> + Send + Sync>;

/// Number of compiled pattern sets kept before the cache is reset
const MAX_CACHED_PATTERNS: usize = 64;

/// Everything the compiled patterns depend on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PatternKey {
    site_domain: SiteKey,
    upload_base_path: UploadPath,
    extensions: Extensions,
}

impl From<&RewriteContext> for PatternKey {
    fn from(context: &RewriteContext) -> Self {
        Self {
            site_domain: context.site_domain().clone(),
            upload_base_path: context.upload_base_path().clone(),
            extensions: context.extensions().clone(),
        }
    }
}

/// Rewrites asset references in content to CDN domains.
///
/// An engine holds no per-request state. Create one at startup and share
/// it between requests; the per-request settings travel in a
/// [`RewriteContext`]. Compiled patterns are cached per site, upload base
/// path and extension set. Contexts are expected to come from configuration;
/// the cache is reset once it holds more than a few dozen pattern sets, so
/// contexts built from request data cost a recompile instead of memory.
///
/// # Examples
///
/// ```
/// use dyncdn_lib::{Context, DomainRegistry, Extensions, RewriteContext, RewriteEngine};
///
/// # fn main() -> Result<(), dyncdn_lib::ErrorKind> {
/// let registry = DomainRegistry::new("localhost:9001");
/// registry.add("cdn1.com", Context::Assets);
///
/// let context = RewriteContext::builder()
///     .site_domain("localhost:9001")
///     .secure(true)
///     .extensions(Extensions::new(["jpg"])?)
///     .build();
///
/// let engine = RewriteEngine::default();
/// let output = engine.rewrite_all(
///     r#"<img src="http://localhost:9001/puppy.jpg" />"#,
///     &registry,
///     &context,
/// )?;
/// assert_eq!(output, r#"<img src="https://cdn1.com/puppy.jpg" />"#);
/// # Ok(())
/// # }
/// ```
#[derive(TypedBuilder)]
#[builder(builder_method(doc = "
Create a builder for a `RewriteEngine`.

All settings are optional, `RewriteEngine::builder().build()` is the same as
`RewriteEngine::default()`.
"))]
pub struct RewriteEngine {
    /// Override for the scheme of rewritten references
    #[builder(default, setter(strip_option))]
    scheme_resolver: Option<SchemeResolver>,

    /// Override for the domain of single references
    #[builder(default, setter(strip_option))]
    domain_selector: Option<DomainSelector>,

    /// Compiled patterns, created on-demand
    #[builder(default, setter(skip))]
    patterns: DashMap<PatternKey, Arc<AssetPatterns>>,
}

impl Default for RewriteEngine {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for RewriteEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewriteEngine")
            .field("scheme_resolver", &self.scheme_resolver.is_some())
            .field("domain_selector", &self.domain_selector.is_some())
            .field("patterns", &self.patterns.len())
            .finish()
    }
}

impl RewriteEngine {
    /// Rewrite `text` with the passes selected by `mode`.
    ///
    /// # Errors
    ///
    /// Returns an error if the asset patterns for `context` cannot be
    /// compiled.
    pub fn rewrite<'t>(
        &self,
        text: &'t str,
        registry: &DomainRegistry,
        context: &RewriteContext,
        mode: RewriteMode,
    ) -> Result<Cow<'t, str>> {
        match mode {
            RewriteMode::All => self.rewrite_all(text, registry, context),
            RewriteMode::UploadsOnly => self.rewrite_uploads_only(text, registry, context),
        }
    }

    /// Rewrite the references below the upload base path.
    ///
    /// Returns the input unchanged if the uploads pool is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the asset patterns for `context` cannot be
    /// compiled.
    pub fn rewrite_uploads_only<'t>(
        &self,
        text: &'t str,
        registry: &DomainRegistry,
        context: &RewriteContext,
    ) -> Result<Cow<'t, str>> {
        self.run_pass(text, &registry.pool(Context::Uploads), context)
    }

    /// Run the uploads pass, then rewrite all remaining same-site references.
    ///
    /// References moved by the uploads pass point at a CDN host afterwards,
    /// so the assets pass does not touch them again.
    ///
    /// # Errors
    ///
    /// Returns an error if the asset patterns for `context` cannot be
    /// compiled.
    pub fn rewrite_all<'t>(
        &self,
        text: &'t str,
        registry: &DomainRegistry,
        context: &RewriteContext,
    ) -> Result<Cow<'t, str>> {
        let assets = registry.pool(Context::Assets);
        match self.rewrite_uploads_only(text, registry, context)? {
            Cow::Borrowed(text) => self.run_pass(text, &assets, context),
            Cow::Owned(text) => {
                let rewritten = match self.run_pass(&text, &assets, context)? {
                    Cow::Borrowed(_) => None,
                    Cow::Owned(rewritten) => Some(rewritten),
                };
                Ok(Cow::Owned(rewritten.unwrap_or(text)))
            }
        }
    }

    /// Rewrite a single URL.
    ///
    /// Absolute, protocol-relative and root-relative URLs on the site domain
    /// get a CDN authority, anything else is returned unchanged. The domain
    /// comes from the uploads pool, or from the assets pool if the uploads
    /// pool is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use dyncdn_lib::{Context, DomainRegistry, RewriteContext, RewriteEngine};
    ///
    /// let registry = DomainRegistry::new("test.com");
    /// registry.add("https://cdn1.com", Context::Uploads);
    ///
    /// let engine = RewriteEngine::default();
    /// let context = RewriteContext::new("test.com");
    /// assert_eq!(
    ///     engine.rewrite_url("http://test.com/image.png", &registry, &context),
    ///     "https://cdn1.com/image.png"
    /// );
    /// assert_eq!(
    ///     engine.rewrite_url("http://other.com/image.png", &registry, &context),
    ///     "http://other.com/image.png"
    /// );
    /// ```
    #[must_use]
    pub fn rewrite_url(&self, url: &str, registry: &DomainRegistry, context: &RewriteContext) -> String {
        match url_pool(registry) {
            Some(pool) => self.rewrite_url_with(url, &pool, context),
            None => url.to_string(),
        }
    }

    /// Rewrite the URLs of `srcset` candidates.
    ///
    /// Candidates keep their order and descriptors. Returns the input
    /// unchanged if both pools are empty.
    #[must_use]
    pub fn rewrite_srcset(
        &self,
        sources: Vec<SrcsetSource>,
        registry: &DomainRegistry,
        context: &RewriteContext,
    ) -> Vec<SrcsetSource> {
        let Some(pool) = url_pool(registry) else {
            return sources;
        };
        sources
            .into_iter()
            .map(|source| SrcsetSource {
                url: self.rewrite_url_with(&source.url, &pool, context),
                descriptor: source.descriptor,
            })
            .collect()
    }

    /// Rewrite a `srcset` attribute value.
    ///
    /// Values that do not parse, or that have no candidate to move, are
    /// returned unchanged.
    #[must_use]
    pub fn rewrite_srcset_attr<'a>(
        &self,
        srcset: &'a str,
        registry: &DomainRegistry,
        context: &RewriteContext,
    ) -> Cow<'a, str> {
        let sources = srcset::parse(srcset);
        if sources.is_empty() {
            return Cow::Borrowed(srcset);
        }
        let rewritten = self.rewrite_srcset(sources.clone(), registry, context);
        if rewritten == sources {
            return Cow::Borrowed(srcset);
        }
        Cow::Owned(srcset::render(&rewritten))
    }

    fn run_pass<'t>(
        &self,
        text: &'t str,
        pool: &DomainPool,
        context: &RewriteContext,
    ) -> Result<Cow<'t, str>> {
        if pool.is_empty() || context.extensions().is_empty() {
            return Ok(Cow::Borrowed(text));
        }

        let patterns = self.patterns(context)?;
        let pattern = patterns.get(pool.context());
        Ok(pattern.replace_all(text, |captures: &Captures<'_>| {
            MatchedAsset::from_captures(captures)
                .and_then(|asset| self.replace(&asset, pool, context))
                .unwrap_or_else(|| captures[0].to_string())
        }))
    }

    fn replace(&self, asset: &MatchedAsset<'_>, pool: &DomainPool, context: &RewriteContext) -> Option<String> {
        let domain = self.select_domain(asset.text, pool)?;
        let rewritten = asset.rewrite(self.resolve_scheme(&domain, context), &domain);
        trace!("Rewrote {} to {rewritten}", asset.text);
        Some(rewritten)
    }

    fn rewrite_url_with(&self, url: &str, pool: &DomainPool, context: &RewriteContext) -> String {
        let Some(rest) = strip_site(url, context.site_domain().authority()) else {
            return url.to_string();
        };
        let Some(domain) = self.select_domain(url, pool) else {
            return url.to_string();
        };
        let scheme = self.resolve_scheme(&domain, context);
        let rewritten = format!("{scheme}://{}{rest}", domain.host());
        trace!("Rewrote {url} to {rewritten}");
        rewritten
    }

    fn select_domain<'p>(&self, key: &str, pool: &'p DomainPool) -> Option<Cow<'p, CdnDomain>> {
        let domain = pool.select(key).ok()?;
        let selected = self
            .domain_selector
            .as_ref()
            .and_then(|select| select(key, pool.context(), domain));
        Some(selected.map_or(Cow::Borrowed(domain), Cow::Owned))
    }

    fn resolve_scheme(&self, domain: &CdnDomain, context: &RewriteContext) -> Scheme {
        let scheme = context.resolve_scheme(domain);
        self.scheme_resolver
            .as_ref()
            .map_or(scheme, |resolve| resolve(scheme, domain))
    }

    fn patterns(&self, context: &RewriteContext) -> Result<Arc<AssetPatterns>> {
        let key = PatternKey::from(context);
        if let Some(patterns) = self.patterns.get(&key) {
            return Ok(patterns.clone());
        }

        let patterns = Arc::new(AssetPatterns::new(context)?);
        if self.patterns.len() >= MAX_CACHED_PATTERNS {
            debug!("Pattern cache is full, dropping {} entries", self.patterns.len());
            self.patterns.clear();
        }
        Ok(self.patterns.entry(key).or_insert(patterns).clone())
    }
}

/// Pool used for single URLs: uploads if it has domains, otherwise assets
fn url_pool(registry: &DomainRegistry) -> Option<DomainPool> {
    [Context::Uploads, Context::Assets]
        .into_iter()
        .map(|context| registry.pool(context))
        .find(|pool| !pool.is_empty())
}

/// The part of `url` after the site authority, if `url` points at the site.
///
/// Root-relative URLs are returned as they are.
fn strip_site<'u>(url: &'u str, authority: &str) -> Option<&'u str> {
    let rest = match Scheme::strip_prefix(url) {
        Some((_, rest)) => rest,
        None => match url.strip_prefix("//") {
            Some(rest) => rest,
            None => return url.starts_with('/').then_some(url),
        },
    };

    let host = rest.get(..authority.len())?;
    if !host.eq_ignore_ascii_case(authority) {
        return None;
    }
    let rest = &rest[authority.len()..];
    (rest.is_empty() || rest.starts_with(['/', '?', '#'])).then_some(rest)
}
