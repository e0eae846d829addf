use serde::Deserialize;
use std::fmt;
use strum::Display;
use typed_builder::TypedBuilder;

use crate::{CdnDomain, Extensions, Scheme, SiteKey};

/// Upload base path used when none is configured.
pub const DEFAULT_UPLOAD_BASE_PATH: &str = "/wp-content/uploads";

/// Which passes a rewrite runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum RewriteMode {
    /// Uploads pass followed by the generic assets pass
    #[default]
    All,
    /// Only references below the upload base path
    UploadsOnly,
}

/// Path below which uploaded media lives, e.g. `/wp-content/uploads`.
///
/// Normalized to start with `/` and to have no trailing `/`. A full upload
/// URL is accepted as well, only its path is kept. The web root itself is
/// the empty path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub struct UploadPath(String);

impl UploadPath {
    /// The normalized path
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if uploads live directly in the web root
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    fn normalize(input: &str) -> Self {
        let input = input.trim();
        let path = match input.split_once("://") {
            Some((_, rest)) => rest.find('/').map_or("", |i| &rest[i..]),
            None => input,
        };
        let path = path.trim_matches('/');
        if path.is_empty() {
            UploadPath(String::new())
        } else {
            UploadPath(format!("/{path}"))
        }
    }
}

impl Default for UploadPath {
    fn default() -> Self {
        UploadPath(DEFAULT_UPLOAD_BASE_PATH.to_string())
    }
}

impl From<&str> for UploadPath {
    fn from(path: &str) -> Self {
        UploadPath::normalize(path)
    }
}

impl From<String> for UploadPath {
    fn from(path: String) -> Self {
        UploadPath::normalize(&path)
    }
}

impl fmt::Display for UploadPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything a rewrite call needs to know about the current request.
///
/// A context is a plain value. Build one per request (or share one per
/// site when the TLS state never changes) and pass it to the
/// [`RewriteEngine`](crate::RewriteEngine) calls.
///
/// # Examples
///
/// ```
/// use dyncdn_lib::{Extensions, RewriteContext, Scheme};
///
/// let context = RewriteContext::builder()
///     .site_domain("http://localhost:9001")
///     .secure(true)
///     .extensions(Extensions::new(["jpg"]).unwrap())
///     .build();
///
/// assert_eq!(context.site_domain().as_str(), "localhost:9001");
/// assert_eq!(context.upload_base_path().as_str(), "/wp-content/uploads");
/// assert_eq!(context.force_scheme(), None::<Scheme>);
/// ```
#[derive(TypedBuilder, Debug, Clone, PartialEq, Eq)]
pub struct RewriteContext {
    /// Domain that same-host references in content use.
    ///
    /// Usually the registry's site domain. Hosts behind a domain alias set
    /// the alias here instead.
    #[builder(setter(into))]
    site_domain: SiteKey,
    /// Path below which uploaded media lives
    #[builder(default, setter(into))]
    upload_base_path: UploadPath,
    /// Whether the current request is served over TLS
    #[builder(default)]
    secure: bool,
    /// Scheme forced on every rewritten reference
    #[builder(default, setter(strip_option))]
    force_scheme: Option<Scheme>,
    /// Extensions eligible for rewriting
    #[builder(default)]
    extensions: Extensions,
}

impl RewriteContext {
    /// Context for `site_domain` with all other settings at their defaults
    #[must_use]
    pub fn new<S: Into<SiteKey>>(site_domain: S) -> Self {
        Self::builder().site_domain(site_domain).build()
    }

    /// Domain that same-host references in content use
    #[must_use]
    pub const fn site_domain(&self) -> &SiteKey {
        &self.site_domain
    }

    /// Path below which uploaded media lives
    #[must_use]
    pub const fn upload_base_path(&self) -> &UploadPath {
        &self.upload_base_path
    }

    /// Whether the current request is served over TLS
    #[must_use]
    pub const fn secure(&self) -> bool {
        self.secure
    }

    /// Scheme forced on every rewritten reference, if any
    #[must_use]
    pub const fn force_scheme(&self) -> Option<Scheme> {
        self.force_scheme
    }

    /// Extensions eligible for rewriting
    #[must_use]
    pub const fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Scheme for a reference rewritten to `domain`.
    ///
    /// A forced scheme wins, then the scheme configured on the domain, then
    /// the scheme of the current request.
    #[must_use]
    pub fn resolve_scheme(&self, domain: &CdnDomain) -> Scheme {
        self.force_scheme
            .or(domain.scheme())
            .unwrap_or(Scheme::for_request(self.secure))
    }
}
