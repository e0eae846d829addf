//! Site configuration loaded at startup.
//!
//! A host describes each site in a small TOML document and turns it into
//! filled registry pools and a [`RewriteContext`]:
//!
//! ```toml
//! site_url = "http://localhost:9001"
//! domains = "cdn1.example.com, cdn2.example.com"
//! extensions = ["jpe?g", "png", "css"]
//! ```
//!
//! Every key except `site_url` is optional.

use log::info;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use strum::IntoEnumIterator;
use url::Url;

use crate::registry::{DomainRegistry, SiteRegistries};
use crate::{
    CdnDomain, Context, ErrorKind, Extensions, Result, RewriteContext, RewriteMode, Scheme,
    SiteKey, UploadPath,
};

/// Callback that decides the final contents of a pool while configuration
/// is applied.
///
/// It receives the configured domains of a context and returns the domains
/// to add, e.g. to filter entries or append environment-specific hosts.
pub type DomainProvider = Arc<dyn Fn(Context, Vec<CdnDomain>) -> Vec<CdnDomain> + Send + Sync>;

/// A list of CDN domains, written either as a TOML array or as a single
/// comma-delimited string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "DomainListRepr")]
pub struct DomainList(Vec<CdnDomain>);

#[derive(Deserialize)]
#[serde(untagged)]
enum DomainListRepr {
    Delimited(String),
    List(Vec<String>),
}

impl From<DomainListRepr> for DomainList {
    fn from(repr: DomainListRepr) -> Self {
        match repr {
            DomainListRepr::Delimited(domains) => domains.split(',').collect(),
            DomainListRepr::List(domains) => domains.iter().map(String::as_str).collect(),
        }
    }
}

impl<'a> FromIterator<&'a str> for DomainList {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        DomainList(
            iter.into_iter()
                .map(str::trim)
                .filter(|domain| !domain.is_empty())
                .map(CdnDomain::from)
                .collect(),
        )
    }
}

impl DomainList {
    /// The domains in configuration order
    #[must_use]
    pub fn as_slice(&self) -> &[CdnDomain] {
        &self.0
    }
}

/// Configuration of one site.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Root URL of the site, e.g. `http://localhost:9001`
    pub site_url: Url,

    /// Domain matched in content instead of the site URL's host
    #[serde(default)]
    pub site_alias: Option<SiteKey>,

    /// Path or URL of the uploads root
    #[serde(default)]
    pub upload_base_path: UploadPath,

    /// CDN domains of both pools
    #[serde(default)]
    pub domains: DomainList,

    /// CDN domains of the uploads pool, replacing `domains` for it
    #[serde(default)]
    pub uploads_domains: Option<DomainList>,

    /// CDN domains of the assets pool, replacing `domains` for it
    #[serde(default)]
    pub assets_domains: Option<DomainList>,

    /// Extension patterns eligible for rewriting
    #[serde(default)]
    pub extensions: Extensions,

    /// Only rewrite references below the upload base path
    #[serde(default)]
    pub uploads_only: bool,

    /// Scheme used for every rewritten reference
    #[serde(default)]
    pub force_scheme: Option<Scheme>,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid
    /// configuration.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let contents =
            fs::read_to_string(path).map_err(|e| ErrorKind::ConfigFile(path.to_path_buf(), e))?;
        contents.parse()
    }

    /// The configured domains of the pool for `context`
    #[must_use]
    pub fn domains_for(&self, context: Context) -> &[CdnDomain] {
        let pool = match context {
            Context::Uploads => self.uploads_domains.as_ref(),
            Context::Assets => self.assets_domains.as_ref(),
        };
        pool.unwrap_or(&self.domains).as_slice()
    }

    /// Fill the pools of this site's registry and return the registry.
    ///
    /// Domains of each context go through `provider` first, if one is
    /// given. Domains already in a pool are skipped, so applying the same
    /// configuration twice is harmless.
    ///
    /// # Errors
    ///
    /// Returns an error if the site URL has no host.
    pub fn populate(
        &self,
        sites: &SiteRegistries,
        provider: Option<&DomainProvider>,
    ) -> Result<Arc<DomainRegistry>> {
        let registry = sites.current(&self.site_url)?;

        for context in Context::iter() {
            let mut domains = self.domains_for(context).to_vec();
            if let Some(provider) = provider {
                domains = provider(context, domains);
            }
            let added = registry.extend(domains, context);
            info!(
                "Added {added} CDN domain(s) to the {context} pool of {}",
                registry.site_domain()
            );
        }

        Ok(registry)
    }

    /// The rewrite context for a request.
    ///
    /// # Errors
    ///
    /// Returns an error if no alias is set and the site URL has no host.
    pub fn context(&self, secure: bool) -> Result<RewriteContext> {
        let site_domain = match &self.site_alias {
            Some(alias) => alias.clone(),
            None => SiteKey::try_from(&self.site_url)?,
        };

        let builder = RewriteContext::builder()
            .site_domain(site_domain)
            .upload_base_path(self.upload_base_path.clone())
            .secure(secure)
            .extensions(self.extensions.clone());
        Ok(match self.force_scheme {
            Some(scheme) => builder.force_scheme(scheme).build(),
            None => builder.build(),
        })
    }

    /// The passes to run on content
    #[must_use]
    pub const fn mode(&self) -> RewriteMode {
        if self.uploads_only {
            RewriteMode::UploadsOnly
        } else {
            RewriteMode::All
        }
    }
}

impl FromStr for Config {
    type Err = ErrorKind;

    fn from_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}
