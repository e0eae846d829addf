use log::debug;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::checksum::pool_index;
use crate::{CdnDomain, Context, ErrorKind, Result, SiteKey};

/// A deduplicated, insertion-ordered list of CDN domains for one context.
///
/// Pools handed out by [`DomainRegistry::pool`] are snapshots: later calls
/// to [`DomainRegistry::add`] do not change them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainPool {
    context: Context,
    domains: Vec<CdnDomain>,
}

impl DomainPool {
    /// Create an empty pool for the given context
    #[must_use]
    pub const fn new(context: Context) -> Self {
        Self {
            context,
            domains: Vec::new(),
        }
    }

    /// The context this pool serves
    #[must_use]
    pub const fn context(&self) -> Context {
        self.context
    }

    /// Pick the domain for `key`.
    ///
    /// The same key always selects the same domain for a given pool.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::EmptyPool`] if the pool has no entries.
    pub fn select(&self, key: &str) -> Result<&CdnDomain> {
        if self.domains.is_empty() {
            return Err(ErrorKind::EmptyPool(self.context));
        }
        Ok(&self.domains[pool_index(key, self.domains.len())])
    }

    /// Returns `true` if the pool has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Number of domains in the pool
    #[must_use]
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    /// Iterate over the domains in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &CdnDomain> {
        self.domains.iter()
    }

    fn insert(&mut self, domain: CdnDomain) -> bool {
        if self.domains.contains(&domain) {
            return false;
        }
        self.domains.push(domain);
        true
    }
}

/// The CDN domain pools of one site.
///
/// Pools are filled with [`DomainRegistry::add`] during configuration and
/// read by every rewrite afterwards. Entries are never removed, so a pool
/// that has domains keeps them for the lifetime of the registry.
///
/// # Examples
///
/// ```
/// use dyncdn_lib::{Context, DomainRegistry};
///
/// let registry = DomainRegistry::new("test.com");
/// assert!(registry.add("https://cdn1.test.com", Context::Uploads));
/// assert!(!registry.add("https://cdn1.test.com", Context::Uploads));
///
/// let first = registry.select_domain("image.jpg", Context::Uploads).unwrap();
/// let second = registry.select_domain("image.jpg", Context::Uploads).unwrap();
/// assert_eq!(first, second);
/// ```
#[derive(Debug)]
pub struct DomainRegistry {
    site_domain: SiteKey,
    pools: RwLock<HashMap<Context, DomainPool>>,
}

impl DomainRegistry {
    /// Create a registry with empty pools for the given site.
    ///
    /// Most hosts go through [`SiteRegistries::get`](crate::SiteRegistries::get)
    /// instead, which hands out one shared registry per site.
    #[must_use]
    pub fn new<S: Into<SiteKey>>(site_domain: S) -> Self {
        let site_domain = site_domain.into();
        debug!("Creating domain registry for {site_domain}");
        Self {
            site_domain,
            pools: RwLock::new(HashMap::new()),
        }
    }

    /// The site this registry belongs to
    #[must_use]
    pub const fn site_domain(&self) -> &SiteKey {
        &self.site_domain
    }

    /// Add a CDN domain to the pool of `context`.
    ///
    /// Returns `true` if the domain was added and `false` if the pool
    /// already contained it. No further validation of the domain happens
    /// here.
    pub fn add<D: Into<CdnDomain>>(&self, domain: D, context: Context) -> bool {
        let mut pools = self.pools.write().unwrap_or_else(PoisonError::into_inner);
        pools
            .entry(context)
            .or_insert_with(|| DomainPool::new(context))
            .insert(domain.into())
    }

    /// Add several domains to the pool of `context`, returning how many of
    /// them were new.
    pub fn extend<I, D>(&self, domains: I, context: Context) -> usize
    where
        I: IntoIterator<Item = D>,
        D: Into<CdnDomain>,
    {
        domains
            .into_iter()
            .map(|domain| usize::from(self.add(domain, context)))
            .sum()
    }

    /// Select the CDN domain for an asset.
    ///
    /// The domain is picked by checksum of `asset_path`, so the same path
    /// always maps to the same domain while the pool is unchanged. This keeps
    /// browsers reusing connections to one host per asset.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::EmptyPool`] if no domain was added for `context`.
    pub fn select_domain(&self, asset_path: &str, context: Context) -> Result<CdnDomain> {
        let pools = self.pools.read().unwrap_or_else(PoisonError::into_inner);
        match pools.get(&context) {
            Some(pool) => pool.select(asset_path).cloned(),
            None => Err(ErrorKind::EmptyPool(context)),
        }
    }

    /// Whether the pool of `context` has at least one domain
    #[must_use]
    pub fn has_domains(&self, context: Context) -> bool {
        let pools = self.pools.read().unwrap_or_else(PoisonError::into_inner);
        pools.get(&context).is_some_and(|pool| !pool.is_empty())
    }

    /// Snapshot of the pool of `context`
    #[must_use]
    pub fn pool(&self, context: Context) -> DomainPool {
        let pools = self.pools.read().unwrap_or_else(PoisonError::into_inner);
        pools
            .get(&context)
            .cloned()
            .unwrap_or_else(|| DomainPool::new(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn registry_with(domains: &[&str], context: Context) -> DomainRegistry {
        let registry = DomainRegistry::new("http://test.com");
        registry.extend(domains.iter().copied(), context);
        registry
    }

    #[test]
    fn test_adds_domains() {
        let registry = DomainRegistry::new("http://test.com");

        assert!(registry.add("http://cdn1.com", Context::Uploads));
        assert!(registry.add("http://cdn2.com", Context::Uploads));
        assert!(!registry.add("http://cdn1.com", Context::Uploads));
        assert_eq!(registry.pool(Context::Uploads).len(), 2);
    }

    #[test]
    fn test_pools_are_separate() {
        let registry = DomainRegistry::new("test.com");
        assert!(registry.add("cdn1.com", Context::Uploads));
        assert!(registry.add("cdn1.com", Context::Assets));

        assert!(registry.has_domains(Context::Uploads));
        assert!(registry.has_domains(Context::Assets));
        assert_eq!(registry.pool(Context::Assets).len(), 1);
    }

    #[test]
    fn test_extend_counts_new_domains() {
        let registry = DomainRegistry::new("test.com");
        assert_eq!(registry.extend(["cdn1.com", "cdn2.com"], Context::Assets), 2);
        assert_eq!(registry.extend(["cdn2.com", "cdn3.com"], Context::Assets), 1);
        assert_eq!(
            registry
                .pool(Context::Assets)
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
            vec!["cdn1.com", "cdn2.com", "cdn3.com"]
        );
    }

    #[test]
    fn test_cdn_domain_selection() {
        let registry = registry_with(
            &["http://cdn1.com", "http://cdn2.com", "http://cdn3.com"],
            Context::Uploads,
        );

        let first = registry.select_domain("file1.jpg", Context::Uploads).unwrap();
        assert_eq!(
            first,
            registry.select_domain("file1.jpg", Context::Uploads).unwrap()
        );
        assert_ne!(
            first,
            registry.select_domain("file2.jpg", Context::Uploads).unwrap()
        );

        // CRC-32 of the path modulo the pool size
        assert_eq!(first, CdnDomain::from("http://cdn1.com"));
        assert_eq!(
            registry.select_domain("file2.jpg", Context::Uploads).unwrap(),
            CdnDomain::from("http://cdn3.com")
        );
    }

    #[test]
    fn test_empty_pool() {
        let registry = registry_with(&["cdn1.com"], Context::Assets);

        assert!(!registry.has_domains(Context::Uploads));
        assert_eq!(
            registry.select_domain("file1.jpg", Context::Uploads),
            Err(ErrorKind::EmptyPool(Context::Uploads))
        );
        assert_eq!(
            registry.pool(Context::Uploads).select("file1.jpg"),
            Err(ErrorKind::EmptyPool(Context::Uploads))
        );
    }

    #[test]
    fn test_has_domains() {
        let registry = DomainRegistry::new("http://test.com");
        assert!(!registry.has_domains(Context::Uploads));

        registry.add("https://cdn1.com", Context::Uploads);
        assert!(registry.has_domains(Context::Uploads));
    }

    #[test]
    fn test_pool_is_a_snapshot() {
        let registry = registry_with(&["cdn1.com"], Context::Uploads);
        let pool = registry.pool(Context::Uploads);
        registry.add("cdn2.com", Context::Uploads);

        assert_eq!(pool.len(), 1);
        assert_eq!(registry.pool(Context::Uploads).len(), 2);
    }
}
