use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::{Arc, PoisonError, RwLock};
use url::Url;

use crate::registry::DomainRegistry;
use crate::{Result, SiteKey};

/// Owns one [`DomainRegistry`] per site domain.
///
/// The host creates a `SiteRegistries` during startup and passes it (or the
/// registries it hands out) to the rewrite calls. Registries are created
/// lazily on first lookup and live as long as this collection.
///
/// # Architecture
///
/// - Each distinct [`SiteKey`] gets exactly one registry, also when several
///   threads look up a new site at the same time
/// - Lookups hand out `Arc`s, so callers may compare registries with
///   [`Arc::ptr_eq`]
/// - The most recently created registry is remembered for hosts that only
///   ever serve a single site
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use dyncdn_lib::SiteRegistries;
///
/// let sites = SiteRegistries::new();
/// let first = sites.get("http://test.com");
/// let second = sites.get("test.com");
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
#[derive(Debug, Default)]
pub struct SiteRegistries {
    /// Map of site domain to registry, created on-demand
    registries: DashMap<SiteKey, Arc<DomainRegistry>>,

    /// Most recently created registry
    last: RwLock<Option<Arc<DomainRegistry>>>,
}

impl SiteRegistries {
    /// Create an empty collection
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the registry for `site`, creating it on first use
    pub fn get<S: Into<SiteKey>>(&self, site: S) -> Arc<DomainRegistry> {
        let key = site.into();

        if let Some(registry) = self.registries.get(&key) {
            return registry.clone();
        }

        // Handle the race where another thread created it in the meantime
        match self.registries.entry(key) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let registry = Arc::new(DomainRegistry::new(entry.key().clone()));
                *self.last.write().unwrap_or_else(PoisonError::into_inner) =
                    Some(registry.clone());
                entry.insert(registry).clone()
            }
        }
    }

    /// Get the registry for the host's canonical site URL
    ///
    /// # Errors
    ///
    /// Returns an error if `site_url` has no host.
    pub fn current(&self, site_url: &Url) -> Result<Arc<DomainRegistry>> {
        Ok(self.get(SiteKey::try_from(site_url)?))
    }

    /// The most recently created registry.
    ///
    /// Only meaningful for hosts that serve a single site. With several
    /// sites this is whichever site was seen for the first time
    /// most recently.
    #[must_use]
    pub fn last(&self) -> Option<Arc<DomainRegistry>> {
        self.last
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of registries created so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.registries.len()
    }

    /// Returns `true` if no registry was created yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Context;
    use std::thread;

    #[test]
    fn test_same_site_same_instance() {
        let sites = SiteRegistries::new();
        let first = sites.get("http://test.com");
        let second = sites.get("http://test2.com");
        let third = sites.get("http://test2.com");

        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&second, &third));
        assert_eq!(sites.len(), 2);
    }

    #[test]
    fn test_current_matches_keyed_lookup() {
        let sites = SiteRegistries::new();
        let url = Url::parse("http://test.com").unwrap();

        let current = sites.current(&url).unwrap();
        let regular = sites.get("http://test.com");
        assert!(Arc::ptr_eq(&current, &regular));
    }

    #[test]
    fn test_last_tracks_creation() {
        let sites = SiteRegistries::new();
        assert!(sites.is_empty());
        assert!(sites.last().is_none());

        let first = sites.get("test.com");
        let second = sites.get("test2.com");
        // Looking up an existing site does not move the pointer
        sites.get("test.com");

        let last = sites.last().unwrap();
        assert!(Arc::ptr_eq(&last, &second));
        assert!(!Arc::ptr_eq(&last, &first));
    }

    #[test]
    fn test_registries_share_pools() {
        let sites = SiteRegistries::new();
        sites.get("test.com").add("cdn1.com", Context::Uploads);

        assert!(sites.get("TEST.com").has_domains(Context::Uploads));
        assert!(!sites.get("other.com").has_domains(Context::Uploads));
    }

    #[test]
    fn test_concurrent_first_access() {
        let sites = Arc::new(SiteRegistries::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sites = Arc::clone(&sites);
                thread::spawn(move || sites.get("localhost:9001"))
            })
            .collect();
        let registries: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();

        assert_eq!(sites.len(), 1);
        assert!(registries.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
