use crate::{Context, DomainRegistry, Extensions, RewriteContext};

/// Helper method to create a registry with the same domains in every pool
pub(crate) fn registry(site: &str, domains: &[&str]) -> DomainRegistry {
    let registry = DomainRegistry::new(site);
    registry.extend(domains.iter().copied(), Context::Uploads);
    registry.extend(domains.iter().copied(), Context::Assets);
    registry
}

/// Helper method to create a rewrite context with the default upload base
/// path
///
/// # Panic
///
/// This panics if an extension pattern is invalid, so it should only be used
/// for testing
pub(crate) fn context(site: &str, secure: bool, extensions: &[&str]) -> RewriteContext {
    RewriteContext::builder()
        .site_domain(site)
        .secure(secure)
        .extensions(Extensions::new(extensions).expect("Expected valid extension patterns"))
        .build()
}
