//! `dyncdn` rewrites asset URLs in outbound HTML so they point at a pool of
//! CDN domains instead of the origin site.
//!
//! Each asset is pinned to one domain of the pool by a checksum of its
//! reference, so browsers keep reusing the same connections while the
//! load is still spread over all domains.
//!
//! ```
//! use dyncdn_lib::{Context, Extensions, Result, RewriteContext, RewriteEngine, SiteRegistries};
//!
//! fn main() -> Result<()> {
//!   let sites = SiteRegistries::new();
//!   let registry = sites.get("localhost:9001");
//!   registry.add("cdn1.com", Context::Uploads);
//!   registry.add("cdn1.com", Context::Assets);
//!
//!   let context = RewriteContext::builder()
//!       .site_domain("localhost:9001")
//!       .secure(true)
//!       .extensions(Extensions::new(["jpg"])?)
//!       .build();
//!
//!   let html = r#"<img src="http://localhost:9001/puppy.jpg" />"#;
//!   let output = RewriteEngine::default().rewrite_all(html, &registry, &context)?;
//!   assert_eq!(output, r#"<img src="https://cdn1.com/puppy.jpg" />"#);
//!   Ok(())
//! }
//! ```
//!
//! Hosts that keep their settings in a file can load a [`Config`] instead,
//! which fills the pools and builds the [`RewriteContext`]:
//!
//! ```
//! use dyncdn_lib::{Config, RewriteEngine, Result, SiteRegistries};
//!
//! fn main() -> Result<()> {
//!   let config: Config = r#"
//!       site_url = "http://localhost"
//!       domains = "cdn1.com, cdn2.com"
//!   "#.parse()?;
//!
//!   let sites = SiteRegistries::new();
//!   let registry = config.populate(&sites, None)?;
//!   let context = config.context(false)?;
//!
//!   let output = RewriteEngine::default().rewrite(
//!       r#"<link href="/style.css">"#,
//!       &registry,
//!       &context,
//!       config.mode(),
//!   )?;
//!   assert!(output.starts_with(r#"<link href="http://cdn"#));
//!   Ok(())
//! }
//! ```
#![warn(missing_docs)]

#[cfg(doctest)]
doc_comment::doctest!("../../README.md");

mod config;
mod registry;
mod rewrite;
mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::{Config, DomainList, DomainProvider};
pub use registry::{DomainPool, DomainRegistry, SiteRegistries};
pub use rewrite::srcset::{self, SrcsetSource};
pub use rewrite::{
    DEFAULT_UPLOAD_BASE_PATH, DomainSelector, RewriteContext, RewriteEngine, RewriteMode, SchemeResolver,
    UploadPath,
};
pub use types::*;
