//! Per-site pools of CDN domains.
//!
//! - [`DomainRegistry`]: the pools of one site, plus deterministic domain
//!   selection by checksum
//! - [`DomainPool`]: a read-only snapshot of one pool
//! - [`SiteRegistries`]: one shared registry per site domain

mod checksum;
mod domain;
mod sites;

pub use domain::{DomainPool, DomainRegistry};
pub use sites::SiteRegistries;
