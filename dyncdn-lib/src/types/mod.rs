#![allow(unreachable_pub)]

mod cdn_domain;
mod context;
mod error;
mod extensions;
mod scheme;
mod site_key;

pub use cdn_domain::CdnDomain;
pub use context::Context;
pub use error::ErrorKind;
pub use extensions::{DEFAULT_EXTENSIONS, Extensions};
pub use scheme::Scheme;
pub use site_key::SiteKey;

/// The dyncdn `Result` type
pub type Result<T> = std::result::Result<T, crate::ErrorKind>;
