//! Domain layer for the identity resolver.

pub mod classifier;
pub mod error;
pub mod guard;
pub mod invitation;
pub mod resolver;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;

pub use classifier::{QueryClassifier, is_identifier_shaped};
pub use error::ResolveError;
pub use guard::{decide, decide_for};
pub use invitation::InvitationIssuer;
pub use resolver::IdentityResolver;
pub use service::IdentityService;
