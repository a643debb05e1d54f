//! Configuration for the identity resolver module.

use serde::{Deserialize, Serialize};

/// Resolver policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Treat a `BadRequest` answer to a direct lookup as "no match" and move
    /// on to the next step.
    ///
    /// The directory rejects some key shapes (e.g. a principal name where an
    /// object id is expected) with a bad request rather than a not-found.
    /// Disable to make such answers fatal.
    pub soft_bad_request_on_direct: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            soft_bad_request_on_direct: true,
        }
    }
}
