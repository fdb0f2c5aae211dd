use jsonwebtoken::Algorithm;
use std::fmt;
use std::sync::Arc;

use super::claims::ExpectedClaims;
use crate::provider::{Secret, SecretProvider};

/// Immutable validation settings, shared by every request a validator handles.
#[derive(Clone)]
pub struct Configuration {
    provider: Arc<dyn SecretProvider>,
    expected: ExpectedClaims,
    algorithm: Option<Algorithm>,
}

impl Configuration {
    /// Verifies every token with `algorithm`, whatever its header declares.
    pub fn new(
        provider: impl SecretProvider + 'static,
        expected: ExpectedClaims,
        algorithm: Algorithm,
    ) -> Self {
        Self {
            provider: Arc::new(provider),
            expected,
            algorithm: Some(algorithm),
        }
    }

    /// Verifies each token with the algorithm named in its own `alg` header.
    ///
    /// **Only use this when every key the provider can return is bound to a
    /// single algorithm family.** A provider that hands out a symmetric secret
    /// next to public keys lets an attacker sign an HMAC token with a public
    /// key and have it accepted. JWKs that declare `alg` are still checked
    /// against the header.
    pub fn trust_provider(provider: impl SecretProvider + 'static, expected: ExpectedClaims) -> Self {
        Self {
            provider: Arc::new(provider),
            expected,
            algorithm: None,
        }
    }

    /// Shortcut for a static shared secret.
    pub fn with_static_secret(
        secret: impl Into<Vec<u8>>,
        expected: ExpectedClaims,
        algorithm: Algorithm,
    ) -> Self {
        Self::new(Secret::from_bytes(secret), expected, algorithm)
    }

    /// Uses a provider that is already shared elsewhere.
    pub fn with_shared_provider(
        provider: Arc<dyn SecretProvider>,
        expected: ExpectedClaims,
        algorithm: Option<Algorithm>,
    ) -> Self {
        Self {
            provider,
            expected,
            algorithm,
        }
    }

    pub fn provider(&self) -> &dyn SecretProvider {
        self.provider.as_ref()
    }

    pub fn expected(&self) -> &ExpectedClaims {
        &self.expected
    }

    /// Pinned algorithm; `None` when the token header is trusted.
    pub fn algorithm(&self) -> Option<Algorithm> {
        self.algorithm
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("expected", &self.expected)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}
