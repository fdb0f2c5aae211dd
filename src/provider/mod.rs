use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::DecodingKey;
use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::request::RequestHead;

/// Key material used to verify a token signature.
#[derive(Clone)]
pub enum Secret {
    /// Shared secret for the HMAC family.
    Bytes(Vec<u8>),
    /// Public (or symmetric) key published in a JWKS document.
    Jwk(Jwk),
    /// Key prepared by the caller, e.g. from a PEM file.
    Key(DecodingKey),
}

impl Secret {
    pub fn from_bytes(secret: impl Into<Vec<u8>>) -> Self {
        Secret::Bytes(secret.into())
    }

    pub fn decoding_key(&self) -> Result<DecodingKey, Error> {
        match self {
            Secret::Bytes(bytes) => Ok(DecodingKey::from_secret(bytes)),
            Secret::Jwk(jwk) => {
                DecodingKey::from_jwk(jwk).map_err(|err| Error::InvalidKey(err.to_string()))
            }
            Secret::Key(key) => Ok(key.clone()),
        }
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Secret::Bytes(_) => f.write_str("Secret::Bytes(<redacted>)"),
            Secret::Jwk(jwk) => f
                .debug_tuple("Secret::Jwk")
                .field(&jwk.common.key_id)
                .finish(),
            Secret::Key(_) => f.write_str("Secret::Key(<redacted>)"),
        }
    }
}

impl From<Jwk> for Secret {
    fn from(jwk: Jwk) -> Self {
        Secret::Jwk(jwk)
    }
}

impl From<DecodingKey> for Secret {
    fn from(key: DecodingKey) -> Self {
        Secret::Key(key)
    }
}

/// Resolves the key that verifies the token carried by `request`.
///
/// Built-in implementations: [`Secret`] (a static key), [`crate::JwksClient`]
/// (keys looked up by `kid` in a remote key set) and [`SecretProviderFn`]
/// (any caller-defined strategy).
pub trait SecretProvider: Send + Sync {
    fn get_secret(&self, request: &dyn RequestHead) -> Result<Secret, Error>;
}

impl SecretProvider for Secret {
    fn get_secret(&self, _request: &dyn RequestHead) -> Result<Secret, Error> {
        Ok(self.clone())
    }
}

impl<P: SecretProvider + ?Sized> SecretProvider for Arc<P> {
    fn get_secret(&self, request: &dyn RequestHead) -> Result<Secret, Error> {
        (**self).get_secret(request)
    }
}

/// Adapts a closure into a [`SecretProvider`].
pub struct SecretProviderFn<F>(pub F);

impl<F> SecretProvider for SecretProviderFn<F>
where
    F: Fn(&dyn RequestHead) -> Result<Secret, Error> + Send + Sync,
{
    fn get_secret(&self, request: &dyn RequestHead) -> Result<Secret, Error> {
        (self.0)(request)
    }
}
