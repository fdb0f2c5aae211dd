mod cache;
mod client;
#[cfg(feature = "async-validate")]
mod client_async;
mod options;
mod sanitize;

#[cfg(test)]
mod tests;

use jsonwebtoken::jwk::Jwk;
use std::slice;

use crate::error::Error;

pub use cache::{KeyCacher, MemoryKeyCacher};
pub use client::JwksClient;
#[cfg(feature = "async-validate")]
pub use client_async::JwksClientAsync;
pub use options::{CacheMode, JwksClientOptions};
pub use sanitize::jwks_from_slice;

fn require_json_content_type(content_type: Option<&str>) -> Result<(), Error> {
    if content_type.is_some_and(|value| value.starts_with("application/json")) {
        return Ok(());
    }
    Err(Error::InvalidContentType(
        content_type.unwrap_or_default().to_string(),
    ))
}

fn keys_from_body(body: &[u8], kid: &str) -> Result<Vec<Jwk>, Error> {
    let jwks = jwks_from_slice(body)?;
    if jwks.keys.is_empty() {
        return Err(Error::NoKeyFound(kid.to_string()));
    }
    Ok(jwks.keys)
}

fn preload(cache: &mut dyn KeyCacher, keys: &[Jwk]) {
    for jwk in keys {
        cache.add(cache::key_id(jwk), slice::from_ref(jwk));
    }
}
