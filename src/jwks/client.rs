use jsonwebtoken::jwk::{Jwk, JwkSet};
use log::debug;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::CONTENT_TYPE;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use url::Url;

use super::cache::{KeyCacher, MemoryKeyCacher};
use super::options::{JwksClientOptions, DEFAULT_JWKS_TIMEOUT};
use super::sanitize::fetch_failure;
use super::{keys_from_body, preload, require_json_content_type};
use crate::error::{read_body_with_limit, Error, MAX_ERROR_BODY_BYTES};
use crate::provider::{Secret, SecretProvider};
use crate::request::RequestHead;
use crate::token::{FromHeader, TokenExtractor};

/// Resolves verification keys by `kid`, downloading the remote key set on a cache miss.
///
/// One mutex guards the cache for the whole lookup, including the download, so
/// concurrent misses never trigger duplicate downloads. Lookups for other
/// identifiers wait while a download is in flight.
pub struct JwksClient {
    jwks_uri: Url,
    http: HttpClient,
    timeout: Option<Duration>,
    cache: Mutex<Box<dyn KeyCacher>>,
    extractor: Box<dyn TokenExtractor>,
}

impl fmt::Debug for JwksClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwksClient")
            .field("jwks_uri", &self.jwks_uri.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl JwksClient {
    /// Creates a client with a persistent cache that reads tokens from the
    /// `Authorization` header.
    pub fn new(jwks_uri: impl AsRef<str>) -> Result<Self, Error> {
        let jwks_uri = Url::parse(jwks_uri.as_ref())?;
        let http = HttpClient::builder().build()?;
        Ok(Self {
            jwks_uri,
            http,
            timeout: Some(DEFAULT_JWKS_TIMEOUT),
            cache: Mutex::new(Box::new(MemoryKeyCacher::persistent())),
            extractor: Box::new(FromHeader),
        })
    }

    pub fn from_options(options: &JwksClientOptions) -> Result<Self, Error> {
        let mut client = Self::new(&options.uri)?.with_cache(options.cache.build());
        client.timeout = options.timeout();
        Ok(client)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    pub fn with_http_client(mut self, http: HttpClient) -> Self {
        self.http = http;
        self
    }

    /// Replaces the key cache; previously cached keys are dropped.
    pub fn with_cache(mut self, cache: impl KeyCacher + 'static) -> Self {
        self.cache = Mutex::new(Box::new(cache));
        self
    }

    /// Replaces the extractor used by [`SecretProvider::get_secret`].
    pub fn with_extractor(mut self, extractor: impl TokenExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    /// Offers every key of `jwks` to the cache as if it had been downloaded.
    pub fn with_preloaded(mut self, jwks: JwkSet) -> Self {
        let cache = self
            .cache
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        preload(&mut **cache, &jwks.keys);
        self
    }

    pub fn jwks_uri(&self) -> &Url {
        &self.jwks_uri
    }

    /// Returns the key for `kid`, downloading the key set when it is not cached.
    pub fn get_key(&self, kid: &str) -> Result<Jwk, Error> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(jwk) = cache.get(kid) {
            debug!("jwks cache hit; kid={kid}");
            return Ok(jwk);
        }
        debug!("jwks cache miss; kid={kid}");
        let keys = self.download_keys(kid)?;
        cache
            .add(kid, &keys)
            .ok_or_else(|| Error::NoKeyFound(kid.to_string()))
    }

    fn download_keys(&self, kid: &str) -> Result<Vec<Jwk>, Error> {
        debug!("downloading jwks; uri={}", self.jwks_uri);
        let mut req = self.http.get(self.jwks_uri.clone());
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let mut resp = req.send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = read_body_with_limit(&mut resp, MAX_ERROR_BODY_BYTES)?;
            return Err(fetch_failure(&self.jwks_uri, status, &body));
        }
        require_json_content_type(
            resp.headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
        )?;
        let body = resp.bytes()?;
        keys_from_body(&body, kid)
    }
}

impl SecretProvider for JwksClient {
    fn get_secret(&self, request: &dyn RequestHead) -> Result<Secret, Error> {
        let token = self.extractor.extract(request)?;
        let kid = token.key_id()?;
        self.get_key(kid).map(Secret::Jwk)
    }
}
