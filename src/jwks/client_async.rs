use jsonwebtoken::jwk::{Jwk, JwkSet};
use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client as AsyncHttpClient;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use url::Url;

use super::cache::{KeyCacher, MemoryKeyCacher};
use super::options::{JwksClientOptions, DEFAULT_JWKS_TIMEOUT};
use super::sanitize::fetch_failure;
use super::{keys_from_body, preload, require_json_content_type};
use crate::error::{read_body_with_limit_async, Error, MAX_ERROR_BODY_BYTES};
use crate::provider::Secret;
use crate::request::RequestHead;
use crate::token::{FromHeader, TokenExtractor};

/// Async counterpart of [`super::JwksClient`]; the cache lock is held across the download.
pub struct JwksClientAsync {
    jwks_uri: Url,
    http: AsyncHttpClient,
    timeout: Option<Duration>,
    cache: AsyncMutex<Box<dyn KeyCacher>>,
    extractor: Box<dyn TokenExtractor>,
}

impl fmt::Debug for JwksClientAsync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwksClientAsync")
            .field("jwks_uri", &self.jwks_uri.as_str())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl JwksClientAsync {
    pub fn new(jwks_uri: impl AsRef<str>) -> Result<Self, Error> {
        let jwks_uri = Url::parse(jwks_uri.as_ref())?;
        let http = AsyncHttpClient::builder().build()?;
        Ok(Self {
            jwks_uri,
            http,
            timeout: Some(DEFAULT_JWKS_TIMEOUT),
            cache: AsyncMutex::new(Box::new(MemoryKeyCacher::persistent())),
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

    pub fn with_http_client(mut self, http: AsyncHttpClient) -> Self {
        self.http = http;
        self
    }

    pub fn with_cache(mut self, cache: impl KeyCacher + 'static) -> Self {
        self.cache = AsyncMutex::new(Box::new(cache));
        self
    }

    pub fn with_extractor(mut self, extractor: impl TokenExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    pub fn with_preloaded(mut self, jwks: JwkSet) -> Self {
        preload(&mut **self.cache.get_mut(), &jwks.keys);
        self
    }

    pub fn jwks_uri(&self) -> &Url {
        &self.jwks_uri
    }

    pub async fn get_key(&self, kid: &str) -> Result<Jwk, Error> {
        let mut cache = self.cache.lock().await;
        if let Some(jwk) = cache.get(kid) {
            debug!("jwks cache hit; kid={kid}");
            return Ok(jwk);
        }
        debug!("jwks cache miss; kid={kid}");
        let keys = self.download_keys(kid).await?;
        cache
            .add(kid, &keys)
            .ok_or_else(|| Error::NoKeyFound(kid.to_string()))
    }

    /// Resolves the key for the token carried by `request`.
    ///
    /// The token is read before the returned future is first polled, so the
    /// future does not borrow `request`.
    pub fn get_secret(
        &self,
        request: &dyn RequestHead,
    ) -> impl Future<Output = Result<Secret, Error>> + Send + '_ {
        let kid = self
            .extractor
            .extract(request)
            .and_then(|token| token.key_id().map(str::to_string));
        async move {
            let kid = kid?;
            self.get_key(&kid).await.map(Secret::Jwk)
        }
    }

    async fn download_keys(&self, kid: &str) -> Result<Vec<Jwk>, Error> {
        debug!("downloading jwks; uri={}", self.jwks_uri);
        let mut req = self.http.get(self.jwks_uri.clone());
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let mut resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = read_body_with_limit_async(&mut resp, MAX_ERROR_BODY_BYTES).await?;
            return Err(fetch_failure(&self.jwks_uri, status, &body));
        }
        require_json_content_type(
            resp.headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
        )?;
        let body = resp.bytes().await?;
        keys_from_body(&body, kid)
    }
}
