use jsonwebtoken::Algorithm;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

use super::claims::ExpectedClaims;
use super::{decode_claims, verify_and_check, verify_only};
use crate::error::Error;
use crate::jwks::JwksClientAsync;
use crate::provider::Secret;
use crate::request::RequestHead;
use crate::token::{FromHeader, Token, TokenExtractor};

/// Validator resolving keys through a [`JwksClientAsync`].
pub struct JwtValidatorAsync {
    jwks: Arc<JwksClientAsync>,
    expected: ExpectedClaims,
    algorithm: Option<Algorithm>,
    extractor: Box<dyn TokenExtractor>,
}

impl std::fmt::Debug for JwtValidatorAsync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtValidatorAsync")
            .field("jwks", &self.jwks)
            .field("expected", &self.expected)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl JwtValidatorAsync {
    /// Creates a validator that verifies every token with `algorithm`.
    pub fn new(
        jwks: impl Into<Arc<JwksClientAsync>>,
        expected: ExpectedClaims,
        algorithm: Algorithm,
    ) -> Self {
        Self {
            jwks: jwks.into(),
            expected,
            algorithm: Some(algorithm),
            extractor: Box::new(FromHeader),
        }
    }

    /// Verifies with the `alg` each token declares; see
    /// [`super::Configuration::trust_provider`] for when that is safe.
    pub fn trust_provider(jwks: impl Into<Arc<JwksClientAsync>>, expected: ExpectedClaims) -> Self {
        Self {
            jwks: jwks.into(),
            expected,
            algorithm: None,
            extractor: Box::new(FromHeader),
        }
    }

    pub fn with_extractor(mut self, extractor: impl TokenExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    pub fn jwks(&self) -> &JwksClientAsync {
        &self.jwks
    }

    /// Extracts, resolves, verifies and checks the token carried by `request`.
    ///
    /// Extraction happens before the returned future is first polled.
    pub fn validate_request(
        &self,
        request: &dyn RequestHead,
    ) -> impl Future<Output = Result<Token, Error>> + Send + '_ {
        let token = self.extractor.extract(request);
        async move {
            let token = token?;
            self.validate_token(&token).await?;
            Ok(token)
        }
    }

    pub async fn validate_token(&self, token: &Token) -> Result<(), Error> {
        self.verified_claims(token).await.map(|_| ())
    }

    /// Re-checks the signature and deserializes the claims into `T`; registered
    /// claims are not compared again.
    pub async fn claims<T: DeserializeOwned>(&self, token: &Token) -> Result<T, Error> {
        let secret = self.secret_for(token).await?;
        let claims = verify_only(token, &secret, self.algorithm)?;
        decode_claims(claims)
    }

    async fn verified_claims(&self, token: &Token) -> Result<Value, Error> {
        let secret = self.secret_for(token).await?;
        verify_and_check(token, &secret, &self.expected, self.algorithm)
    }

    async fn secret_for(&self, token: &Token) -> Result<Secret, Error> {
        let kid = token.key_id()?;
        Ok(Secret::Jwk(self.jwks.get_key(kid).await?))
    }
}
