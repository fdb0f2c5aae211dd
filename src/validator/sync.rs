use log::debug;
use serde::de::DeserializeOwned;

use super::config::Configuration;
use super::{decode_claims, verify_and_check, verify_only};
use crate::error::Error;
use crate::request::RequestHead;
use crate::token::{FromHeader, Token, TokenExtractor};

/// Validates bearer tokens carried by incoming requests.
pub struct JwtValidator {
    config: Configuration,
    extractor: Box<dyn TokenExtractor>,
}

impl std::fmt::Debug for JwtValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtValidator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl JwtValidator {
    /// Creates a validator reading tokens from the `Authorization` header.
    pub fn new(config: Configuration) -> Self {
        Self {
            config,
            extractor: Box::new(FromHeader),
        }
    }

    pub fn with_extractor(mut self, extractor: impl TokenExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Extracts the token, resolves its key, verifies the signature and checks the claims.
    ///
    /// Provider failures are returned as the provider reported them.
    pub fn validate_request(&self, request: &dyn RequestHead) -> Result<Token, Error> {
        let token = self.extractor.extract(request)?;
        self.validate_token(request, &token)?;
        Ok(token)
    }

    /// Validates an already extracted token. `request` is handed to the secret provider.
    pub fn validate_token(&self, request: &dyn RequestHead, token: &Token) -> Result<(), Error> {
        self.verified_claims(request, token).map(|_| ())
    }

    /// Resolves the key again, re-checks the signature and deserializes the claims into `T`.
    ///
    /// Registered claims are not compared here; call this after a successful
    /// [`JwtValidator::validate_request`].
    pub fn claims<T: DeserializeOwned>(
        &self,
        request: &dyn RequestHead,
        token: &Token,
    ) -> Result<T, Error> {
        let secret = self.config.provider().get_secret(request)?;
        let claims = verify_only(token, &secret, self.config.algorithm())?;
        decode_claims(claims)
    }

    fn verified_claims(
        &self,
        request: &dyn RequestHead,
        token: &Token,
    ) -> Result<serde_json::Value, Error> {
        let secret = self.config.provider().get_secret(request)?;
        let claims = verify_and_check(
            token,
            &secret,
            self.config.expected(),
            self.config.algorithm(),
        );
        if let Err(err) = &claims {
            debug!("token rejected; kind={} error={err}", err.kind());
        }
        claims
    }
}
