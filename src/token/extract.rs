use http::header::AUTHORIZATION;
use log::debug;

use super::Token;
use crate::error::Error;
use crate::request::RequestHead;

const BEARER_PREFIX: &str = "BEARER ";
const TOKEN_QUERY_PARAM: &str = "token";

/// Pulls a bearer token out of an HTTP request.
///
/// `Error::TokenNotFound` means the request carries no token at all; a token
/// that is present but cannot be parsed yields `Error::TokenMalformed`.
pub trait TokenExtractor: Send + Sync {
    fn extract(&self, request: &dyn RequestHead) -> Result<Token, Error>;
}

/// Reads `Authorization: Bearer <token>`; the scheme is matched case-insensitively.
#[derive(Debug, Clone, Copy, Default)]
pub struct FromHeader;

impl FromHeader {
    fn raw_token(request: &dyn RequestHead) -> Option<&str> {
        let value = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
        if value.len() <= BEARER_PREFIX.len() {
            return None;
        }
        let scheme = value.get(..BEARER_PREFIX.len())?;
        if !scheme.eq_ignore_ascii_case(BEARER_PREFIX) {
            return None;
        }
        value.get(BEARER_PREFIX.len()..)
    }
}

impl TokenExtractor for FromHeader {
    fn extract(&self, request: &dyn RequestHead) -> Result<Token, Error> {
        let raw = Self::raw_token(request).ok_or(Error::TokenNotFound)?;
        Token::parse(raw)
    }
}

/// Reads the `token` query parameter.
#[derive(Debug, Clone, Copy, Default)]
pub struct FromParams;

impl FromParams {
    fn raw_token(request: &dyn RequestHead) -> Option<String> {
        let query = request.uri().query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == TOKEN_QUERY_PARAM)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    }
}

impl TokenExtractor for FromParams {
    fn extract(&self, request: &dyn RequestHead) -> Result<Token, Error> {
        let raw = Self::raw_token(request).ok_or(Error::TokenNotFound)?;
        Token::parse(raw)
    }
}

/// Tries each extractor in order and keeps the first token found.
///
/// Failures of individual extractors, malformed tokens included, only move on
/// to the next one; when every extractor fails the result is `TokenNotFound`.
#[derive(Default)]
pub struct FromMultiple {
    extractors: Vec<Box<dyn TokenExtractor>>,
}

impl FromMultiple {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, extractor: impl TokenExtractor + 'static) -> Self {
        self.extractors.push(Box::new(extractor));
        self
    }
}

impl From<Vec<Box<dyn TokenExtractor>>> for FromMultiple {
    fn from(extractors: Vec<Box<dyn TokenExtractor>>) -> Self {
        Self { extractors }
    }
}

impl TokenExtractor for FromMultiple {
    fn extract(&self, request: &dyn RequestHead) -> Result<Token, Error> {
        for extractor in &self.extractors {
            match extractor.extract(request) {
                Ok(token) => return Ok(token),
                Err(err) => debug!("token extractor skipped: {err}"),
            }
        }
        Err(Error::TokenNotFound)
    }
}

/// Adapts a closure into a [`TokenExtractor`].
pub struct ExtractorFn<F>(pub F);

impl<F> TokenExtractor for ExtractorFn<F>
where
    F: Fn(&dyn RequestHead) -> Result<Token, Error> + Send + Sync,
{
    fn extract(&self, request: &dyn RequestHead) -> Result<Token, Error> {
        (self.0)(request)
    }
}
