use std::fmt;
use std::io::Read;

pub(crate) const MAX_ERROR_BODY_BYTES: usize = 4096;

/// Boxed error returned by caller-defined secret providers and extractors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("token not found")]
    TokenNotFound,
    #[error("malformed token: {0}")]
    TokenMalformed(String),
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("jwks endpoint must answer with a json content type, got {0:?}")]
    InvalidContentType(String),
    #[error("jwks fetch failed: {0}")]
    JwksFetch(String),
    #[error("no key found for kid: {0:?}")]
    NoKeyFound(String),
    #[error("token carries no jws headers")]
    NoJwtHeaders,
    #[error("invalid jwk: {0}")]
    InvalidKey(String),
    #[error("secret provider error: {0}")]
    Provider(#[source] BoxError),
    #[error("signature verification failed: {0}")]
    Signature(#[source] jsonwebtoken::errors::Error),
    #[error("validation failed, {0}")]
    Claim(#[from] ClaimError),
}

/// Claim-specific validation failures, in the order they are checked.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimError {
    #[error("invalid issuer claim (iss)")]
    InvalidIssuer,
    #[error("invalid audience claim (aud)")]
    InvalidAudience,
    #[error("token is expired (exp)")]
    Expired,
    #[error("token not valid yet (nbf)")]
    NotValidYet,
    #[error("malformed claim ({0})")]
    Malformed(&'static str),
}

/// Coarse failure categories a transport layer can map onto its own rejections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    TokenNotFound,
    TokenMalformed,
    KeyResolution,
    CryptographicPrimitive,
    ClaimValidation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::TokenNotFound => "token not found",
            ErrorKind::TokenMalformed => "token malformed",
            ErrorKind::KeyResolution => "key resolution failed",
            ErrorKind::CryptographicPrimitive => "cryptographic primitive error",
            ErrorKind::ClaimValidation => "claim validation failed",
        };
        f.write_str(name)
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::TokenNotFound => ErrorKind::TokenNotFound,
            Error::TokenMalformed(_) => ErrorKind::TokenMalformed,
            Error::Url(_)
            | Error::Http(_)
            | Error::Json(_)
            | Error::InvalidContentType(_)
            | Error::JwksFetch(_)
            | Error::NoKeyFound(_)
            | Error::NoJwtHeaders
            | Error::InvalidKey(_)
            | Error::Provider(_) => ErrorKind::KeyResolution,
            Error::Signature(_) => ErrorKind::CryptographicPrimitive,
            Error::Claim(_) => ErrorKind::ClaimValidation,
        }
    }

    /// Wraps a caller-side failure so it can be returned from a custom provider.
    pub fn provider(err: impl Into<BoxError>) -> Self {
        Error::Provider(err.into())
    }
}

pub(crate) fn read_body_with_limit(
    resp: &mut reqwest::blocking::Response,
    limit: usize,
) -> Result<Vec<u8>, Error> {
    let mut body = Vec::new();
    resp.take(limit as u64)
        .read_to_end(&mut body)
        .map_err(|err| Error::JwksFetch(format!("error body read failed: {err}")))?;
    Ok(body)
}

#[cfg(feature = "async-validate")]
pub(crate) async fn read_body_with_limit_async(
    resp: &mut reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, Error> {
    let mut body = Vec::new();
    while body.len() < limit {
        let Some(chunk) = resp.chunk().await? else {
            break;
        };
        let take = chunk.len().min(limit - body.len());
        body.extend_from_slice(&chunk[..take]);
    }
    Ok(body)
}
