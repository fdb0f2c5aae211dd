#![forbid(unsafe_code)]

mod error;
mod jwks;
mod provider;
mod request;
mod token;
mod validator;

pub use error::{BoxError, ClaimError, Error, ErrorKind};

pub use jwks::{
    jwks_from_slice, CacheMode, JwksClient, JwksClientOptions, KeyCacher, MemoryKeyCacher,
};
#[cfg(feature = "async-validate")]
pub use jwks::JwksClientAsync;

pub use provider::{Secret, SecretProvider, SecretProviderFn};

pub use request::RequestHead;

pub use token::{
    ExtractorFn, FromHeader, FromMultiple, FromParams, JwtHeader, Token, TokenExtractor,
};

pub use validator::{Configuration, ExpectedClaims, JwtValidator, DEFAULT_LEEWAY};
#[cfg(feature = "async-validate")]
pub use validator::JwtValidatorAsync;

pub use jsonwebtoken::jwk::{Jwk, JwkSet};
pub use jsonwebtoken::Algorithm;
