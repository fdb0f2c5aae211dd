#[cfg(feature = "async-validate")]
mod async_impl;
mod claims;
mod config;
mod sync;
mod verify;


#[cfg(feature = "async-validate")]
pub use async_impl::JwtValidatorAsync;
pub use claims::{ExpectedClaims, DEFAULT_LEEWAY};
pub use config::Configuration;
pub use sync::JwtValidator;

use jsonwebtoken::Algorithm;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Error;
use crate::provider::Secret;
use crate::token::Token;

// Shared by the blocking and async validators once the key is known.
fn verify_and_check(
    token: &Token,
    secret: &Secret,
    expected: &ExpectedClaims,
    pinned: Option<Algorithm>,
) -> Result<Value, Error> {
    let claims = verify_only(token, secret, pinned)?;
    claims::validate_claims(&claims, expected, jsonwebtoken::get_current_timestamp())?;
    Ok(claims)
}

// Claim decoding re-checks the signature but not the registered claims.
fn verify_only(token: &Token, secret: &Secret, pinned: Option<Algorithm>) -> Result<Value, Error> {
    let alg = verify::resolve_algorithm(pinned, token)?;
    verify::verify_signature(token, secret, alg)
}

// Payloads that do not fit `T` are reported as malformed tokens.
fn decode_claims<T: DeserializeOwned>(claims: Value) -> Result<T, Error> {
    serde_json::from_value(claims)
        .map_err(|err| Error::TokenMalformed(format!("claims do not match: {err}")))
}
