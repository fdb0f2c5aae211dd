use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::{KeyAlgorithm, PublicKeyUse};
use jsonwebtoken::{decode, Algorithm, Validation};
use serde_json::Value;
use std::str::FromStr;

use crate::error::Error;
use crate::provider::Secret;
use crate::token::Token;

/// Algorithm the signature is checked with: the pinned one, or the one the
/// token header declares when no algorithm is pinned.
pub(super) fn resolve_algorithm(pinned: Option<Algorithm>, token: &Token) -> Result<Algorithm, Error> {
    if let Some(alg) = pinned {
        return Ok(alg);
    }
    let header = token.header().ok_or(Error::NoJwtHeaders)?;
    Algorithm::from_str(&header.alg).map_err(Error::Signature)
}

// Registered claims are compared separately, so the library only checks the signature.
fn signature_only(alg: Algorithm) -> Validation {
    let mut validation = Validation::new(alg);
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation
}

fn jwk_allows(secret: &Secret, alg: Algorithm) -> bool {
    let Secret::Jwk(jwk) = secret else {
        return true;
    };
    let use_ok = matches!(
        jwk.common.public_key_use,
        None | Some(PublicKeyUse::Signature)
    );
    let alg_ok = jwk
        .common
        .key_algorithm
        .as_ref()
        .map_or(true, |key_alg| signing_algorithm(key_alg) == Some(alg));
    use_ok && alg_ok
}

/// Signature algorithm named by a JWK `alg`; encryption algorithms have none.
fn signing_algorithm(key_alg: &KeyAlgorithm) -> Option<Algorithm> {
    match key_alg {
        KeyAlgorithm::HS256 => Some(Algorithm::HS256),
        KeyAlgorithm::HS384 => Some(Algorithm::HS384),
        KeyAlgorithm::HS512 => Some(Algorithm::HS512),
        KeyAlgorithm::ES256 => Some(Algorithm::ES256),
        KeyAlgorithm::ES384 => Some(Algorithm::ES384),
        KeyAlgorithm::RS256 => Some(Algorithm::RS256),
        KeyAlgorithm::RS384 => Some(Algorithm::RS384),
        KeyAlgorithm::RS512 => Some(Algorithm::RS512),
        KeyAlgorithm::PS256 => Some(Algorithm::PS256),
        KeyAlgorithm::PS384 => Some(Algorithm::PS384),
        KeyAlgorithm::PS512 => Some(Algorithm::PS512),
        KeyAlgorithm::EdDSA => Some(Algorithm::EdDSA),
        _ => None,
    }
}

/// Verifies the token signature with `secret` and returns the claims payload.
///
/// Every failure, whether a wrong key, a wrong algorithm or a bad signature,
/// maps to `Error::Signature`.
pub(super) fn verify_signature(token: &Token, secret: &Secret, alg: Algorithm) -> Result<Value, Error> {
    if !jwk_allows(secret, alg) {
        return Err(Error::Signature(ErrorKind::InvalidAlgorithm.into()));
    }
    let key = secret.decoding_key()?;
    let data = decode::<Value>(token.raw(), &key, &signature_only(alg)).map_err(Error::Signature)?;
    Ok(data.claims)
}
