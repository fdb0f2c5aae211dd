use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::Value;

use super::JwtHeader;
use crate::error::Error;

pub(super) struct JwtParts<'a> {
    pub(super) header: &'a str,
    pub(super) payload: &'a str,
    pub(super) signature: &'a str,
}

pub(super) fn split_jwt(token: &str) -> Result<JwtParts<'_>, Error> {
    let mut iter = token.split('.');
    let header = iter.next().ok_or_else(|| malformed("missing header"))?;
    let payload = iter.next().ok_or_else(|| malformed("missing payload"))?;
    let signature = iter.next().ok_or_else(|| malformed("missing signature"))?;
    if iter.next().is_some() {
        return Err(malformed("too many segments"));
    }
    if header.is_empty() || payload.is_empty() {
        return Err(malformed("empty segment"));
    }
    Ok(JwtParts {
        header,
        payload,
        signature,
    })
}

pub(super) fn decode_jwt_header(encoded: &str) -> Result<JwtHeader, Error> {
    let header_bytes = base64_url_decode(encoded)?;
    let raw: Value = serde_json::from_slice(&header_bytes)
        .map_err(|err| malformed(&format!("header is not json: {err}")))?;
    let alg = raw
        .get("alg")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("header alg must be a string"))?;
    let kid = match raw.get("kid") {
        None | Some(Value::Null) => None,
        Some(Value::String(value)) => Some(value.to_string()),
        Some(_) => return Err(malformed("header kid must be a string")),
    };
    let typ = match raw.get("typ") {
        None | Some(Value::Null) => None,
        Some(Value::String(value)) => Some(value.to_string()),
        Some(_) => return Err(malformed("header typ must be a string")),
    };
    Ok(JwtHeader {
        alg: alg.to_string(),
        kid,
        typ,
        raw,
    })
}

pub(super) fn base64_url_decode(data: &str) -> Result<Vec<u8>, Error> {
    URL_SAFE_NO_PAD
        .decode(data)
        .map_err(|err| malformed(&format!("base64url decode error: {err}")))
}

fn malformed(reason: &str) -> Error {
    Error::TokenMalformed(reason.to_string())
}
