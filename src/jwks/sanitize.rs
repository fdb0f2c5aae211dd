use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::Algorithm;
use log::warn;
use serde_json::Value;
use std::str::FromStr;
use url::Url;

use crate::error::Error;

const PREVIEW_LIMIT: usize = 128;

#[derive(serde::Deserialize)]
struct JwksDocument {
    keys: Vec<Value>,
}

/// Parses a JWKS document into the keys that can verify a JWS signature.
///
/// A member is skipped, with a warning, when its `use` is anything but `sig`,
/// when its `alg` does not name a signature algorithm, or when it is not a
/// decodable JWK. A body that is not JSON or has no `keys` array is an error.
pub fn jwks_from_slice(body: &[u8]) -> Result<JwkSet, Error> {
    let document: JwksDocument = serde_json::from_slice(body)?;
    let keys = document.keys.into_iter().filter_map(signing_key).collect();
    Ok(JwkSet { keys })
}

fn signing_key(member: Value) -> Option<Jwk> {
    let kid = member
        .get("kid")
        .and_then(Value::as_str)
        .unwrap_or("<none>")
        .to_string();

    if let Some(key_use) = member.get("use") {
        if key_use.as_str() != Some("sig") {
            warn!("jwks key skipped; kid={kid} use={key_use}");
            return None;
        }
    }

    if let Some(alg) = member.get("alg") {
        let signs = alg
            .as_str()
            .is_some_and(|name| Algorithm::from_str(name).is_ok());
        if !signs {
            warn!("jwks key skipped; kid={kid} alg={alg}");
            return None;
        }
    }

    match serde_json::from_value(member) {
        Ok(jwk) => Some(jwk),
        Err(err) => {
            warn!("jwks key skipped; kid={kid} error={err}");
            None
        }
    }
}

/// `scheme://host[:port]/path` of the key set location, without credentials,
/// query or fragment.
pub(super) fn redact_jwks_uri(uri: &Url) -> String {
    let host = uri.host_str().unwrap_or_default();
    match uri.port() {
        Some(port) => format!("{}://{host}:{port}{}", uri.scheme(), uri.path()),
        None => format!("{}://{host}{}", uri.scheme(), uri.path()),
    }
}

// ASCII-escaped head of an error body.
pub(super) fn body_preview(body: &[u8]) -> String {
    let mut preview: String = body
        .iter()
        .take(PREVIEW_LIMIT)
        .flat_map(|&byte| std::ascii::escape_default(byte))
        .map(char::from)
        .collect();
    if body.len() > PREVIEW_LIMIT {
        preview.push_str("...");
    }
    preview
}

pub(super) fn fetch_failure(uri: &Url, status: reqwest::StatusCode, body: &[u8]) -> Error {
    let uri = redact_jwks_uri(uri);
    warn!("jwks download failed; uri={uri} status={status}");
    let preview = body_preview(body);
    if preview.is_empty() {
        Error::JwksFetch(format!("uri {uri} status {status}"))
    } else {
        Error::JwksFetch(format!("uri {uri} status {status} body_preview {preview}"))
    }
}
