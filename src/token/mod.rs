mod extract;
mod parts;


use serde::de::DeserializeOwned;
use serde_json::Value;
use std::str::FromStr;

use crate::error::Error;
use parts::{base64_url_decode, decode_jwt_header, split_jwt};

pub use extract::{ExtractorFn, FromHeader, FromMultiple, FromParams, TokenExtractor};

/// Decoded JOSE header of a compact token.
#[derive(Debug, Clone)]
pub struct JwtHeader {
    pub alg: String,
    pub kid: Option<String>,
    pub typ: Option<String>,
    pub raw: Value,
}

/// A compact-serialized JWS that has been parsed but not verified.
#[derive(Debug, Clone)]
pub struct Token {
    raw: String,
    headers: Vec<JwtHeader>,
    payload: Vec<u8>,
}

impl Token {
    /// Parses a compact `header.payload.signature` token without checking its signature.
    pub fn parse(raw: impl Into<String>) -> Result<Self, Error> {
        let raw = raw.into();
        let (header, payload) = {
            let parts = split_jwt(&raw)?;
            let header = decode_jwt_header(parts.header)?;
            let payload = base64_url_decode(parts.payload)?;
            base64_url_decode(parts.signature)?;
            (header, payload)
        };
        Ok(Self {
            raw,
            headers: vec![header],
            payload,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Protected headers in signature order. Compact tokens carry exactly one.
    pub fn headers(&self) -> &[JwtHeader] {
        &self.headers
    }

    pub fn header(&self) -> Option<&JwtHeader> {
        self.headers.first()
    }

    /// Key identifier of the first header; a header without `kid` selects the empty identifier.
    pub fn key_id(&self) -> Result<&str, Error> {
        let header = self.header().ok_or(Error::NoJwtHeaders)?;
        Ok(header.kid.as_deref().unwrap_or(""))
    }

    /// Raw claims payload, base64url-decoded.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Deserializes the claims without any signature check.
    pub fn unverified_claims<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.payload)
            .map_err(|err| Error::TokenMalformed(format!("claims are not json: {err}")))
    }
}

impl FromStr for Token {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Token::parse(raw)
    }
}
