use serde_json::Value;
use std::fmt;
use std::time::Duration;

use crate::error::{ClaimError, Error};

/// Leeway applied to `exp` and `nbf` unless configured otherwise.
pub const DEFAULT_LEEWAY: Duration = Duration::from_secs(60);

/// Registered claim values a token must carry to be accepted.
///
/// An unset issuer or an empty audience list disables the corresponding check.
#[derive(Debug, Clone)]
pub struct ExpectedClaims {
    pub issuer: Option<String>,
    pub audience: Vec<String>,
    pub exp_leeway: Duration,
    pub nbf_leeway: Duration,
}

impl ExpectedClaims {
    pub fn new() -> Self {
        Self {
            issuer: None,
            audience: Vec::new(),
            exp_leeway: DEFAULT_LEEWAY,
            nbf_leeway: DEFAULT_LEEWAY,
        }
    }

    /// Requires `iss` to equal `issuer`; an empty string leaves the issuer unchecked.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        let issuer = issuer.into();
        self.issuer = (!issuer.is_empty()).then_some(issuer);
        self
    }

    /// Requires `aud` to contain at least one of `audience`; empty strings are ignored.
    pub fn with_audience<I, S>(mut self, audience: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audience = audience
            .into_iter()
            .map(Into::into)
            .filter(|aud: &String| !aud.is_empty())
            .collect();
        self
    }

    pub fn with_exp_leeway(mut self, leeway: Duration) -> Self {
        self.exp_leeway = leeway;
        self
    }

    pub fn with_nbf_leeway(mut self, leeway: Duration) -> Self {
        self.nbf_leeway = leeway;
        self
    }

    /// Sets both the `exp` and `nbf` leeway.
    pub fn with_leeway(self, leeway: Duration) -> Self {
        self.with_exp_leeway(leeway).with_nbf_leeway(leeway)
    }
}

impl Default for ExpectedClaims {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(serde::Deserialize)]
struct ClaimsForValidation {
    #[serde(deserialize_with = "numeric_type", default)]
    exp: TryParse<u64>,
    #[serde(deserialize_with = "numeric_type", default)]
    nbf: TryParse<u64>,
    iss: TryParse<String>,
    aud: TryParse<OneOrMany>,
}

#[derive(Debug, Default)]
enum TryParse<T> {
    Parsed(T),
    FailedToParse,
    #[default]
    NotPresent,
}

impl<'de, T: serde::Deserialize<'de>> serde::Deserialize<'de> for TryParse<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<T>::deserialize(deserializer) {
            Ok(Some(value)) => TryParse::Parsed(value),
            Ok(None) => TryParse::NotPresent,
            Err(_) => TryParse::FailedToParse,
        })
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn contains(&self, value: &str) -> bool {
        match self {
            OneOrMany::One(one) => one == value,
            OneOrMany::Many(many) => many.iter().any(|item| item == value),
        }
    }
}

/// Checks issuer, audience, expiry and not-before, in that order, against `now`
/// (seconds since the epoch).
pub(super) fn validate_claims(
    claims: &Value,
    expected: &ExpectedClaims,
    now: u64,
) -> Result<(), Error> {
    let claims: ClaimsForValidation = serde::Deserialize::deserialize(claims)
        .map_err(|_| Error::Claim(ClaimError::Malformed("claims")))?;

    if let Some(issuer) = expected.issuer.as_deref() {
        match claims.iss {
            TryParse::Parsed(iss) if iss == issuer => {}
            _ => return Err(ClaimError::InvalidIssuer.into()),
        }
    }

    if !expected.audience.is_empty() {
        match claims.aud {
            TryParse::Parsed(aud) if expected.audience.iter().any(|a| aud.contains(a)) => {}
            _ => return Err(ClaimError::InvalidAudience.into()),
        }
    }

    match claims.exp {
        TryParse::Parsed(exp) if now.saturating_sub(expected.exp_leeway.as_secs()) > exp => {
            return Err(ClaimError::Expired.into());
        }
        TryParse::FailedToParse => return Err(ClaimError::Malformed("exp").into()),
        _ => {}
    }

    match claims.nbf {
        TryParse::Parsed(nbf) if now.saturating_add(expected.nbf_leeway.as_secs()) < nbf => {
            return Err(ClaimError::NotValidYet.into());
        }
        TryParse::FailedToParse => return Err(ClaimError::Malformed("nbf").into()),
        _ => {}
    }

    Ok(())
}

fn numeric_type<'de, D>(deserializer: D) -> Result<TryParse<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct NumericType;

    impl<'de> serde::de::Visitor<'de> for NumericType {
        type Value = TryParse<u64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a numeric value representable as u64")
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if value.is_finite() && value >= 0.0 && value < (u64::MAX as f64) {
                Ok(TryParse::Parsed(value.round() as u64))
            } else {
                Err(serde::de::Error::custom(
                    "numeric value must be representable as u64",
                ))
            }
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(TryParse::Parsed(value))
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(TryParse::NotPresent)
        }
    }

    match deserializer.deserialize_any(NumericType) {
        Ok(ok) => Ok(ok),
        Err(_) => Ok(TryParse::FailedToParse),
    }
}
