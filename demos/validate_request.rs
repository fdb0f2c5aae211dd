use jwt_bearer_rs::{Algorithm, Configuration, ExpectedClaims, JwksClient, JwtValidator};
use serde_json::Value;
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let token = match env::var("JWT_BEARER_TOKEN") {
        Ok(value) => value,
        Err(_) => {
            eprintln!("JWT_BEARER_TOKEN is not set. Skipping.");
            eprintln!(
                "Example: JWT_BEARER_TOKEN=eyJhbGciOi... JWKS_URL=https://issuer.example/.well-known/jwks.json cargo run --example validate_request"
            );
            return Ok(());
        }
    };
    let jwks_url = env::var("JWKS_URL")
        .unwrap_or_else(|_| "https://issuer.example/.well-known/jwks.json".to_string());
    let issuer = env::var("JWT_ISSUER").unwrap_or_default();
    let audience = env::var("JWT_AUDIENCE").unwrap_or_default();

    let jwks = JwksClient::new(&jwks_url)?;
    let expected = ExpectedClaims::new()
        .with_issuer(issuer)
        .with_audience(audience.split(','));
    let validator = JwtValidator::new(Configuration::new(jwks, expected, Algorithm::RS256));

    let request = http::Request::builder()
        .uri("http://localhost/")
        .header("Authorization", format!("Bearer {token}"))
        .body(())?;
    let token = validator.validate_request(&request)?;
    let claims: Value = validator.claims(&request, &token)?;

    println!("kid: {}", token.key_id()?);
    println!("claims: {claims}");
    Ok(())
}
