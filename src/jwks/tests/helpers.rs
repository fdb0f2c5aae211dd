use super::super::jwks_from_slice;
use crate::error::Error;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rand::thread_rng;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde_json::{json, Value};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Duration;

pub(super) struct StubResponse {
    pub(super) status: u16,
    pub(super) content_type: &'static str,
    pub(super) body: String,
}

impl StubResponse {
    pub(super) fn jwks(jwks: &Value) -> Self {
        Self {
            status: 200,
            content_type: "application/json; charset=utf-8",
            body: jwks.to_string(),
        }
    }

    pub(super) fn raw(status: u16, content_type: &'static str, body: &str) -> Self {
        Self {
            status,
            content_type,
            body: body.to_string(),
        }
    }
}

pub(super) struct StubServer {
    pub(super) url: String,
    count: Arc<AtomicUsize>,
    shutdown: Sender<()>,
    handle: Option<thread::JoinHandle<()>>,
}

impl StubServer {
    pub(super) fn requests(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Serves `responses` in order, one per connection, then stops accepting.
pub(super) fn serve_sequence(responses: Vec<StubResponse>) -> StubServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.set_nonblocking(true).expect("nonblocking");
    let addr = listener.local_addr().expect("addr");
    let count = Arc::new(AtomicUsize::new(0));
    let count_thread = Arc::clone(&count);
    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    let handle = thread::spawn(move || {
        while count_thread.load(Ordering::SeqCst) < responses.len() {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }
            match listener.accept() {
                Ok((mut stream, _)) => {
                    let idx = count_thread.fetch_add(1, Ordering::SeqCst);
                    let response = &responses[idx];
                    let _ = stream.set_nonblocking(false);
                    let mut buf = [0u8; 1024];
                    let _ = stream.read(&mut buf);
                    let reason = http::StatusCode::from_u16(response.status)
                        .ok()
                        .and_then(|status| status.canonical_reason())
                        .unwrap_or("Unknown");
                    let raw = format!(
                        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        response.status,
                        reason,
                        response.content_type,
                        response.body.len(),
                        response.body
                    );
                    let _ = stream.write_all(raw.as_bytes());
                    let _ = stream.flush();
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(5));
                }
                Err(_) => break,
            }
        }
    });
    StubServer {
        url: format!("http://{}/jwks", addr),
        count,
        shutdown: shutdown_tx,
        handle: Some(handle),
    }
}

pub(super) fn rsa_private_key_pem() -> &'static str {
    static PEM: OnceLock<String> = OnceLock::new();
    PEM.get_or_init(|| {
        let mut rng = thread_rng();
        let key = RsaPrivateKey::new(&mut rng, 2048).expect("private key");
        key.to_pkcs1_pem(LineEnding::LF)
            .expect("private key pem")
            .to_string()
    })
    .as_str()
}

pub(super) fn rsa_jwk(kid: Option<&str>) -> Value {
    let private_key = RsaPrivateKey::from_pkcs1_pem(rsa_private_key_pem()).expect("private key");
    let public_key = RsaPublicKey::from(&private_key);
    let mut jwk = json!({
        "kty": "RSA",
        "use": "sig",
        "alg": "RS256",
        "n": URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
        "e": URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
    });
    if let Some(kid) = kid {
        jwk["kid"] = json!(kid);
    }
    jwk
}

pub(super) fn jwks_json(kids: &[&str]) -> Value {
    let keys: Vec<Value> = kids.iter().map(|kid| rsa_jwk(Some(kid))).collect();
    json!({ "keys": keys })
}

pub(super) fn rs256_token(kid: Option<&str>) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    let claims = json!({
        "iss": "issuer",
        "aud": "audience",
        "sub": "principal",
        "exp": jsonwebtoken::get_current_timestamp() + 3600,
    });
    encode(
        &header,
        &claims,
        &EncodingKey::from_rsa_pem(rsa_private_key_pem().as_bytes()).expect("encoding key"),
    )
    .expect("token")
}

pub(super) fn bearer_request(token: &str) -> http::Request<()> {
    http::Request::builder()
        .uri("http://localhost/")
        .header("Authorization", format!("Bearer {token}"))
        .body(())
        .expect("request")
}

pub(super) fn jwks_from_value(value: Value) -> Result<JwkSet, Error> {
    jwks_from_slice(value.to_string().as_bytes())
}
