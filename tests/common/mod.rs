#![allow(dead_code)]

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rand::thread_rng;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde_json::{json, Value};
use std::io::{Read, Write};
use std::net::TcpListener as StdTcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::timeout;

pub const ISSUER: &str = "https://issuer.example";
pub const AUDIENCE: &str = "orders-api";

const READ_TIMEOUT: Duration = Duration::from_secs(2);
const MAX_HEADER_BYTES: usize = 64 * 1024;

pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
}

impl CapturedRequest {
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

pub fn response_with_body(status: &str, headers: &[(&str, &str)], body: &str) -> String {
    let mut response = format!("HTTP/1.1 {status}\r\n");
    for (name, value) in headers {
        response.push_str(&format!("{name}: {value}\r\n"));
    }
    response.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    ));
    response
}

pub fn json_response(status: &str, body: &str) -> String {
    response_with_body(status, &[("Content-Type", "application/json")], body)
}

/// Answers a single connection with `response` and reports the captured request.
pub async fn serve_once(
    response: impl AsRef<[u8]>,
) -> (String, oneshot::Receiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (tx, rx) = oneshot::channel();
    let response = response.as_ref().to_vec();

    tokio::spawn(async move {
        if let Ok((mut stream, _)) = listener.accept().await {
            let head = read_head(&mut stream).await;
            let _ = tx.send(parse_head(&head));
            let _ = stream.write_all(&response).await;
        }
    });

    (format!("http://{}", addr), rx)
}

async fn read_head(stream: &mut tokio::net::TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while find_header_end(&buf).is_none() {
        assert!(buf.len() < MAX_HEADER_BYTES, "request headers too large");
        let read = match timeout(READ_TIMEOUT, stream.read(&mut chunk)).await {
            Ok(Ok(read)) => read,
            Ok(Err(e)) => panic!("read_head I/O error: {e}"),
            Err(_) => panic!("timed out reading request headers"),
        };
        if read == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..read]);
    }
    buf
}

fn parse_head(buf: &[u8]) -> CapturedRequest {
    let end = find_header_end(buf).unwrap_or(buf.len());
    let head = String::from_utf8_lossy(&buf[..end]);
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or("").split_whitespace();
    let method = request_line.next().unwrap_or("").to_string();
    let path = request_line.next().unwrap_or("").to_string();
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect();
    CapturedRequest {
        method,
        path,
        headers,
    }
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|window| window == b"\r\n\r\n")
        .map(|pos| pos + 4)
}

/// Blocking stub that answers `responses` in order, one per connection.
pub struct BlockingServer {
    pub url: String,
    count: Arc<AtomicUsize>,
    handle: Option<thread::JoinHandle<()>>,
}

impl BlockingServer {
    pub fn start(responses: Vec<String>) -> Self {
        let listener = StdTcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let count = Arc::new(AtomicUsize::new(0));
        let count_thread = Arc::clone(&count);
        let handle = thread::spawn(move || {
            for response in responses {
                let Ok((mut stream, _)) = listener.accept() else {
                    break;
                };
                count_thread.fetch_add(1, Ordering::SeqCst);
                let _ = stream.set_read_timeout(Some(READ_TIMEOUT));
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while find_header_end(&buf).is_none() {
                    match stream.read(&mut chunk) {
                        Ok(0) | Err(_) => break,
                        Ok(read) => buf.extend_from_slice(&chunk[..read]),
                    }
                }
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
            }
        });
        Self {
            url: format!("http://{}/.well-known/jwks.json", addr),
            count,
            handle: Some(handle),
        }
    }

    pub fn requests(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Waits until every scripted response has been served.
    pub fn finish(mut self) -> usize {
        if let Some(handle) = self.handle.take() {
            handle.join().expect("server thread");
        }
        self.requests()
    }
}

pub fn rsa_private_key_pem() -> &'static str {
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

pub fn jwks_body(kids: &[&str]) -> String {
    let private_key = RsaPrivateKey::from_pkcs1_pem(rsa_private_key_pem()).expect("private key");
    let public_key = RsaPublicKey::from(&private_key);
    let n = URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be());
    let e = URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be());
    let keys: Vec<Value> = kids
        .iter()
        .map(|kid| {
            json!({
                "kty": "RSA",
                "kid": kid,
                "use": "sig",
                "alg": "RS256",
                "n": n,
                "e": e,
            })
        })
        .collect();
    json!({ "keys": keys }).to_string()
}

pub fn standard_claims() -> Value {
    json!({
        "iss": ISSUER,
        "aud": AUDIENCE,
        "sub": "user-42",
        "scope": "orders:read",
        "exp": jsonwebtoken::get_current_timestamp() + 3600,
    })
}

pub fn rs256_token(kid: &str, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    encode(
        &header,
        claims,
        &EncodingKey::from_rsa_pem(rsa_private_key_pem().as_bytes()).expect("encoding key"),
    )
    .expect("token")
}

pub fn bearer_request(token: &str) -> http::Request<()> {
    http::Request::builder()
        .uri("https://api.example/orders")
        .header("Authorization", format!("bearer {token}"))
        .body(())
        .expect("request")
}
