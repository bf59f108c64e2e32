//! Bearer-token persistence and unverified JWT claim inspection

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

/// Storage key the shell has always used for the bearer token
pub const TOKEN_STORAGE_KEY: &str = "phshoes.auth.token";

/// Key-value persistence behind the token store
///
/// The in-memory implementation is the default; hosts embedding the client
/// can provide their own backing (keychain, config file) without the rest
/// of the crate noticing.
pub trait TokenStorage: Send + Sync {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Process-lifetime in-memory storage
#[derive(Default)]
pub struct MemoryTokenStorage {
    values: RwLock<HashMap<String, String>>,
}

impl TokenStorage for MemoryTokenStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.values.read().unwrap().get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) {
        self.values
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values.write().unwrap().remove(key);
    }
}

/// Shared handle to the persisted bearer token
///
/// The token is only ever replaced or cleared, never edited in place. Every
/// API client holds a clone of this handle and reads it per request.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn TokenStorage>,
}

impl TokenStore {
    /// Create a store backed by process memory
    pub fn new() -> Self {
        Self::with_storage(Arc::new(MemoryTokenStorage::default()))
    }

    /// Create a store over a caller-provided backing
    pub fn with_storage(storage: Arc<dyn TokenStorage>) -> Self {
        Self { storage }
    }

    pub fn save(&self, token: &str) {
        self.storage.write(TOKEN_STORAGE_KEY, token);
    }

    pub fn get(&self) -> Option<String> {
        self.storage.read(TOKEN_STORAGE_KEY)
    }

    pub fn clear(&self) {
        self.storage.remove(TOKEN_STORAGE_KEY);
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode the JWT payload segment without verifying the signature.
///
/// The client only needs to read claims for scheduling and display; the
/// backend is the sole authority on token validity.
fn decode_jwt_payload(token: &str) -> Option<serde_json::Value> {
    let payload = token.split('.').nth(1)?;
    // Tokens in the wild are sometimes padded; strip before decoding.
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Wall-clock instant at which the token's `exp` claim elapses, if the
/// claim is present and numeric
pub fn decode_jwt_expiry(token: &str) -> Option<SystemTime> {
    let payload = decode_jwt_payload(token)?;
    let exp = payload.get("exp")?.as_i64()?;
    if exp < 0 {
        return Some(UNIX_EPOCH);
    }
    Some(UNIX_EPOCH + Duration::from_secs(exp as u64))
}

/// The `email` claim, used as a graceful display fallback
pub fn decode_jwt_email(token: &str) -> Option<String> {
    let payload = decode_jwt_payload(token)?;
    payload
        .get("email")
        .and_then(|value| value.as_str())
        .map(|email| email.to_string())
}

#[cfg(test)]
pub(crate) fn encode_test_jwt(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
    format!("{}.{}.sig", header, payload)
}
