// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed, single-use CSRF state for the Strava connect flow.
//!
//! A state value is `base64url("nonce|timestamp_hex|hmac_hex")`. Issued
//! values are remembered server-side until consumed or expired; the same
//! value is also set as a cookie so a callback can still be matched after
//! a server restart.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Name of the cookie carrying the issued state.
pub const STATE_COOKIE: &str = "strava_oauth_state";

/// How long an issued state stays valid, in seconds.
pub const STATE_TTL_SECS: i64 = 600;

/// Issued OAuth states awaiting their callback.
#[derive(Clone)]
pub struct OAuthStates {
    key: Arc<Vec<u8>>,
    /// state -> issue time (ms since epoch)
    pending: Arc<DashMap<String, i64>>,
}

impl OAuthStates {
    pub fn new(key: Vec<u8>) -> Self {
        Self {
            key: Arc::new(key),
            pending: Arc::new(DashMap::new()),
        }
    }

    /// Create a fresh state value and remember it.
    pub fn issue(&self) -> Result<String, AppError> {
        let now_ms = Utc::now().timestamp_millis();
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let payload = format!("{}|{:x}", nonce, now_ms);

        let signature = hex::encode(self.sign(&payload)?);
        let state = URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature));

        self.purge_expired(now_ms);
        self.pending.insert(state.clone(), now_ms);
        Ok(state)
    }

    /// Accept a callback state exactly once.
    ///
    /// The state must carry a valid signature and be younger than the TTL.
    /// It must then either still be pending (it is removed) or match the
    /// state cookie presented by the browser.
    pub fn consume(&self, state: &str, cookie: Option<&str>) -> Result<(), AppError> {
        let now_ms = Utc::now().timestamp_millis();
        let issued_ms = self
            .verify(state)
            .ok_or_else(|| AppError::BadRequest("Invalid OAuth state".to_string()))?;

        if now_ms - issued_ms > STATE_TTL_SECS * 1000 {
            self.pending.remove(state);
            return Err(AppError::BadRequest("OAuth state expired".to_string()));
        }

        if self.pending.remove(state).is_some() {
            return Ok(());
        }

        match cookie {
            Some(c) if bool::from(c.as_bytes().ct_eq(state.as_bytes())) => Ok(()),
            _ => Err(AppError::BadRequest(
                "OAuth state not recognized or already used".to_string(),
            )),
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn sign(&self, payload: &str) -> Result<Vec<u8>, AppError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
        mac.update(payload.as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }

    /// Check the signature and return the issue timestamp (ms).
    fn verify(&self, state: &str) -> Option<i64> {
        let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
        let decoded = String::from_utf8(bytes).ok()?;

        let (payload, signature_hex) = decoded.rsplit_once('|')?;
        let (_nonce, timestamp_hex) = payload.split_once('|')?;

        let signature = hex::decode(signature_hex).ok()?;
        let expected = self.sign(payload).ok()?;
        if !bool::from(signature.ct_eq(&expected)) {
            tracing::error!("OAuth state signature mismatch");
            return None;
        }

        i64::from_str_radix(timestamp_hex, 16).ok()
    }

    fn purge_expired(&self, now_ms: i64) {
        self.pending
            .retain(|_, issued| now_ms - *issued <= STATE_TTL_SECS * 1000);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forge(key: &[u8], nonce: &str, issued_ms: i64) -> String {
        let payload = format!("{}|{:x}", nonce, issued_ms);
        let mut mac = HmacSha256::new_from_slice(key).unwrap();
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());
        URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature))
    }

    #[test]
    fn test_issued_state_is_single_use() {
        let states = OAuthStates::new(b"secret_key".to_vec());
        let state = states.issue().unwrap();
        assert_eq!(states.pending_len(), 1);

        states.consume(&state, None).unwrap();
        assert_eq!(states.pending_len(), 0);
        assert!(states.consume(&state, None).is_err());
    }

    #[test]
    fn test_cookie_fallback_after_restart() {
        let key = b"secret_key".to_vec();
        let state = OAuthStates::new(key.clone()).issue().unwrap();

        // New process, same key: nothing pending
        let restarted = OAuthStates::new(key);
        assert!(restarted.consume(&state, None).is_err());
        assert!(restarted.consume(&state, Some("other")).is_err());
        restarted.consume(&state, Some(&state)).unwrap();
    }

    #[test]
    fn test_rejects_wrong_key_and_garbage() {
        let states = OAuthStates::new(b"secret_key".to_vec());
        let forged = forge(b"other_key", "abc", Utc::now().timestamp_millis());
        assert!(states.consume(&forged, Some(&forged)).is_err());
        assert!(states.consume("not base64 !!", None).is_err());
        assert!(states.consume(&URL_SAFE_NO_PAD.encode("a|b"), None).is_err());
    }

    #[test]
    fn test_rejects_expired_state() {
        let key = b"secret_key";
        let states = OAuthStates::new(key.to_vec());
        let old = Utc::now().timestamp_millis() - (STATE_TTL_SECS + 5) * 1000;
        let state = forge(key, "abc", old);
        assert!(matches!(
            states.consume(&state, Some(&state)),
            Err(AppError::BadRequest(msg)) if msg.contains("expired")
        ));
    }
}
