//! Provider webhook signature verification.
//!
//! HMAC-SHA256 over `"{timestamp}.{payload}"` with the endpoint's signing
//! secret, compared in constant time, with a replay window on the timestamp.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::webhook_errors::WebhookError;

/// Maximum allowed age for webhook events (5 minutes).
const MAX_EVENT_AGE_SECS: i64 = 300;

/// Maximum allowed clock skew for future events (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed components from the signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp when the signature was generated.
    pub timestamp: i64,
    /// Every v1 signature present. More than one appears while a secret rolls.
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses a header of the form `t=<timestamp>,v1=<hex>[,v1=<hex>...]`.
    ///
    /// Unknown keys (`v0`, future schemes) are ignored.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            let (key, value) = part.trim().split_once('=').ok_or_else(|| {
                WebhookError::MalformedSignature("invalid header format".to_string())
            })?;

            match key {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| {
                        WebhookError::MalformedSignature("invalid timestamp".to_string())
                    })?);
                }
                "v1" => {
                    v1_signatures.push(hex::decode(value).map_err(|_| {
                        WebhookError::MalformedSignature("invalid v1 signature hex".to_string())
                    })?);
                }
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| WebhookError::MalformedSignature("missing timestamp".to_string()))?;
        if v1_signatures.is_empty() {
            return Err(WebhookError::MalformedSignature(
                "missing v1 signature".to_string(),
            ));
        }

        Ok(SignatureHeader {
            timestamp,
            v1_signatures,
        })
    }
}

/// Verifier for signed webhook deliveries.
///
/// The signing secret is injected at construction; nothing is read from
/// process-global state.
pub struct WebhookVerifier {
    secret: SecretString,
}

impl WebhookVerifier {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Verifies the signature header against the raw payload.
    ///
    /// Must run before the payload is decoded.
    pub fn verify(&self, payload: &[u8], signature_header: &str) -> Result<(), WebhookError> {
        self.verify_at(payload, signature_header, chrono::Utc::now().timestamp())
    }

    /// Same as [`verify`](Self::verify) against an explicit clock.
    pub fn verify_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: i64,
    ) -> Result<(), WebhookError> {
        if signature_header.trim().is_empty() {
            return Err(WebhookError::MissingSignature);
        }

        let header = SignatureHeader::parse(signature_header)?;
        validate_timestamp(header.timestamp, now)?;

        let expected = self.compute_signature(header.timestamp, payload)?;
        let matched = header
            .v1_signatures
            .iter()
            .any(|candidate| constant_time_compare(&expected, candidate));

        if matched {
            Ok(())
        } else {
            Err(WebhookError::InvalidSignature)
        }
    }

    /// Builds a valid header for `payload`, e.g. to replay captured events
    /// against a local endpoint.
    pub fn signature_header(&self, timestamp: i64, payload: &[u8]) -> Result<String, WebhookError> {
        let signature = self.compute_signature(timestamp, payload)?;
        Ok(format!("t={},v1={}", timestamp, hex::encode(signature)))
    }

    fn compute_signature(&self, timestamp: i64, payload: &[u8]) -> Result<Vec<u8>, WebhookError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| WebhookError::InvalidSignature)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

fn validate_timestamp(timestamp: i64, now: i64) -> Result<(), WebhookError> {
    let age = now
        .checked_sub(timestamp)
        .ok_or(WebhookError::InvalidTimestamp)?;

    if age > MAX_EVENT_AGE_SECS {
        return Err(WebhookError::TimestampOutOfRange);
    }

    if age < -MAX_CLOCK_SKEW_SECS {
        return Err(WebhookError::InvalidTimestamp);
    }

    Ok(())
}

/// Constant-time comparison; unequal lengths fail fast.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
