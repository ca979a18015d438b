//! Webhook signature verification.
//!
//! Parses the `Stripe-Signature` header and verifies the HMAC-SHA256
//! signature over `"{timestamp}.{payload}"` with constant-time comparison
//! and a replay window.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::ports::GatewayError;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age for webhook events (5 minutes).
const MAX_TIMESTAMP_AGE_SECS: i64 = 300;

/// Clock skew tolerance for future timestamps (60 seconds).
const MAX_FUTURE_TOLERANCE_SECS: i64 = 60;

/// Error parsing the signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureParseError {
    /// Header is empty or missing.
    MissingHeader,
    /// Missing timestamp component (t=...).
    MissingTimestamp,
    /// Missing v1 signature component.
    MissingV1Signature,
    /// Invalid timestamp format.
    InvalidTimestamp,
    /// Invalid signature format (not valid hex).
    InvalidSignatureFormat,
}

impl std::fmt::Display for SignatureParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingHeader => write!(f, "Missing signature header"),
            Self::MissingTimestamp => write!(f, "Missing timestamp (t=) in signature"),
            Self::MissingV1Signature => write!(f, "Missing v1 signature in header"),
            Self::InvalidTimestamp => write!(f, "Invalid timestamp format"),
            Self::InvalidSignatureFormat => write!(f, "Invalid signature format (not valid hex)"),
        }
    }
}

impl std::error::Error for SignatureParseError {}

/// Parsed signature header components.
///
/// The header format is: `t=timestamp,v1=signature[,v0=legacy_signature]`
#[derive(Debug, Clone)]
pub struct SignatureHeader {
    /// Unix timestamp when the processor generated the delivery.
    pub timestamp: i64,

    /// Primary v1 signature (HMAC-SHA256, hex-encoded).
    pub v1_signature: Vec<u8>,
}

impl SignatureHeader {
    /// Parse a signature header into components.
    pub fn parse(header: &str) -> Result<Self, SignatureParseError> {
        if header.is_empty() {
            return Err(SignatureParseError::MissingHeader);
        }

        let mut timestamp: Option<i64> = None;
        let mut v1_signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or(SignatureParseError::MissingTimestamp)?;

            match key.trim() {
                "t" => {
                    timestamp = Some(
                        value
                            .trim()
                            .parse()
                            .map_err(|_| SignatureParseError::InvalidTimestamp)?,
                    );
                }
                "v1" => {
                    v1_signature = Some(
                        hex_decode(value.trim())
                            .ok_or(SignatureParseError::InvalidSignatureFormat)?,
                    );
                }
                _ => {
                    // Ignore unknown fields for forward compatibility
                }
            }
        }

        Ok(Self {
            timestamp: timestamp.ok_or(SignatureParseError::MissingTimestamp)?,
            v1_signature: v1_signature.ok_or(SignatureParseError::MissingV1Signature)?,
        })
    }
}

/// Verifies webhook signatures against a signing secret.
pub struct SignatureVerifier {
    secret: SecretString,
}

impl SignatureVerifier {
    /// Creates a verifier for the given signing secret.
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Verify a delivery's signature header against its raw payload.
    ///
    /// Checks the timestamp window first (replay prevention), then the
    /// HMAC-SHA256 signature with constant-time comparison.
    pub fn verify(&self, payload: &[u8], header: &str) -> Result<(), GatewayError> {
        let header = SignatureHeader::parse(header)
            .map_err(|e| GatewayError::new(crate::ports::GatewayErrorCode::InvalidRequest, e.to_string()))?;

        let now = chrono::Utc::now().timestamp();
        let age = now - header.timestamp;

        if age > MAX_TIMESTAMP_AGE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                age_secs = age,
                "Webhook delivery too old"
            );
            return Err(GatewayError::new(
                crate::ports::GatewayErrorCode::InvalidRequest,
                format!("Delivery too old ({} seconds)", age),
            ));
        }

        if age < -MAX_FUTURE_TOLERANCE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                "Webhook delivery timestamp in future"
            );
            return Err(GatewayError::new(
                crate::ports::GatewayErrorCode::InvalidRequest,
                "Delivery timestamp in future",
            ));
        }

        let signed_payload = format!("{}.{}", header.timestamp, String::from_utf8_lossy(payload));

        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signed_payload.as_bytes());
        let expected = mac.finalize().into_bytes();

        if expected.as_slice().ct_eq(&header.v1_signature).unwrap_u8() != 1 {
            tracing::warn!("Invalid webhook signature");
            return Err(GatewayError::new(
                crate::ports::GatewayErrorCode::InvalidRequest,
                "Invalid signature",
            ));
        }

        Ok(())
    }
}

/// Decode a hex string to bytes.
fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    let hex = hex.trim();
    if hex.len() % 2 != 0 {
        return None;
    }

    let mut bytes = Vec::with_capacity(hex.len() / 2);
    for i in (0..hex.len()).step_by(2) {
        let byte = u8::from_str_radix(&hex[i..i + 2], 16).ok()?;
        bytes.push(byte);
    }
    Some(bytes)
}

/// Encode bytes to hex string.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, timestamp: i64, payload: &str) -> String {
        let signed_payload = format!("{}.{}", timestamp, payload);
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(signed_payload.as_bytes());
        format!("t={},v1={}", timestamp, hex_encode(&mac.finalize().into_bytes()))
    }

    fn verifier() -> SignatureVerifier {
        SignatureVerifier::new(SecretString::new("whsec_test_secret".to_string()))
    }

    // ══════════════════════════════════════════════════════════════
    // Header Parsing Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn parse_valid_header() {
        let header = "t=1704067200,v1=5d41402abc4b2a76b9719d911017c592";
        let parsed = SignatureHeader::parse(header).unwrap();

        assert_eq!(parsed.timestamp, 1704067200);
        assert_eq!(
            hex_encode(&parsed.v1_signature),
            "5d41402abc4b2a76b9719d911017c592"
        );
    }

    #[test]
    fn parse_missing_timestamp() {
        let result = SignatureHeader::parse("v1=5d41402abc4b2a76b9719d911017c592");
        assert!(matches!(result, Err(SignatureParseError::MissingTimestamp)));
    }

    #[test]
    fn parse_missing_v1() {
        let result = SignatureHeader::parse("t=1704067200");
        assert!(matches!(
            result,
            Err(SignatureParseError::MissingV1Signature)
        ));
    }

    #[test]
    fn parse_empty_header() {
        let result = SignatureHeader::parse("");
        assert!(matches!(result, Err(SignatureParseError::MissingHeader)));
    }

    #[test]
    fn parse_invalid_timestamp() {
        let result = SignatureHeader::parse("t=not_a_number,v1=aabb");
        assert!(matches!(result, Err(SignatureParseError::InvalidTimestamp)));
    }

    #[test]
    fn parse_invalid_hex() {
        let result = SignatureHeader::parse("t=1704067200,v1=not_hex_xyz");
        assert!(matches!(
            result,
            Err(SignatureParseError::InvalidSignatureFormat)
        ));
    }

    #[test]
    fn parse_odd_length_hex() {
        let result = SignatureHeader::parse("t=1704067200,v1=abc");
        assert!(matches!(
            result,
            Err(SignatureParseError::InvalidSignatureFormat)
        ));
    }

    // ══════════════════════════════════════════════════════════════
    // Verification Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn verify_valid_signature() {
        let payload = r#"{"id":"evt_test"}"#;
        let timestamp = chrono::Utc::now().timestamp();
        let header = sign("whsec_test_secret", timestamp, payload);

        assert!(verifier().verify(payload.as_bytes(), &header).is_ok());
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let payload = r#"{"id":"evt_test"}"#;
        let timestamp = chrono::Utc::now().timestamp();
        let header = sign("wrong_secret", timestamp, payload);

        assert!(verifier().verify(payload.as_bytes(), &header).is_err());
    }

    #[test]
    fn verify_rejects_expired_timestamp() {
        let payload = r#"{"id":"evt_test"}"#;
        let timestamp = chrono::Utc::now().timestamp() - 600;
        let header = sign("whsec_test_secret", timestamp, payload);

        let err = verifier().verify(payload.as_bytes(), &header).unwrap_err();
        assert!(err.message.contains("too old"));
    }

    #[test]
    fn verify_rejects_future_timestamp() {
        let payload = r#"{"id":"evt_test"}"#;
        let timestamp = chrono::Utc::now().timestamp() + 120;
        let header = sign("whsec_test_secret", timestamp, payload);

        let err = verifier().verify(payload.as_bytes(), &header).unwrap_err();
        assert!(err.message.contains("future"));
    }

    #[test]
    fn verify_tolerates_small_clock_skew() {
        let payload = r#"{"id":"evt_test"}"#;
        let timestamp = chrono::Utc::now().timestamp() + 30;
        let header = sign("whsec_test_secret", timestamp, payload);

        assert!(verifier().verify(payload.as_bytes(), &header).is_ok());
    }

    #[test]
    fn verify_rejects_tampered_payload() {
        let timestamp = chrono::Utc::now().timestamp();
        let header = sign("whsec_test_secret", timestamp, r#"{"id":"evt_test"}"#);

        let result = verifier().verify(br#"{"id":"evt_other"}"#, &header);
        assert!(result.is_err());
    }

    // ══════════════════════════════════════════════════════════════
    // Hex Encoding Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn hex_roundtrip() {
        let original = vec![0xde, 0xad, 0xbe, 0xef];
        let encoded = hex_encode(&original);
        assert_eq!(hex_decode(&encoded).unwrap(), original);
    }

    #[test]
    fn hex_encode_empty() {
        assert_eq!(hex_encode(&[]), "");
    }
}
