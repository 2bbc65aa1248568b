//! QR payment request payload.
//!
//! This module defines:
//! - `PaymentRequest`: The structured payment request carried inside a QR
//!   code, plus its string encoding and validated decoding

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discriminator value every payment request payload must carry.
pub const PAYMENT_REQUEST_TYPE: &str = "payment_request";

/// A payment request as embedded in a QR code.
///
/// The payload is a single JSON object; the string form produced by
/// [`encode`](PaymentRequest::encode) is what gets rendered as a QR image
/// on the requesting device and scanned back on the paying device.
///
/// # JSON Example
///
/// ```json
/// {
///   "type": "payment_request",
///   "amount": 75000,
///   "description": "Lunch order",
///   "merchant": "Người dùng Demo",
///   "recipient_id": "00000000-0000-0000-0000-0000000000d1",
///   "transaction_id": "qr_1766311200000",
///   "created_at": "2025-12-21T10:00:00Z"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Always `"payment_request"`; anything else fails decoding
    #[serde(rename = "type")]
    pub request_type: String,

    /// Requested amount in whole VND, must be positive
    pub amount: i64,

    /// What the payment is for
    pub description: String,

    /// Display name of the requesting party
    pub merchant: String,

    /// Account id of the requesting party
    pub recipient_id: Uuid,

    /// Time-based id, `qr_<unix millis>`; recorded as the resulting
    /// transaction's reference
    pub transaction_id: String,

    /// When the request was generated
    pub created_at: DateTime<Utc>,
}

impl PaymentRequest {
    /// Build a fresh payment request stamped with the current time.
    pub fn new(amount: i64, description: String, merchant: String, recipient_id: Uuid) -> Self {
        let created_at = Utc::now();
        Self {
            request_type: PAYMENT_REQUEST_TYPE.to_string(),
            amount,
            description,
            merchant,
            recipient_id,
            transaction_id: format!("qr_{}", created_at.timestamp_millis()),
            created_at,
        }
    }

    /// Serialize to the QR payload string.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a scanned payload string and check the discriminator.
    ///
    /// Returns a human-readable reason on failure; callers surface it as an
    /// invalid-payload error. Amount bounds are checked by the ledger rules,
    /// not here.
    pub fn decode(payload: &str) -> Result<Self, String> {
        let request: PaymentRequest =
            serde_json::from_str(payload).map_err(|e| format!("malformed payload: {e}"))?;
        if request.request_type != PAYMENT_REQUEST_TYPE {
            return Err(format!(
                "not a payment request (type was {:?})",
                request.request_type
            ));
        }
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_preserves_the_request() {
        let request = PaymentRequest::new(
            75_000,
            "Lunch order".to_string(),
            "Người dùng Demo".to_string(),
            Uuid::from_u128(0xd1),
        );
        let payload = request.encode().unwrap();
        let decoded = PaymentRequest::decode(&payload).unwrap();
        assert_eq!(decoded.amount, 75_000);
        assert_eq!(decoded.description, "Lunch order");
        assert_eq!(decoded.merchant, "Người dùng Demo");
        assert_eq!(decoded, request);
    }

    #[test]
    fn transaction_id_is_time_based() {
        let request = PaymentRequest::new(
            10_000,
            "x".to_string(),
            "m".to_string(),
            Uuid::new_v4(),
        );
        let millis: i64 = request
            .transaction_id
            .strip_prefix("qr_")
            .expect("qr_ prefix")
            .parse()
            .expect("millis suffix");
        assert_eq!(millis, request.created_at.timestamp_millis());
    }

    #[test]
    fn wrong_type_discriminator_is_rejected() {
        let payload = serde_json::json!({
            "type": "refund_request",
            "amount": 50_000,
            "description": "d",
            "merchant": "m",
            "recipient_id": Uuid::new_v4(),
            "transaction_id": "qr_1",
            "created_at": Utc::now(),
        })
        .to_string();
        let err = PaymentRequest::decode(&payload).unwrap_err();
        assert!(err.contains("not a payment request"));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(PaymentRequest::decode("not json at all").is_err());
        assert!(PaymentRequest::decode("{\"type\":\"payment_request\"}").is_err());
    }
}
