//! Payment Callback Handling
//!
//! Verifies server-to-server callbacks sent by the gateway to the
//! configured `callback_url`. The body is signed with HMAC-SHA256 using a
//! shared secret and the hex digest is sent in the `x-signature` header.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{PaymentError, Result};
use crate::transaction::PaymentStatus;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex signature
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Parsed callback payload
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCallback {
    pub transaction_ref: String,

    #[serde(default)]
    pub status: PaymentStatus,
}

/// Callback signature verifier
#[derive(Clone)]
pub struct CallbackVerifier {
    secret: String,
}

impl std::fmt::Debug for CallbackVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackVerifier").finish_non_exhaustive()
    }
}

impl CallbackVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    /// Create from `PAYMENT_CALLBACK_SECRET`; `None` when unset or blank
    pub fn from_env() -> Option<Self> {
        std::env::var("PAYMENT_CALLBACK_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(Self::new)
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| PaymentError::Config(format!("invalid callback secret: {e}")))
    }

    /// Hex signature for a payload
    pub fn sign(&self, payload: &str) -> Result<String> {
        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Verify the signature and parse the payload
    pub fn verify(&self, payload: &str, signature: &str) -> Result<PaymentCallback> {
        let expected = hex::decode(signature.trim())
            .map_err(|e| PaymentError::CallbackSignature(format!("signature is not hex: {e}")))?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&expected)
            .map_err(|_| PaymentError::CallbackSignature("signature mismatch".into()))?;

        let callback: PaymentCallback = serde_json::from_str(payload)
            .map_err(|e| PaymentError::CallbackParse(e.to_string()))?;

        tracing::info!(
            transaction_ref = %callback.transaction_ref,
            status = %callback.status,
            "Verified payment callback"
        );

        Ok(callback)
    }
}
