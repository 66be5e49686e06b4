//! Webhook signature verification.
//!
//! GitHub signs the raw request body with HMAC-SHA256 and sends the
//! result as `X-Hub-Signature-256: sha256=<hex>`. Verification runs
//! before any payload decode; the comparison goes through the MAC's own
//! constant-time check.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";

/// Check a signature header against the raw body and shared secret.
///
/// Any malformed header (missing prefix, bad hex) fails closed.
pub fn verify_signature(secret: &str, body: &[u8], signature_header: &str) -> bool {
    let Some(sig_hex) = signature_header.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Ok(sig_bytes) = hex::decode(sig_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&sig_bytes).is_ok()
}
