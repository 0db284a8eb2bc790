//! `X-Hub-Signature` verification.
//!
//! The platform signs every webhook POST body with HMAC-SHA1 keyed by the
//! app secret and sends `sha1=<lowercase hex>` in the `X-Hub-Signature`
//! header. Verification recomputes the digest over the raw body bytes.

use crate::messenger::error::{MessengerError, MessengerResult};
use hmac::{Hmac, Mac};
use log::warn;
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Prefix of the signature header value.
pub const SIGNATURE_PREFIX: &str = "sha1=";

/// Verifier keyed once with the app secret.
///
/// Without a secret every payload passes; see [`SignatureVerifier::disabled`].
#[derive(Clone)]
pub struct SignatureVerifier {
    mac: Option<HmacSha1>,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl SignatureVerifier {
    /// Key the verifier. `None` disables verification.
    ///
    /// An empty secret or a key the MAC rejects is a configuration error.
    pub fn new(app_secret: Option<&str>) -> MessengerResult<Self> {
        match app_secret {
            Some(secret) => {
                if secret.is_empty() {
                    return Err(MessengerError::invalid_config("App secret must not be empty"));
                }
                let mac = HmacSha1::new_from_slice(secret.as_bytes()).map_err(|e| {
                    MessengerError::invalid_config(format!("HMAC-SHA1 key setup failed: {}", e))
                })?;
                Ok(Self { mac: Some(mac) })
            }
            None => Ok(Self::disabled()),
        }
    }

    /// Insecure mode: accepts every payload. Development only.
    pub fn disabled() -> Self {
        warn!("No app secret configured; webhook signature verification is disabled");
        Self { mac: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.mac.is_some()
    }

    /// Check `signature` (the raw `X-Hub-Signature` value) against `payload`.
    ///
    /// Never fails on malformed input: an absent header, a missing `sha1=`
    /// prefix or a wrong digest all return `false`.
    pub fn verify(&self, payload: &[u8], signature: Option<&str>) -> bool {
        let Some(ref mac) = self.mac else {
            return true;
        };
        let Some(expected) = signature.and_then(|s| s.strip_prefix(SIGNATURE_PREFIX)) else {
            return false;
        };
        let computed = Self::digest_hex(mac, payload);
        constant_time_eq(computed.as_bytes(), expected.as_bytes())
    }

    /// Produce the `sha1=<hex>` header value for `payload`, or `None` when
    /// verification is disabled.
    pub fn sign(&self, payload: &[u8]) -> Option<String> {
        self.mac
            .as_ref()
            .map(|mac| format!("{}{}", SIGNATURE_PREFIX, Self::digest_hex(mac, payload)))
    }

    fn digest_hex(mac: &HmacSha1, payload: &[u8]) -> String {
        let mut mac = mac.clone();
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }
}

/// Byte equality whose running time does not depend on where the inputs differ.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "my_app_secret";

    fn verifier() -> SignatureVerifier {
        SignatureVerifier::new(Some(SECRET)).unwrap()
    }

    #[test]
    fn sign_then_verify() {
        let v = verifier();
        let bodies: [&[u8]; 4] = [b"", b"{}", b"{\"object\":\"page\",\"entry\":[]}", &[0xff, 0x00, 0x10]];
        for body in bodies {
            let sig = v.sign(body).unwrap();
            assert!(sig.starts_with("sha1="));
            assert!(v.verify(body, Some(&sig)));
        }
    }

    #[test]
    fn known_vector() {
        // RFC 2202 test case 2
        let v = SignatureVerifier::new(Some("Jefe")).unwrap();
        let sig = "sha1=effcdf6ae5eb2fa2d27416d5f184df9c259a7c79";
        assert!(v.verify(b"what do ya want for nothing?", Some(sig)));
        assert_eq!(v.sign(b"what do ya want for nothing?").as_deref(), Some(sig));
    }

    #[test]
    fn matches_independent_hmac() {
        let body = b"test payload body";
        let mut mac = HmacSha1::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(body);
        let sig = format!("sha1={}", hex::encode(mac.finalize().into_bytes()));
        assert!(verifier().verify(body, Some(&sig)));
    }

    #[test]
    fn rejects_malformed_signatures() {
        let v = verifier();
        let body = b"payload";
        let good = v.sign(body).unwrap();
        let hex_part = good.strip_prefix("sha1=").unwrap();

        assert!(!v.verify(body, None));
        assert!(!v.verify(body, Some("")));
        assert!(!v.verify(body, Some(hex_part)));
        assert!(!v.verify(body, Some(&format!("sha256={}", hex_part))));
        assert!(!v.verify(body, Some("sha1=")));
        assert!(!v.verify(body, Some("sha1=not-hex")));
        assert!(!v.verify(body, Some(&format!("sha1={}", hex_part.to_uppercase()))));
        assert!(!v.verify(b"other payload", Some(&good)));
    }

    #[test]
    fn wrong_secret_fails() {
        let sig = SignatureVerifier::new(Some("other_secret"))
            .unwrap()
            .sign(b"body")
            .unwrap();
        assert!(!verifier().verify(b"body", Some(&sig)));
    }

    #[test]
    fn disabled_accepts_everything() {
        let v = SignatureVerifier::new(None).unwrap();
        assert!(!v.is_enabled());
        assert!(v.verify(b"anything", None));
        assert!(v.verify(b"anything", Some("garbage")));
        assert!(v.sign(b"anything").is_none());
    }

    #[test]
    fn empty_secret_is_config_error() {
        let err = SignatureVerifier::new(Some("")).unwrap_err();
        assert_eq!(err.code, crate::messenger::error::MessengerErrorCode::InvalidConfig);
    }

    #[test]
    fn constant_time_eq_basics() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
        assert!(constant_time_eq(b"", b""));
    }
}
