//! Signed session tokens.
//!
//! A token is `<payload>.<signature>`, both base64url without padding. The
//! payload is the JSON object `{"sub": <user id>}` and the signature is
//! HMAC-SHA256 of the encoded payload under the application secret.
//!
//! Tokens carry no expiry; their lifetime is the cookie's `Max-Age`. Rotating
//! the secret invalidates every outstanding token.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use fitshop_core::UserId;

use super::AuthError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Serialize, Deserialize)]
struct Claims {
    sub: UserId,
}

/// Issues and verifies session tokens.
#[derive(Clone)]
pub struct TokenCodec {
    mac: HmacSha256,
}

impl TokenCodec {
    /// Key a codec with the application secret.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLength` if the MAC rejects the key.
    pub fn new(secret: &SecretString) -> Result<Self, hmac::digest::InvalidLength> {
        let mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())?;
        Ok(Self { mac })
    }

    /// Sign a token for `user_id`. Deterministic for a given secret.
    #[must_use]
    pub fn issue(&self, user_id: UserId) -> String {
        // Serializing a struct holding one integer cannot fail.
        let payload = serde_json::to_vec(&Claims { sub: user_id }).unwrap_or_default();
        let payload = URL_SAFE_NO_PAD.encode(payload);

        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        format!("{payload}.{signature}")
    }

    /// Verify a token and return the user it was issued for.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidSignature` if the token is malformed or its
    /// signature does not match the current secret.
    pub fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        let (payload, signature) = token.split_once('.').ok_or(AuthError::InvalidSignature)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::InvalidSignature)?;

        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        // verify_slice compares in constant time
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::InvalidSignature)?;
        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| AuthError::InvalidSignature)?;

        Ok(claims.sub)
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn codec(secret: &str) -> TokenCodec {
        TokenCodec::new(&SecretString::from(secret.to_string())).unwrap()
    }

    #[test]
    fn test_verify_returns_issued_id() {
        let codec = codec("k3Jd9sLq0Zx8Vb2Nw7Rt5Yp1Hc4Mf6Ga");
        for id in [1, 42, i32::MAX] {
            let token = codec.issue(UserId::new(id));
            assert_eq!(codec.verify(&token).unwrap(), UserId::new(id));
        }
    }

    #[test]
    fn test_issue_is_deterministic() {
        let codec = codec("k3Jd9sLq0Zx8Vb2Nw7Rt5Yp1Hc4Mf6Ga");
        assert_eq!(codec.issue(UserId::new(5)), codec.issue(UserId::new(5)));
        assert_ne!(codec.issue(UserId::new(5)), codec.issue(UserId::new(6)));
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let token = codec("k3Jd9sLq0Zx8Vb2Nw7Rt5Yp1Hc4Mf6Ga").issue(UserId::new(1));
        let result = codec("Qw8Er7Ty6Ui5Op4As3Df2Gh1Jk0Lz9Xc").verify(&token);
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        let codec = codec("k3Jd9sLq0Zx8Vb2Nw7Rt5Yp1Hc4Mf6Ga");
        for token in ["", ".", "abc", "abc.", ".abc", "not base64!.x", "a.b.c"] {
            assert!(
                matches!(codec.verify(token), Err(AuthError::InvalidSignature)),
                "accepted {token:?}"
            );
        }
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let codec = codec("k3Jd9sLq0Zx8Vb2Nw7Rt5Yp1Hc4Mf6Ga");
        let token = codec.issue(UserId::new(1));
        let (_, signature) = token.split_once('.').unwrap();
        let forged = format!("{}.{signature}", URL_SAFE_NO_PAD.encode(br#"{"sub":2}"#));

        assert!(matches!(codec.verify(&forged), Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn test_signed_garbage_payload_is_rejected() {
        let codec = codec("k3Jd9sLq0Zx8Vb2Nw7Rt5Yp1Hc4Mf6Ga");
        let payload = URL_SAFE_NO_PAD.encode(b"not json");
        let mut mac = codec.mac.clone();
        mac.update(payload.as_bytes());
        let token = format!(
            "{payload}.{}",
            URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
        );

        assert!(matches!(codec.verify(&token), Err(AuthError::InvalidSignature)));
    }
}
