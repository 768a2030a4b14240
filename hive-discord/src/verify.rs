//! Interaction request-signature verification.
//!
//! Discord signs every interactions-endpoint request with the application's
//! ed25519 key over `timestamp + body`; endpoints that fail to reject bad
//! signatures are deactivated, so verification failure must map to 401.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};

/// Holds the application's parsed public key.
#[derive(Clone)]
pub struct InteractionVerifier {
    key: VerifyingKey,
}

impl InteractionVerifier {
    /// Parse the hex public key as shown in the developer portal.
    pub fn from_hex(public_key: &str) -> Result<Self, VerifyError> {
        let bytes = hex::decode(public_key)?;
        let bytes: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| VerifyError::KeyLength(bytes.len()))?;
        let key = VerifyingKey::from_bytes(&bytes).map_err(|_| VerifyError::InvalidKey)?;
        Ok(Self { key })
    }

    /// Check the `X-Signature-Ed25519` header against the timestamp header
    /// and the raw request body. Malformed headers count as invalid.
    pub fn verify(&self, signature_hex: &str, timestamp: &str, body: &[u8]) -> bool {
        let Ok(sig_bytes) = hex::decode(signature_hex) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(&sig_bytes) else {
            return false;
        };
        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);
        self.key.verify(&message, &signature).is_ok()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("public key is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("public key must be 32 bytes, got {0}")]
    KeyLength(usize),
    #[error("public key is not a valid ed25519 point")]
    InvalidKey,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    fn keypair() -> (SigningKey, InteractionVerifier) {
        let signing = SigningKey::from_bytes(&[7u8; 32]);
        let verifier =
            InteractionVerifier::from_hex(&hex::encode(signing.verifying_key().as_bytes()))
                .unwrap();
        (signing, verifier)
    }

    #[test]
    fn accepts_a_correctly_signed_request() {
        let (signing, verifier) = keypair();
        let timestamp = "1700000000";
        let body = br#"{"type":1}"#;
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(body);
        let signature = hex::encode(signing.sign(&message).to_bytes());
        assert!(verifier.verify(&signature, timestamp, body));
    }

    #[test]
    fn rejects_a_tampered_body_or_garbage_signature() {
        let (signing, verifier) = keypair();
        let timestamp = "1700000000";
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(br#"{"type":1}"#);
        let signature = hex::encode(signing.sign(&message).to_bytes());

        assert!(!verifier.verify(&signature, timestamp, br#"{"type":2}"#));
        assert!(!verifier.verify("not-hex", timestamp, br#"{"type":1}"#));
        assert!(!verifier.verify(&signature, "1700000001", br#"{"type":1}"#));
    }

    #[test]
    fn key_parsing_rejects_bad_lengths() {
        assert!(matches!(
            InteractionVerifier::from_hex("abcd"),
            Err(VerifyError::KeyLength(2))
        ));
        assert!(InteractionVerifier::from_hex("zz").is_err());
    }
}
