use base64::{URL_SAFE_NO_PAD, decode_config, encode_config};
use p256::PublicKey;
use p256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::error::{Error, Result};
use crate::types::push::VapidConfig;

const UNCOMPRESSED_POINT_LEN: usize = 65;
const UNCOMPRESSED_POINT_TAG: u8 = 0x04;

/// The server's P-256 signing identity, both halves base64url without padding.
///
/// The public half is the uncompressed SEC1 point, the private half the raw
/// 32-byte scalar. Values of this type are always a matching, valid pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VapidKeys {
    public_key: String,
    private_key: String,
}

impl VapidKeys {
    pub fn generate() -> Self {
        let mut rng = OsRng;
        Self::generate_with_rng(&mut rng)
    }

    pub fn generate_with_rng<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut key_bytes = [0u8; 32];
        loop {
            rng.fill_bytes(&mut key_bytes);
            if let Ok(signing_key) = SigningKey::from_slice(&key_bytes) {
                return Self::from_signing_key(&signing_key);
            }
        }
    }

    /// Validates externally supplied keys. Meant to run once at startup.
    pub fn parse(public_key: &str, private_key: &str) -> Result<Self> {
        let public_bytes = decode_config(public_key.trim(), URL_SAFE_NO_PAD)
            .map_err(|err| invalid(format!("public key is not base64url: {err}")))?;
        if public_bytes.len() != UNCOMPRESSED_POINT_LEN
            || public_bytes[0] != UNCOMPRESSED_POINT_TAG
        {
            return Err(invalid(format!(
                "public key must be a {UNCOMPRESSED_POINT_LEN}-byte uncompressed point, got {} bytes",
                public_bytes.len()
            )));
        }
        PublicKey::from_sec1_bytes(&public_bytes)
            .map_err(|_| invalid("public key is not a point on P-256".to_string()))?;

        let private_bytes = decode_config(private_key.trim(), URL_SAFE_NO_PAD)
            .map_err(|err| invalid(format!("private key is not base64url: {err}")))?;
        let signing_key = SigningKey::from_slice(&private_bytes)
            .map_err(|_| invalid("private key is not a valid P-256 scalar".to_string()))?;

        let keys = Self::from_signing_key(&signing_key);
        let derived = keys.public_key_bytes()?;
        if derived != public_bytes {
            return Err(invalid(
                "public key does not belong to the private key".to_string(),
            ));
        }
        Ok(keys)
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    pub fn public_key_bytes(&self) -> Result<Vec<u8>> {
        decode_config(&self.public_key, URL_SAFE_NO_PAD)
            .map_err(|err| invalid(format!("public key is not base64url: {err}")))
    }

    pub fn into_config(self, subject: impl Into<String>) -> VapidConfig {
        VapidConfig {
            private_key: self.private_key,
            public_key: self.public_key,
            subject: subject.into(),
        }
    }

    fn from_signing_key(signing_key: &SigningKey) -> Self {
        let public_point = signing_key.verifying_key().to_encoded_point(false);
        Self {
            public_key: encode_config(public_point.as_bytes(), URL_SAFE_NO_PAD),
            private_key: encode_config(signing_key.to_bytes(), URL_SAFE_NO_PAD),
        }
    }
}

fn invalid(message: String) -> Error {
    Error::InvalidKeyFormat(message)
}
