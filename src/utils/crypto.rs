use aes_gcm::{
    aead::{generic_array::GenericArray, AeadInPlace, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;
use thiserror::Error;

const NONCE_LEN: usize = 12;
const GCM_TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;
// Packed payload is nonce + tag + ciphertext; ciphertext can be empty.
const MIN_ENCRYPTED_BYTES: usize = NONCE_LEN + GCM_TAG_LEN;
const BASE64_KEY_PREFIX: &str = "base64:";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("invalid encryption key: {0}")]
    InvalidKey(String),

    #[error("malformed token blob: {0}")]
    Format(String),

    #[error("token authentication failed (tampered data or wrong key)")]
    Authentication,
}

fn resolve_key_bytes(raw: &str) -> Result<Vec<u8>, CodecError> {
    let bytes = match raw.strip_prefix(BASE64_KEY_PREFIX) {
        Some(encoded) => general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| CodecError::InvalidKey(format!("base64 decode failed: {}", e)))?,
        None => raw.as_bytes().to_vec(),
    };
    if bytes.len() != KEY_LEN {
        return Err(CodecError::InvalidKey(format!(
            "expected {} bytes, got {}",
            KEY_LEN,
            bytes.len()
        )));
    }
    Ok(bytes)
}

/// Authenticated encryption of bearer tokens at rest.
///
/// Blobs are `base64(nonce ‖ tag ‖ ciphertext)` so they stay readable by the
/// provisioning tooling that wrote the existing store records.
#[derive(Clone)]
pub struct TokenCodec {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Builds a codec from the configured secret. Raw secrets are used
    /// byte-for-byte; `base64:`-prefixed secrets are decoded first.
    pub fn new(secret: &str) -> Result<Self, CodecError> {
        let key = resolve_key_bytes(secret)?;
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| CodecError::InvalidKey(e.to_string()))?;
        Ok(Self { cipher })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CodecError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let mut buffer = plaintext.as_bytes().to_vec();
        let tag = self
            .cipher
            .encrypt_in_place_detached(nonce, b"", &mut buffer)
            .map_err(|_| CodecError::Format("encryption failed".to_string()))?;

        let mut packed = Vec::with_capacity(MIN_ENCRYPTED_BYTES + buffer.len());
        packed.extend_from_slice(&nonce_bytes);
        packed.extend_from_slice(tag.as_slice());
        packed.extend_from_slice(&buffer);
        Ok(general_purpose::STANDARD.encode(packed))
    }

    pub fn decrypt(&self, blob: &str) -> Result<String, CodecError> {
        let decoded = general_purpose::STANDARD
            .decode(blob.trim())
            .map_err(|e| CodecError::Format(format!("base64 decode failed: {}", e)))?;
        if decoded.len() < MIN_ENCRYPTED_BYTES {
            return Err(CodecError::Format(format!(
                "blob is {} bytes, need at least {}",
                decoded.len(),
                MIN_ENCRYPTED_BYTES
            )));
        }

        let (nonce_bytes, rest) = decoded.split_at(NONCE_LEN);
        let (tag_bytes, ciphertext) = rest.split_at(GCM_TAG_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);
        let tag = GenericArray::from_slice(tag_bytes);

        let mut buffer = ciphertext.to_vec();
        self.cipher
            .decrypt_in_place_detached(nonce, b"", &mut buffer, tag)
            .map_err(|_| CodecError::Authentication)?;

        String::from_utf8(buffer)
            .map_err(|e| CodecError::Format(format!("UTF-8 conversion failed: {}", e)))
    }
}
