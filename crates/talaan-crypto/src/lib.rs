//! Field confidentiality service for person-identifying roster fields.
//!
//! AES-256-GCM encryption with HKDF per-sub-unit key derivation. Every
//! sub-unit gets its own derived key, so ciphertext never decrypts across
//! sub-unit boundaries. Consumers of this crate only ever exchange
//! plaintext field values; the stored form is `nonce || ciphertext || tag`.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use hkdf::Hkdf;
use sha2::Sha256;
use thiserror::Error;

use talaan_core::SubUnitId;

/// Length of AES-256 key in bytes.
const KEY_LENGTH: usize = 32;

/// Length of GCM nonce in bytes.
const NONCE_LENGTH: usize = 12;

/// Length of GCM authentication tag in bytes.
const TAG_LENGTH: usize = 16;

/// Context string for HKDF key derivation.
const HKDF_INFO: &[u8] = b"talaan-field-confidentiality-v1";

/// Errors produced while sealing or opening confidential fields.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Sealing a field failed.
    #[error("seal failed: {message}")]
    SealFailed { message: String },

    /// Opening a field failed (wrong key, truncation, or tampering).
    #[error("open failed: {message}")]
    OpenFailed { message: String },

    /// The supplied master key material is unusable.
    #[error("invalid master key: {message}")]
    InvalidKey { message: String },
}

/// Result alias for confidentiality operations.
pub type CryptoResult<T> = std::result::Result<T, CryptoError>;

/// Service for sealing and opening person-identifying field values.
///
/// Uses AES-256-GCM with HKDF-derived per-sub-unit keys.
#[derive(Clone)]
pub struct FieldCipher {
    /// Master key for deriving sub-unit-specific keys.
    master_key: [u8; KEY_LENGTH],
}

impl FieldCipher {
    /// Create a new cipher with the given master key.
    #[must_use]
    pub fn new(master_key: [u8; KEY_LENGTH]) -> Self {
        Self { master_key }
    }

    /// Create a new cipher from a hex-encoded master key.
    pub fn from_hex(hex_key: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(hex_key).map_err(|e| CryptoError::InvalidKey {
            message: format!("invalid hex key: {e}"),
        })?;
        Self::from_bytes(&bytes)
    }

    /// Create a new cipher from a base64-encoded master key.
    pub fn from_base64(base64_key: &str) -> CryptoResult<Self> {
        use base64::{engine::general_purpose::STANDARD, Engine};

        let bytes = STANDARD
            .decode(base64_key)
            .map_err(|e| CryptoError::InvalidKey {
                message: format!("invalid base64 key: {e}"),
            })?;
        Self::from_bytes(&bytes)
    }

    fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != KEY_LENGTH {
            return Err(CryptoError::InvalidKey {
                message: format!("key must be {} bytes, got {}", KEY_LENGTH, bytes.len()),
            });
        }

        let mut key = [0u8; KEY_LENGTH];
        key.copy_from_slice(bytes);
        Ok(Self::new(key))
    }

    /// Derive a sub-unit-specific key using HKDF.
    ///
    /// # Panics
    ///
    /// Panics if HKDF expansion fails, which cannot happen with a 32-byte
    /// output length (HKDF-SHA256 expands up to 255 * 32 bytes).
    fn derive_sub_unit_key(&self, sub_unit: SubUnitId) -> [u8; KEY_LENGTH] {
        let hkdf = Hkdf::<Sha256>::new(Some(sub_unit.as_uuid().as_bytes()), &self.master_key);
        let mut derived_key = [0u8; KEY_LENGTH];
        hkdf.expand(HKDF_INFO, &mut derived_key)
            .expect("HKDF-SHA256 supports 32-byte output; this is a programming error if it fails");
        derived_key
    }

    /// Seal a field value for a specific sub-unit.
    ///
    /// Returns `nonce || ciphertext || tag`.
    pub fn seal(&self, sub_unit: SubUnitId, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        let key = self.derive_sub_unit_key(sub_unit);
        let cipher = Aes256Gcm::new_from_slice(&key).map_err(|e| CryptoError::SealFailed {
            message: format!("failed to create cipher: {e}"),
        })?;

        // Nonce from the OS CSPRNG; never reused because it is random per seal.
        use rand::rngs::OsRng;
        use rand::RngCore;
        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| CryptoError::SealFailed {
                message: format!("encryption failed: {e}"),
            })?;

        let mut result = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);

        Ok(result)
    }

    /// Open a sealed field value for a specific sub-unit.
    ///
    /// The sub-unit must match the one used to seal; opening with any
    /// other sub-unit fails authentication.
    pub fn open(&self, sub_unit: SubUnitId, sealed: &[u8]) -> CryptoResult<Vec<u8>> {
        if sealed.len() < NONCE_LENGTH + TAG_LENGTH {
            return Err(CryptoError::OpenFailed {
                message: "sealed value too short".to_string(),
            });
        }

        let key = self.derive_sub_unit_key(sub_unit);
        let cipher = Aes256Gcm::new_from_slice(&key).map_err(|e| CryptoError::OpenFailed {
            message: format!("failed to create cipher: {e}"),
        })?;

        let (nonce_bytes, encrypted) = sealed.split_at(NONCE_LENGTH);
        let nonce = Nonce::from_slice(nonce_bytes);

        cipher
            .decrypt(nonce, encrypted)
            .map_err(|e| CryptoError::OpenFailed {
                message: format!("decryption failed: {e}"),
            })
    }

    /// Seal a string field value.
    pub fn seal_str(&self, sub_unit: SubUnitId, plaintext: &str) -> CryptoResult<Vec<u8>> {
        self.seal(sub_unit, plaintext.as_bytes())
    }

    /// Open a sealed value back to a string field.
    pub fn open_str(&self, sub_unit: SubUnitId, sealed: &[u8]) -> CryptoResult<String> {
        let plaintext = self.open(sub_unit, sealed)?;
        String::from_utf8(plaintext).map_err(|e| CryptoError::OpenFailed {
            message: format!("opened data is not valid UTF-8: {e}"),
        })
    }
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCipher")
            .field("master_key", &"[REDACTED]")
            .finish()
    }
}

/// Generate a random master key.
///
/// Intended for initial setup and tests only.
#[must_use]
pub fn generate_master_key() -> [u8; KEY_LENGTH] {
    use rand::rngs::OsRng;
    use rand::RngCore;
    let mut key = [0u8; KEY_LENGTH];
    OsRng.fill_bytes(&mut key);
    key
}

/// Generate a random master key as a hex string.
#[must_use]
pub fn generate_master_key_hex() -> String {
    hex::encode(generate_master_key())
}
