//! # Cascade cipher engine
//!
//! Composes three block-cipher adapters, each under its own 256-bit key:
//!
//! ```text
//! encrypt: plaintext ─Twofish─▶ ─Serpent─▶ ─AES─▶ body ──▶ body || HMAC-SHA256(body)
//! decrypt: verify tag ─▶ AES⁻¹ ─▶ Serpent⁻¹ ─▶ Twofish⁻¹ ─▶ plaintext
//! ```
//!
//! Every layer prepends its own random IV, so encryption is non-deterministic.
//! The body is authenticated with an HMAC whose key is derived (HKDF-SHA256)
//! from all three layer keys; CBC alone is malleable, so without the tag a
//! flipped IV byte would silently flip a plaintext byte.
//!
//! Ciphertext carries no key-version metadata. See [`candidates`] for how
//! decryption finds the right version triple.

pub mod candidates;

pub use candidates::CandidateSet;

use crate::common::key::KEY_SIZE;
use crate::error::{Error, Result};
use crate::symmetric::{Aes256Cbc, BlockCipherSystem, SerpentCbc, TwofishCbc};
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Length of the authentication tag appended to the cascade body.
pub const TAG_SIZE: usize = 32;

const MAC_KEY_INFO: &[u8] = b"cascade-seal/v1/body-mac";

/// One layer of the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Layer A, applied first on encryption.
    Twofish,
    /// Layer B.
    Serpent,
    /// Layer C, applied last on encryption.
    Aes,
}

impl Layer {
    /// Encryption order.
    pub const ALL: [Layer; 3] = [Layer::Twofish, Layer::Serpent, Layer::Aes];

    pub fn algorithm(&self) -> &'static str {
        match self {
            Layer::Twofish => TwofishCbc::NAME,
            Layer::Serpent => SerpentCbc::NAME,
            Layer::Aes => Aes256Cbc::NAME,
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Layer::Twofish => "Twofish",
            Layer::Serpent => "Serpent",
            Layer::Aes => "AES",
        })
    }
}

/// Borrowed key triple, one key per layer. Keys may be identical.
#[derive(Clone, Copy)]
pub struct LayerKeys<'a> {
    pub twofish: &'a [u8],
    pub serpent: &'a [u8],
    pub aes: &'a [u8],
}

impl<'a> LayerKeys<'a> {
    pub fn new(twofish: &'a [u8], serpent: &'a [u8], aes: &'a [u8]) -> Self {
        Self {
            twofish,
            serpent,
            aes,
        }
    }

    /// Uses the same key for all three layers.
    pub fn uniform(key: &'a [u8]) -> Self {
        Self::new(key, key, key)
    }

    fn get(&self, layer: Layer) -> &'a [u8] {
        match layer {
            Layer::Twofish => self.twofish,
            Layer::Serpent => self.serpent,
            Layer::Aes => self.aes,
        }
    }

    /// Fails with [`Error::InvalidKeySize`] naming the first bad layer.
    pub fn validate(&self) -> Result<()> {
        for layer in Layer::ALL {
            let actual = self.get(layer).len();
            if actual != KEY_SIZE {
                return Err(Error::InvalidKeySize {
                    layer,
                    expected: KEY_SIZE,
                    actual,
                });
            }
        }
        Ok(())
    }

    fn mac(&self) -> Result<HmacSha256> {
        let mut ikm = Zeroizing::new(Vec::with_capacity(3 * KEY_SIZE));
        for layer in Layer::ALL {
            ikm.extend_from_slice(self.get(layer));
        }
        let mut mac_key = Zeroizing::new([0u8; 32]);
        Hkdf::<Sha256>::new(None, &ikm)
            .expand(MAC_KEY_INFO, &mut mac_key[..])
            .map_err(|_| Error::DecryptionFailed)?;
        <HmacSha256 as Mac>::new_from_slice(&mac_key[..]).map_err(|_| Error::DecryptionFailed)
    }
}

impl fmt::Debug for LayerKeys<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerKeys").finish_non_exhaustive()
    }
}

/// The three-layer cascade. Stateless; all state lives in the keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct CascadeCipher;

impl CascadeCipher {
    /// Encrypts `plaintext` with Twofish, then Serpent, then AES, and appends
    /// the body tag.
    pub fn encrypt(plaintext: &[u8], keys: &LayerKeys<'_>) -> Result<Vec<u8>> {
        if plaintext.is_empty() {
            return Err(Error::EmptyInput);
        }
        keys.validate()?;

        let twofish = TwofishCbc::encrypt_block(plaintext, keys.twofish).map_err(|source| {
            Error::Encryption {
                layer: Layer::Twofish,
                source,
            }
        })?;
        let serpent = SerpentCbc::encrypt_block(&twofish, keys.serpent).map_err(|source| {
            Error::Encryption {
                layer: Layer::Serpent,
                source,
            }
        })?;
        let mut body = Aes256Cbc::encrypt_block(&serpent, keys.aes).map_err(|source| {
            Error::Encryption {
                layer: Layer::Aes,
                source,
            }
        })?;

        let mut mac = keys.mac()?;
        mac.update(&body);
        body.extend_from_slice(&mac.finalize().into_bytes());
        Ok(body)
    }

    /// Exact mirror of [`CascadeCipher::encrypt`].
    ///
    /// Any failure after key validation is reported as
    /// [`Error::DecryptionFailed`], without saying which step failed.
    pub fn decrypt(ciphertext: &[u8], keys: &LayerKeys<'_>) -> Result<Vec<u8>> {
        if ciphertext.is_empty() {
            return Err(Error::EmptyInput);
        }
        keys.validate()?;

        let Some(body_len) = ciphertext.len().checked_sub(TAG_SIZE) else {
            return Err(Error::DecryptionFailed);
        };
        let (body, tag) = ciphertext.split_at(body_len);

        let mut mac = keys.mac()?;
        mac.update(body);
        mac.verify_slice(tag).map_err(|_| Error::DecryptionFailed)?;

        Self::unwrap_layers(body, keys).map_err(|_| Error::DecryptionFailed)
    }

    fn unwrap_layers(
        body: &[u8],
        keys: &LayerKeys<'_>,
    ) -> std::result::Result<Vec<u8>, crate::symmetric::BlockCipherError> {
        let serpent = Aes256Cbc::decrypt_block(body, keys.aes)?;
        let twofish = SerpentCbc::decrypt_block(&serpent, keys.serpent)?;
        TwofishCbc::decrypt_block(&twofish, keys.twofish)
    }
}
