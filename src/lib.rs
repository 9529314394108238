//! # Cascade-Seal: Three-Layer Cascade Encryption with Managed Keys
//!
//! `cascade-seal` encrypts text with three independent block ciphers applied
//! in sequence (Twofish, then Serpent, then AES, each in CBC mode under its
//! own 256-bit key) and manages the lifetime of those keys in a versioned
//! secret store with automatic rotation and retirement.
//!
//! ## Core Concepts
//!
//! - **`CascadeSeal`**: The main entry point. Validates input, resolves keys and runs the cascade.
//! - **`KeyLifecycleManager`**: Mints, rotates and retires key versions per logical key name.
//! - **`KeyVersionStore`**: A trait for integrating secret stores. `cascade-seal` provides
//!   in-memory and file-system implementations.
//! - **`CascadeCipher`**: The stateless three-layer cipher, usable directly with raw keys.
//!
//! Ciphertext carries no key-version marker. Decryption tries every retained
//! version of every layer's key, newest first, until one combination validates.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cascade_seal::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ConfigFile::new(ProviderConfig::File { directory: "./keys".into() })
//!         .apply_env_overrides()?;
//!     let seal = CascadeSeal::from_config(&config)?;
//!
//!     let ciphertext = seal.encrypt_cascade("Hello, Cascade-Seal!", "orders", "orders", "audit").await?;
//!     let plaintext = seal.decrypt_cascade(&ciphertext, "orders", "orders", "audit").await?;
//!
//!     assert_eq!(plaintext, "Hello, Cascade-Seal!");
//!     Ok(())
//! }
//! ```

pub mod cascade;
pub mod common;
pub mod error;
pub mod rotation;
pub mod seal;
pub mod storage;
pub mod symmetric;

pub use cascade::{CandidateSet, CascadeCipher, Layer, LayerKeys};
pub use error::{Error, Result};
pub use rotation::{KeyLifecycleManager, RotationPolicy};
pub use seal::CascadeSeal;

// --- Prelude ---
// A collection of the most commonly used traits, structs, and enums.
pub mod prelude {
    pub use crate::cascade::{CascadeCipher, LayerKeys};
    pub use crate::common::{CascadeKeyNames, ConfigFile, KeyMaterial, KeyName, ProviderConfig};
    pub use crate::error::{Error, Result};
    pub use crate::rotation::{KeyLifecycleManager, RotationPolicy};
    pub use crate::seal::CascadeSeal;
    pub use crate::storage::{FileKeyStore, InMemoryKeyStore, KeyVersionStore};
}

/// The version of the `cascade-seal` crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
