//! Hierarchical deterministic key derivation (BIP32) over secp256k1.
//!
//! This crate derives a master key from a seed, derives child keys from private and
//! public parents, serializes extended keys to their 82-byte binary and Base58 text forms,
//! and parses derivation paths.
//!
//! # Usage
//!
//! ```rust,ignore
//! use hdkeys_key_deriv::{DerivationPath, ExtendedKey, Network};
//!
//! // Create the master key from a seed
//! let master = ExtendedKey::new_master(&seed, Network::Bitcoin)?;
//!
//! // Derive an account key and export its public half
//! let path: DerivationPath = "m/44'/0'/0'".parse()?;
//! let account = master.derive_path(&path)?;
//! let xpub = account.neuter().to_string();
//!
//! // Import it elsewhere and keep deriving, public keys only
//! let account_xpub: ExtendedKey = xpub.parse()?;
//! let receive = account_xpub.derive_path(&"m/0/0".parse()?)?;
//! ```
//!
//! # Key Hierarchy
//!
//! Every node can derive all of its descendants. Hardened children (`'` in a path) can only
//! be derived from a private parent; normal children can also be derived from the parent's
//! neutered form, yielding the public half of the same child.

pub mod codec;
pub mod curve;
pub mod derive;
pub mod errors;
pub mod hash;
pub mod keys;
pub mod network;
pub mod paths;

pub use codec::{deserialize, from_base58, serialize, to_base58, SERIALIZED_SIZE};
pub use derive::{
    derive_child, derive_child_at, derive_child_with, derive_path, derive_path_with,
    master_from_seed, neuter, DeriveConfig, RetryPolicy,
};
pub use errors::{DerivationError, MalformedKey, ParseNetworkError};
pub use keys::{ChainCode, ExtendedKey, Fingerprint, KeyMaterial};
pub use network::{Network, Version};
pub use paths::{ChildNumber, DerivationPath, HARDENED_OFFSET};
