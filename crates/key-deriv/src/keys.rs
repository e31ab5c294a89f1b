//! Key material and extended keys.
//!
//! An [`ExtendedKey`] is a private scalar or a public point, a chain code, and the node's
//! position in the tree. Values are immutable: derivation and neutering always build a
//! new key.

use std::fmt;

use secp256k1::{PublicKey, SecretKey};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    curve,
    hash::hash160,
    network::{Network, Version},
    paths::ChildNumber,
};

/// Size of a chain code in bytes.
pub const CHAIN_CODE_SIZE: usize = 32;

/// Size of a key fingerprint in bytes.
pub const FINGERPRINT_SIZE: usize = 4;

/// 32 bytes of entropy used as the HMAC key when deriving a node's children.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct ChainCode([u8; CHAIN_CODE_SIZE]);

impl ChainCode {
    /// Wraps raw chain code bytes.
    pub const fn new(bytes: [u8; CHAIN_CODE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the chain code bytes.
    pub const fn as_bytes(&self) -> &[u8; CHAIN_CODE_SIZE] {
        &self.0
    }
}

impl fmt::Debug for ChainCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainCode({})", hex::encode(self.0))
    }
}

impl Zeroize for ChainCode {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// First four bytes of the HASH160 of a compressed public key.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; FINGERPRINT_SIZE]);

impl Fingerprint {
    /// The all-zero fingerprint carried by master keys.
    pub const ZERO: Self = Self([0; FINGERPRINT_SIZE]);

    /// Wraps raw fingerprint bytes.
    pub const fn new(bytes: [u8; FINGERPRINT_SIZE]) -> Self {
        Self(bytes)
    }

    /// Computes the fingerprint of a public key.
    pub fn of(public_key: &PublicKey) -> Self {
        let id = hash160(&curve::compress(public_key));
        let mut bytes = [0u8; FINGERPRINT_SIZE];
        bytes.copy_from_slice(&id[..FINGERPRINT_SIZE]);
        Self(bytes)
    }

    /// Returns the fingerprint bytes.
    pub const fn as_bytes(&self) -> &[u8; FINGERPRINT_SIZE] {
        &self.0
    }

    /// Whether all bytes are zero.
    pub fn is_zero(&self) -> bool {
        self.0 == [0; FINGERPRINT_SIZE]
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", hex::encode(self.0))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// The key itself: a private scalar with its public point, or a public point alone.
#[derive(Clone, PartialEq, Eq)]
pub enum KeyMaterial {
    /// A private scalar in `[1, n-1]` and the point it generates.
    Private {
        /// The private scalar.
        secret: SecretKey,
        /// `secret * G`.
        public: PublicKey,
    },

    /// A neutered key.
    Public(PublicKey),
}

impl KeyMaterial {
    /// Key material for a private scalar.
    pub fn from_secret(secret: SecretKey) -> Self {
        let public = curve::scalar_mul_base(&secret);
        KeyMaterial::Private { secret, public }
    }

    /// The public point.
    pub const fn public_key(&self) -> &PublicKey {
        match self {
            KeyMaterial::Private { public, .. } | KeyMaterial::Public(public) => public,
        }
    }

    /// The private scalar, unless neutered.
    pub const fn secret_key(&self) -> Option<&SecretKey> {
        match self {
            KeyMaterial::Private { secret, .. } => Some(secret),
            KeyMaterial::Public(_) => None,
        }
    }

    /// Whether the private scalar is present.
    pub const fn is_private(&self) -> bool {
        matches!(self, KeyMaterial::Private { .. })
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyMaterial::Private { public, .. } => f
                .debug_struct("Private")
                .field("secret", &"<redacted>")
                .field("public", public)
                .finish(),
            KeyMaterial::Public(public) => f.debug_tuple("Public").field(public).finish(),
        }
    }
}

/// A key together with its chain code and its position in the derivation tree.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ExtendedKey {
    pub(crate) network: Network,
    pub(crate) depth: u8,
    pub(crate) parent_fingerprint: Fingerprint,
    pub(crate) child_number: ChildNumber,
    pub(crate) chain_code: ChainCode,
    pub(crate) key: KeyMaterial,
}

impl ExtendedKey {
    /// Network the key is tagged for.
    pub const fn network(&self) -> Network {
        self.network
    }

    /// Version tag: the network's private or public variant.
    pub fn version(&self) -> Version {
        self.network.version(self.is_private())
    }

    /// Number of derivation steps from the master key.
    pub const fn depth(&self) -> u8 {
        self.depth
    }

    /// Fingerprint of the parent's public key, zero for the master key.
    pub const fn parent_fingerprint(&self) -> Fingerprint {
        self.parent_fingerprint
    }

    /// The step used to reach this key from its parent, `Normal { index: 0 }` for the
    /// master key.
    pub const fn child_number(&self) -> ChildNumber {
        self.child_number
    }

    /// The chain code.
    pub const fn chain_code(&self) -> &ChainCode {
        &self.chain_code
    }

    /// The key material.
    pub const fn key_material(&self) -> &KeyMaterial {
        &self.key
    }

    /// The public point.
    pub const fn public_key(&self) -> &PublicKey {
        self.key.public_key()
    }

    /// The private scalar, unless neutered.
    pub const fn private_key(&self) -> Option<&SecretKey> {
        self.key.secret_key()
    }

    /// Whether the private scalar is present.
    pub const fn is_private(&self) -> bool {
        self.key.is_private()
    }

    /// Whether this is a public-only key.
    pub const fn is_neutered(&self) -> bool {
        !self.is_private()
    }

    /// HASH160 of the compressed public key.
    pub fn identifier(&self) -> [u8; 20] {
        hash160(&curve::compress(self.public_key()))
    }

    /// Fingerprint of this key, as carried by its children.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(self.public_key())
    }

    /// Whether this key sits at the root of its tree.
    pub fn is_master(&self) -> bool {
        self.depth == 0
    }
}

impl Drop for ExtendedKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl Zeroize for ExtendedKey {
    #[inline]
    fn zeroize(&mut self) {
        let Self {
            network: _,
            depth,
            parent_fingerprint,
            child_number,
            chain_code,
            key,
        } = self;

        // The network tag is public and left alone.
        // NOTE: `SecretKey::non_secure_erase` writes `1`s to the memory.
        depth.zeroize();
        parent_fingerprint.0.zeroize();
        *child_number = ChildNumber::Normal { index: 0 };
        chain_code.zeroize();
        if let KeyMaterial::Private { secret, .. } = key {
            secret.non_secure_erase();
        }
    }
}

impl ZeroizeOnDrop for ExtendedKey {}
