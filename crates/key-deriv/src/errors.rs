//! Errors for key derivation, extended key decoding and path parsing.

use thiserror::Error;

use crate::{network::Version, paths::ChildNumber};

/// Error type for every fallible operation of this crate.
///
/// All variants are local, value-level failures: no operation leaves a partially built
/// key behind, and none of them indicate corrupted process state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DerivationError {
    /// `HMAC-SHA512("Bitcoin seed", seed)` produced a left half that is zero or not below
    /// the curve order. The seed must be rejected.
    #[error("seed produces an invalid master key")]
    InvalidMasterKey,

    /// The child at this index does not exist (`IL >= n`, zero scalar or point at
    /// infinity). Callers may retry with the next index.
    #[error("child {0} is not a valid key, try the next index")]
    InvalidChildKey(ChildNumber),

    /// Hardened derivation was requested from a public-only key.
    #[error("cannot derive hardened child {0} from a public key")]
    HardenedFromPublicUnsupported(ChildNumber),

    /// The parent is already at depth 255.
    #[error("maximum derivation depth exceeded")]
    DepthOverflow,

    /// The binary form of an extended key is not well formed.
    #[error("malformed extended key: {0}")]
    MalformedExtendedKey(#[from] MalformedKey),

    /// The trailing four bytes do not match the double-SHA256 of the payload.
    #[error("checksum mismatch: expected {}, got {}", hex::encode(expected), hex::encode(actual))]
    ChecksumMismatch {
        /// Checksum recomputed from the payload.
        expected: [u8; 4],
        /// Checksum found in the data.
        actual: [u8; 4],
    },

    /// The version tag is not registered for any network.
    #[error("unknown extended key version {0}")]
    UnknownVersion(Version),

    /// The text form is not valid Base58.
    #[error("invalid base58: {0}")]
    InvalidBase58(#[from] bs58::decode::Error),

    /// A textual derivation path does not follow `m(/\d+'?)*`.
    #[error("invalid derivation path syntax: {0}")]
    InvalidPathSyntax(String),

    /// A child index does not fit in 31 bits.
    #[error("child index {0} is out of range, must be below 2^31")]
    IndexOutOfRange(u64),
}

/// Reasons an 82-byte extended key payload is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MalformedKey {
    /// The data is not exactly 82 bytes long.
    #[error("expected 82 bytes, got {0}")]
    InvalidLength(usize),

    /// A private key must be prefixed with a zero byte.
    #[error("private key data must start with 0x00, found {0:#04x}")]
    InvalidPrivatePrefix(u8),

    /// The private scalar is zero or not below the curve order.
    #[error("private key scalar is out of range")]
    InvalidPrivateScalar,

    /// The public key bytes are not a valid compressed curve point.
    #[error("public key is not a valid compressed point")]
    InvalidPublicPoint,

    /// A depth-zero key carries a parent fingerprint or child number.
    #[error("master key must have zero parent fingerprint and child number")]
    NonZeroMasterMetadata,
}

/// A network name that is not registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown network {0:?}, expected bitcoin or testnet")]
pub struct ParseNetworkError(pub String);
