//! Curve arithmetic over secp256k1.
//!
//! Every scalar and point that enters a key goes through one of these functions, so the
//! `[1, n-1]` range of private scalars and the validity of public points are checked in
//! one place. The arithmetic itself is delegated to libsecp256k1 through the global
//! context.

use secp256k1::{PublicKey, Scalar, SecretKey, SECP256K1};

/// Size of a compressed public key.
pub const COMPRESSED_POINT_SIZE: usize = 33;

/// Parses a private scalar, rejecting zero and values not below the curve order.
pub fn parse_secret(bytes: &[u8; 32]) -> Option<SecretKey> {
    SecretKey::from_slice(bytes).ok()
}

/// Parses a tweak scalar, rejecting values not below the curve order. Zero is allowed.
pub fn parse_tweak(bytes: &[u8; 32]) -> Option<Scalar> {
    Scalar::from_be_bytes(*bytes).ok()
}

/// Computes `scalar * G`.
pub fn scalar_mul_base(secret: &SecretKey) -> PublicKey {
    PublicKey::from_secret_key(SECP256K1, secret)
}

/// Computes `(secret + tweak) mod n`, or `None` when the sum is zero.
pub fn add_scalars(secret: &SecretKey, tweak: &Scalar) -> Option<SecretKey> {
    secret.add_tweak(tweak).ok()
}

/// Computes `point + tweak * G`, or `None` for the point at infinity.
pub fn add_tweak_point(point: &PublicKey, tweak: &Scalar) -> Option<PublicKey> {
    point.add_exp_tweak(SECP256K1, tweak).ok()
}

/// Computes `a + b`, or `None` for the point at infinity.
pub fn point_add(a: &PublicKey, b: &PublicKey) -> Option<PublicKey> {
    a.combine(b).ok()
}

/// Serializes a point in 33-byte compressed form.
pub fn compress(point: &PublicKey) -> [u8; COMPRESSED_POINT_SIZE] {
    point.serialize()
}

/// Parses a 33-byte compressed point, rejecting anything not on the curve.
pub fn decompress(bytes: &[u8; COMPRESSED_POINT_SIZE]) -> Option<PublicKey> {
    match bytes[0] {
        0x02 | 0x03 => PublicKey::from_slice(bytes).ok(),
        _ => None,
    }
}
