//! Core derivation functions.
//!
//! All functions are pure: they read their inputs and return a new [`ExtendedKey`],
//! so derivations along different paths from a shared parent can run on separate threads.
//!
//! # Usage
//!
//! ```rust,ignore
//! use hdkeys_key_deriv::{derive_path, master_from_seed, neuter, Network};
//!
//! let master = master_from_seed(&seed, Network::Bitcoin)?;
//! let account = derive_path(&master, &"m/44'/0'/0'".parse()?)?;
//!
//! // Hand out the public half; receive addresses are derived from it without secrets.
//! let account_xpub = neuter(&account);
//! let receive = derive_path(&account_xpub, &"m/0/0".parse()?)?;
//! ```

use tracing::{debug, warn};

use crate::{
    curve,
    errors::DerivationError,
    hash::hmac_sha512,
    keys::{ChainCode, ExtendedKey, Fingerprint, KeyMaterial},
    network::Network,
    paths::{ChildNumber, DerivationPath},
};

/// HMAC key used to derive the master key from a seed.
pub const MASTER_HMAC_KEY: &[u8] = b"Bitcoin seed";

/// Smallest seed length in bytes recommended by BIP32 (128 bits).
pub const RECOMMENDED_MIN_SEED_LEN: usize = 16;

/// What to do when a child index yields an invalid key.
///
/// This happens with probability below 2^-127 per index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Return [`DerivationError::InvalidChildKey`].
    #[default]
    Fail,

    /// Move on to the next index of the same kind until a valid child is found.
    ///
    /// The returned key's child number records the index actually used.
    SkipInvalid,
}

/// Configuration for child derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct DeriveConfig {
    /// Handling of invalid child indices.
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl DeriveConfig {
    /// Creates a config with the given retry policy.
    pub const fn new(retry: RetryPolicy) -> Self {
        Self { retry }
    }
}

/// Derives the master key of a tree from a seed.
///
/// BIP32 recommends seeds of 16 to 64 bytes; shorter seeds are accepted but logged.
/// Fails with [`DerivationError::InvalidMasterKey`] when the seed maps to an invalid
/// scalar, in which case the seed must be discarded.
pub fn master_from_seed(seed: &[u8], network: Network) -> Result<ExtendedKey, DerivationError> {
    if seed.len() < RECOMMENDED_MIN_SEED_LEN {
        warn!(len = seed.len(), "seed is shorter than 128 bits");
    }

    let (il, ir) = split(hmac_sha512(MASTER_HMAC_KEY, &[seed]));
    let secret = curve::parse_secret(&il).ok_or(DerivationError::InvalidMasterKey)?;

    debug!(%network, "derived master key");

    Ok(ExtendedKey {
        network,
        depth: 0,
        parent_fingerprint: Fingerprint::ZERO,
        child_number: ChildNumber::Normal { index: 0 },
        chain_code: ChainCode::new(ir),
        key: KeyMaterial::from_secret(secret),
    })
}

/// Derives the child of `parent` at `child`.
///
/// Private parents derive private children, public parents derive public children. Hardened
/// children of public parents fail with [`DerivationError::HardenedFromPublicUnsupported`].
pub fn derive_child(
    parent: &ExtendedKey,
    child: ChildNumber,
) -> Result<ExtendedKey, DerivationError> {
    if parent.depth == u8::MAX {
        return Err(DerivationError::DepthOverflow);
    }

    let ser32 = child.to_be_bytes();
    let (il, ir) = match (&parent.key, child.is_hardened()) {
        (KeyMaterial::Private { secret, .. }, true) => split(hmac_sha512(
            parent.chain_code.as_bytes(),
            &[&[0x00], &secret.secret_bytes(), &ser32],
        )),
        (KeyMaterial::Public(_), true) => {
            return Err(DerivationError::HardenedFromPublicUnsupported(child));
        }
        (key, false) => split(hmac_sha512(
            parent.chain_code.as_bytes(),
            &[&curve::compress(key.public_key()), &ser32],
        )),
    };

    let tweak = curve::parse_tweak(&il).ok_or(DerivationError::InvalidChildKey(child))?;
    let key = match &parent.key {
        KeyMaterial::Private { secret, .. } => curve::add_scalars(secret, &tweak)
            .map(KeyMaterial::from_secret)
            .ok_or(DerivationError::InvalidChildKey(child))?,
        KeyMaterial::Public(public) => curve::add_tweak_point(public, &tweak)
            .map(KeyMaterial::Public)
            .ok_or(DerivationError::InvalidChildKey(child))?,
    };

    let depth = parent.depth + 1;
    debug!(depth, %child, private = key.is_private(), "derived child key");

    Ok(ExtendedKey {
        network: parent.network,
        depth,
        parent_fingerprint: parent.fingerprint(),
        child_number: child,
        chain_code: ChainCode::new(ir),
        key,
    })
}

/// Derives the child at `index`, hardened or not.
///
/// Fails with [`DerivationError::IndexOutOfRange`] if `index >= 2^31`.
pub fn derive_child_at(
    parent: &ExtendedKey,
    index: u32,
    hardened: bool,
) -> Result<ExtendedKey, DerivationError> {
    derive_child(parent, ChildNumber::new(index, hardened)?)
}

/// Derives the child at `child`, applying the retry policy of `config`.
pub fn derive_child_with(
    parent: &ExtendedKey,
    child: ChildNumber,
    config: &DeriveConfig,
) -> Result<ExtendedKey, DerivationError> {
    let mut child = child;
    loop {
        match derive_child(parent, child) {
            Err(DerivationError::InvalidChildKey(skipped))
                if config.retry == RetryPolicy::SkipInvalid =>
            {
                warn!(%skipped, depth = parent.depth, "child index yields an invalid key, skipping");
                child = skipped.increment()?;
            }
            result => return result,
        }
    }
}

/// Drops the private scalar, keeping the public point, chain code and tree position.
///
/// Neutering a public key returns an equal key.
pub fn neuter(key: &ExtendedKey) -> ExtendedKey {
    ExtendedKey {
        network: key.network,
        depth: key.depth,
        parent_fingerprint: key.parent_fingerprint,
        child_number: key.child_number,
        chain_code: key.chain_code,
        key: KeyMaterial::Public(*key.public_key()),
    }
}

/// Replays `path` from `key`, stopping at the first failure.
pub fn derive_path(
    key: &ExtendedKey,
    path: &DerivationPath,
) -> Result<ExtendedKey, DerivationError> {
    derive_path_with(key, path, &DeriveConfig::default())
}

/// Replays `path` from `key` with the retry policy of `config`.
pub fn derive_path_with(
    key: &ExtendedKey,
    path: &DerivationPath,
    config: &DeriveConfig,
) -> Result<ExtendedKey, DerivationError> {
    path.iter().try_fold(key.clone(), |node, &child| {
        derive_child_with(&node, child, config)
    })
}

impl ExtendedKey {
    /// See [`master_from_seed`].
    pub fn new_master(seed: &[u8], network: Network) -> Result<Self, DerivationError> {
        master_from_seed(seed, network)
    }

    /// See [`derive_child`].
    pub fn derive_child(&self, child: ChildNumber) -> Result<Self, DerivationError> {
        derive_child(self, child)
    }

    /// See [`derive_path`].
    pub fn derive_path(&self, path: &DerivationPath) -> Result<Self, DerivationError> {
        derive_path(self, path)
    }

    /// See [`neuter`].
    pub fn neuter(&self) -> Self {
        neuter(self)
    }
}

/// Splits an HMAC-SHA512 output into `IL` and `IR`.
fn split(i: [u8; 64]) -> ([u8; 32], [u8; 32]) {
    let mut il = [0u8; 32];
    let mut ir = [0u8; 32];
    il.copy_from_slice(&i[..32]);
    ir.copy_from_slice(&i[32..]);
    (il, ir)
}
