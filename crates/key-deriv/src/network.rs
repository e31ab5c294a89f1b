//! Network registry: maps each supported network to its pair of extended key version tags.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::{DerivationError, ParseNetworkError};

/// Size of an extended key version tag in bytes.
pub const VERSION_SIZE: usize = 4;

/// Networks with a registered pair of version tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Bitcoin main network (`xprv` / `xpub`).
    #[default]
    Bitcoin,

    /// Bitcoin test networks (`tprv` / `tpub`).
    Testnet,
}

/// Mainnet private version tag (`xprv`).
pub const MAINNET_PRIVATE: Version = Version::new([0x04, 0x88, 0xAD, 0xE4]);

/// Mainnet public version tag (`xpub`).
pub const MAINNET_PUBLIC: Version = Version::new([0x04, 0x88, 0xB2, 0x1E]);

/// Testnet private version tag (`tprv`).
pub const TESTNET_PRIVATE: Version = Version::new([0x04, 0x35, 0x83, 0x94]);

/// Testnet public version tag (`tpub`).
pub const TESTNET_PUBLIC: Version = Version::new([0x04, 0x35, 0x87, 0xCF]);

impl Network {
    /// Every registered network.
    pub const ALL: [Network; 2] = [Network::Bitcoin, Network::Testnet];

    /// Version tag for private extended keys on this network.
    pub fn private_version(self) -> Version {
        self.versions().0
    }

    /// Version tag for public extended keys on this network.
    pub fn public_version(self) -> Version {
        self.versions().1
    }

    /// Version tag for the private or public variant.
    pub fn version(self, private: bool) -> Version {
        if private {
            self.private_version()
        } else {
            self.public_version()
        }
    }

    /// Looks up the network and variant a version tag belongs to.
    ///
    /// Returns the network and `true` for a private variant.
    pub fn from_version(version: Version) -> Result<(Self, bool), DerivationError> {
        Self::ALL
            .into_iter()
            .find_map(|network| {
                let (private, public) = network.versions();
                if version == private {
                    Some((network, true))
                } else if version == public {
                    Some((network, false))
                } else {
                    None
                }
            })
            .ok_or(DerivationError::UnknownVersion(version))
    }

    const fn versions(self) -> (Version, Version) {
        match self {
            Network::Bitcoin => (MAINNET_PRIVATE, MAINNET_PUBLIC),
            Network::Testnet => (TESTNET_PRIVATE, TESTNET_PUBLIC),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Bitcoin => write!(f, "bitcoin"),
            Network::Testnet => write!(f, "testnet"),
        }
    }
}

impl FromStr for Network {
    type Err = ParseNetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bitcoin" | "mainnet" => Ok(Network::Bitcoin),
            "testnet" => Ok(Network::Testnet),
            other => Err(ParseNetworkError(other.to_string())),
        }
    }
}

/// A 4-byte big-endian version tag at the start of a serialized extended key.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Version([u8; VERSION_SIZE]);

impl Version {
    /// Creates a version tag from its bytes.
    pub const fn new(bytes: [u8; VERSION_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the tag as a byte array.
    pub const fn as_bytes(&self) -> &[u8; VERSION_SIZE] {
        &self.0
    }

    /// Returns the tag as a big-endian integer.
    pub const fn to_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }
}

impl From<u32> for Version {
    fn from(value: u32) -> Self {
        Self(value.to_be_bytes())
    }
}

impl From<Version> for [u8; VERSION_SIZE] {
    fn from(version: Version) -> Self {
        version.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.to_u32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_table_round_trips() {
        for network in Network::ALL {
            assert_eq!(
                Network::from_version(network.private_version()).unwrap(),
                (network, true)
            );
            assert_eq!(
                Network::from_version(network.public_version()).unwrap(),
                (network, false)
            );
        }
    }

    #[test]
    fn mainnet_versions() {
        assert_eq!(Network::Bitcoin.private_version().to_u32(), 0x0488_ADE4);
        assert_eq!(Network::Bitcoin.public_version().to_u32(), 0x0488_B21E);
        assert_eq!(Network::Bitcoin.version(false), Network::Bitcoin.public_version());
    }

    #[test]
    fn unknown_version_is_rejected() {
        let version = Version::from(0xdead_beef);
        assert_eq!(
            Network::from_version(version),
            Err(DerivationError::UnknownVersion(version))
        );
        assert_eq!(version.to_string(), "0xdeadbeef");
    }

    #[test]
    fn network_names() {
        assert_eq!(Network::default(), Network::Bitcoin);
        assert_eq!(Network::Testnet.to_string(), "testnet");
        for network in Network::ALL {
            assert_eq!(network.to_string().parse::<Network>().unwrap(), network);
        }
        assert_eq!("mainnet".parse::<Network>().unwrap(), Network::Bitcoin);
        assert_eq!(
            "regtest".parse::<Network>(),
            Err(ParseNetworkError("regtest".to_string()))
        );
    }
}
