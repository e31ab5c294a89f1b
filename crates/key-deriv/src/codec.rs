//! Extended key serialization.
//!
//! The binary layout is fixed at 82 bytes, big-endian throughout:
//!
//! ```text
//! offset  size  field
//!      0     4  version
//!      4     1  depth
//!      5     4  parent fingerprint
//!      9     4  child number
//!     13    32  chain code
//!     45    33  key data (0x00 || scalar, or compressed point)
//!     78     4  checksum = SHA256(SHA256(bytes[0..78]))[0..4]
//! ```
//!
//! The text form is the plain Base58 encoding of these 82 bytes. The checksum is already
//! part of the payload, so no second Base58Check checksum is added.

use std::{fmt, str::FromStr};

use crate::{
    curve::{self, COMPRESSED_POINT_SIZE},
    errors::{DerivationError, MalformedKey},
    hash::{checksum, CHECKSUM_SIZE},
    keys::{ChainCode, ExtendedKey, Fingerprint, KeyMaterial, CHAIN_CODE_SIZE, FINGERPRINT_SIZE},
    network::{Network, Version, VERSION_SIZE},
    paths::ChildNumber,
};

/// Length of the serialized payload before the checksum.
pub const PAYLOAD_SIZE: usize = 78;

/// Length of a serialized extended key including the checksum.
pub const SERIALIZED_SIZE: usize = PAYLOAD_SIZE + CHECKSUM_SIZE;

const DEPTH_OFFSET: usize = VERSION_SIZE;
const FINGERPRINT_OFFSET: usize = DEPTH_OFFSET + 1;
const CHILD_NUMBER_OFFSET: usize = FINGERPRINT_OFFSET + FINGERPRINT_SIZE;
const CHAIN_CODE_OFFSET: usize = CHILD_NUMBER_OFFSET + 4;
const KEY_OFFSET: usize = CHAIN_CODE_OFFSET + CHAIN_CODE_SIZE;

/// Lays out the 78-byte payload of `key`.
pub fn encode_payload(key: &ExtendedKey) -> [u8; PAYLOAD_SIZE] {
    let mut out = [0u8; PAYLOAD_SIZE];
    out[..DEPTH_OFFSET].copy_from_slice(key.version().as_bytes());
    out[DEPTH_OFFSET] = key.depth();
    out[FINGERPRINT_OFFSET..CHILD_NUMBER_OFFSET]
        .copy_from_slice(key.parent_fingerprint().as_bytes());
    out[CHILD_NUMBER_OFFSET..CHAIN_CODE_OFFSET]
        .copy_from_slice(&key.child_number().to_be_bytes());
    out[CHAIN_CODE_OFFSET..KEY_OFFSET].copy_from_slice(key.chain_code().as_bytes());
    match key.key_material() {
        KeyMaterial::Private { secret, .. } => {
            out[KEY_OFFSET] = 0x00;
            out[KEY_OFFSET + 1..].copy_from_slice(&secret.secret_bytes());
        }
        KeyMaterial::Public(public) => {
            out[KEY_OFFSET..].copy_from_slice(&curve::compress(public));
        }
    }
    out
}

/// Serializes `key` into its 82-byte binary form.
pub fn serialize(key: &ExtendedKey) -> [u8; SERIALIZED_SIZE] {
    let payload = encode_payload(key);
    let mut out = [0u8; SERIALIZED_SIZE];
    out[..PAYLOAD_SIZE].copy_from_slice(&payload);
    out[PAYLOAD_SIZE..].copy_from_slice(&checksum(&payload));
    out
}

/// Parses the 82-byte binary form of an extended key.
///
/// Checks, in order: length, checksum, version tag, then the key data and master-key
/// metadata.
pub fn deserialize(bytes: &[u8]) -> Result<ExtendedKey, DerivationError> {
    if bytes.len() != SERIALIZED_SIZE {
        return Err(MalformedKey::InvalidLength(bytes.len()).into());
    }

    let (payload, actual) = bytes.split_at(PAYLOAD_SIZE);
    let expected = checksum(payload);
    let actual: [u8; CHECKSUM_SIZE] = array(actual);
    if expected != actual {
        return Err(DerivationError::ChecksumMismatch { expected, actual });
    }

    let version = Version::new(array(&payload[..DEPTH_OFFSET]));
    let (network, private) = Network::from_version(version)?;

    let depth = payload[DEPTH_OFFSET];
    let parent_fingerprint =
        Fingerprint::new(array(&payload[FINGERPRINT_OFFSET..CHILD_NUMBER_OFFSET]));
    let child_number = ChildNumber::from(u32::from_be_bytes(array(
        &payload[CHILD_NUMBER_OFFSET..CHAIN_CODE_OFFSET],
    )));
    let chain_code = ChainCode::new(array(&payload[CHAIN_CODE_OFFSET..KEY_OFFSET]));

    let key_data: [u8; COMPRESSED_POINT_SIZE] = array(&payload[KEY_OFFSET..]);
    let key = if private {
        if key_data[0] != 0x00 {
            return Err(MalformedKey::InvalidPrivatePrefix(key_data[0]).into());
        }
        let secret =
            curve::parse_secret(&array(&key_data[1..])).ok_or(MalformedKey::InvalidPrivateScalar)?;
        KeyMaterial::from_secret(secret)
    } else {
        KeyMaterial::Public(curve::decompress(&key_data).ok_or(MalformedKey::InvalidPublicPoint)?)
    };

    if depth == 0 && (!parent_fingerprint.is_zero() || child_number.to_u32() != 0) {
        return Err(MalformedKey::NonZeroMasterMetadata.into());
    }

    Ok(ExtendedKey {
        network,
        depth,
        parent_fingerprint,
        child_number,
        chain_code,
        key,
    })
}

/// Encodes `key` as Base58 text (`xprv...`, `xpub...`, `tprv...`, `tpub...`).
pub fn to_base58(key: &ExtendedKey) -> String {
    bs58::encode(serialize(key)).into_string()
}

/// Parses the Base58 text form of an extended key.
pub fn from_base58(text: &str) -> Result<ExtendedKey, DerivationError> {
    let bytes = bs58::decode(text).into_vec()?;
    deserialize(&bytes)
}

/// Copies a slice of known length into an array.
fn array<const N: usize>(slice: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    out
}

impl ExtendedKey {
    /// See [`serialize`].
    pub fn to_bytes(&self) -> [u8; SERIALIZED_SIZE] {
        serialize(self)
    }

    /// See [`deserialize`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DerivationError> {
        deserialize(bytes)
    }
}

impl fmt::Display for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_base58(self))
    }
}

impl FromStr for ExtendedKey {
    type Err = DerivationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        from_base58(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        derive::{derive_child_at, derive_path, master_from_seed, neuter},
        paths::DerivationPath,
    };

    /// Checks a path of a BIP32 test vector, both the private key and its neutered form,
    /// and the public-only derivation of the last step where it is a normal step.
    fn check_vector(seed: &str, path: &str, xprv: &str, xpub: &str) {
        let master = master_from_seed(&hex::decode(seed).unwrap(), Network::Bitcoin).unwrap();
        let path: DerivationPath = path.parse().unwrap();
        let key = derive_path(&master, &path).unwrap();

        assert_eq!(key.to_string(), xprv, "{path}");
        assert_eq!(neuter(&key).to_string(), xpub, "{path}");
        assert_eq!(xprv.parse::<ExtendedKey>().unwrap(), key, "{path}");
        assert_eq!(xpub.parse::<ExtendedKey>().unwrap(), neuter(&key), "{path}");

        if let Some((last, parent_steps)) = path.as_slice().split_last() {
            if last.is_normal() {
                let parent = derive_path(&master, &parent_steps.into()).unwrap();
                let public_child = neuter(&parent).derive_child(*last).unwrap();
                assert_eq!(public_child.to_string(), xpub, "public derivation of {path}");
            }
        }
    }

    #[test]
    fn test_vector_1() {
        let seed = "000102030405060708090a0b0c0d0e0f";
        check_vector(seed, "m",
            "xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvNKmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi",
            "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8");
        check_vector(seed, "m/0'",
            "xprv9uHRZZhk6KAJC1avXpDAp4MDc3sQKNxDiPvvkX8Br5ngLNv1TxvUxt4cV1rGL5hj6KCesnDYUhd7oWgT11eZG7XnxHrnYeSvkzY7d2bhkJ7",
            "xpub68Gmy5EdvgibQVfPdqkBBCHxA5htiqg55crXYuXoQRKfDBFA1WEjWgP6LHhwBZeNK1VTsfTFUHCdrfp1bgwQ9xv5ski8PX9rL2dZXvgGDnw");
        check_vector(seed, "m/0'/1",
            "xprv9wTYmMFdV23N2TdNG573QoEsfRrWKQgWeibmLntzniatZvR9BmLnvSxqu53Kw1UmYPxLgboyZQaXwTCg8MSY3H2EU4pWcQDnRnrVA1xe8fs",
            "xpub6ASuArnXKPbfEwhqN6e3mwBcDTgzisQN1wXN9BJcM47sSikHjJf3UFHKkNAWbWMiGj7Wf5uMash7SyYq527Hqck2AxYysAA7xmALppuCkwQ");
        check_vector(seed, "m/0'/1/2'",
            "xprv9z4pot5VBttmtdRTWfWQmoH1taj2axGVzFqSb8C9xaxKymcFzXBDptWmT7FwuEzG3ryjH4ktypQSAewRiNMjANTtpgP4mLTj34bhnZX7UiM",
            "xpub6D4BDPcP2GT577Vvch3R8wDkScZWzQzMMUm3PWbmWvVJrZwQY4VUNgqFJPMM3No2dFDFGTsxxpG5uJh7n7epu4trkrX7x7DogT5Uv6fcLW5");
        check_vector(seed, "m/0'/1/2'/2",
            "xprvA2JDeKCSNNZky6uBCviVfJSKyQ1mDYahRjijr5idH2WwLsEd4Hsb2Tyh8RfQMuPh7f7RtyzTtdrbdqqsunu5Mm3wDvUAKRHSC34sJ7in334",
            "xpub6FHa3pjLCk84BayeJxFW2SP4XRrFd1JYnxeLeU8EqN3vDfZmbqBqaGJAyiLjTAwm6ZLRQUMv1ZACTj37sR62cfN7fe5JnJ7dh8zL4fiyLHV");
        check_vector(seed, "m/0'/1/2'/2/1000000000",
            "xprvA41z7zogVVwxVSgdKUHDy1SKmdb533PjDz7J6N6mV6uS3ze1ai8FHa8kmHScGpWmj4WggLyQjgPie1rFSruoUihUZREPSL39UNdE3BBDu76",
            "xpub6H1LXWLaKsWFhvm6RVpEL9P4KfRZSW7abD2ttkWP3SSQvnyA8FSVqNTEcYFgJS2UaFcxupHiYkro49S8yGasTvXEYBVPamhGW6cFJodrTHy");
    }

    #[test]
    fn test_vector_2() {
        let seed = "fffcf9f6f3f0edeae7e4e1dedbd8d5d2cfccc9c6c3c0bdbab7b4b1aeaba8a5a29f9c999693908d8a8784817e7b7875726f6c696663605d5a5754514e4b484542";
        check_vector(seed, "m",
            "xprv9s21ZrQH143K31xYSDQpPDxsXRTUcvj2iNHm5NUtrGiGG5e2DtALGdso3pGz6ssrdK4PFmM8NSpSBHNqPqm55Qn3LqFtT2emdEXVYsCzC2U",
            "xpub661MyMwAqRbcFW31YEwpkMuc5THy2PSt5bDMsktWQcFF8syAmRUapSCGu8ED9W6oDMSgv6Zz8idoc4a6mr8BDzTJY47LJhkJ8UB7WEGuduB");
        check_vector(seed, "m/0",
            "xprv9vHkqa6EV4sPZHYqZznhT2NPtPCjKuDKGY38FBWLvgaDx45zo9WQRUT3dKYnjwih2yJD9mkrocEZXo1ex8G81dwSM1fwqWpWkeS3v86pgKt",
            "xpub69H7F5d8KSRgmmdJg2KhpAK8SR3DjMwAdkxj3ZuxV27CprR9LgpeyGmXUbC6wb7ERfvrnKZjXoUmmDznezpbZb7ap6r1D3tgFxHmwMkQTPH");
        check_vector(seed, "m/0/2147483647'",
            "xprv9wSp6B7kry3Vj9m1zSnLvN3xH8RdsPP1Mh7fAaR7aRLcQMKTR2vidYEeEg2mUCTAwCd6vnxVrcjfy2kRgVsFawNzmjuHc2YmYRmagcEPdU9",
            "xpub6ASAVgeehLbnwdqV6UKMHVzgqAG8Gr6riv3Fxxpj8ksbH9ebxaEyBLZ85ySDhKiLDBrQSARLq1uNRts8RuJiHjaDMBU4Zn9h8LZNnBC5y4a");
        check_vector(seed, "m/0/2147483647'/1",
            "xprv9zFnWC6h2cLgpmSA46vutJzBcfJ8yaJGg8cX1e5StJh45BBciYTRXSd25UEPVuesF9yog62tGAQtHjXajPPdbRCHuWS6T8XA2ECKADdw4Ef",
            "xpub6DF8uhdarytz3FWdA8TvFSvvAh8dP3283MY7p2V4SeE2wyWmG5mg5EwVvmdMVCQcoNJxGoWaU9DCWh89LojfZ537wTfunKau47EL2dhHKon");
        check_vector(seed, "m/0/2147483647'/1/2147483646'",
            "xprvA1RpRA33e1JQ7ifknakTFpgNXPmW2YvmhqLQYMmrj4xJXXWYpDPS3xz7iAxn8L39njGVyuoseXzU6rcxFLJ8HFsTjSyQbLYnMpCqE2VbFWc",
            "xpub6ERApfZwUNrhLCkDtcHTcxd75RbzS1ed54G1LkBUHQVHQKqhMkhgbmJbZRkrgZw4koxb5JaHWkY4ALHY2grBGRjaDMzQLcgJvLJuZZvRcEL");
        check_vector(seed, "m/0/2147483647'/1/2147483646'/2",
            "xprvA2nrNbFZABcdryreWet9Ea4LvTJcGsqrMzxHx98MMrotbir7yrKCEXw7nadnHM8Dq38EGfSh6dqA9QWTyefMLEcBYJUuekgW4BYPJcr9E7j",
            "xpub6FnCn6nSzZAw5Tw7cgR9bi15UV96gLZhjDstkXXxvCLsUXBGXPdSnLFbdpq8p9HmGsApME5hQTZ3emM2rnY5agb9rXpVGyy3bdW6EEgAtqt");
    }

    #[test]
    fn single_zero_byte_seed() {
        check_vector("00", "m",
            "xprv9s21ZrQH143K49gX56Mx7cRsm1rUryuRH8u989noX3ahzZWtUf1iVwevgC6BgPJf6CLNjsPznoV66h54NUjQCoKjtPNCz8AkEcmihrucxv6",
            "xpub661MyMwAqRbcGdkzB7txUkNcK3gyGSdGeMpjvYCR5P7gsMr32CKy3jyQXUGtJPTzRKef35ajnJD4s5L9RfDQ5TTm4fzQcLttiG4GuMtaEq5");
        check_vector("00", "m/0'",
            "xprv9uf9f43xEtiFKC7jsQoukAXar4JEXNBXkDpahsj7xxHXQNnA5a75RcF4PSjenKx2tWi59E8k7QzuvbDXV4Fi7RfxV2qEt9epvaUXq3BRQno",
            "xpub68eW4Zar5GGYXgCCySLv7JUKQ68ivpuP7SkBWG8jXHpWHB7Jd7RKyQZYEkeCJmopuc9NznZ6Qp6HWnLvaL4A6vxozPNWC2HkoUKaXwJUQBi");
    }

    fn master() -> ExtendedKey {
        master_from_seed(&hex::decode("000102030405060708090a0b0c0d0e0f").unwrap(), Network::Bitcoin)
            .unwrap()
    }

    #[test]
    fn layout() {
        let child = derive_child_at(&master(), 0, true).unwrap();
        let bytes = serialize(&child);
        assert_eq!(bytes.len(), SERIALIZED_SIZE);
        assert_eq!(&bytes[..4], Network::Bitcoin.private_version().as_bytes());
        assert_eq!(bytes[4], 1);
        assert_eq!(&bytes[5..9], master().fingerprint().as_bytes());
        assert_eq!(&bytes[9..13], &[0x80, 0, 0, 0]);
        assert_eq!(&bytes[13..45], child.chain_code().as_bytes());
        assert_eq!(bytes[45], 0x00);
        assert_eq!(&bytes[46..78], &child.private_key().unwrap().secret_bytes());
        assert_eq!(bytes[78..], checksum(&bytes[..78]));

        let public = serialize(&neuter(&child));
        assert_eq!(&public[..4], Network::Bitcoin.public_version().as_bytes());
        assert_eq!(&public[45..78], &curve::compress(child.public_key()));
    }

    #[test]
    fn testnet_prefixes() {
        let master = master_from_seed(&[7u8; 32], Network::Testnet).unwrap();
        assert!(master.to_string().starts_with("tprv"));
        assert!(neuter(&master).to_string().starts_with("tpub"));
        assert_eq!(master.to_string().parse::<ExtendedKey>().unwrap().network(), Network::Testnet);
    }

    #[test]
    fn wrong_length() {
        let bytes = serialize(&master());
        assert_eq!(
            deserialize(&bytes[..81]),
            Err(DerivationError::MalformedExtendedKey(MalformedKey::InvalidLength(81)))
        );
        let mut long = bytes.to_vec();
        long.push(0);
        assert_eq!(
            deserialize(&long),
            Err(DerivationError::MalformedExtendedKey(MalformedKey::InvalidLength(83)))
        );
    }

    #[test]
    fn checksum_mismatch_reports_both_checksums() {
        let mut bytes = serialize(&master());
        bytes[80] ^= 0xff;
        assert!(matches!(
            deserialize(&bytes),
            Err(DerivationError::ChecksumMismatch { expected, actual })
                if expected != actual && actual[2] == bytes[80]
        ));
    }

    /// Rebuilds a serialized key after editing its payload so that the checksum is valid.
    fn with_payload(edit: impl FnOnce(&mut [u8; PAYLOAD_SIZE])) -> [u8; SERIALIZED_SIZE] {
        let mut payload = encode_payload(&derive_child_at(&master(), 1, false).unwrap());
        edit(&mut payload);
        let mut out = [0u8; SERIALIZED_SIZE];
        out[..PAYLOAD_SIZE].copy_from_slice(&payload);
        out[PAYLOAD_SIZE..].copy_from_slice(&checksum(&payload));
        out
    }

    #[test]
    fn unknown_version() {
        let bytes = with_payload(|p| p[..4].copy_from_slice(&[0x01, 0x02, 0x03, 0x04]));
        assert_eq!(
            deserialize(&bytes),
            Err(DerivationError::UnknownVersion(Version::new([1, 2, 3, 4])))
        );
    }

    #[test]
    fn private_key_data_must_be_zero_prefixed() {
        let bytes = with_payload(|p| p[KEY_OFFSET] = 0x02);
        assert_eq!(
            deserialize(&bytes),
            Err(MalformedKey::InvalidPrivatePrefix(0x02).into())
        );
    }

    #[test]
    fn private_scalar_out_of_range() {
        let bytes = with_payload(|p| p[KEY_OFFSET + 1..].fill(0xff));
        assert_eq!(deserialize(&bytes), Err(MalformedKey::InvalidPrivateScalar.into()));

        let bytes = with_payload(|p| p[KEY_OFFSET + 1..].fill(0x00));
        assert_eq!(deserialize(&bytes), Err(MalformedKey::InvalidPrivateScalar.into()));
    }

    #[test]
    fn public_version_with_private_data_is_rejected() {
        let bytes =
            with_payload(|p| p[..4].copy_from_slice(Network::Bitcoin.public_version().as_bytes()));
        assert_eq!(deserialize(&bytes), Err(MalformedKey::InvalidPublicPoint.into()));
    }

    #[test]
    fn master_with_parent_fingerprint_is_rejected() {
        let bytes = with_payload(|p| p[DEPTH_OFFSET] = 0);
        assert_eq!(deserialize(&bytes), Err(MalformedKey::NonZeroMasterMetadata.into()));
    }

    #[test]
    fn invalid_base58() {
        assert!(matches!(
            "xprv0OIl".parse::<ExtendedKey>(),
            Err(DerivationError::InvalidBase58(_))
        ));
    }

    mod proptests {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            // Masters survive a trip through the binary and text forms.
            #[test]
            fn master_round_trip(seed in prop::collection::vec(any::<u8>(), 16..=64)) {
                let master = master_from_seed(&seed, Network::Bitcoin).unwrap();
                prop_assert_eq!(&deserialize(&serialize(&master)).unwrap(), &master);
                prop_assert_eq!(&from_base58(&to_base58(&master)).unwrap(), &master);
                let public = neuter(&master);
                prop_assert_eq!(deserialize(&serialize(&public)).unwrap(), public);
            }

            // Flipping any payload byte is caught by the checksum.
            #[test]
            fn corrupted_payload_fails_checksum(
                position in 0usize..PAYLOAD_SIZE,
                flip in 1u8..=255,
            ) {
                let mut bytes = serialize(&master());
                bytes[position] ^= flip;
                let is_checksum_mismatch = matches!(
                    deserialize(&bytes),
                    Err(DerivationError::ChecksumMismatch { .. })
                );
                prop_assert!(is_checksum_mismatch);
            }
        }
    }
}
