//! Child numbers and derivation paths.
//!
//! A [`DerivationPath`] is an ordered list of [`ChildNumber`]s. It can be built from the
//! textual grammar
//!
//! ```text
//! m(/\d+'?)*
//! ```
//!
//! (`h` and `H` are accepted in place of `'`), from `(index, hardened)` pairs, or from the
//! raw encoded 32-bit child numbers, and always displays back in the textual form:
//!
//! ```text
//! m                 empty path, the key itself
//! m/0               normal child 0
//! m/0'/1/2'         hardened 0, normal 1, hardened 2
//! m/2147483647'     largest hardened index (encoded 0xFFFFFFFF)
//! ```

use std::{fmt, num::IntErrorKind, str::FromStr};

use crate::errors::DerivationError;

/// First encoded child number of the hardened range (`2^31`).
pub const HARDENED_OFFSET: u32 = 1 << 31;

/// Largest index accepted for either derivation kind (`2^31 - 1`).
pub const MAX_CHILD_INDEX: u32 = HARDENED_OFFSET - 1;

/// A single derivation step.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChildNumber {
    /// Normal (non-hardened) child, derivable from the parent's public key.
    Normal {
        /// Index in `[0, 2^31 - 1]`.
        index: u32,
    },

    /// Hardened child, derivable only from the parent's private key.
    Hardened {
        /// Index in `[0, 2^31 - 1]`, encoded as `index + 2^31`.
        index: u32,
    },
}

impl ChildNumber {
    /// Creates a normal child number.
    pub fn from_normal_idx(index: u32) -> Result<Self, DerivationError> {
        if index > MAX_CHILD_INDEX {
            return Err(DerivationError::IndexOutOfRange(index as u64));
        }
        Ok(ChildNumber::Normal { index })
    }

    /// Creates a hardened child number.
    pub fn from_hardened_idx(index: u32) -> Result<Self, DerivationError> {
        if index > MAX_CHILD_INDEX {
            return Err(DerivationError::IndexOutOfRange(index as u64));
        }
        Ok(ChildNumber::Hardened { index })
    }

    /// Creates a child number from an index and a hardened flag.
    pub fn new(index: u32, hardened: bool) -> Result<Self, DerivationError> {
        if hardened {
            Self::from_hardened_idx(index)
        } else {
            Self::from_normal_idx(index)
        }
    }

    /// Whether this is a hardened step.
    pub const fn is_hardened(&self) -> bool {
        matches!(self, ChildNumber::Hardened { .. })
    }

    /// Whether this is a normal step.
    pub const fn is_normal(&self) -> bool {
        !self.is_hardened()
    }

    /// The 31-bit index, without the hardened bit.
    pub const fn index(&self) -> u32 {
        match self {
            ChildNumber::Normal { index } | ChildNumber::Hardened { index } => *index,
        }
    }

    /// The encoded 32-bit child number: `index`, or `index + 2^31` when hardened.
    pub const fn to_u32(self) -> u32 {
        match self {
            ChildNumber::Normal { index } => index,
            ChildNumber::Hardened { index } => index | HARDENED_OFFSET,
        }
    }

    /// The encoded child number in big-endian bytes (`ser32`).
    pub const fn to_be_bytes(self) -> [u8; 4] {
        self.to_u32().to_be_bytes()
    }

    /// The next child of the same kind.
    ///
    /// Fails with [`DerivationError::IndexOutOfRange`] past `2^31 - 1`.
    pub fn increment(self) -> Result<Self, DerivationError> {
        let next = self.index() as u64 + 1;
        if next > MAX_CHILD_INDEX as u64 {
            return Err(DerivationError::IndexOutOfRange(next));
        }
        Self::new(next as u32, self.is_hardened())
    }
}

impl From<u32> for ChildNumber {
    /// Decodes an encoded child number. Every `u32` is valid.
    fn from(number: u32) -> Self {
        if number & HARDENED_OFFSET != 0 {
            ChildNumber::Hardened {
                index: number ^ HARDENED_OFFSET,
            }
        } else {
            ChildNumber::Normal { index: number }
        }
    }
}

impl From<ChildNumber> for u32 {
    fn from(child: ChildNumber) -> Self {
        child.to_u32()
    }
}

impl fmt::Display for ChildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildNumber::Normal { index } => write!(f, "{index}"),
            ChildNumber::Hardened { index } => write!(f, "{index}'"),
        }
    }
}

impl FromStr for ChildNumber {
    type Err = DerivationError;

    fn from_str(segment: &str) -> Result<Self, Self::Err> {
        let (digits, hardened) = match segment.strip_suffix(&['\'', 'h', 'H'][..]) {
            Some(digits) => (digits, true),
            None => (segment, false),
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DerivationError::InvalidPathSyntax(format!(
                "invalid path segment {segment:?}"
            )));
        }

        let index = match digits.parse::<u64>() {
            Ok(index) => index,
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => {
                return Err(DerivationError::IndexOutOfRange(u64::MAX));
            }
            Err(e) => {
                return Err(DerivationError::InvalidPathSyntax(format!(
                    "invalid path segment {segment:?}: {e}"
                )));
            }
        };

        if index > MAX_CHILD_INDEX as u64 {
            return Err(DerivationError::IndexOutOfRange(index));
        }

        Self::new(index as u32, hardened)
    }
}

/// An ordered sequence of derivation steps, relative to the key it is applied to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DerivationPath(Vec<ChildNumber>);

impl DerivationPath {
    /// The empty path (`m`).
    pub const fn master() -> Self {
        Self(Vec::new())
    }

    /// Builds a path from `(index, hardened)` pairs, checking every index range.
    pub fn from_steps(steps: &[(u32, bool)]) -> Result<Self, DerivationError> {
        steps
            .iter()
            .map(|&(index, hardened)| ChildNumber::new(index, hardened))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Builds a path from encoded 32-bit child numbers.
    pub fn from_encoded(numbers: &[u32]) -> Self {
        Self(numbers.iter().copied().map(ChildNumber::from).collect())
    }

    /// The steps of the path.
    pub fn as_slice(&self) -> &[ChildNumber] {
        &self.0
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this is the empty path.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the steps.
    pub fn iter(&self) -> std::slice::Iter<'_, ChildNumber> {
        self.0.iter()
    }

    /// Returns a new path with `child` appended.
    pub fn child(&self, child: ChildNumber) -> Self {
        let mut steps = self.0.clone();
        steps.push(child);
        Self(steps)
    }

    /// Returns a new path with `other` appended.
    pub fn extend(&self, other: &DerivationPath) -> Self {
        let mut steps = self.0.clone();
        steps.extend_from_slice(&other.0);
        Self(steps)
    }

    /// The encoded 32-bit child numbers.
    pub fn to_u32_vec(&self) -> Vec<u32> {
        self.0.iter().map(|child| child.to_u32()).collect()
    }
}

impl From<Vec<ChildNumber>> for DerivationPath {
    fn from(steps: Vec<ChildNumber>) -> Self {
        Self(steps)
    }
}

impl From<&[ChildNumber]> for DerivationPath {
    fn from(steps: &[ChildNumber]) -> Self {
        Self(steps.to_vec())
    }
}

impl AsRef<[ChildNumber]> for DerivationPath {
    fn as_ref(&self) -> &[ChildNumber] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a DerivationPath {
    type Item = &'a ChildNumber;
    type IntoIter = std::slice::Iter<'a, ChildNumber>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromStr for DerivationPath {
    type Err = DerivationError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let mut segments = path.split('/');
        if segments.next() != Some("m") {
            return Err(DerivationError::InvalidPathSyntax(format!(
                "path {path:?} must start with \"m\""
            )));
        }

        segments
            .map(ChildNumber::from_str)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for child in &self.0 {
            write!(f, "/{child}")?;
        }
        Ok(())
    }
}
