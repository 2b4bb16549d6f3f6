//! Hash sources (`'sha256-…'` and friends).

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine as _;
use bitflags::bitflags;
use sha2::{Digest, Sha256, Sha384, Sha512};

/// Digest algorithm named by a hash source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// All supported algorithms, in prefix-matching order.
    pub const ALL: [HashAlgorithm; 3] = [
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
    ];

    /// Source-expression prefix, e.g. `'sha256-`.
    pub fn source_prefix(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "'sha256-",
            HashAlgorithm::Sha384 => "'sha384-",
            HashAlgorithm::Sha512 => "'sha512-",
        }
    }

    /// The single-bit set for this algorithm.
    pub fn flag(&self) -> HashAlgorithms {
        match self {
            HashAlgorithm::Sha256 => HashAlgorithms::SHA256,
            HashAlgorithm::Sha384 => HashAlgorithms::SHA384,
            HashAlgorithm::Sha512 => HashAlgorithms::SHA512,
        }
    }
}

bitflags! {
    /// Set of algorithms appearing in a source list.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HashAlgorithms: u8 {
        const SHA256 = 1 << 0;
        const SHA384 = 1 << 1;
        const SHA512 = 1 << 2;
    }
}

impl HashAlgorithms {
    /// Iterate the algorithms in this set.
    pub fn algorithms(self) -> impl Iterator<Item = HashAlgorithm> {
        HashAlgorithm::ALL
            .into_iter()
            .filter(move |algorithm| self.contains(algorithm.flag()))
    }
}

/// A digest plus the algorithm that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HashValue {
    pub algorithm: HashAlgorithm,
    pub digest: Vec<u8>,
}

impl HashValue {
    /// Hash inline content (script or style text) with `algorithm`.
    pub fn compute(algorithm: HashAlgorithm, content: &str) -> Self {
        let digest = match algorithm {
            HashAlgorithm::Sha256 => Sha256::digest(content.as_bytes()).to_vec(),
            HashAlgorithm::Sha384 => Sha384::digest(content.as_bytes()).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(content.as_bytes()).to_vec(),
        };
        Self { algorithm, digest }
    }

    /// Decode the base64 (or base64url) digest of a hash source.
    ///
    /// Returns `None` for undecodable or empty digests.
    pub fn from_base64(algorithm: HashAlgorithm, encoded: &str) -> Option<Self> {
        let normalized: String = encoded
            .trim_end_matches('=')
            .chars()
            .map(|c| match c {
                '-' => '+',
                '_' => '/',
                c => c,
            })
            .collect();
        let digest = STANDARD_NO_PAD.decode(normalized).ok()?;
        if digest.is_empty() {
            return None;
        }
        Some(Self { algorithm, digest })
    }
}
