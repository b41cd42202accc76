//! Core types: derivation paths, app version, network, signing results.

use std::str::FromStr;

use crate::error::InvalidDataReason;
use byteorder::{BigEndian, WriteBytesExt};

pub const HARDENED: u32 = 0x8000_0000;

/// Longest path the device accepts.
pub const MAX_PATH_LENGTH: usize = 10;

/// BIP32-style derivation path. Components carry the hardened bit themselves.
///
/// Equality is structural, which is what witness deduplication relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DerivationPath(Vec<u32>);

impl DerivationPath {
    /// Each hardened component must already have the hardened bit set.
    pub fn new(components: Vec<u32>) -> Result<Self, InvalidDataReason> {
        if components.len() > MAX_PATH_LENGTH {
            return Err(InvalidDataReason::DerivationPathMalformed);
        }
        Ok(Self(components))
    }

    pub(crate) fn from_validated(components: Vec<u32>) -> Self {
        Self(components)
    }

    /// Shelley: `1852'/1815'/account'/role/index`
    #[must_use]
    pub fn shelley(account: u32, role: u32, index: u32) -> Self {
        Self(vec![
            1852 | HARDENED,
            1815 | HARDENED,
            account | HARDENED,
            role,
            index,
        ])
    }

    /// Byron: `44'/1815'/account'/0/index`
    #[must_use]
    pub fn byron(account: u32, index: u32) -> Self {
        Self(vec![44 | HARDENED, 1815 | HARDENED, account | HARDENED, 0, index])
    }

    /// Wire format: `[n: u8][path[0]: u32 BE]...[path[n-1]: u32 BE]`
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + self.0.len() * 4);
        self.serialize_into(&mut buf);
        buf
    }

    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        buf.push(self.0.len() as u8);
        for &component in &self.0 {
            buf.write_u32::<BigEndian>(component).unwrap();
        }
    }

    pub fn components(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "m")?;
        for &c in &self.0 {
            let val = c & !HARDENED;
            let h = if c & HARDENED != 0 { "'" } else { "" };
            write!(f, "/{val}{h}")?;
        }
        Ok(())
    }
}

/// Parses `m/1852'/1815'/0'/0/0`. The leading `m` is optional and both `'`
/// and `h` mark hardened components.
impl FromStr for DerivationPath {
    type Err = InvalidDataReason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/').peekable();
        if parts.peek() == Some(&"m") {
            parts.next();
        }
        let mut components = Vec::new();
        for part in parts {
            let (digits, hardened) = match part.strip_suffix(&['\'', 'h'][..]) {
                Some(rest) => (rest, true),
                None => (part, false),
            };
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(InvalidDataReason::DerivationPathMalformed);
            }
            let value: u32 = digits
                .parse()
                .map_err(|_| InvalidDataReason::DerivationPathMalformed)?;
            if value & HARDENED != 0 {
                return Err(InvalidDataReason::DerivationPathMalformed);
            }
            components.push(if hardened { value | HARDENED } else { value });
        }
        Self::new(components)
    }
}

/// App version and build flags as reported by `GET_VERSION`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
    pub flags: VersionFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VersionFlags {
    pub is_debug: bool,
    /// Reduced-feature build for memory-constrained devices.
    pub is_app_xs: bool,
}

impl AppVersion {
    #[must_use]
    pub fn new(major: u8, minor: u8, patch: u8) -> Self {
        Self {
            major,
            minor,
            patch,
            flags: VersionFlags::default(),
        }
    }

    pub fn triple(&self) -> (u8, u8, u8) {
        (self.major, self.minor, self.patch)
    }
}

impl std::fmt::Display for AppVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Cardano v{}.{}.{}", self.major, self.minor, self.patch)?;
        if self.flags.is_app_xs {
            write!(f, " XS")?;
        }
        if self.flags.is_debug {
            write!(f, " (debug)")?;
        }
        Ok(())
    }
}

/// Network the transaction or address belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Network {
    /// Shelley-era network id, a 4-bit value.
    pub network_id: u8,
    /// Byron-era protocol magic.
    pub protocol_magic: u32,
}

impl Network {
    pub const MAINNET: Network = Network {
        network_id: 0x01,
        protocol_magic: 764_824_073,
    };

    pub const TESTNET: Network = Network {
        network_id: 0x00,
        protocol_magic: 1_097_911_063,
    };
}

/// 32-byte transaction body hash computed by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxHash(pub [u8; 32]);

/// 64-byte Ed25519 signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

/// Ed25519 public key with its BIP32 chain code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendedPublicKey {
    pub public_key: [u8; 32],
    pub chain_code: [u8; 32],
}

/// 7-byte device serial number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Serial(pub [u8; 7]);

/// Signature over the transaction hash for one derivation path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness {
    pub path: DerivationPath,
    pub signature: Signature,
}

/// Data the device computed while streaming auxiliary data that the host
/// needs to assemble the final auxiliary data blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuxiliaryDataSupplement {
    CatalystRegistration {
        auxiliary_data_hash: [u8; 32],
        registration_signature: Signature,
    },
}

/// Result of a successful signing session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub tx_hash: TxHash,
    pub witnesses: Vec<Witness>,
    pub auxiliary_data_supplement: Option<AuxiliaryDataSupplement>,
}

impl AsRef<[u8]> for TxHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Display for TxHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl std::fmt::Display for ExtendedPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}",
            hex::encode(self.public_key),
            hex::encode(self.chain_code)
        )
    }
}

impl std::fmt::Display for Serial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}
