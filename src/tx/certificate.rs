//! Certificates, stake credentials and stake pool registration parameters.

use serde_json::{Map, Value};

use crate::error::InvalidDataReason;
use crate::primitives::{
    optional, optional_array, parse_ascii, parse_hex_fixed, parse_object, parse_path,
    parse_uint16, parse_uint64, parse_uint8, required, AsciiString, FixedHex, Hash28, Hash32,
    Uint64Str, MAX_LOVELACE_SUPPLY,
};
use crate::types::DerivationPath;

pub const MAX_POOL_OWNERS: usize = 1000;
pub const MAX_POOL_RELAYS: usize = 1000;
pub const MAX_DNS_NAME_LENGTH: usize = 64;
pub const MAX_METADATA_URL_LENGTH: usize = 64;
pub const MAX_MARGIN_DENOMINATOR: u64 = 1_000_000_000_000_000;
pub const REWARD_ACCOUNT_LENGTH: usize = 29;

/// A stake credential: either a key the device derives or a script hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    KeyPath(DerivationPath),
    ScriptHash(Hash28),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CertificateType {
    StakeRegistration = 0,
    StakeDeregistration = 1,
    StakeDelegation = 2,
    StakePoolRegistration = 3,
    StakePoolRetirement = 4,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Certificate {
    StakeRegistration {
        credential: Credential,
    },
    StakeDeregistration {
        credential: Credential,
    },
    StakeDelegation {
        credential: Credential,
        pool_key_hash: Hash28,
    },
    StakePoolRegistration(Box<PoolParams>),
    StakePoolRetirement {
        pool_key_path: DerivationPath,
        retirement_epoch: Uint64Str,
    },
}

impl Certificate {
    pub fn certificate_type(&self) -> CertificateType {
        match self {
            Self::StakeRegistration { .. } => CertificateType::StakeRegistration,
            Self::StakeDeregistration { .. } => CertificateType::StakeDeregistration,
            Self::StakeDelegation { .. } => CertificateType::StakeDelegation,
            Self::StakePoolRegistration(_) => CertificateType::StakePoolRegistration,
            Self::StakePoolRetirement { .. } => CertificateType::StakePoolRetirement,
        }
    }

    /// The stake credential of registration, deregistration and delegation.
    pub fn credential(&self) -> Option<&Credential> {
        match self {
            Self::StakeRegistration { credential }
            | Self::StakeDeregistration { credential }
            | Self::StakeDelegation { credential, .. } => Some(credential),
            Self::StakePoolRegistration(_) | Self::StakePoolRetirement { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolKey {
    DeviceOwned(DerivationPath),
    ThirdParty(Hash28),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolOwner {
    DeviceOwned(DerivationPath),
    ThirdParty(Hash28),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolRewardAccount {
    DeviceOwned(DerivationPath),
    ThirdParty(FixedHex<REWARD_ACCOUNT_LENGTH>),
}

/// Pool margin as a fraction. `numerator <= denominator <= 10^15`,
/// `denominator > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Margin {
    pub numerator: Uint64Str,
    pub denominator: Uint64Str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relay {
    SingleHostIp {
        port: Option<u16>,
        ipv4: Option<[u8; 4]>,
        ipv6: Option<[u8; 16]>,
    },
    SingleHostName {
        port: Option<u16>,
        dns_name: AsciiString,
    },
    MultiHost {
        dns_name: AsciiString,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolMetadata {
    pub url: AsciiString,
    pub hash: Hash32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolParams {
    pub pool_key: PoolKey,
    pub vrf_key_hash: Hash32,
    pub pledge: Uint64Str,
    pub cost: Uint64Str,
    pub margin: Margin,
    pub reward_account: PoolRewardAccount,
    pub owners: Vec<PoolOwner>,
    pub relays: Vec<Relay>,
    pub metadata: Option<PoolMetadata>,
}

impl PoolParams {
    pub fn device_owned_owners(&self) -> impl Iterator<Item = &DerivationPath> {
        self.owners.iter().filter_map(|o| match o {
            PoolOwner::DeviceOwned(path) => Some(path),
            PoolOwner::ThirdParty(_) => None,
        })
    }
}

/// `{ type: "key_path", keyPath }` or `{ type: "script_hash", scriptHashHex }`.
pub fn parse_credential(
    value: &Value,
    reason: InvalidDataReason,
) -> Result<Credential, InvalidDataReason> {
    let obj = parse_object(value, reason)?;
    match required(obj, "type", reason)?.as_str() {
        Some("key_path") => Ok(Credential::KeyPath(parse_path(
            required(obj, "keyPath", reason)?,
            reason,
        )?)),
        Some("script_hash") => Ok(Credential::ScriptHash(parse_hex_fixed(
            required(obj, "scriptHashHex", reason)?,
            reason,
        )?)),
        _ => Err(reason),
    }
}

/// `{ type: 0..=4, params: {...} }`
pub fn parse_certificate(value: &Value) -> Result<Certificate, InvalidDataReason> {
    let obj = parse_object(value, InvalidDataReason::CertificateInvalidType)?;
    let cert_type = parse_uint8(
        required(obj, "type", InvalidDataReason::CertificateInvalidType)?,
        0..=4,
        InvalidDataReason::CertificateInvalidType,
    )?;
    let params = parse_object(
        required(obj, "params", InvalidDataReason::CertificateInvalidType)?,
        InvalidDataReason::CertificateInvalidType,
    )?;

    let stake_credential = |params: &Map<String, Value>| {
        parse_credential(
            required(
                params,
                "stakeCredential",
                InvalidDataReason::CertificateInvalidStakeCredential,
            )?,
            InvalidDataReason::CertificateInvalidStakeCredential,
        )
    };

    match cert_type {
        0 => Ok(Certificate::StakeRegistration {
            credential: stake_credential(params)?,
        }),
        1 => Ok(Certificate::StakeDeregistration {
            credential: stake_credential(params)?,
        }),
        2 => Ok(Certificate::StakeDelegation {
            credential: stake_credential(params)?,
            pool_key_hash: parse_hex_fixed(
                required(
                    params,
                    "poolKeyHashHex",
                    InvalidDataReason::CertificateInvalidPoolKeyHash,
                )?,
                InvalidDataReason::CertificateInvalidPoolKeyHash,
            )?,
        }),
        3 => Ok(Certificate::StakePoolRegistration(Box::new(
            parse_pool_params(params)?,
        ))),
        _ => Ok(Certificate::StakePoolRetirement {
            pool_key_path: parse_path(
                required(params, "poolKeyPath", InvalidDataReason::CertificateInvalidPath)?,
                InvalidDataReason::CertificateInvalidPath,
            )?,
            retirement_epoch: parse_uint64(
                required(
                    params,
                    "retirementEpoch",
                    InvalidDataReason::CertificateInvalidRetirementEpoch,
                )?,
                0..=u64::MAX,
                InvalidDataReason::CertificateInvalidRetirementEpoch,
            )?,
        }),
    }
}

fn parse_pool_params(obj: &Map<String, Value>) -> Result<PoolParams, InvalidDataReason> {
    let pool_key = parse_pool_key(required(
        obj,
        "poolKey",
        InvalidDataReason::PoolRegistrationInvalidPoolKey,
    )?)?;
    let vrf_key_hash = parse_hex_fixed(
        required(obj, "vrfKeyHashHex", InvalidDataReason::PoolRegistrationInvalidVrfKeyHash)?,
        InvalidDataReason::PoolRegistrationInvalidVrfKeyHash,
    )?;
    let pledge = parse_uint64(
        required(obj, "pledge", InvalidDataReason::PoolRegistrationInvalidPledge)?,
        0..=MAX_LOVELACE_SUPPLY,
        InvalidDataReason::PoolRegistrationInvalidPledge,
    )?;
    let cost = parse_uint64(
        required(obj, "cost", InvalidDataReason::PoolRegistrationInvalidCost)?,
        0..=MAX_LOVELACE_SUPPLY,
        InvalidDataReason::PoolRegistrationInvalidCost,
    )?;
    let margin = parse_margin(required(
        obj,
        "margin",
        InvalidDataReason::PoolRegistrationInvalidMargin,
    )?)?;
    let reward_account = parse_reward_account(required(
        obj,
        "rewardAccount",
        InvalidDataReason::PoolRegistrationInvalidRewardAccount,
    )?)?;

    let raw_owners = optional_array(obj, "poolOwners", InvalidDataReason::PoolRegistrationOwnersNotArray)?;
    if raw_owners.len() > MAX_POOL_OWNERS {
        return Err(InvalidDataReason::PoolRegistrationOwnersTooMany);
    }
    let owners = raw_owners
        .iter()
        .map(parse_pool_owner)
        .collect::<Result<Vec<_>, _>>()?;

    let raw_relays = optional_array(obj, "relays", InvalidDataReason::PoolRegistrationRelaysNotArray)?;
    if raw_relays.len() > MAX_POOL_RELAYS {
        return Err(InvalidDataReason::PoolRegistrationRelaysTooMany);
    }
    let relays = raw_relays
        .iter()
        .map(parse_relay)
        .collect::<Result<Vec<_>, _>>()?;

    let metadata = optional(obj, "metadata").map(parse_pool_metadata).transpose()?;

    Ok(PoolParams {
        pool_key,
        vrf_key_hash,
        pledge,
        cost,
        margin,
        reward_account,
        owners,
        relays,
        metadata,
    })
}

fn parse_pool_key(value: &Value) -> Result<PoolKey, InvalidDataReason> {
    const R: InvalidDataReason = InvalidDataReason::PoolRegistrationInvalidPoolKey;
    let obj = parse_object(value, R)?;
    match required(obj, "type", R)?.as_str() {
        Some("device_owned") => Ok(PoolKey::DeviceOwned(parse_path(required(obj, "path", R)?, R)?)),
        Some("third_party") => Ok(PoolKey::ThirdParty(parse_hex_fixed(
            required(obj, "keyHashHex", R)?,
            R,
        )?)),
        _ => Err(R),
    }
}

fn parse_pool_owner(value: &Value) -> Result<PoolOwner, InvalidDataReason> {
    const R: InvalidDataReason = InvalidDataReason::PoolRegistrationInvalidOwner;
    let obj = parse_object(value, R)?;
    match required(obj, "type", R)?.as_str() {
        Some("device_owned") => Ok(PoolOwner::DeviceOwned(parse_path(
            required(obj, "stakingPath", R)?,
            R,
        )?)),
        Some("third_party") => Ok(PoolOwner::ThirdParty(parse_hex_fixed(
            required(obj, "stakingKeyHashHex", R)?,
            R,
        )?)),
        _ => Err(R),
    }
}

fn parse_reward_account(value: &Value) -> Result<PoolRewardAccount, InvalidDataReason> {
    const R: InvalidDataReason = InvalidDataReason::PoolRegistrationInvalidRewardAccount;
    let obj = parse_object(value, R)?;
    match required(obj, "type", R)?.as_str() {
        Some("device_owned") => Ok(PoolRewardAccount::DeviceOwned(parse_path(
            required(obj, "path", R)?,
            R,
        )?)),
        Some("third_party") => {
            let account: FixedHex<REWARD_ACCOUNT_LENGTH> =
                parse_hex_fixed(required(obj, "rewardAccountHex", R)?, R)?;
            // header nibble 0b1110 (key) or 0b1111 (script)
            if account.as_bytes()[0] >> 4 < 0x0E {
                return Err(R);
            }
            Ok(PoolRewardAccount::ThirdParty(account))
        }
        _ => Err(R),
    }
}

pub fn parse_margin(value: &Value) -> Result<Margin, InvalidDataReason> {
    const R: InvalidDataReason = InvalidDataReason::PoolRegistrationInvalidMargin;
    let obj = parse_object(value, R)?;
    let denominator = parse_uint64(
        required(obj, "denominator", InvalidDataReason::PoolRegistrationInvalidMarginDenominator)?,
        1..=MAX_MARGIN_DENOMINATOR,
        InvalidDataReason::PoolRegistrationInvalidMarginDenominator,
    )?;
    let numerator = parse_uint64(required(obj, "numerator", R)?, 0..=denominator.get(), R)?;
    Ok(Margin {
        numerator,
        denominator,
    })
}

fn parse_relay(value: &Value) -> Result<Relay, InvalidDataReason> {
    const R: InvalidDataReason = InvalidDataReason::PoolRegistrationInvalidRelay;
    let obj = parse_object(value, R)?;
    let relay_type = parse_uint8(required(obj, "type", R)?, 0..=2, R)?;
    let params = parse_object(required(obj, "params", R)?, R)?;

    let port = || {
        optional(params, "portNumber")
            .map(|p| parse_uint16(p, InvalidDataReason::RelayInvalidPort))
            .transpose()
    };
    let dns_name = || {
        let name = parse_ascii(
            required(params, "dnsName", InvalidDataReason::RelayInvalidDns)?,
            MAX_DNS_NAME_LENGTH,
            InvalidDataReason::RelayInvalidDns,
        )?;
        if name.as_bytes().is_empty() {
            return Err(InvalidDataReason::RelayInvalidDns);
        }
        Ok(name)
    };

    match relay_type {
        0 => {
            let ipv4 = optional(params, "ipv4").map(parse_ipv4).transpose()?;
            let ipv6 = optional(params, "ipv6").map(parse_ipv6).transpose()?;
            Ok(Relay::SingleHostIp {
                port: port()?,
                ipv4,
                ipv6,
            })
        }
        1 => Ok(Relay::SingleHostName {
            port: port()?,
            dns_name: dns_name()?,
        }),
        _ => Ok(Relay::MultiHost {
            dns_name: dns_name()?,
        }),
    }
}

/// Dotted quad, each octet a canonical decimal in `0..=255`.
fn parse_ipv4(value: &Value) -> Result<[u8; 4], InvalidDataReason> {
    const R: InvalidDataReason = InvalidDataReason::RelayInvalidIpv4;
    let s = value.as_str().ok_or(R)?;
    let mut out = [0u8; 4];
    let mut parts = s.split('.');
    for octet in out.iter_mut() {
        let part = parts.next().ok_or(R)?;
        *octet = parse_uint8(&Value::String(part.to_owned()), 0..=u8::MAX, R)?;
    }
    if parts.next().is_some() {
        return Err(R);
    }
    Ok(out)
}

/// 32 hex digits once colons are stripped. No `::` shorthand.
fn parse_ipv6(value: &Value) -> Result<[u8; 16], InvalidDataReason> {
    const R: InvalidDataReason = InvalidDataReason::RelayInvalidIpv6;
    let s = value.as_str().ok_or(R)?;
    let stripped: String = s.chars().filter(|&c| c != ':').collect();
    let hex: FixedHex<16> = parse_hex_fixed(&Value::String(stripped), R)?;
    Ok(*hex.as_bytes())
}

fn parse_pool_metadata(value: &Value) -> Result<PoolMetadata, InvalidDataReason> {
    let obj = parse_object(value, InvalidDataReason::PoolRegistrationInvalidMetadata)?;
    Ok(PoolMetadata {
        url: parse_ascii(
            required(obj, "metadataUrl", InvalidDataReason::PoolMetadataInvalidUrl)?,
            MAX_METADATA_URL_LENGTH,
            InvalidDataReason::PoolMetadataInvalidUrl,
        )?,
        hash: parse_hex_fixed(
            required(obj, "metadataHashHex", InvalidDataReason::PoolMetadataInvalidHash)?,
            InvalidDataReason::PoolMetadataInvalidHash,
        )?,
    })
}
