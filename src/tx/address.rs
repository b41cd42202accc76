//! Address parameters for addresses the device derives itself.

use serde_json::{Map, Value};

use crate::error::InvalidDataReason;
use crate::primitives::{
    optional, parse_hex_fixed, parse_object, parse_path, parse_uint32, parse_uint8, required,
    Hash28,
};
use crate::types::{DerivationPath, Network};

/// Shelley header nibble / Byron marker, as the device numbers address types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AddressType {
    BasePaymentKeyStakeKey = 0x00,
    BasePaymentScriptStakeKey = 0x01,
    BasePaymentKeyStakeScript = 0x02,
    BasePaymentScriptStakeScript = 0x03,
    PointerKey = 0x04,
    PointerScript = 0x05,
    EnterpriseKey = 0x06,
    EnterpriseScript = 0x07,
    Byron = 0x08,
    RewardKey = 0x0E,
    RewardScript = 0x0F,
}

impl AddressType {
    fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0x00 => Self::BasePaymentKeyStakeKey,
            0x01 => Self::BasePaymentScriptStakeKey,
            0x02 => Self::BasePaymentKeyStakeScript,
            0x03 => Self::BasePaymentScriptStakeScript,
            0x04 => Self::PointerKey,
            0x05 => Self::PointerScript,
            0x06 => Self::EnterpriseKey,
            0x07 => Self::EnterpriseScript,
            0x08 => Self::Byron,
            0x0E => Self::RewardKey,
            0x0F => Self::RewardScript,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpendingSource {
    Path(DerivationPath),
    ScriptHash(Hash28),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StakingSource {
    KeyPath(DerivationPath),
    KeyHash(Hash28),
    ScriptHash(Hash28),
}

impl StakingSource {
    fn is_script(&self) -> bool {
        matches!(self, Self::ScriptHash(_))
    }
}

/// Certificate index triple locating a stake registration on chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockchainPointer {
    pub block_index: u32,
    pub tx_index: u32,
    pub certificate_index: u32,
}

/// An address shape. Each kind only admits the sources it can carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Base {
        spending: SpendingSource,
        staking: StakingSource,
    },
    Pointer {
        spending: SpendingSource,
        pointer: BlockchainPointer,
    },
    Enterprise {
        spending: SpendingSource,
    },
    Reward {
        staking: StakingSource,
    },
    Byron {
        spending: DerivationPath,
    },
}

impl Address {
    pub fn address_type(&self) -> AddressType {
        use AddressType::*;
        match self {
            Self::Base { spending, staking } => {
                match (matches!(spending, SpendingSource::ScriptHash(_)), staking.is_script()) {
                    (false, false) => BasePaymentKeyStakeKey,
                    (true, false) => BasePaymentScriptStakeKey,
                    (false, true) => BasePaymentKeyStakeScript,
                    (true, true) => BasePaymentScriptStakeScript,
                }
            }
            Self::Pointer { spending, .. } => match spending {
                SpendingSource::Path(_) => PointerKey,
                SpendingSource::ScriptHash(_) => PointerScript,
            },
            Self::Enterprise { spending } => match spending {
                SpendingSource::Path(_) => EnterpriseKey,
                SpendingSource::ScriptHash(_) => EnterpriseScript,
            },
            Self::Reward { staking } => {
                if staking.is_script() {
                    RewardScript
                } else {
                    RewardKey
                }
            }
            Self::Byron { .. } => Byron,
        }
    }

    pub fn spending(&self) -> Option<&SpendingSource> {
        match self {
            Self::Base { spending, .. }
            | Self::Pointer { spending, .. }
            | Self::Enterprise { spending } => Some(spending),
            Self::Reward { .. } | Self::Byron { .. } => None,
        }
    }

    pub fn has_script_spending(&self) -> bool {
        matches!(self.spending(), Some(SpendingSource::ScriptHash(_)))
    }

    /// Whether any part of the address is a script hash.
    pub fn uses_scripts(&self) -> bool {
        match self {
            Self::Base { spending, staking } => {
                matches!(spending, SpendingSource::ScriptHash(_)) || staking.is_script()
            }
            Self::Pointer { spending, .. } | Self::Enterprise { spending } => {
                matches!(spending, SpendingSource::ScriptHash(_))
            }
            Self::Reward { staking } => staking.is_script(),
            Self::Byron { .. } => false,
        }
    }
}

/// A validated address together with the network it lives on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressParams {
    pub network: Network,
    pub address: Address,
}

#[derive(Clone, Copy)]
enum Spending {
    Key,
    Script,
}

#[derive(Clone, Copy)]
enum Staking {
    Key,
    Script,
}

/// Parses `{ type, params: { spendingPath | spendingScriptHashHex,
/// stakingPath | stakingKeyHashHex | stakingScriptHashHex |
/// stakingBlockchainPointer } }`.
pub fn parse_address_params(
    network: Network,
    value: &Value,
) -> Result<AddressParams, InvalidDataReason> {
    let obj = parse_object(value, InvalidDataReason::AddressParamsNotObject)?;
    let raw_type = required(obj, "type", InvalidDataReason::AddressInvalidType)?;
    let address_type = parse_uint8(raw_type, 0..=u8::MAX, InvalidDataReason::AddressInvalidType)
        .ok()
        .and_then(AddressType::from_u8)
        .ok_or(InvalidDataReason::AddressInvalidType)?;
    let params = parse_object(
        required(obj, "params", InvalidDataReason::AddressParamsNotObject)?,
        InvalidDataReason::AddressParamsNotObject,
    )?;

    use AddressType::*;
    let address = match address_type {
        BasePaymentKeyStakeKey => base(params, Spending::Key, Staking::Key)?,
        BasePaymentScriptStakeKey => base(params, Spending::Script, Staking::Key)?,
        BasePaymentKeyStakeScript => base(params, Spending::Key, Staking::Script)?,
        BasePaymentScriptStakeScript => base(params, Spending::Script, Staking::Script)?,
        PointerKey | PointerScript => {
            let kind = if address_type == PointerKey {
                Spending::Key
            } else {
                Spending::Script
            };
            let spending = parse_spending(params, kind)?;
            let pointer = parse_pointer(params)?;
            Address::Pointer { spending, pointer }
        }
        EnterpriseKey | EnterpriseScript => {
            let kind = if address_type == EnterpriseKey {
                Spending::Key
            } else {
                Spending::Script
            };
            let spending = parse_spending(params, kind)?;
            expect_no_staking(params)?;
            Address::Enterprise { spending }
        }
        Byron => {
            let spending = match parse_spending(params, Spending::Key)? {
                SpendingSource::Path(path) => path,
                SpendingSource::ScriptHash(_) => {
                    return Err(InvalidDataReason::AddressInvalidSpendingInfo)
                }
            };
            expect_no_staking(params)?;
            Address::Byron { spending }
        }
        RewardKey | RewardScript => {
            expect_no_spending(params)?;
            let kind = if address_type == RewardKey {
                Staking::Key
            } else {
                Staking::Script
            };
            let staking = parse_staking(params, kind)?;
            Address::Reward { staking }
        }
    };

    Ok(AddressParams { network, address })
}

fn base(
    params: &Map<String, Value>,
    spending: Spending,
    staking: Staking,
) -> Result<Address, InvalidDataReason> {
    Ok(Address::Base {
        spending: parse_spending(params, spending)?,
        staking: parse_staking(params, staking)?,
    })
}

fn parse_spending(
    params: &Map<String, Value>,
    kind: Spending,
) -> Result<SpendingSource, InvalidDataReason> {
    let path = optional(params, "spendingPath");
    let script = optional(params, "spendingScriptHashHex");
    match (kind, path, script) {
        (Spending::Key, Some(p), None) => Ok(SpendingSource::Path(parse_path(
            p,
            InvalidDataReason::AddressInvalidSpendingPath,
        )?)),
        (Spending::Script, None, Some(h)) => Ok(SpendingSource::ScriptHash(parse_hex_fixed(
            h,
            InvalidDataReason::AddressInvalidSpendingScriptHash,
        )?)),
        _ => Err(InvalidDataReason::AddressInvalidSpendingInfo),
    }
}

fn parse_staking(
    params: &Map<String, Value>,
    kind: Staking,
) -> Result<StakingSource, InvalidDataReason> {
    if optional(params, "stakingBlockchainPointer").is_some() {
        return Err(InvalidDataReason::AddressInvalidStakingInfo);
    }
    let path = optional(params, "stakingPath");
    let key_hash = optional(params, "stakingKeyHashHex");
    let script = optional(params, "stakingScriptHashHex");
    match (kind, path, key_hash, script) {
        (Staking::Key, Some(p), None, None) => Ok(StakingSource::KeyPath(parse_path(
            p,
            InvalidDataReason::AddressInvalidStakingPath,
        )?)),
        (Staking::Key, None, Some(h), None) => Ok(StakingSource::KeyHash(parse_hex_fixed(
            h,
            InvalidDataReason::AddressInvalidStakingKeyHash,
        )?)),
        (Staking::Script, None, None, Some(h)) => Ok(StakingSource::ScriptHash(parse_hex_fixed(
            h,
            InvalidDataReason::AddressInvalidStakingScriptHash,
        )?)),
        _ => Err(InvalidDataReason::AddressInvalidStakingInfo),
    }
}

fn parse_pointer(params: &Map<String, Value>) -> Result<BlockchainPointer, InvalidDataReason> {
    const R: InvalidDataReason = InvalidDataReason::AddressInvalidBlockchainPointer;
    if ["stakingPath", "stakingKeyHashHex", "stakingScriptHashHex"]
        .iter()
        .any(|k| optional(params, k).is_some())
    {
        return Err(InvalidDataReason::AddressInvalidStakingInfo);
    }
    let pointer = parse_object(
        required(params, "stakingBlockchainPointer", InvalidDataReason::AddressInvalidStakingInfo)?,
        R,
    )?;
    Ok(BlockchainPointer {
        block_index: parse_uint32(required(pointer, "blockIndex", R)?, R)?,
        tx_index: parse_uint32(required(pointer, "txIndex", R)?, R)?,
        certificate_index: parse_uint32(required(pointer, "certificateIndex", R)?, R)?,
    })
}

fn expect_no_staking(params: &Map<String, Value>) -> Result<(), InvalidDataReason> {
    let any = [
        "stakingPath",
        "stakingKeyHashHex",
        "stakingScriptHashHex",
        "stakingBlockchainPointer",
    ]
    .iter()
    .any(|k| optional(params, k).is_some());
    if any {
        return Err(InvalidDataReason::AddressInvalidStakingInfo);
    }
    Ok(())
}

fn expect_no_spending(params: &Map<String, Value>) -> Result<(), InvalidDataReason> {
    if optional(params, "spendingPath").is_some()
        || optional(params, "spendingScriptHashHex").is_some()
    {
        return Err(InvalidDataReason::AddressInvalidSpendingInfo);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const KEY_HASH: &str = "122a946b9ad3d2ddf029d3a828f0468aece76895f15c9efbd69b4277";
    const SCRIPT_HASH: &str = "14c16d7f43243bd81478e68b9db53a8528fd4fb1078d58d54a7f1124";

    fn parse(v: Value) -> Result<Address, InvalidDataReason> {
        parse_address_params(Network::MAINNET, &v).map(|p| p.address)
    }

    #[test]
    fn base_key_path_key_path() {
        let addr = parse(json!({
            "type": 0,
            "params": {
                "spendingPath": "m/1852'/1815'/0'/0/1",
                "stakingPath": "m/1852'/1815'/0'/2/0",
            }
        }))
        .unwrap();
        assert_eq!(addr.address_type(), AddressType::BasePaymentKeyStakeKey);
        assert!(!addr.uses_scripts());
    }

    #[test]
    fn base_with_key_hash() {
        let addr = parse(json!({
            "type": 0,
            "params": {"spendingPath": "m/1852'/1815'/0'/0/1", "stakingKeyHashHex": KEY_HASH}
        }))
        .unwrap();
        assert!(matches!(
            addr,
            Address::Base {
                staking: StakingSource::KeyHash(_),
                ..
            }
        ));
    }

    #[test]
    fn base_script_script() {
        let addr = parse(json!({
            "type": 3,
            "params": {"spendingScriptHashHex": SCRIPT_HASH, "stakingScriptHashHex": SCRIPT_HASH}
        }))
        .unwrap();
        assert_eq!(addr.address_type(), AddressType::BasePaymentScriptStakeScript);
        assert!(addr.has_script_spending());
        assert!(addr.uses_scripts());
    }

    #[test]
    fn base_key_stake_script_uses_scripts() {
        let addr = parse(json!({
            "type": 2,
            "params": {"spendingPath": "m/1852'/1815'/0'/0/1", "stakingScriptHashHex": SCRIPT_HASH}
        }))
        .unwrap();
        assert!(addr.uses_scripts());
        assert!(!addr.has_script_spending());
    }

    #[test]
    fn base_requires_staking() {
        let err = parse(json!({"type": 0, "params": {"spendingPath": "m/1852'/1815'/0'/0/1"}}));
        assert_eq!(err, Err(InvalidDataReason::AddressInvalidStakingInfo));
    }

    #[test]
    fn base_rejects_both_staking_sources() {
        let err = parse(json!({
            "type": 0,
            "params": {
                "spendingPath": "m/1852'/1815'/0'/0/1",
                "stakingPath": "m/1852'/1815'/0'/2/0",
                "stakingKeyHashHex": KEY_HASH,
            }
        }));
        assert_eq!(err, Err(InvalidDataReason::AddressInvalidStakingInfo));
    }

    #[test]
    fn pointer_requires_three_components() {
        let ok = parse(json!({
            "type": 4,
            "params": {
                "spendingPath": "m/1852'/1815'/0'/0/1",
                "stakingBlockchainPointer": {"blockIndex": 1, "txIndex": 2, "certificateIndex": 3},
            }
        }))
        .unwrap();
        assert_eq!(
            ok,
            Address::Pointer {
                spending: SpendingSource::Path(DerivationPath::shelley(0, 0, 1)),
                pointer: BlockchainPointer {
                    block_index: 1,
                    tx_index: 2,
                    certificate_index: 3
                },
            }
        );

        let err = parse(json!({
            "type": 4,
            "params": {
                "spendingPath": "m/1852'/1815'/0'/0/1",
                "stakingBlockchainPointer": {"blockIndex": 1, "txIndex": 2},
            }
        }));
        assert_eq!(err, Err(InvalidDataReason::AddressInvalidBlockchainPointer));
    }

    #[test]
    fn enterprise_rejects_staking() {
        let err = parse(json!({
            "type": 6,
            "params": {"spendingPath": "m/1852'/1815'/0'/0/1", "stakingKeyHashHex": KEY_HASH}
        }));
        assert_eq!(err, Err(InvalidDataReason::AddressInvalidStakingInfo));
    }

    #[test]
    fn reward_rejects_spending() {
        let err = parse(json!({
            "type": 14,
            "params": {"spendingPath": "m/1852'/1815'/0'/0/1", "stakingPath": "m/1852'/1815'/0'/2/0"}
        }));
        assert_eq!(err, Err(InvalidDataReason::AddressInvalidSpendingInfo));

        let ok = parse(json!({"type": 14, "params": {"stakingPath": "m/1852'/1815'/0'/2/0"}}));
        assert_eq!(
            ok,
            Ok(Address::Reward {
                staking: StakingSource::KeyPath(DerivationPath::shelley(0, 2, 0))
            })
        );
    }

    #[test]
    fn reward_script() {
        let addr = parse(json!({"type": 15, "params": {"stakingScriptHashHex": SCRIPT_HASH}})).unwrap();
        assert_eq!(addr.address_type(), AddressType::RewardScript);
        assert!(addr.uses_scripts());
    }

    #[test]
    fn byron_path_only() {
        let addr = parse(json!({"type": 8, "params": {"spendingPath": "m/44'/1815'/0'/0/0"}})).unwrap();
        assert_eq!(
            addr,
            Address::Byron {
                spending: DerivationPath::byron(0, 0)
            }
        );
        assert!(!addr.uses_scripts());
    }

    #[test]
    fn key_type_rejects_script_spending() {
        let err = parse(json!({"type": 6, "params": {"spendingScriptHashHex": SCRIPT_HASH}}));
        assert_eq!(err, Err(InvalidDataReason::AddressInvalidSpendingInfo));
    }

    #[test]
    fn unknown_type() {
        for t in [json!(9), json!(16), json!("x"), json!(null)] {
            let err = parse(json!({"type": t, "params": {}}));
            assert_eq!(err, Err(InvalidDataReason::AddressInvalidType));
        }
    }

    #[test]
    fn bad_hash_length() {
        let err = parse(json!({"type": 7, "params": {"spendingScriptHashHex": "00"}}));
        assert_eq!(err, Err(InvalidDataReason::AddressInvalidSpendingScriptHash));
    }
}
