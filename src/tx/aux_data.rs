//! Auxiliary data: either a precomputed hash or a Catalyst voting
//! registration the device builds and signs itself.

use serde_json::Value;

use crate::error::InvalidDataReason;
use crate::primitives::{
    parse_hex_fixed, parse_object, parse_path, parse_uint64, required, Hash32, Uint64Str,
};
use crate::tx::address::{parse_address_params, Address, AddressParams};
use crate::types::{DerivationPath, Network};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalystRegistration {
    pub voting_public_key: Hash32,
    pub staking_path: DerivationPath,
    pub rewards_destination: AddressParams,
    pub nonce: Uint64Str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuxiliaryData {
    ArbitraryHash(Hash32),
    CatalystRegistration(CatalystRegistration),
}

/// `{ type: "arbitrary_hash", params: { hashHex } }` or
/// `{ type: "catalyst_registration", params: { votingPublicKeyHex,
/// stakingPath, rewardsDestination, nonce } }`.
pub fn parse_auxiliary_data(
    network: Network,
    value: &Value,
) -> Result<AuxiliaryData, InvalidDataReason> {
    let obj = parse_object(value, InvalidDataReason::AuxiliaryDataNotObject)?;
    let params = parse_object(
        required(obj, "params", InvalidDataReason::AuxiliaryDataNotObject)?,
        InvalidDataReason::AuxiliaryDataNotObject,
    )?;

    match required(obj, "type", InvalidDataReason::AuxiliaryDataUnknownType)?.as_str() {
        Some("arbitrary_hash") => Ok(AuxiliaryData::ArbitraryHash(parse_hex_fixed(
            required(params, "hashHex", InvalidDataReason::AuxiliaryDataInvalidHash)?,
            InvalidDataReason::AuxiliaryDataInvalidHash,
        )?)),
        Some("catalyst_registration") => {
            let voting_public_key = parse_hex_fixed(
                required(params, "votingPublicKeyHex", InvalidDataReason::CatalystInvalidVotingKey)?,
                InvalidDataReason::CatalystInvalidVotingKey,
            )?;
            let staking_path = parse_path(
                required(params, "stakingPath", InvalidDataReason::CatalystInvalidStakingPath)?,
                InvalidDataReason::CatalystInvalidStakingPath,
            )?;
            let rewards_destination = parse_address_params(
                network,
                required(
                    params,
                    "rewardsDestination",
                    InvalidDataReason::CatalystInvalidRewardsDestination,
                )?,
            )
            .map_err(|_| InvalidDataReason::CatalystInvalidRewardsDestination)?;
            // rewards go to a Shelley address the device can derive
            if matches!(rewards_destination.address, Address::Byron { .. })
                || rewards_destination.address.uses_scripts()
            {
                return Err(InvalidDataReason::CatalystInvalidRewardsDestination);
            }
            let nonce = parse_uint64(
                required(params, "nonce", InvalidDataReason::CatalystInvalidNonce)?,
                0..=u64::MAX,
                InvalidDataReason::CatalystInvalidNonce,
            )?;
            Ok(AuxiliaryData::CatalystRegistration(CatalystRegistration {
                voting_public_key,
                staking_path,
                rewards_destination,
                nonce,
            }))
        }
        _ => Err(InvalidDataReason::AuxiliaryDataUnknownType),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const VOTING_KEY: &str = "4b19e27ffc006ace16592311c4d2f0cafc255eaa47a6178ff540c0a46d07027c";

    fn catalyst(rewards: Value) -> Value {
        json!({
            "type": "catalyst_registration",
            "params": {
                "votingPublicKeyHex": VOTING_KEY,
                "stakingPath": "m/1852'/1815'/0'/2/0",
                "rewardsDestination": rewards,
                "nonce": 1454448,
            }
        })
    }

    #[test]
    fn arbitrary_hash() {
        let aux = parse_auxiliary_data(
            Network::MAINNET,
            &json!({"type": "arbitrary_hash", "params": {"hashHex": VOTING_KEY}}),
        )
        .unwrap();
        assert!(matches!(aux, AuxiliaryData::ArbitraryHash(_)));
    }

    #[test]
    fn catalyst_registration() {
        let aux = parse_auxiliary_data(
            Network::MAINNET,
            &catalyst(json!({
                "type": 0,
                "params": {
                    "spendingPath": "m/1852'/1815'/0'/0/0",
                    "stakingPath": "m/1852'/1815'/0'/2/0",
                }
            })),
        )
        .unwrap();
        let AuxiliaryData::CatalystRegistration(reg) = aux else {
            panic!("expected catalyst registration");
        };
        assert_eq!(reg.nonce.get(), 1_454_448);
        assert_eq!(reg.staking_path, DerivationPath::shelley(0, 2, 0));
    }

    #[test]
    fn catalyst_rejects_byron_rewards() {
        let err = parse_auxiliary_data(
            Network::MAINNET,
            &catalyst(json!({"type": 8, "params": {"spendingPath": "m/44'/1815'/0'/0/0"}})),
        );
        assert_eq!(err, Err(InvalidDataReason::CatalystInvalidRewardsDestination));
    }

    #[test]
    fn unknown_type() {
        let err = parse_auxiliary_data(
            Network::MAINNET,
            &json!({"type": "metadata", "params": {}}),
        );
        assert_eq!(err, Err(InvalidDataReason::AuxiliaryDataUnknownType));
    }
}
