//! Payloads for the `SIGN_TX` stages.

use crate::compat::DeviceCompatibility;
use crate::error::LedgerError;
use crate::primitives::{Hash32, Int64Str, Uint64Str};
use crate::serialize::address::address_params;
use crate::serialize::{credential, push_count, push_flag, push_i64, push_u32, push_u64};
use crate::tx::{
    AssetGroup, Certificate, CatalystRegistration, Input, Output, OutputDestination,
    RequiredSigner, SigningMode, Token, Transaction, Withdrawal,
};
use crate::types::DerivationPath;

const DESTINATION_THIRD_PARTY: u8 = 0x01;
const DESTINATION_DEVICE_OWNED: u8 = 0x02;

const AUX_DATA_ARBITRARY_HASH: u8 = 0x00;
const AUX_DATA_CATALYST_REGISTRATION: u8 = 0x01;

const REQUIRED_SIGNER_PATH: u8 = 0x00;
const REQUIRED_SIGNER_HASH: u8 = 0x01;

/// Header declaring which optional stages follow and how many items each
/// repeated stage carries. The device holds us to these counts.
pub fn init(
    tx: &Transaction,
    mode: SigningMode,
    witness_count: usize,
    compat: &DeviceCompatibility,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(48);
    buf.push(tx.network.network_id);
    push_u32(&mut buf, tx.network.protocol_magic);
    push_flag(&mut buf, tx.ttl.is_some());
    push_flag(&mut buf, tx.auxiliary_data.is_some());
    push_flag(&mut buf, tx.validity_interval_start.is_some());
    if compat.supports_mint {
        push_flag(&mut buf, tx.mint.is_some());
    }
    if compat.supports_alonzo {
        push_flag(&mut buf, tx.script_data_hash.is_some());
    }
    buf.push(mode.wire_code());
    push_count(&mut buf, tx.inputs.len());
    push_count(&mut buf, tx.outputs.len());
    push_count(&mut buf, tx.certificates.len());
    push_count(&mut buf, tx.withdrawals.len());
    if compat.supports_alonzo {
        push_count(&mut buf, tx.collateral_inputs.len());
        push_count(&mut buf, tx.required_signers.len());
    }
    push_count(&mut buf, witness_count);
    buf
}

/// `[tx hash 32][output index u32]`, used for inputs and collaterals.
pub fn input(input: &Input) -> Vec<u8> {
    let mut buf = Vec::with_capacity(36);
    buf.extend_from_slice(input.tx_hash.as_ref());
    push_u32(&mut buf, input.output_index);
    buf
}

pub fn output_basic(
    output: &Output,
    compat: &DeviceCompatibility,
) -> Result<Vec<u8>, LedgerError> {
    let mut buf = Vec::new();
    match &output.destination {
        OutputDestination::ThirdParty(address) => {
            buf.push(DESTINATION_THIRD_PARTY);
            push_count(&mut buf, address.len());
            buf.extend_from_slice(address.as_bytes());
        }
        OutputDestination::DeviceOwned(params) => {
            buf.push(DESTINATION_DEVICE_OWNED);
            buf.extend_from_slice(&address_params(params, compat)?);
        }
    }
    push_u64(&mut buf, output.amount.get());
    push_count(&mut buf, output.token_bundle.len());
    if compat.supports_alonzo {
        push_flag(&mut buf, output.datum_hash.is_some());
        if let Some(hash) = &output.datum_hash {
            buf.extend_from_slice(hash.as_ref());
        }
    }
    Ok(buf)
}

/// `[policy id 28][#tokens u32]`
pub fn asset_group<A>(group: &AssetGroup<A>) -> Vec<u8> {
    let mut buf = Vec::with_capacity(32);
    buf.extend_from_slice(group.policy_id.as_ref());
    push_count(&mut buf, group.tokens.len());
    buf
}

fn token_header<A>(token: &Token<A>) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4 + token.asset_name.len() + 8);
    push_count(&mut buf, token.asset_name.len());
    buf.extend_from_slice(token.asset_name.as_bytes());
    buf
}

pub fn output_token(token: &Token<Uint64Str>) -> Vec<u8> {
    let mut buf = token_header(token);
    push_u64(&mut buf, token.amount.get());
    buf
}

pub fn mint_token(token: &Token<Int64Str>) -> Vec<u8> {
    let mut buf = token_header(token);
    push_i64(&mut buf, token.amount.get());
    buf
}

/// `[#asset groups u32]`
pub fn mint_basic<A>(groups: &[AssetGroup<A>]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4);
    push_count(&mut buf, groups.len());
    buf
}

pub fn uint64(value: Uint64Str) -> Vec<u8> {
    value.get().to_be_bytes().to_vec()
}

/// `[type u8]` followed by the body. Pool registration bodies travel in
/// their own sub-exchanges.
pub fn certificate(
    cert: &Certificate,
    compat: &DeviceCompatibility,
) -> Result<Vec<u8>, LedgerError> {
    let mut buf = vec![cert.certificate_type() as u8];
    match cert {
        Certificate::StakeRegistration { credential: c }
        | Certificate::StakeDeregistration { credential: c } => {
            buf.extend_from_slice(&credential(c, compat)?);
        }
        Certificate::StakeDelegation {
            credential: c,
            pool_key_hash,
        } => {
            buf.extend_from_slice(&credential(c, compat)?);
            buf.extend_from_slice(pool_key_hash.as_ref());
        }
        Certificate::StakePoolRegistration(_) => {}
        Certificate::StakePoolRetirement {
            pool_key_path,
            retirement_epoch,
        } => {
            pool_key_path.serialize_into(&mut buf);
            push_u64(&mut buf, retirement_epoch.get());
        }
    }
    Ok(buf)
}

/// `[amount u64][stake credential]`
pub fn withdrawal(
    withdrawal: &Withdrawal,
    compat: &DeviceCompatibility,
) -> Result<Vec<u8>, LedgerError> {
    let mut buf = uint64(withdrawal.amount);
    buf.extend_from_slice(&credential(&withdrawal.stake_credential, compat)?);
    Ok(buf)
}

pub fn aux_data_hash(hash: &Hash32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(33);
    buf.push(AUX_DATA_ARBITRARY_HASH);
    buf.extend_from_slice(hash.as_ref());
    buf
}

pub fn aux_data_catalyst_header() -> Vec<u8> {
    vec![AUX_DATA_CATALYST_REGISTRATION]
}

pub fn catalyst_voting_key(reg: &CatalystRegistration) -> Vec<u8> {
    reg.voting_public_key.as_ref().to_vec()
}

pub fn catalyst_staking_path(reg: &CatalystRegistration) -> Vec<u8> {
    reg.staking_path.serialize()
}

pub fn catalyst_rewards_destination(
    reg: &CatalystRegistration,
    compat: &DeviceCompatibility,
) -> Result<Vec<u8>, LedgerError> {
    address_params(&reg.rewards_destination, compat)
}

pub fn catalyst_nonce(reg: &CatalystRegistration) -> Vec<u8> {
    uint64(reg.nonce)
}

pub fn hash32(hash: &Hash32) -> Vec<u8> {
    hash.as_ref().to_vec()
}

pub fn required_signer(signer: &RequiredSigner) -> Vec<u8> {
    let mut buf = Vec::new();
    match signer {
        RequiredSigner::Path(path) => {
            buf.push(REQUIRED_SIGNER_PATH);
            path.serialize_into(&mut buf);
        }
        RequiredSigner::Hash(hash) => {
            buf.push(REQUIRED_SIGNER_HASH);
            buf.extend_from_slice(hash.as_ref());
        }
    }
    buf
}

pub fn witness(path: &DerivationPath) -> Vec<u8> {
    path.serialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::tests::{current, legacy};
    use crate::serialize::{OPTION_NO, OPTION_YES};
    use crate::tx::parse_signing_request;
    use crate::tx::tests::{byron_tx, request};
    use serde_json::json;

    fn parsed(mode: &str, tx: serde_json::Value) -> Transaction {
        parse_signing_request(&request(mode, tx)).unwrap().tx
    }

    #[test]
    fn init_layout_legacy() {
        let tx = parsed("ordinary_transaction", byron_tx());
        let bytes = init(&tx, SigningMode::OrdinaryTransaction, 1, &legacy());
        let mut expected = vec![0x01];
        expected.extend_from_slice(&764_824_073u32.to_be_bytes());
        expected.extend_from_slice(&[OPTION_YES, OPTION_NO, OPTION_NO, 0x03]);
        for count in [1u32, 1, 0, 0, 1] {
            expected.extend_from_slice(&count.to_be_bytes());
        }
        assert_eq!(bytes, expected);
    }

    #[test]
    fn init_layout_alonzo() {
        let tx = parsed("ordinary_transaction", byron_tx());
        let bytes = init(&tx, SigningMode::OrdinaryTransaction, 1, &current());
        // mint and script data hash flags, then collateral and signer counts
        assert_eq!(bytes.len(), 1 + 4 + 5 + 1 + 7 * 4);
        assert_eq!(&bytes[5..11], &[OPTION_YES, OPTION_NO, OPTION_NO, OPTION_NO, OPTION_NO, 0x03]);
    }

    #[test]
    fn third_party_output() {
        let tx = parsed("ordinary_transaction", byron_tx());
        let bytes = output_basic(&tx.outputs[0], &legacy()).unwrap();
        assert_eq!(bytes[0], DESTINATION_THIRD_PARTY);
        assert_eq!(&bytes[1..5], &43u32.to_be_bytes());
        assert_eq!(&bytes[48..56], &3_003_112u64.to_be_bytes());
        assert_eq!(&bytes[56..], &[0, 0, 0, 0]);

        let with_datum_flag = output_basic(&tx.outputs[0], &current()).unwrap();
        assert_eq!(with_datum_flag.len(), bytes.len() + 1);
        assert_eq!(*with_datum_flag.last().unwrap(), OPTION_NO);
    }

    #[test]
    fn input_layout() {
        let tx = parsed("ordinary_transaction", byron_tx());
        let bytes = input(&tx.inputs[0]);
        assert_eq!(bytes.len(), 36);
        assert_eq!(&bytes[32..], &[0, 0, 0, 0]);
    }

    #[test]
    fn certificate_epochs() {
        let mut raw = byron_tx();
        raw["certificates"] = json!([{"type": 2, "params": {
            "stakeCredential": {"type": "key_path", "keyPath": "m/1852'/1815'/0'/2/0"},
            "poolKeyHashHex": "f61c42cbf7c8c53af3f520508212ad3e72f674f957fe23ff0acb4973",
        }}]);
        let tx = parsed("ordinary_transaction", raw);

        let legacy_bytes = certificate(&tx.certificates[0], &legacy()).unwrap();
        assert_eq!(legacy_bytes[0], 2);
        assert_eq!(legacy_bytes[1], 5);
        assert_eq!(legacy_bytes.len(), 1 + 21 + 28);

        let current_bytes = certificate(&tx.certificates[0], &current()).unwrap();
        assert_eq!(&current_bytes[..3], &[2, 0x00, 5]);
        assert_eq!(current_bytes.len(), 1 + 1 + 21 + 28);
    }

    #[test]
    fn retirement_layout() {
        let mut raw = byron_tx();
        raw["certificates"] = json!([{"type": 4, "params": {
            "poolKeyPath": "m/1853'/1815'/0'/0'", "retirementEpoch": "300",
        }}]);
        let tx = parsed("ordinary_transaction", raw);
        let bytes = certificate(&tx.certificates[0], &current()).unwrap();
        assert_eq!(bytes[0], 4);
        assert_eq!(&bytes[bytes.len() - 8..], &300u64.to_be_bytes());
    }

    #[test]
    fn mint_amounts_are_signed() {
        let mut raw = byron_tx();
        raw["mint"] = json!([{
            "policyIdHex": "95a292ffee938be03e9bae5657982a74e9014eb4960108c9e23a5b39",
            "tokens": [{"assetNameHex": "74657374", "amount": "-1"}],
        }]);
        let tx = parsed("ordinary_transaction", raw);
        let mint = tx.mint.unwrap();
        assert_eq!(mint_basic(&mint), vec![0, 0, 0, 1]);
        assert_eq!(asset_group(&mint[0]).len(), 32);
        let token = mint_token(&mint[0].tokens[0]);
        assert_eq!(&token[..8], &[0, 0, 0, 4, b't', b'e', b's', b't']);
        assert_eq!(&token[8..], &[0xFF; 8]);
    }

    #[test]
    fn required_signer_layout() {
        let signer = RequiredSigner::Path(DerivationPath::shelley(0, 0, 0));
        let bytes = required_signer(&signer);
        assert_eq!(bytes[0], REQUIRED_SIGNER_PATH);
        assert_eq!(bytes.len(), 1 + 21);
    }
}
