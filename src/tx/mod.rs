//! Validated transaction model and the parser from raw JSON requests.
//!
//! Parsing is all-or-nothing: the first violated rule aborts with its
//! [`InvalidDataReason`] and no partial transaction escapes.
//!
//! ```
//! use ledger_cardano::tx::{parse_signing_request, SigningMode};
//! use serde_json::json;
//!
//! let request = parse_signing_request(&json!({
//!     "signingMode": "ordinary_transaction",
//!     "tx": {
//!         "network": {"networkId": 1, "protocolMagic": 764824073},
//!         "inputs": [{
//!             "txHashHex": "1af8fa0b754ff99253d983894e63a2b09cbb56c833ba18c3384210163f63dcfc",
//!             "outputIndex": 0,
//!             "path": "m/44'/1815'/0'/0/0",
//!         }],
//!         "outputs": [],
//!         "fee": "42",
//!         "ttl": "10",
//!     },
//! }))?;
//! assert_eq!(request.signing_mode, SigningMode::OrdinaryTransaction);
//! # Ok::<(), ledger_cardano::error::InvalidDataReason>(())
//! ```

pub mod address;
pub mod aux_data;
pub mod certificate;
pub(crate) mod mode;
pub mod output;

use serde_json::{Map, Value};

use crate::error::InvalidDataReason;
use crate::primitives::{
    optional, optional_array, parse_hex_fixed, parse_int64, parse_object, parse_path,
    parse_uint32, parse_uint64, parse_uint8, required, Hash28, Hash32, Int64Str, Uint64Str,
    MAX_LOVELACE_SUPPLY,
};
use crate::types::{DerivationPath, Network};

pub use address::{
    parse_address_params, Address, AddressParams, AddressType, BlockchainPointer, SpendingSource,
    StakingSource,
};
pub use aux_data::{AuxiliaryData, CatalystRegistration};
pub use certificate::{
    Certificate, CertificateType, Credential, Margin, PoolKey, PoolMetadata, PoolOwner,
    PoolParams, PoolRewardAccount, Relay,
};
pub use output::{AssetGroup, Output, OutputDestination, Token, TokenBundle};

/// Highest Shelley network id; the id occupies the low header nibble.
pub const MAX_NETWORK_ID: u8 = 0x0F;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub tx_hash: Hash32,
    pub output_index: u32,
    /// Set when the device should witness this input.
    pub path: Option<DerivationPath>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Withdrawal {
    pub stake_credential: Credential,
    pub amount: Uint64Str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequiredSigner {
    Path(DerivationPath),
    Hash(Hash28),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub network: Network,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    pub fee: Uint64Str,
    pub ttl: Option<Uint64Str>,
    pub certificates: Vec<Certificate>,
    pub withdrawals: Vec<Withdrawal>,
    pub auxiliary_data: Option<AuxiliaryData>,
    pub validity_interval_start: Option<Uint64Str>,
    pub mint: Option<TokenBundle<Int64Str>>,
    pub script_data_hash: Option<Hash32>,
    pub collateral_inputs: Vec<Input>,
    pub required_signers: Vec<RequiredSigner>,
}

/// Decides which rules apply and what the device shows the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningMode {
    OrdinaryTransaction,
    PoolRegistrationAsOwner,
    PoolRegistrationAsOperator,
    MultisigTransaction,
    PlutusTransaction,
}

impl SigningMode {
    /// Mode byte in the `INIT` payload.
    pub fn wire_code(self) -> u8 {
        match self {
            Self::OrdinaryTransaction => 0x03,
            Self::PoolRegistrationAsOwner => 0x04,
            Self::PoolRegistrationAsOperator => 0x05,
            Self::MultisigTransaction => 0x06,
            Self::PlutusTransaction => 0x07,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "ordinary_transaction" => Self::OrdinaryTransaction,
            "pool_registration_as_owner" => Self::PoolRegistrationAsOwner,
            "pool_registration_as_operator" => Self::PoolRegistrationAsOperator,
            "multisig_transaction" => Self::MultisigTransaction,
            "plutus_transaction" => Self::PlutusTransaction,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    pub signing_mode: SigningMode,
    pub tx: Transaction,
    /// Extra paths to sign, typically script key holders.
    pub additional_witness_paths: Vec<DerivationPath>,
}

/// Parses and validates a full signing request, including the per-mode
/// rule table.
pub fn parse_signing_request(value: &Value) -> Result<SigningRequest, InvalidDataReason> {
    let obj = parse_object(value, InvalidDataReason::RequestNotObject)?;
    let signing_mode = required(obj, "signingMode", InvalidDataReason::SigningModeUnknown)?
        .as_str()
        .and_then(SigningMode::from_name)
        .ok_or(InvalidDataReason::SigningModeUnknown)?;
    let tx = parse_transaction(required(obj, "tx", InvalidDataReason::TxNotObject)?)?;
    let additional_witness_paths = optional_array(
        obj,
        "additionalWitnessPaths",
        InvalidDataReason::AdditionalWitnessesNotArray,
    )?
    .iter()
    .map(|p| parse_path(p, InvalidDataReason::AdditionalWitnessInvalidPath))
    .collect::<Result<Vec<_>, _>>()?;

    mode::validate(&tx, signing_mode)?;

    Ok(SigningRequest {
        signing_mode,
        tx,
        additional_witness_paths,
    })
}

pub fn parse_network(value: &Value) -> Result<Network, InvalidDataReason> {
    let obj = parse_object(value, InvalidDataReason::NetworkNotObject)?;
    Ok(Network {
        network_id: parse_uint8(
            required(obj, "networkId", InvalidDataReason::NetworkInvalidId)?,
            0..=MAX_NETWORK_ID,
            InvalidDataReason::NetworkInvalidId,
        )?,
        protocol_magic: parse_uint32(
            required(obj, "protocolMagic", InvalidDataReason::NetworkInvalidProtocolMagic)?,
            InvalidDataReason::NetworkInvalidProtocolMagic,
        )?,
    })
}

fn parse_transaction(value: &Value) -> Result<Transaction, InvalidDataReason> {
    let obj = parse_object(value, InvalidDataReason::TxNotObject)?;
    let network = parse_network(required(obj, "network", InvalidDataReason::NetworkNotObject)?)?;

    let inputs = required(obj, "inputs", InvalidDataReason::InputsNotArray)?
        .as_array()
        .ok_or(InvalidDataReason::InputsNotArray)?
        .iter()
        .map(parse_input)
        .collect::<Result<Vec<_>, _>>()?;

    let outputs = required(obj, "outputs", InvalidDataReason::OutputsNotArray)?
        .as_array()
        .ok_or(InvalidDataReason::OutputsNotArray)?
        .iter()
        .map(|o| output::parse_output(network, o))
        .collect::<Result<Vec<_>, _>>()?;

    let fee = parse_uint64(
        required(obj, "fee", InvalidDataReason::FeeInvalid)?,
        0..=MAX_LOVELACE_SUPPLY,
        InvalidDataReason::FeeInvalid,
    )?;
    let ttl = optional_u64(obj, "ttl", InvalidDataReason::TtlInvalid)?;

    let certificates = optional_array(obj, "certificates", InvalidDataReason::CertificatesNotArray)?
        .iter()
        .map(certificate::parse_certificate)
        .collect::<Result<Vec<_>, _>>()?;

    let withdrawals = optional_array(obj, "withdrawals", InvalidDataReason::WithdrawalsNotArray)?
        .iter()
        .map(parse_withdrawal)
        .collect::<Result<Vec<_>, _>>()?;

    let auxiliary_data = optional(obj, "auxiliaryData")
        .map(|a| aux_data::parse_auxiliary_data(network, a))
        .transpose()?;

    let validity_interval_start = optional_u64(
        obj,
        "validityIntervalStart",
        InvalidDataReason::ValidityIntervalStartInvalid,
    )?;

    let mint = optional(obj, "mint")
        .map(|m| {
            output::parse_token_bundle(m, |a| {
                parse_int64(a, i64::MIN..=i64::MAX, InvalidDataReason::TokenInvalidAmount)
            })
        })
        .transpose()?;

    let script_data_hash = optional(obj, "scriptDataHashHex")
        .map(|h| parse_hex_fixed(h, InvalidDataReason::ScriptDataHashInvalid))
        .transpose()?;

    let collateral_inputs =
        optional_array(obj, "collateralInputs", InvalidDataReason::CollateralsNotArray)?
            .iter()
            .map(parse_input)
            .collect::<Result<Vec<_>, _>>()?;

    let required_signers =
        optional_array(obj, "requiredSigners", InvalidDataReason::RequiredSignersNotArray)?
            .iter()
            .map(parse_required_signer)
            .collect::<Result<Vec<_>, _>>()?;

    Ok(Transaction {
        network,
        inputs,
        outputs,
        fee,
        ttl,
        certificates,
        withdrawals,
        auxiliary_data,
        validity_interval_start,
        mint,
        script_data_hash,
        collateral_inputs,
        required_signers,
    })
}

fn optional_u64(
    obj: &Map<String, Value>,
    key: &str,
    reason: InvalidDataReason,
) -> Result<Option<Uint64Str>, InvalidDataReason> {
    optional(obj, key)
        .map(|v| parse_uint64(v, 0..=u64::MAX, reason))
        .transpose()
}

fn parse_input(value: &Value) -> Result<Input, InvalidDataReason> {
    let obj = parse_object(value, InvalidDataReason::InputInvalidTxHash)?;
    Ok(Input {
        tx_hash: parse_hex_fixed(
            required(obj, "txHashHex", InvalidDataReason::InputInvalidTxHash)?,
            InvalidDataReason::InputInvalidTxHash,
        )?,
        output_index: parse_uint32(
            required(obj, "outputIndex", InvalidDataReason::InputInvalidIndex)?,
            InvalidDataReason::InputInvalidIndex,
        )?,
        path: optional(obj, "path")
            .map(|p| parse_path(p, InvalidDataReason::InputInvalidPath))
            .transpose()?,
    })
}

fn parse_withdrawal(value: &Value) -> Result<Withdrawal, InvalidDataReason> {
    let obj = parse_object(value, InvalidDataReason::WithdrawalInvalidStakeCredential)?;
    Ok(Withdrawal {
        stake_credential: certificate::parse_credential(
            required(
                obj,
                "stakeCredential",
                InvalidDataReason::WithdrawalInvalidStakeCredential,
            )?,
            InvalidDataReason::WithdrawalInvalidStakeCredential,
        )?,
        amount: parse_uint64(
            required(obj, "amount", InvalidDataReason::WithdrawalInvalidAmount)?,
            0..=MAX_LOVELACE_SUPPLY,
            InvalidDataReason::WithdrawalInvalidAmount,
        )?,
    })
}

fn parse_required_signer(value: &Value) -> Result<RequiredSigner, InvalidDataReason> {
    const R: InvalidDataReason = InvalidDataReason::RequiredSignerInvalid;
    let obj = parse_object(value, R)?;
    match required(obj, "type", R)?.as_str() {
        Some("path") => Ok(RequiredSigner::Path(parse_path(required(obj, "path", R)?, R)?)),
        Some("hash") => Ok(RequiredSigner::Hash(parse_hex_fixed(
            required(obj, "hashHex", R)?,
            R,
        )?)),
        _ => Err(R),
    }
}
