//! Transaction outputs and multi-asset token bundles.

use std::cmp::Ordering;

use serde_json::Value;

use crate::error::InvalidDataReason;
use crate::primitives::{
    optional, parse_hex_fixed, parse_hex_var, parse_object, parse_uint64,
    required, Hash28, Hash32, Uint64Str, VarHex, MAX_LOVELACE_SUPPLY,
};
use crate::tx::address::{parse_address_params, Address, AddressParams};
use crate::types::Network;

pub const MAX_ADDRESS_LENGTH: usize = 128;
pub const MAX_ASSET_NAME_LENGTH: usize = 32;
pub const MAX_ASSET_GROUPS: usize = 1000;
pub const MAX_TOKENS_IN_GROUP: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<A> {
    pub asset_name: VarHex,
    pub amount: A,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetGroup<A> {
    pub policy_id: Hash28,
    pub tokens: Vec<Token<A>>,
}

/// Asset groups in canonical order. `A` is `Uint64Str` for outputs and
/// `Int64Str` for mint.
pub type TokenBundle<A> = Vec<AssetGroup<A>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputDestination {
    /// Raw address bytes; shown to the user on the device.
    ThirdParty(VarHex),
    /// Derived and checked on the device, never shown.
    DeviceOwned(AddressParams),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub destination: OutputDestination,
    pub amount: Uint64Str,
    pub token_bundle: TokenBundle<Uint64Str>,
    pub datum_hash: Option<Hash32>,
}

/// CBOR map key ordering: shorter first, then bytewise.
pub fn canonical_cmp(a: &[u8], b: &[u8]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn check_canonical<'a, I>(
    keys: I,
    duplicate: InvalidDataReason,
    unordered: InvalidDataReason,
) -> Result<(), InvalidDataReason>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut prev: Option<&[u8]> = None;
    for key in keys {
        if let Some(prev) = prev {
            match canonical_cmp(prev, key) {
                Ordering::Less => {}
                Ordering::Equal => return Err(duplicate),
                Ordering::Greater => return Err(unordered),
            }
        }
        prev = Some(key);
    }
    Ok(())
}

/// Parses `[{ policyIdHex, tokens: [{ assetNameHex, amount }] }]`, checking
/// the canonical ordering of policies and of asset names inside each group.
pub fn parse_token_bundle<A, F>(
    value: &Value,
    parse_amount: F,
) -> Result<TokenBundle<A>, InvalidDataReason>
where
    F: Fn(&Value) -> Result<A, InvalidDataReason>,
{
    let raw_groups = value.as_array().ok_or(InvalidDataReason::TokenBundleNotArray)?;
    if raw_groups.len() > MAX_ASSET_GROUPS {
        return Err(InvalidDataReason::TokenBundleTooLarge);
    }

    let mut bundle = Vec::with_capacity(raw_groups.len());
    for raw in raw_groups {
        let obj = parse_object(raw, InvalidDataReason::AssetGroupInvalidPolicyId)?;
        let policy_id = parse_hex_fixed(
            required(obj, "policyIdHex", InvalidDataReason::AssetGroupInvalidPolicyId)?,
            InvalidDataReason::AssetGroupInvalidPolicyId,
        )?;
        let raw_tokens = required(obj, "tokens", InvalidDataReason::AssetGroupTokensNotArray)?
            .as_array()
            .ok_or(InvalidDataReason::AssetGroupTokensNotArray)?;
        if raw_tokens.is_empty() {
            return Err(InvalidDataReason::AssetGroupEmpty);
        }
        if raw_tokens.len() > MAX_TOKENS_IN_GROUP {
            return Err(InvalidDataReason::AssetGroupTooLarge);
        }

        let tokens = raw_tokens
            .iter()
            .map(|t| {
                let obj = parse_object(t, InvalidDataReason::TokenInvalidAssetName)?;
                Ok(Token {
                    asset_name: parse_hex_var(
                        required(obj, "assetNameHex", InvalidDataReason::TokenInvalidAssetName)?,
                        MAX_ASSET_NAME_LENGTH,
                        InvalidDataReason::TokenInvalidAssetName,
                    )?,
                    amount: parse_amount(required(
                        obj,
                        "amount",
                        InvalidDataReason::TokenInvalidAmount,
                    )?)?,
                })
            })
            .collect::<Result<Vec<_>, InvalidDataReason>>()?;

        check_canonical(
            tokens.iter().map(|t| t.asset_name.as_bytes()),
            InvalidDataReason::AssetGroupDuplicateAssetName,
            InvalidDataReason::AssetGroupUnorderedAssetNames,
        )?;
        bundle.push(AssetGroup { policy_id, tokens });
    }

    check_canonical(
        bundle.iter().map(|g| &g.policy_id.as_bytes()[..]),
        InvalidDataReason::TokenBundleDuplicatePolicy,
        InvalidDataReason::TokenBundleUnorderedPolicies,
    )?;
    Ok(bundle)
}

/// Shelley header nibbles 1, 3, 5 and 7 have a script payment part.
fn header_has_script_spending(header: u8) -> bool {
    matches!(header >> 4, 0x01 | 0x03 | 0x05 | 0x07)
}

fn header_is_reward(header: u8) -> bool {
    matches!(header >> 4, 0x0E | 0x0F)
}

fn parse_destination(
    network: Network,
    value: &Value,
) -> Result<OutputDestination, InvalidDataReason> {
    const R: InvalidDataReason = InvalidDataReason::OutputInvalidDestination;
    let obj = parse_object(value, R)?;
    let params = required(obj, "params", R)?;
    match required(obj, "type", R)?.as_str() {
        Some("third_party") => {
            let params = parse_object(params, R)?;
            let address = parse_hex_var(
                required(params, "addressHex", InvalidDataReason::OutputInvalidAddress)?,
                MAX_ADDRESS_LENGTH,
                InvalidDataReason::OutputInvalidAddress,
            )?;
            match address.as_bytes().first() {
                None => Err(InvalidDataReason::OutputInvalidAddress),
                Some(&header) if header_is_reward(header) => {
                    Err(InvalidDataReason::OutputWithRewardAddress)
                }
                Some(_) => Ok(OutputDestination::ThirdParty(address)),
            }
        }
        Some("device_owned") => {
            let params = parse_address_params(network, params)?;
            if matches!(params.address, Address::Reward { .. }) {
                return Err(InvalidDataReason::OutputWithRewardAddress);
            }
            Ok(OutputDestination::DeviceOwned(params))
        }
        _ => Err(R),
    }
}

pub fn parse_output(network: Network, value: &Value) -> Result<Output, InvalidDataReason> {
    let obj = parse_object(value, InvalidDataReason::OutputInvalidDestination)?;
    let destination = parse_destination(
        network,
        required(obj, "destination", InvalidDataReason::OutputInvalidDestination)?,
    )?;
    let amount = parse_uint64(
        required(obj, "amount", InvalidDataReason::OutputInvalidAmount)?,
        0..=MAX_LOVELACE_SUPPLY,
        InvalidDataReason::OutputInvalidAmount,
    )?;
    let token_bundle = match optional(obj, "tokenBundle") {
        None => Vec::new(),
        Some(v) => parse_token_bundle(v, |a| {
            parse_uint64(a, 0..=u64::MAX, InvalidDataReason::TokenInvalidAmount)
        })?,
    };
    let datum_hash: Option<Hash32> = optional(obj, "datumHashHex")
        .map(|v| parse_hex_fixed(v, InvalidDataReason::OutputInvalidDatumHash))
        .transpose()?;

    if datum_hash.is_some() {
        let is_script = match &destination {
            OutputDestination::ThirdParty(address) => address
                .as_bytes()
                .first()
                .map_or(false, |&h| header_has_script_spending(h)),
            OutputDestination::DeviceOwned(params) => params.address.has_script_spending(),
        };
        if !is_script {
            return Err(InvalidDataReason::OutputDatumHashWithoutScriptAddress);
        }
    }

    Ok(Output {
        destination,
        amount,
        token_bundle,
        datum_hash,
    })
}
