//! Address parameters, as sent for `DERIVE_ADDRESS`, device-owned outputs
//! and Catalyst reward destinations.

use crate::compat::DeviceCompatibility;
use crate::error::LedgerError;
use crate::serialize::{push_u32, unsupported};
use crate::tx::{Address, AddressParams, AddressType, SpendingSource, StakingSource};

const SPENDING_NONE: u8 = 0x11;
const SPENDING_PATH: u8 = 0x33;
const SPENDING_SCRIPT_HASH: u8 = 0x36;

const STAKING_NONE: u8 = 0x11;
const STAKING_KEY_PATH: u8 = 0x22;
const STAKING_KEY_HASH: u8 = 0x33;
const STAKING_POINTER: u8 = 0x44;
const STAKING_SCRIPT_HASH: u8 = 0x55;

/// `[type][network id | protocol magic][spending][staking]`
pub fn address_params(
    params: &AddressParams,
    compat: &DeviceCompatibility,
) -> Result<Vec<u8>, LedgerError> {
    ensure_encodable(params, compat)?;
    if compat.uses_tagged_credentials() {
        Ok(current(params))
    } else {
        legacy(params)
    }
}

/// Fails with `DeviceVersionUnsupported` when the app's address layout has no
/// room for `params`. Apps before multisig support take neither script
/// hashes nor a reward address identified by anything but its staking path.
pub(crate) fn ensure_encodable(
    params: &AddressParams,
    compat: &DeviceCompatibility,
) -> Result<(), LedgerError> {
    if compat.uses_tagged_credentials() {
        return Ok(());
    }
    let address = &params.address;
    if address.uses_scripts() {
        return Err(unsupported("script address"));
    }
    let reward_without_path = matches!(
        address,
        Address::Reward { staking } if !matches!(staking, StakingSource::KeyPath(_))
    );
    if reward_without_path {
        return Err(unsupported("reward address without staking path"));
    }
    Ok(())
}

fn push_network(buf: &mut Vec<u8>, params: &AddressParams) {
    if params.address.address_type() == AddressType::Byron {
        push_u32(buf, params.network.protocol_magic);
    } else {
        buf.push(params.network.network_id);
    }
}

fn current(params: &AddressParams) -> Vec<u8> {
    let address = &params.address;
    let mut buf = vec![address.address_type() as u8];
    push_network(&mut buf, params);

    match address {
        Address::Byron { spending } => {
            buf.push(SPENDING_PATH);
            spending.serialize_into(&mut buf);
        }
        Address::Reward { .. } => buf.push(SPENDING_NONE),
        Address::Base { spending, .. }
        | Address::Pointer { spending, .. }
        | Address::Enterprise { spending } => match spending {
            SpendingSource::Path(path) => {
                buf.push(SPENDING_PATH);
                path.serialize_into(&mut buf);
            }
            SpendingSource::ScriptHash(hash) => {
                buf.push(SPENDING_SCRIPT_HASH);
                buf.extend_from_slice(hash.as_ref());
            }
        },
    }

    match address {
        Address::Base { staking, .. } | Address::Reward { staking } => {
            push_staking(&mut buf, staking)
        }
        Address::Pointer { pointer, .. } => {
            buf.push(STAKING_POINTER);
            push_u32(&mut buf, pointer.block_index);
            push_u32(&mut buf, pointer.tx_index);
            push_u32(&mut buf, pointer.certificate_index);
        }
        Address::Enterprise { .. } | Address::Byron { .. } => buf.push(STAKING_NONE),
    }
    buf
}

fn push_staking(buf: &mut Vec<u8>, staking: &StakingSource) {
    match staking {
        StakingSource::KeyPath(path) => {
            buf.push(STAKING_KEY_PATH);
            path.serialize_into(buf);
        }
        StakingSource::KeyHash(hash) => {
            buf.push(STAKING_KEY_HASH);
            buf.extend_from_slice(hash.as_ref());
        }
        StakingSource::ScriptHash(hash) => {
            buf.push(STAKING_SCRIPT_HASH);
            buf.extend_from_slice(hash.as_ref());
        }
    }
}

/// Apps before multisig support always expect a spending path followed by a
/// staking choice. A reward address is sent as its staking path in the
/// spending slot.
fn legacy(params: &AddressParams) -> Result<Vec<u8>, LedgerError> {
    let address = &params.address;
    let mut buf = vec![address.address_type() as u8];
    push_network(&mut buf, params);

    match address {
        Address::Byron { spending } => {
            spending.serialize_into(&mut buf);
            buf.push(STAKING_NONE);
        }
        Address::Reward { staking } => {
            let StakingSource::KeyPath(path) = staking else {
                return Err(unsupported("reward address without staking path"));
            };
            path.serialize_into(&mut buf);
            buf.push(STAKING_NONE);
        }
        Address::Base { spending, staking } => {
            push_legacy_spending(&mut buf, spending)?;
            push_staking(&mut buf, staking);
        }
        Address::Pointer { spending, pointer } => {
            push_legacy_spending(&mut buf, spending)?;
            buf.push(STAKING_POINTER);
            push_u32(&mut buf, pointer.block_index);
            push_u32(&mut buf, pointer.tx_index);
            push_u32(&mut buf, pointer.certificate_index);
        }
        Address::Enterprise { spending } => {
            push_legacy_spending(&mut buf, spending)?;
            buf.push(STAKING_NONE);
        }
    }
    Ok(buf)
}

fn push_legacy_spending(buf: &mut Vec<u8>, spending: &SpendingSource) -> Result<(), LedgerError> {
    match spending {
        SpendingSource::Path(path) => {
            path.serialize_into(buf);
            Ok(())
        }
        SpendingSource::ScriptHash(_) => Err(unsupported("script address")),
    }
}
