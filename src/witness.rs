//! Which derivation paths the device has to sign the transaction with.

use std::collections::HashSet;

use crate::error::InvalidDataReason;
use crate::tx::{
    mode, Certificate, Credential, PoolKey, RequiredSigner, SigningMode, SigningRequest,
};
use crate::types::DerivationPath;

/// Walks inputs, certificates, withdrawals, collaterals and required signers
/// in transaction order, then the additional witness paths. Each path is
/// kept once, at its first occurrence.
pub fn collect_witness_paths(
    request: &SigningRequest,
) -> Result<Vec<DerivationPath>, InvalidDataReason> {
    let tx = &request.tx;
    mode::validate(tx, request.signing_mode)?;

    let mut paths: Vec<&DerivationPath> = Vec::new();

    paths.extend(tx.inputs.iter().filter_map(|i| i.path.as_ref()));

    for cert in &tx.certificates {
        match cert {
            Certificate::StakeRegistration { credential }
            | Certificate::StakeDeregistration { credential }
            | Certificate::StakeDelegation { credential, .. } => {
                if let Credential::KeyPath(path) = credential {
                    paths.push(path);
                }
            }
            Certificate::StakePoolRegistration(pool) => {
                paths.extend(pool.device_owned_owners());
                if request.signing_mode == SigningMode::PoolRegistrationAsOperator {
                    if let PoolKey::DeviceOwned(path) = &pool.pool_key {
                        paths.push(path);
                    }
                }
            }
            Certificate::StakePoolRetirement { pool_key_path, .. } => paths.push(pool_key_path),
        }
    }

    paths.extend(tx.withdrawals.iter().filter_map(|w| match &w.stake_credential {
        Credential::KeyPath(path) => Some(path),
        Credential::ScriptHash(_) => None,
    }));

    paths.extend(tx.collateral_inputs.iter().filter_map(|i| i.path.as_ref()));

    paths.extend(tx.required_signers.iter().filter_map(|s| match s {
        RequiredSigner::Path(path) => Some(path),
        RequiredSigner::Hash(_) => None,
    }));

    // Multisig transactions contribute nothing above, so their witnesses are
    // exactly the script-witness paths in the caller's order.
    paths.extend(request.additional_witness_paths.iter());

    let mut seen = HashSet::new();
    let witnesses: Vec<DerivationPath> = paths
        .into_iter()
        .filter(|p| seen.insert(*p))
        .cloned()
        .collect();

    for path in &witnesses {
        log::debug!("witness path {path}");
    }
    Ok(witnesses)
}
