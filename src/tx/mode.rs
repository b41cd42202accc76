//! Per signing-mode restrictions on an otherwise valid transaction.

use crate::error::InvalidDataReason;
use crate::tx::{
    Certificate, Credential, OutputDestination, PoolKey, PoolParams, RequiredSigner, SigningMode,
    Transaction,
};

type Reason = InvalidDataReason;

pub(crate) fn validate(tx: &Transaction, mode: SigningMode) -> Result<(), InvalidDataReason> {
    if mode != SigningMode::PlutusTransaction {
        if !tx.collateral_inputs.is_empty() {
            return Err(Reason::CollateralsNotAllowed);
        }
        if tx.script_data_hash.is_some() {
            return Err(Reason::ScriptDataHashNotAllowed);
        }
    }

    match mode {
        SigningMode::OrdinaryTransaction => validate_ordinary(tx),
        SigningMode::MultisigTransaction => validate_multisig(tx),
        SigningMode::PoolRegistrationAsOwner => validate_pool_owner(tx),
        SigningMode::PoolRegistrationAsOperator => validate_pool_operator(tx),
        SigningMode::PlutusTransaction => validate_plutus(tx),
    }
}

fn has_device_owned_output(tx: &Transaction) -> bool {
    tx.outputs
        .iter()
        .any(|o| matches!(o.destination, OutputDestination::DeviceOwned(_)))
}

fn validate_ordinary(tx: &Transaction) -> Result<(), InvalidDataReason> {
    for cert in &tx.certificates {
        if let Certificate::StakePoolRegistration(_) = cert {
            return Err(Reason::OrdinaryPoolRegistrationNotAllowed);
        }
        if let Some(Credential::ScriptHash(_)) = cert.credential() {
            return Err(Reason::OrdinaryCertificateCredentialOnlyAsPath);
        }
    }
    if tx
        .withdrawals
        .iter()
        .any(|w| matches!(w.stake_credential, Credential::ScriptHash(_)))
    {
        return Err(Reason::OrdinaryWithdrawalOnlyAsPath);
    }
    Ok(())
}

fn validate_multisig(tx: &Transaction) -> Result<(), InvalidDataReason> {
    for cert in &tx.certificates {
        match cert {
            Certificate::StakePoolRegistration(_) => {
                return Err(Reason::MultisigPoolRegistrationNotAllowed)
            }
            Certificate::StakePoolRetirement { .. } => {
                return Err(Reason::MultisigPoolRetirementNotAllowed)
            }
            _ => {}
        }
        if let Some(Credential::KeyPath(_)) = cert.credential() {
            return Err(Reason::MultisigCertificateCredentialOnlyAsScript);
        }
    }
    if tx
        .withdrawals
        .iter()
        .any(|w| matches!(w.stake_credential, Credential::KeyPath(_)))
    {
        return Err(Reason::MultisigWithdrawalOnlyAsScript);
    }
    if tx.inputs.iter().any(|i| i.path.is_some()) {
        return Err(Reason::MultisigInputWithPathNotAllowed);
    }
    if has_device_owned_output(tx) {
        return Err(Reason::MultisigDeviceOwnedAddressNotAllowed);
    }
    if tx
        .required_signers
        .iter()
        .any(|s| matches!(s, RequiredSigner::Path(_)))
    {
        return Err(Reason::MultisigRequiredSignerOnlyAsHash);
    }
    Ok(())
}

/// The lone certificate of a pool registration transaction.
fn single_pool_registration(tx: &Transaction, reason: Reason) -> Result<&PoolParams, Reason> {
    match tx.certificates.as_slice() {
        [Certificate::StakePoolRegistration(pool)] => Ok(pool),
        _ => Err(reason),
    }
}

/// Rules shared by both pool registration modes.
fn validate_pool_registration_common(
    tx: &Transaction,
    withdrawals: Reason,
    mint: Reason,
) -> Result<(), InvalidDataReason> {
    if !tx.withdrawals.is_empty() {
        return Err(withdrawals);
    }
    if tx.mint.is_some() {
        return Err(mint);
    }
    if !tx.required_signers.is_empty() {
        return Err(Reason::RequiredSignersNotAllowed);
    }
    Ok(())
}

fn validate_pool_owner(tx: &Transaction) -> Result<(), InvalidDataReason> {
    let pool = single_pool_registration(tx, Reason::PoolOwnerSinglePoolRegistrationRequired)?;
    if pool.device_owned_owners().count() != 1 {
        return Err(Reason::PoolOwnerSinglePathOwnerRequired);
    }
    if !matches!(pool.pool_key, PoolKey::ThirdParty(_)) {
        return Err(Reason::PoolOwnerThirdPartyPoolKeyRequired);
    }
    if tx.inputs.iter().any(|i| i.path.is_some()) {
        return Err(Reason::PoolOwnerInputWithPathNotAllowed);
    }
    if has_device_owned_output(tx) {
        return Err(Reason::PoolOwnerDeviceOwnedAddressNotAllowed);
    }
    validate_pool_registration_common(
        tx,
        Reason::PoolOwnerWithdrawalsNotAllowed,
        Reason::PoolOwnerMintNotAllowed,
    )
}

fn validate_pool_operator(tx: &Transaction) -> Result<(), InvalidDataReason> {
    let pool = single_pool_registration(tx, Reason::PoolOperatorSinglePoolRegistrationRequired)?;
    if !matches!(pool.pool_key, PoolKey::DeviceOwned(_)) {
        return Err(Reason::PoolOperatorDeviceOwnedPoolKeyRequired);
    }
    if pool.device_owned_owners().next().is_some() {
        return Err(Reason::PoolOperatorDeviceOwnedOwnerNotAllowed);
    }
    validate_pool_registration_common(
        tx,
        Reason::PoolOperatorWithdrawalsNotAllowed,
        Reason::PoolOperatorMintNotAllowed,
    )
}

fn validate_plutus(tx: &Transaction) -> Result<(), InvalidDataReason> {
    if tx
        .certificates
        .iter()
        .any(|c| matches!(c, Certificate::StakePoolRegistration(_)))
    {
        return Err(Reason::PlutusPoolRegistrationNotAllowed);
    }
    Ok(())
}
