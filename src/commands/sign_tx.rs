//! The staged `SIGN_TX` session.
//!
//! The device rebuilds the transaction body from a fixed sequence of
//! exchanges, one item per exchange, and checks every stage against the
//! counts declared in `INIT`. Everything that could fail on the host
//! (parsing, witness collection, feature gating) happens before the first
//! exchange, so a rejected request never leaves the device mid-session.

use crate::apdu::Instruction;
use crate::compat::DeviceCompatibility;
use crate::error::LedgerError;
use crate::protocol;
use crate::serialize::{address, pool, tx as payload, unsupported};
use crate::transport::Transport;
use crate::tx::{
    AssetGroup, AuxiliaryData, Certificate, Credential, OutputDestination, PoolParams,
    SigningMode, SigningRequest, Token, Transaction,
};
use crate::types::{
    AuxiliaryDataSupplement, DerivationPath, Signature, SignedTransaction, TxHash, Witness,
};
use crate::witness;

/// `SIGN_TX` stage, sent as P1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Stage {
    Init = 0x01,
    Inputs = 0x02,
    Outputs = 0x03,
    Fee = 0x04,
    Ttl = 0x05,
    Certificates = 0x06,
    Withdrawals = 0x07,
    AuxData = 0x08,
    ValidityIntervalStart = 0x09,
    Confirm = 0x0A,
    Mint = 0x0B,
    ScriptDataHash = 0x0C,
    Collaterals = 0x0D,
    RequiredSigners = 0x0E,
    Witnesses = 0x0F,
}

const P2_UNUSED: u8 = 0x00;

// outputs and mint
const P2_BASIC_DATA: u8 = 0x30;
const P2_ASSET_GROUP: u8 = 0x31;
const P2_TOKEN: u8 = 0x32;
const P2_CONFIRM: u8 = 0x33;

// pool registration certificate
const P2_POOL_INIT: u8 = 0x30;
const P2_POOL_KEY: u8 = 0x31;
const P2_POOL_VRF_KEY: u8 = 0x32;
const P2_POOL_FINANCIALS: u8 = 0x33;
const P2_POOL_REWARD_ACCOUNT: u8 = 0x34;
const P2_POOL_OWNERS: u8 = 0x35;
const P2_POOL_RELAYS: u8 = 0x36;
const P2_POOL_METADATA: u8 = 0x37;
const P2_POOL_CONFIRMATION: u8 = 0x38;

// catalyst registration auxiliary data
const P2_CATALYST_VOTING_KEY: u8 = 0x30;
const P2_CATALYST_STAKING_KEY: u8 = 0x31;
const P2_CATALYST_REWARDS_DESTINATION: u8 = 0x32;
const P2_CATALYST_NONCE: u8 = 0x33;
const P2_CATALYST_CONFIRM: u8 = 0x35;

const TX_HASH_LENGTH: usize = 32;
const SIGNATURE_LENGTH: usize = 64;
const CATALYST_CONFIRM_LENGTH: usize = 32 + SIGNATURE_LENGTH;

pub fn exec(
    transport: &dyn Transport,
    request: &SigningRequest,
    compat: &DeviceCompatibility,
) -> Result<SignedTransaction, LedgerError> {
    ensure_supported(request, compat)?;
    let witness_paths = witness::collect_witness_paths(request)?;
    let tx = &request.tx;

    log::info!(
        "signing {:?}: {} inputs, {} outputs, {} certificates, {} witnesses",
        request.signing_mode,
        tx.inputs.len(),
        tx.outputs.len(),
        tx.certificates.len(),
        witness_paths.len()
    );

    let session = Session { transport, compat };

    session.send(
        Stage::Init,
        P2_UNUSED,
        payload::init(tx, request.signing_mode, witness_paths.len(), compat),
        0,
    )?;

    let mut supplement = None;
    if compat.aux_data_before_inputs() {
        supplement = session.aux_data(tx)?;
    }

    for input in &tx.inputs {
        session.send(Stage::Inputs, P2_UNUSED, payload::input(input), 0)?;
    }

    for output in &tx.outputs {
        session.send(
            Stage::Outputs,
            P2_BASIC_DATA,
            payload::output_basic(output, compat)?,
            0,
        )?;
        session.token_bundle(Stage::Outputs, &output.token_bundle, payload::output_token)?;
        session.send(Stage::Outputs, P2_CONFIRM, Vec::new(), 0)?;
    }

    session.send(Stage::Fee, P2_UNUSED, payload::uint64(tx.fee), 0)?;

    if let Some(ttl) = tx.ttl {
        session.send(Stage::Ttl, P2_UNUSED, payload::uint64(ttl), 0)?;
    }

    for cert in &tx.certificates {
        session.send(
            Stage::Certificates,
            P2_UNUSED,
            payload::certificate(cert, compat)?,
            0,
        )?;
        if let Certificate::StakePoolRegistration(params) = cert {
            session.pool_registration(params)?;
        }
    }

    for withdrawal in &tx.withdrawals {
        session.send(
            Stage::Withdrawals,
            P2_UNUSED,
            payload::withdrawal(withdrawal, compat)?,
            0,
        )?;
    }

    if !compat.aux_data_before_inputs() {
        supplement = session.aux_data(tx)?;
    }

    if let Some(start) = tx.validity_interval_start {
        session.send(Stage::ValidityIntervalStart, P2_UNUSED, payload::uint64(start), 0)?;
    }

    if let Some(mint) = &tx.mint {
        session.send(Stage::Mint, P2_BASIC_DATA, payload::mint_basic(mint), 0)?;
        session.token_bundle(Stage::Mint, mint, payload::mint_token)?;
        session.send(Stage::Mint, P2_CONFIRM, Vec::new(), 0)?;
    }

    if let Some(hash) = &tx.script_data_hash {
        session.send(Stage::ScriptDataHash, P2_UNUSED, payload::hash32(hash), 0)?;
    }

    for collateral in &tx.collateral_inputs {
        session.send(Stage::Collaterals, P2_UNUSED, payload::input(collateral), 0)?;
    }

    for signer in &tx.required_signers {
        session.send(
            Stage::RequiredSigners,
            P2_UNUSED,
            payload::required_signer(signer),
            0,
        )?;
    }

    let reply = session.send(Stage::Confirm, P2_UNUSED, Vec::new(), TX_HASH_LENGTH)?;
    let mut hash = [0u8; TX_HASH_LENGTH];
    hash.copy_from_slice(&reply);
    let tx_hash = TxHash(hash);

    let mut witnesses = Vec::with_capacity(witness_paths.len());
    for path in witness_paths {
        let signature = session.witness(&path)?;
        witnesses.push(Witness { path, signature });
    }

    log::info!("signed tx {tx_hash} with {} witnesses", witnesses.len());

    Ok(SignedTransaction {
        tx_hash,
        witnesses,
        auxiliary_data_supplement: supplement,
    })
}

struct Session<'a> {
    transport: &'a dyn Transport,
    compat: &'a DeviceCompatibility,
}

impl Session<'_> {
    fn send(
        &self,
        stage: Stage,
        p2: u8,
        data: Vec<u8>,
        expected_len: usize,
    ) -> Result<Vec<u8>, LedgerError> {
        protocol::send(
            self.transport,
            Instruction::SignTx,
            stage as u8,
            p2,
            data,
            expected_len,
        )
    }

    fn token_bundle<A>(
        &self,
        stage: Stage,
        groups: &[AssetGroup<A>],
        token: fn(&Token<A>) -> Vec<u8>,
    ) -> Result<(), LedgerError> {
        for group in groups {
            self.send(stage, P2_ASSET_GROUP, payload::asset_group(group), 0)?;
            for t in &group.tokens {
                self.send(stage, P2_TOKEN, token(t), 0)?;
            }
        }
        Ok(())
    }

    fn pool_registration(&self, params: &PoolParams) -> Result<(), LedgerError> {
        let stage = Stage::Certificates;
        self.send(stage, P2_POOL_INIT, pool::init(params), 0)?;
        self.send(
            stage,
            P2_POOL_KEY,
            pool::pool_key(&params.pool_key, self.compat)?,
            0,
        )?;
        self.send(stage, P2_POOL_VRF_KEY, pool::vrf_key_hash(params), 0)?;
        self.send(stage, P2_POOL_FINANCIALS, pool::financials(params), 0)?;
        self.send(
            stage,
            P2_POOL_REWARD_ACCOUNT,
            pool::reward_account(&params.reward_account, self.compat)?,
            0,
        )?;
        for owner in &params.owners {
            self.send(stage, P2_POOL_OWNERS, pool::owner(owner), 0)?;
        }
        for relay in &params.relays {
            self.send(stage, P2_POOL_RELAYS, pool::relay(relay), 0)?;
        }
        self.send(
            stage,
            P2_POOL_METADATA,
            pool::metadata(params.metadata.as_ref()),
            0,
        )?;
        self.send(stage, P2_POOL_CONFIRMATION, Vec::new(), 0)?;
        Ok(())
    }

    fn aux_data(&self, tx: &Transaction) -> Result<Option<AuxiliaryDataSupplement>, LedgerError> {
        let stage = Stage::AuxData;
        match &tx.auxiliary_data {
            None => Ok(None),
            Some(AuxiliaryData::ArbitraryHash(hash)) => {
                self.send(stage, P2_UNUSED, payload::aux_data_hash(hash), 0)?;
                Ok(None)
            }
            Some(AuxiliaryData::CatalystRegistration(reg)) => {
                self.send(stage, P2_UNUSED, payload::aux_data_catalyst_header(), 0)?;
                self.send(stage, P2_CATALYST_VOTING_KEY, payload::catalyst_voting_key(reg), 0)?;
                self.send(
                    stage,
                    P2_CATALYST_STAKING_KEY,
                    payload::catalyst_staking_path(reg),
                    0,
                )?;
                self.send(
                    stage,
                    P2_CATALYST_REWARDS_DESTINATION,
                    payload::catalyst_rewards_destination(reg, self.compat)?,
                    0,
                )?;
                self.send(stage, P2_CATALYST_NONCE, payload::catalyst_nonce(reg), 0)?;
                let reply =
                    self.send(stage, P2_CATALYST_CONFIRM, Vec::new(), CATALYST_CONFIRM_LENGTH)?;

                let mut auxiliary_data_hash = [0u8; 32];
                auxiliary_data_hash.copy_from_slice(&reply[..32]);
                let mut signature = [0u8; SIGNATURE_LENGTH];
                signature.copy_from_slice(&reply[32..]);
                Ok(Some(AuxiliaryDataSupplement::CatalystRegistration {
                    auxiliary_data_hash,
                    registration_signature: Signature(signature),
                }))
            }
        }
    }

    fn witness(&self, path: &DerivationPath) -> Result<Signature, LedgerError> {
        log::debug!("requesting witness for {path}");
        let reply = self.send(
            Stage::Witnesses,
            P2_UNUSED,
            payload::witness(path),
            SIGNATURE_LENGTH,
        )?;
        let mut sig = [0u8; SIGNATURE_LENGTH];
        sig.copy_from_slice(&reply);
        Ok(Signature(sig))
    }
}

/// Rejects requests the connected app cannot process, before any
/// `SIGN_TX` exchange.
pub(crate) fn ensure_supported(
    request: &SigningRequest,
    compat: &DeviceCompatibility,
) -> Result<(), LedgerError> {
    let tx = &request.tx;
    let require = |supported: bool, what: &str| {
        if supported {
            Ok(())
        } else {
            Err(unsupported(what))
        }
    };

    require(compat.is_compatible, "this signing request")?;

    match request.signing_mode {
        SigningMode::OrdinaryTransaction | SigningMode::PoolRegistrationAsOwner => {}
        SigningMode::PoolRegistrationAsOperator => require(
            compat.supports_pool_registration_as_operator,
            "pool registration as operator",
        )?,
        SigningMode::MultisigTransaction => {
            require(compat.supports_multisig_transaction, "multisig transaction")?
        }
        SigningMode::PlutusTransaction => {
            require(compat.supports_alonzo, "plutus transaction")?
        }
    }

    if tx.ttl.map(|t| t.get()) == Some(0) {
        require(compat.supports_zero_ttl, "zero TTL")?;
    }

    if let Some(AuxiliaryData::CatalystRegistration(reg)) = &tx.auxiliary_data {
        require(
            compat.supports_catalyst_registration,
            "Catalyst voting registration",
        )?;
        address::ensure_encodable(&reg.rewards_destination, compat)?;
    }

    for cert in &tx.certificates {
        match cert {
            Certificate::StakePoolRetirement { .. } => {
                require(compat.supports_pool_retirement, "pool retirement")?
            }
            Certificate::StakePoolRegistration(params) => pool::ensure_encodable(params, compat)?,
            _ => {}
        }
        if let Some(Credential::ScriptHash(_)) = cert.credential() {
            require(compat.supports_multisig_transaction, "script hash credential")?;
        }
    }

    if tx
        .withdrawals
        .iter()
        .any(|w| matches!(w.stake_credential, Credential::ScriptHash(_)))
    {
        require(compat.supports_multisig_transaction, "script hash withdrawal")?;
    }

    for output in &tx.outputs {
        if let OutputDestination::DeviceOwned(params) = &output.destination {
            address::ensure_encodable(params, compat)?;
        }
        if output.datum_hash.is_some() {
            require(compat.supports_alonzo, "output datum hash")?;
        }
    }

    if tx.mint.is_some() {
        require(compat.supports_mint, "mint")?;
    }
    if tx.script_data_hash.is_some() {
        require(compat.supports_alonzo, "script data hash")?;
    }
    if !tx.collateral_inputs.is_empty() {
        require(compat.supports_alonzo, "collateral inputs")?;
    }
    if !tx.required_signers.is_empty() {
        require(compat.supports_alonzo, "required signers")?;
        if matches!(
            request.signing_mode,
            SigningMode::OrdinaryTransaction | SigningMode::MultisigTransaction
        ) {
            require(
                compat.supports_required_signers_in_ordinary_tx,
                "required signers in this signing mode",
            )?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::certificate::tests::{
        device_owner, pool_params, third_party_pool_key, OWNER_KEY_HASH, POOL_KEY_HASH,
    };
    use crate::tx::parse_signing_request;
    use crate::tx::tests::{byron_tx, request, TX_HASH};
    use crate::types::AppVersion;
    use serde_json::{json, Value};

    fn compat(major: u8, minor: u8) -> DeviceCompatibility {
        DeviceCompatibility::for_version(&AppVersion::new(major, minor, 0))
    }

    fn check(mode: &str, tx: Value, major: u8, minor: u8) -> Result<(), LedgerError> {
        let req = parse_signing_request(&request(mode, tx)).unwrap();
        ensure_supported(&req, &compat(major, minor))
    }

    fn is_unsupported(r: Result<(), LedgerError>) -> bool {
        matches!(r, Err(LedgerError::DeviceVersionUnsupported(_)))
    }

    #[test]
    fn plain_transaction_on_oldest_app() {
        assert!(check("ordinary_transaction", byron_tx(), 2, 2).is_ok());
        assert!(is_unsupported(check("ordinary_transaction", byron_tx(), 2, 1)));
    }

    #[test]
    fn zero_ttl_needs_2_3() {
        let mut tx = byron_tx();
        tx["ttl"] = json!(0);
        assert!(is_unsupported(check("ordinary_transaction", tx.clone(), 2, 2)));
        assert!(check("ordinary_transaction", tx, 2, 3).is_ok());
    }

    #[test]
    fn retirement_needs_2_4() {
        let mut tx = byron_tx();
        tx["certificates"] = json!([{"type": 4, "params": {
            "poolKeyPath": "m/1853'/1815'/0'/0'", "retirementEpoch": "10",
        }}]);
        assert!(is_unsupported(check("ordinary_transaction", tx.clone(), 2, 3)));
        assert!(check("ordinary_transaction", tx, 2, 4).is_ok());
    }

    #[test]
    fn mint_needs_3_0() {
        let mut tx = byron_tx();
        tx["mint"] = json!([{
            "policyIdHex": "95a292ffee938be03e9bae5657982a74e9014eb4960108c9e23a5b39",
            "tokens": [{"assetNameHex": "01", "amount": "5"}],
        }]);
        assert!(is_unsupported(check("ordinary_transaction", tx.clone(), 2, 4)));
        assert!(check("ordinary_transaction", tx, 3, 0).is_ok());
    }

    #[test]
    fn plutus_needs_4_0_and_ordinary_signers_4_1() {
        assert!(is_unsupported(check("plutus_transaction", byron_tx(), 3, 0)));
        assert!(check("plutus_transaction", byron_tx(), 4, 0).is_ok());

        let mut tx = byron_tx();
        tx["requiredSigners"] = json!([{"type": "path", "path": "m/1852'/1815'/0'/0/0"}]);
        assert!(is_unsupported(check("ordinary_transaction", tx.clone(), 4, 0)));
        assert!(check("ordinary_transaction", tx.clone(), 4, 1).is_ok());
        assert!(check("plutus_transaction", tx, 4, 0).is_ok());
    }

    #[test]
    fn multisig_needs_3_0() {
        let mut tx = byron_tx();
        tx["inputs"][0]["path"] = Value::Null;
        assert!(is_unsupported(check("multisig_transaction", tx.clone(), 2, 4)));
        assert!(check("multisig_transaction", tx, 3, 0).is_ok());
    }

    const STAKING_PATH: &str = "m/1852'/1815'/0'/2/0";
    const VOTING_KEY: &str = "4b19e27ffc006ace16592311c4d2f0cafc255eaa47a6178ff540c0a46d07027c";

    /// Builds every payload whose layout depends on the app version.
    fn encode_version_dependent(
        request: &SigningRequest,
        compat: &DeviceCompatibility,
    ) -> Result<(), LedgerError> {
        let tx = &request.tx;
        for output in &tx.outputs {
            payload::output_basic(output, compat)?;
        }
        for cert in &tx.certificates {
            payload::certificate(cert, compat)?;
            if let Certificate::StakePoolRegistration(params) = cert {
                pool::pool_key(&params.pool_key, compat)?;
                pool::reward_account(&params.reward_account, compat)?;
            }
        }
        for withdrawal in &tx.withdrawals {
            payload::withdrawal(withdrawal, compat)?;
        }
        if let Some(AuxiliaryData::CatalystRegistration(reg)) = &tx.auxiliary_data {
            payload::catalyst_rewards_destination(reg, compat)?;
        }
        Ok(())
    }

    fn owner_registration(reward_account: Value) -> Value {
        let mut tx = byron_tx();
        tx["inputs"][0]["path"] = Value::Null;
        let mut params = pool_params(json!([device_owner()]), third_party_pool_key());
        params["rewardAccount"] = reward_account;
        tx["certificates"] = json!([{"type": 3, "params": params}]);
        tx
    }

    fn operator_registration() -> Value {
        let mut tx = byron_tx();
        let mut params = pool_params(
            json!([{"type": "third_party", "stakingKeyHashHex": OWNER_KEY_HASH}]),
            json!({"type": "device_owned", "path": "m/1853'/1815'/0'/0'"}),
        );
        params["rewardAccount"] = json!({"type": "device_owned", "path": STAKING_PATH});
        tx["certificates"] = json!([{"type": 3, "params": params}]);
        tx
    }

    fn catalyst(rewards: Value) -> Value {
        let mut tx = byron_tx();
        tx["auxiliaryData"] = json!({
            "type": "catalyst_registration",
            "params": {
                "votingPublicKeyHex": VOTING_KEY,
                "stakingPath": STAKING_PATH,
                "rewardsDestination": rewards,
                "nonce": 1454448,
            },
        });
        tx
    }

    fn device_output(address: Value) -> Value {
        let mut tx = byron_tx();
        tx["outputs"] = json!([{
            "destination": {"type": "device_owned", "params": address},
            "amount": "1",
        }]);
        tx
    }

    fn script_credentials() -> Value {
        let script = json!({"type": "script_hash", "scriptHashHex": POOL_KEY_HASH});
        let mut tx = byron_tx();
        tx["inputs"] = json!([{"txHashHex": TX_HASH, "outputIndex": 0}]);
        tx["certificates"] = json!([{"type": 0, "params": {"stakeCredential": script.clone()}}]);
        tx["withdrawals"] = json!([{"stakeCredential": script, "amount": "1000"}]);
        tx
    }

    #[test]
    fn device_owned_reward_account_needs_2_4() {
        let tx = owner_registration(json!({"type": "device_owned", "path": STAKING_PATH}));
        assert!(is_unsupported(check("pool_registration_as_owner", tx.clone(), 2, 3)));
        assert!(check("pool_registration_as_owner", tx, 2, 4).is_ok());
    }

    #[test]
    fn catalyst_reward_address_by_key_hash_needs_3_0() {
        let tx = catalyst(json!({"type": 14, "params": {"stakingKeyHashHex": OWNER_KEY_HASH}}));
        assert!(is_unsupported(check("ordinary_transaction", tx.clone(), 2, 4)));
        assert!(check("ordinary_transaction", tx, 3, 0).is_ok());
    }

    #[test]
    fn accepted_requests_encode_on_every_app() {
        let cases = [
            ("ordinary_transaction", byron_tx()),
            (
                "pool_registration_as_owner",
                owner_registration(json!({"type": "device_owned", "path": STAKING_PATH})),
            ),
            (
                "pool_registration_as_owner",
                owner_registration(json!({
                    "type": "third_party",
                    "rewardAccountHex": format!("e1{OWNER_KEY_HASH}"),
                })),
            ),
            ("pool_registration_as_operator", operator_registration()),
            (
                "ordinary_transaction",
                catalyst(json!({"type": 14, "params": {"stakingKeyHashHex": OWNER_KEY_HASH}})),
            ),
            (
                "ordinary_transaction",
                catalyst(json!({"type": 14, "params": {"stakingPath": STAKING_PATH}})),
            ),
            (
                "ordinary_transaction",
                device_output(json!({"type": 0, "params": {
                    "spendingPath": "m/1852'/1815'/0'/0/0",
                    "stakingKeyHashHex": OWNER_KEY_HASH,
                }})),
            ),
            (
                "ordinary_transaction",
                device_output(json!({"type": 1, "params": {
                    "spendingScriptHashHex": POOL_KEY_HASH,
                    "stakingPath": STAKING_PATH,
                }})),
            ),
            ("multisig_transaction", script_credentials()),
        ];
        let versions = [(2, 2), (2, 3), (2, 4), (3, 0), (4, 0), (4, 1)];

        for (mode, tx) in cases {
            let req = parse_signing_request(&request(mode, tx)).unwrap();
            let mut accepted = 0;
            for (major, minor) in versions {
                let compat = compat(major, minor);
                if ensure_supported(&req, &compat).is_ok() {
                    accepted += 1;
                    assert!(
                        encode_version_dependent(&req, &compat).is_ok(),
                        "{mode} accepted but not encodable on {major}.{minor}"
                    );
                }
            }
            assert!(accepted > 0, "{mode} never accepted");
        }
    }
}
