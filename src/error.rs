//! Error types and Cardano app status word mapping.

use thiserror::Error;

/// Raw status words returned by the Cardano app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum StatusWord {
    Ok = 0x9000,
    WrongApp = 0x6E00,
    AppNotOpen = 0x6E01,
    StillInCall = 0x6E04,
    InvalidData = 0x6E07,
    InvalidBip32Path = 0x6E08,
    RejectedByUser = 0x6E09,
    RejectedByPolicy = 0x6E10,
    DeviceLocked = 0x6E11,
    UnsupportedAddressType = 0x6E12,
}

impl StatusWord {
    pub(crate) fn is_success(code: u16) -> bool {
        code == Self::Ok as u16
    }
}

/// Errors returned by the library.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid data: {0}")]
    InvalidData(#[from] InvalidDataReason),

    #[error("device version unsupported: {0}")]
    DeviceVersionUnsupported(String),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("device returned status 0x{0:04X}: {1}")]
    DeviceStatus(u16, &'static str),

    #[error("device is locked or asleep, unlock it and open the Cardano app")]
    DeviceLocked,

    #[error("Cardano app is not open, open it and try again")]
    AppNotOpen,

    #[error("wrong app open on device, close it and open the Cardano app")]
    WrongApp,

    #[error("device is still processing a previous call")]
    StillInCall,

    #[error("user rejected the request on device")]
    UserRejected,

    #[error("request rejected by device security policy")]
    RejectedByPolicy,

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl LedgerError {
    pub fn from_status(code: u16) -> Self {
        match code {
            c if c == StatusWord::DeviceLocked as u16 => Self::DeviceLocked,
            c if c == StatusWord::RejectedByUser as u16 => Self::UserRejected,
            c if c == StatusWord::RejectedByPolicy as u16 => Self::RejectedByPolicy,
            c if c == StatusWord::StillInCall as u16 => Self::StillInCall,
            c if c == StatusWord::WrongApp as u16 => Self::WrongApp,
            c if c == StatusWord::AppNotOpen as u16 => Self::AppNotOpen,
            c if c == StatusWord::InvalidData as u16 => {
                Self::DeviceStatus(code, "device rejected the data")
            }
            c if c == StatusWord::InvalidBip32Path as u16 => {
                Self::DeviceStatus(code, "device rejected the derivation path")
            }
            c if c == StatusWord::UnsupportedAddressType as u16 => {
                Self::DeviceStatus(code, "unsupported address type")
            }
            _ => Self::DeviceStatus(code, "unknown"),
        }
    }

    /// True when the device itself refused an exchange.
    pub fn is_device_rejection(&self) -> bool {
        matches!(
            self,
            Self::DeviceStatus(..)
                | Self::DeviceLocked
                | Self::AppNotOpen
                | Self::WrongApp
                | Self::StillInCall
                | Self::UserRejected
                | Self::RejectedByPolicy
        )
    }
}

/// Transport-level errors reported by a [`Transport`](crate::transport::Transport)
/// implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no Ledger device found, is it plugged in?")]
    DeviceNotFound,

    #[error("communication error: {0}")]
    Comm(String),

    #[error("device timed out after {0}ms")]
    Timeout(u32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Every rule the request parsers enforce. Each validator is handed the
/// reason it fails with, so a rejected request always names the rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum InvalidDataReason {
    // -- request envelope --
    #[error("signing request must be an object")]
    RequestNotObject,
    #[error("transaction must be an object")]
    TxNotObject,
    #[error("unknown signing mode")]
    SigningModeUnknown,
    #[error("additional witness paths must be an array")]
    AdditionalWitnessesNotArray,
    #[error("invalid additional witness path")]
    AdditionalWitnessInvalidPath,
    #[error("malformed derivation path string")]
    DerivationPathMalformed,

    // -- network --
    #[error("network must be an object")]
    NetworkNotObject,
    #[error("invalid network id")]
    NetworkInvalidId,
    #[error("invalid protocol magic")]
    NetworkInvalidProtocolMagic,

    // -- inputs --
    #[error("inputs must be an array")]
    InputsNotArray,
    #[error("invalid input transaction hash")]
    InputInvalidTxHash,
    #[error("invalid input output index")]
    InputInvalidIndex,
    #[error("invalid input path")]
    InputInvalidPath,

    // -- outputs --
    #[error("outputs must be an array")]
    OutputsNotArray,
    #[error("invalid output amount")]
    OutputInvalidAmount,
    #[error("invalid output destination")]
    OutputInvalidDestination,
    #[error("invalid output address")]
    OutputInvalidAddress,
    #[error("reward address cannot be an output destination")]
    OutputWithRewardAddress,
    #[error("invalid output datum hash")]
    OutputInvalidDatumHash,
    #[error("inconsistent output: datum hash given for an address without a script spending part")]
    OutputDatumHashWithoutScriptAddress,

    // -- token bundles (outputs and mint) --
    #[error("token bundle must be an array")]
    TokenBundleNotArray,
    #[error("token bundle has too many asset groups")]
    TokenBundleTooLarge,
    #[error("invalid asset group policy id")]
    AssetGroupInvalidPolicyId,
    #[error("asset group tokens must be an array")]
    AssetGroupTokensNotArray,
    #[error("asset group must contain at least one token")]
    AssetGroupEmpty,
    #[error("asset group has too many tokens")]
    AssetGroupTooLarge,
    #[error("duplicate policy id in token bundle")]
    TokenBundleDuplicatePolicy,
    #[error("policy ids in token bundle are not canonically ordered")]
    TokenBundleUnorderedPolicies,
    #[error("duplicate asset name in asset group")]
    AssetGroupDuplicateAssetName,
    #[error("asset names in asset group are not canonically ordered")]
    AssetGroupUnorderedAssetNames,
    #[error("invalid token asset name")]
    TokenInvalidAssetName,
    #[error("invalid token amount")]
    TokenInvalidAmount,

    // -- address parameters --
    #[error("address parameters must be an object")]
    AddressParamsNotObject,
    #[error("invalid address type")]
    AddressInvalidType,
    #[error("invalid address spending path")]
    AddressInvalidSpendingPath,
    #[error("invalid address spending script hash")]
    AddressInvalidSpendingScriptHash,
    #[error("address spending information does not match the address type")]
    AddressInvalidSpendingInfo,
    #[error("invalid address staking path")]
    AddressInvalidStakingPath,
    #[error("invalid address staking key hash")]
    AddressInvalidStakingKeyHash,
    #[error("invalid address staking script hash")]
    AddressInvalidStakingScriptHash,
    #[error("invalid address blockchain pointer")]
    AddressInvalidBlockchainPointer,
    #[error("address staking information does not match the address type")]
    AddressInvalidStakingInfo,

    // -- fee, ttl, validity interval --
    #[error("invalid fee")]
    FeeInvalid,
    #[error("invalid ttl")]
    TtlInvalid,
    #[error("invalid validity interval start")]
    ValidityIntervalStartInvalid,

    // -- certificates --
    #[error("certificates must be an array")]
    CertificatesNotArray,
    #[error("invalid certificate type")]
    CertificateInvalidType,
    #[error("invalid certificate stake credential")]
    CertificateInvalidStakeCredential,
    #[error("invalid certificate pool key hash")]
    CertificateInvalidPoolKeyHash,
    #[error("invalid pool retirement path")]
    CertificateInvalidPath,
    #[error("invalid pool retirement epoch")]
    CertificateInvalidRetirementEpoch,

    // -- pool registration --
    #[error("pool parameters must be an object")]
    PoolRegistrationNotObject,
    #[error("invalid pool key")]
    PoolRegistrationInvalidPoolKey,
    #[error("invalid pool VRF key hash")]
    PoolRegistrationInvalidVrfKeyHash,
    #[error("invalid pool pledge")]
    PoolRegistrationInvalidPledge,
    #[error("invalid pool cost")]
    PoolRegistrationInvalidCost,
    #[error("invalid pool margin")]
    PoolRegistrationInvalidMargin,
    #[error("invalid pool margin denominator")]
    PoolRegistrationInvalidMarginDenominator,
    #[error("invalid pool reward account")]
    PoolRegistrationInvalidRewardAccount,
    #[error("pool owners must be an array")]
    PoolRegistrationOwnersNotArray,
    #[error("too many pool owners")]
    PoolRegistrationOwnersTooMany,
    #[error("invalid pool owner")]
    PoolRegistrationInvalidOwner,
    #[error("pool relays must be an array")]
    PoolRegistrationRelaysNotArray,
    #[error("too many pool relays")]
    PoolRegistrationRelaysTooMany,
    #[error("invalid pool relay")]
    PoolRegistrationInvalidRelay,
    #[error("invalid relay port")]
    RelayInvalidPort,
    #[error("invalid relay IPv4 address")]
    RelayInvalidIpv4,
    #[error("invalid relay IPv6 address")]
    RelayInvalidIpv6,
    #[error("invalid relay DNS name")]
    RelayInvalidDns,
    #[error("invalid pool metadata")]
    PoolRegistrationInvalidMetadata,
    #[error("invalid pool metadata URL")]
    PoolMetadataInvalidUrl,
    #[error("invalid pool metadata hash")]
    PoolMetadataInvalidHash,

    // -- withdrawals --
    #[error("withdrawals must be an array")]
    WithdrawalsNotArray,
    #[error("invalid withdrawal amount")]
    WithdrawalInvalidAmount,
    #[error("invalid withdrawal stake credential")]
    WithdrawalInvalidStakeCredential,

    // -- auxiliary data --
    #[error("auxiliary data must be an object")]
    AuxiliaryDataNotObject,
    #[error("unknown auxiliary data type")]
    AuxiliaryDataUnknownType,
    #[error("invalid auxiliary data hash")]
    AuxiliaryDataInvalidHash,
    #[error("invalid catalyst voting key")]
    CatalystInvalidVotingKey,
    #[error("invalid catalyst staking path")]
    CatalystInvalidStakingPath,
    #[error("invalid catalyst rewards destination")]
    CatalystInvalidRewardsDestination,
    #[error("invalid catalyst nonce")]
    CatalystInvalidNonce,

    // -- alonzo fields --
    #[error("invalid script data hash")]
    ScriptDataHashInvalid,
    #[error("collateral inputs must be an array")]
    CollateralsNotArray,
    #[error("required signers must be an array")]
    RequiredSignersNotArray,
    #[error("invalid required signer")]
    RequiredSignerInvalid,

    // -- signing mode: ordinary --
    #[error("pool registration is not allowed in an ordinary transaction")]
    OrdinaryPoolRegistrationNotAllowed,
    #[error("certificate stake credential must be a path in an ordinary transaction")]
    OrdinaryCertificateCredentialOnlyAsPath,
    #[error("withdrawal must be a path in an ordinary transaction")]
    OrdinaryWithdrawalOnlyAsPath,

    // -- signing mode: multisig --
    #[error("pool registration is not allowed in a multisig transaction")]
    MultisigPoolRegistrationNotAllowed,
    #[error("pool retirement is not allowed in a multisig transaction")]
    MultisigPoolRetirementNotAllowed,
    #[error("certificate stake credential must be a script hash in a multisig transaction")]
    MultisigCertificateCredentialOnlyAsScript,
    #[error("withdrawal must be a script hash in a multisig transaction")]
    MultisigWithdrawalOnlyAsScript,
    #[error("input with path is not allowed in a multisig transaction")]
    MultisigInputWithPathNotAllowed,
    #[error("device-owned output is not allowed in a multisig transaction")]
    MultisigDeviceOwnedAddressNotAllowed,
    #[error("required signer must be a key hash in a multisig transaction")]
    MultisigRequiredSignerOnlyAsHash,

    // -- signing mode: pool registration as owner --
    #[error("single pool registration certificate required")]
    PoolOwnerSinglePoolRegistrationRequired,
    #[error("single path owner required")]
    PoolOwnerSinglePathOwnerRequired,
    #[error("third-party pool key required when signing as pool owner")]
    PoolOwnerThirdPartyPoolKeyRequired,
    #[error("input with path is not allowed when signing as pool owner")]
    PoolOwnerInputWithPathNotAllowed,
    #[error("device-owned output is not allowed when signing as pool owner")]
    PoolOwnerDeviceOwnedAddressNotAllowed,
    #[error("withdrawals are not allowed when signing as pool owner")]
    PoolOwnerWithdrawalsNotAllowed,
    #[error("mint is not allowed when signing as pool owner")]
    PoolOwnerMintNotAllowed,

    // -- signing mode: pool registration as operator --
    #[error("single pool registration certificate required")]
    PoolOperatorSinglePoolRegistrationRequired,
    #[error("device-owned pool key required when signing as pool operator")]
    PoolOperatorDeviceOwnedPoolKeyRequired,
    #[error("device-owned pool owner is not allowed when signing as pool operator")]
    PoolOperatorDeviceOwnedOwnerNotAllowed,
    #[error("withdrawals are not allowed when signing as pool operator")]
    PoolOperatorWithdrawalsNotAllowed,
    #[error("mint is not allowed when signing as pool operator")]
    PoolOperatorMintNotAllowed,

    // -- signing mode: plutus --
    #[error("pool registration is not allowed in a plutus transaction")]
    PlutusPoolRegistrationNotAllowed,

    // -- alonzo fields outside plutus --
    #[error("collateral inputs are only allowed in a plutus transaction")]
    CollateralsNotAllowed,
    #[error("script data hash is only allowed in a plutus transaction")]
    ScriptDataHashNotAllowed,
    #[error("required signers are not allowed in pool registration transactions")]
    RequiredSignersNotAllowed,
}
