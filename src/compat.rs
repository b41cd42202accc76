//! Capability table: which protocol features a given app version speaks.
//!
//! Derived once per connection from the version reply and never mutated.

use crate::types::AppVersion;

/// Oldest app version this library can talk to.
pub const MIN_VERSION: (u8, u8, u8) = (2, 2, 0);

/// Version recommended to users of incompatible or feature-limited apps.
pub const RECOMMENDED_VERSION: &str = "4.1";

/// Forward compatibility is assumed only within known major versions.
const MAX_KNOWN_MAJOR: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCompatibility {
    pub is_compatible: bool,
    /// `Some` when a newer app should be installed.
    pub recommended_version: Option<&'static str>,
    pub supports_mary: bool,
    pub supports_catalyst_registration: bool,
    pub supports_zero_ttl: bool,
    pub supports_pool_registration_as_operator: bool,
    pub supports_pool_retirement: bool,
    /// Script-hash credentials and the current address/certificate layouts.
    pub supports_multisig_transaction: bool,
    pub supports_mint: bool,
    /// Datum hashes, script data hash, collateral, required signers.
    pub supports_alonzo: bool,
    pub supports_required_signers_in_ordinary_tx: bool,
}

impl DeviceCompatibility {
    pub fn for_version(version: &AppVersion) -> Self {
        let at_least = |major: u8, minor: u8| {
            (version.major, version.minor) >= (major, minor) && version.major <= MAX_KNOWN_MAJOR
        };

        let v2_2 = at_least(2, 2);
        let v2_3 = at_least(2, 3);
        let v2_4 = at_least(2, 4);
        let v3_0 = at_least(3, 0);
        let v4_0 = at_least(4, 0);
        let v4_1 = at_least(4, 1);

        Self {
            is_compatible: v2_2,
            recommended_version: if v4_1 { None } else { Some(RECOMMENDED_VERSION) },
            supports_mary: v2_2,
            supports_catalyst_registration: v2_3,
            supports_zero_ttl: v2_3,
            supports_pool_registration_as_operator: v2_4,
            supports_pool_retirement: v2_4,
            supports_multisig_transaction: v3_0,
            supports_mint: v3_0,
            supports_alonzo: v4_0,
            supports_required_signers_in_ordinary_tx: v4_1,
        }
    }

    /// Whether certificate, withdrawal and address payloads use the layout
    /// with explicit credential type tags.
    pub(crate) fn uses_tagged_credentials(&self) -> bool {
        self.supports_multisig_transaction
    }

    /// Older apps expect auxiliary data after withdrawals instead of right
    /// after INIT.
    pub(crate) fn aux_data_before_inputs(&self) -> bool {
        self.supports_multisig_transaction
    }

    /// Pool key and reward account carry an ownership header.
    pub(crate) fn uses_tagged_pool_keys(&self) -> bool {
        self.supports_pool_registration_as_operator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compat(major: u8, minor: u8, patch: u8) -> DeviceCompatibility {
        DeviceCompatibility::for_version(&AppVersion::new(major, minor, patch))
    }

    #[test]
    fn too_old_is_incompatible() {
        let c = compat(2, 1, 9);
        assert!(!c.is_compatible);
        assert!(!c.supports_mary);
        assert_eq!(c.recommended_version, Some(RECOMMENDED_VERSION));
    }

    #[test]
    fn exact_minimum() {
        let c = compat(2, 2, 0);
        assert!(c.is_compatible);
        assert!(c.supports_mary);
        assert!(!c.supports_catalyst_registration);
        assert!(!c.supports_zero_ttl);
    }

    #[test]
    fn v2_3_boundary() {
        let c = compat(2, 3, 0);
        assert!(c.supports_catalyst_registration);
        assert!(c.supports_zero_ttl);
        assert!(!c.supports_pool_retirement);
    }

    #[test]
    fn v2_4_boundary() {
        let c = compat(2, 4, 1);
        assert!(c.supports_pool_registration_as_operator);
        assert!(c.supports_pool_retirement);
        assert!(!c.supports_multisig_transaction);
        assert!(c.uses_tagged_pool_keys());
        assert!(!c.uses_tagged_credentials());
    }

    #[test]
    fn v3_0_boundary() {
        let c = compat(3, 0, 0);
        assert!(c.supports_multisig_transaction);
        assert!(c.supports_mint);
        assert!(!c.supports_alonzo);
        assert!(c.aux_data_before_inputs());
    }

    #[test]
    fn v4_boundaries() {
        let c = compat(4, 0, 0);
        assert!(c.supports_alonzo);
        assert!(!c.supports_required_signers_in_ordinary_tx);
        assert_eq!(c.recommended_version, Some(RECOMMENDED_VERSION));

        let c = compat(4, 1, 0);
        assert!(c.supports_required_signers_in_ordinary_tx);
        assert_eq!(c.recommended_version, None);
    }

    #[test]
    fn unknown_major_is_incompatible() {
        let c = compat(5, 0, 0);
        assert!(!c.is_compatible);
        assert!(!c.supports_alonzo);
    }

    #[test]
    fn patch_does_not_matter() {
        assert_eq!(compat(2, 4, 0), compat(2, 4, 7));
    }
}
