//! Binary layouts the Cardano app expects for each validated entity.
//!
//! All integers are big-endian. Where the firmware changed a layout, the
//! encoder picks the one matching the negotiated [`DeviceCompatibility`].

pub mod address;
pub mod pool;
pub mod tx;

use byteorder::{BigEndian, WriteBytesExt};

use crate::compat::DeviceCompatibility;
use crate::error::LedgerError;
use crate::tx::Credential;
use crate::types::DerivationPath;

/// Presence flags preceding optional fields.
pub const OPTION_NO: u8 = 0x01;
pub const OPTION_YES: u8 = 0x02;

const CREDENTIAL_KEY_PATH: u8 = 0x00;
const CREDENTIAL_SCRIPT_HASH: u8 = 0x01;

pub(crate) fn push_u32(buf: &mut Vec<u8>, value: u32) {
    buf.write_u32::<BigEndian>(value).unwrap();
}

pub(crate) fn push_u64(buf: &mut Vec<u8>, value: u64) {
    buf.write_u64::<BigEndian>(value).unwrap();
}

pub(crate) fn push_i64(buf: &mut Vec<u8>, value: i64) {
    buf.write_i64::<BigEndian>(value).unwrap();
}

pub(crate) fn push_flag(buf: &mut Vec<u8>, present: bool) {
    buf.push(if present { OPTION_YES } else { OPTION_NO });
}

/// Element counts declared in `INIT` and pool headers. A count past `u32`
/// saturates and the device rejects the mismatch.
pub(crate) fn push_count(buf: &mut Vec<u8>, count: usize) {
    push_u32(buf, u32::try_from(count).unwrap_or(u32::MAX));
}

pub(crate) fn unsupported(what: &str) -> LedgerError {
    LedgerError::DeviceVersionUnsupported(format!("{what} requires a newer Cardano app"))
}

/// Current layout: `[0x00][path] | [0x01][hash 28]`. Older apps only take a
/// bare path.
pub fn credential(
    credential: &Credential,
    compat: &DeviceCompatibility,
) -> Result<Vec<u8>, LedgerError> {
    let mut buf = Vec::new();
    match (credential, compat.uses_tagged_credentials()) {
        (Credential::KeyPath(path), true) => {
            buf.push(CREDENTIAL_KEY_PATH);
            path.serialize_into(&mut buf);
        }
        (Credential::ScriptHash(hash), true) => {
            buf.push(CREDENTIAL_SCRIPT_HASH);
            buf.extend_from_slice(hash.as_ref());
        }
        (Credential::KeyPath(path), false) => path.serialize_into(&mut buf),
        (Credential::ScriptHash(_), false) => return Err(unsupported("script hash credential")),
    }
    Ok(buf)
}

pub fn path(path: &DerivationPath) -> Vec<u8> {
    path.serialize()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::AppVersion;
    use byteorder::ReadBytesExt;
    use proptest::prelude::*;
    use std::io::Cursor;

    pub(crate) fn legacy() -> DeviceCompatibility {
        DeviceCompatibility::for_version(&AppVersion::new(2, 2, 0))
    }

    pub(crate) fn v2_4() -> DeviceCompatibility {
        DeviceCompatibility::for_version(&AppVersion::new(2, 4, 0))
    }

    pub(crate) fn current() -> DeviceCompatibility {
        DeviceCompatibility::for_version(&AppVersion::new(4, 1, 0))
    }

    fn decode_path(bytes: &[u8]) -> DerivationPath {
        let mut cursor = Cursor::new(bytes);
        let len = cursor.read_u8().unwrap();
        let components = (0..len)
            .map(|_| cursor.read_u32::<BigEndian>().unwrap())
            .collect();
        assert_eq!(cursor.position() as usize, bytes.len());
        DerivationPath::new(components).unwrap()
    }

    #[test]
    fn credential_epochs() {
        let key = Credential::KeyPath(DerivationPath::shelley(0, 2, 0));
        let bare = DerivationPath::shelley(0, 2, 0).serialize();

        assert_eq!(credential(&key, &legacy()).unwrap(), bare);
        let tagged = credential(&key, &current()).unwrap();
        assert_eq!(tagged[0], CREDENTIAL_KEY_PATH);
        assert_eq!(&tagged[1..], &bare[..]);
    }

    #[test]
    fn script_credential_needs_multisig_app() {
        let hash = crate::primitives::parse_hex_fixed(
            &serde_json::json!("29fb5fd4aa8cadd6705acc8263cee0fc62edca5ac38db593fec2f9fd"),
            crate::error::InvalidDataReason::CertificateInvalidStakeCredential,
        )
        .unwrap();
        let script = Credential::ScriptHash(hash);
        assert!(matches!(
            credential(&script, &legacy()),
            Err(LedgerError::DeviceVersionUnsupported(_))
        ));
        let bytes = credential(&script, &current()).unwrap();
        assert_eq!(bytes.len(), 29);
        assert_eq!(bytes[0], CREDENTIAL_SCRIPT_HASH);
    }

    #[test]
    fn flags_are_not_booleans() {
        let mut buf = Vec::new();
        push_flag(&mut buf, false);
        push_flag(&mut buf, true);
        assert_eq!(buf, vec![0x01, 0x02]);
    }

    proptest! {
        #[test]
        fn path_round_trip(components in proptest::collection::vec(any::<u32>(), 0..=10)) {
            let path = DerivationPath::new(components.clone()).unwrap();
            let bytes = super::path(&path);
            prop_assert_eq!(bytes.len(), 1 + 4 * components.len());
            prop_assert_eq!(decode_path(&bytes), path);
        }

        #[test]
        fn u64_round_trip(value in any::<u64>()) {
            let mut buf = Vec::new();
            push_u64(&mut buf, value);
            prop_assert_eq!(buf.len(), 8);
            prop_assert_eq!(Cursor::new(&buf).read_u64::<BigEndian>().unwrap(), value);
        }

        #[test]
        fn i64_round_trip(value in any::<i64>()) {
            let mut buf = Vec::new();
            push_i64(&mut buf, value);
            prop_assert_eq!(Cursor::new(&buf).read_i64::<BigEndian>().unwrap(), value);
        }
    }
}
