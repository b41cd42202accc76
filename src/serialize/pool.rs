//! Stake pool registration sub-exchange payloads.

use crate::compat::DeviceCompatibility;
use crate::error::LedgerError;
use crate::serialize::{push_count, push_flag, push_u64, unsupported};
use crate::tx::{PoolKey, PoolMetadata, PoolOwner, PoolParams, PoolRewardAccount, Relay};

const DEVICE_OWNED: u8 = 0x01;
const THIRD_PARTY: u8 = 0x02;

const RELAY_SINGLE_HOST_IP: u8 = 0x00;
const RELAY_SINGLE_HOST_NAME: u8 = 0x01;
const RELAY_MULTI_HOST: u8 = 0x02;

/// `[#owners u32][#relays u32]`
pub fn init(pool: &PoolParams) -> Vec<u8> {
    let mut buf = Vec::with_capacity(8);
    push_count(&mut buf, pool.owners.len());
    push_count(&mut buf, pool.relays.len());
    buf
}

/// Apps before operator support take the pool key and reward account only as
/// raw third-party bytes.
pub(crate) fn ensure_encodable(
    pool: &PoolParams,
    compat: &DeviceCompatibility,
) -> Result<(), LedgerError> {
    if compat.uses_tagged_pool_keys() {
        return Ok(());
    }
    if matches!(pool.pool_key, PoolKey::DeviceOwned(_)) {
        return Err(unsupported("device-owned pool key"));
    }
    if matches!(pool.reward_account, PoolRewardAccount::DeviceOwned(_)) {
        return Err(unsupported("device-owned reward account"));
    }
    Ok(())
}

pub fn pool_key(key: &PoolKey, compat: &DeviceCompatibility) -> Result<Vec<u8>, LedgerError> {
    let mut buf = Vec::new();
    match (key, compat.uses_tagged_pool_keys()) {
        (PoolKey::DeviceOwned(path), true) => {
            buf.push(DEVICE_OWNED);
            path.serialize_into(&mut buf);
        }
        (PoolKey::ThirdParty(hash), true) => {
            buf.push(THIRD_PARTY);
            buf.extend_from_slice(hash.as_ref());
        }
        (PoolKey::ThirdParty(hash), false) => buf.extend_from_slice(hash.as_ref()),
        (PoolKey::DeviceOwned(_), false) => return Err(unsupported("device-owned pool key")),
    }
    Ok(buf)
}

pub fn vrf_key_hash(pool: &PoolParams) -> Vec<u8> {
    pool.vrf_key_hash.as_ref().to_vec()
}

/// `[pledge][cost][margin numerator][margin denominator]`, each u64.
pub fn financials(pool: &PoolParams) -> Vec<u8> {
    let mut buf = Vec::with_capacity(32);
    push_u64(&mut buf, pool.pledge.get());
    push_u64(&mut buf, pool.cost.get());
    push_u64(&mut buf, pool.margin.numerator.get());
    push_u64(&mut buf, pool.margin.denominator.get());
    buf
}

pub fn reward_account(
    account: &PoolRewardAccount,
    compat: &DeviceCompatibility,
) -> Result<Vec<u8>, LedgerError> {
    let mut buf = Vec::new();
    match (account, compat.uses_tagged_pool_keys()) {
        (PoolRewardAccount::DeviceOwned(path), true) => {
            buf.push(DEVICE_OWNED);
            path.serialize_into(&mut buf);
        }
        (PoolRewardAccount::ThirdParty(bytes), true) => {
            buf.push(THIRD_PARTY);
            buf.extend_from_slice(bytes.as_ref());
        }
        (PoolRewardAccount::ThirdParty(bytes), false) => buf.extend_from_slice(bytes.as_ref()),
        (PoolRewardAccount::DeviceOwned(_), false) => {
            return Err(unsupported("device-owned reward account"))
        }
    }
    Ok(buf)
}

pub fn owner(owner: &PoolOwner) -> Vec<u8> {
    let mut buf = Vec::new();
    match owner {
        PoolOwner::DeviceOwned(path) => {
            buf.push(DEVICE_OWNED);
            path.serialize_into(&mut buf);
        }
        PoolOwner::ThirdParty(hash) => {
            buf.push(THIRD_PARTY);
            buf.extend_from_slice(hash.as_ref());
        }
    }
    buf
}

pub fn relay(relay: &Relay) -> Vec<u8> {
    let mut buf = Vec::new();
    match relay {
        Relay::SingleHostIp { port, ipv4, ipv6 } => {
            buf.push(RELAY_SINGLE_HOST_IP);
            push_port(&mut buf, *port);
            push_flag(&mut buf, ipv4.is_some());
            if let Some(ip) = ipv4 {
                buf.extend_from_slice(ip);
            }
            push_flag(&mut buf, ipv6.is_some());
            if let Some(ip) = ipv6 {
                buf.extend_from_slice(ip);
            }
        }
        Relay::SingleHostName { port, dns_name } => {
            buf.push(RELAY_SINGLE_HOST_NAME);
            push_port(&mut buf, *port);
            buf.extend_from_slice(dns_name.as_bytes());
        }
        Relay::MultiHost { dns_name } => {
            buf.push(RELAY_MULTI_HOST);
            buf.extend_from_slice(dns_name.as_bytes());
        }
    }
    buf
}

fn push_port(buf: &mut Vec<u8>, port: Option<u16>) {
    push_flag(buf, port.is_some());
    if let Some(port) = port {
        buf.extend_from_slice(&port.to_be_bytes());
    }
}

/// `NO`, or `YES` followed by the 32-byte hash and the URL.
pub fn metadata(metadata: Option<&PoolMetadata>) -> Vec<u8> {
    let mut buf = Vec::new();
    push_flag(&mut buf, metadata.is_some());
    if let Some(m) = metadata {
        buf.extend_from_slice(m.hash.as_ref());
        buf.extend_from_slice(m.url.as_bytes());
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::tests::{current, legacy, v2_4};
    use crate::serialize::{OPTION_NO, OPTION_YES};
    use crate::tx::certificate::tests::{device_owner, pool_params, third_party_pool_key};
    use crate::tx::{certificate::parse_certificate, Certificate};
    use serde_json::json;

    fn parsed_pool() -> PoolParams {
        let cert = parse_certificate(&json!({
            "type": 3,
            "params": pool_params(json!([device_owner()]), third_party_pool_key()),
        }))
        .unwrap();
        match cert {
            Certificate::StakePoolRegistration(pool) => *pool,
            other => panic!("unexpected certificate {other:?}"),
        }
    }

    #[test]
    fn pool_key_epochs() {
        let pool = parsed_pool();
        assert_eq!(pool_key(&pool.pool_key, &legacy()).unwrap().len(), 28);
        let tagged = pool_key(&pool.pool_key, &v2_4()).unwrap();
        assert_eq!(tagged.len(), 29);
        assert_eq!(tagged[0], THIRD_PARTY);

        let device = PoolKey::DeviceOwned("m/1853'/1815'/0'/0'".parse().unwrap());
        assert!(matches!(
            pool_key(&device, &legacy()),
            Err(LedgerError::DeviceVersionUnsupported(_))
        ));
        assert_eq!(pool_key(&device, &current()).unwrap()[0], DEVICE_OWNED);
    }

    #[test]
    fn reward_account_epochs() {
        let pool = parsed_pool();
        assert_eq!(reward_account(&pool.reward_account, &legacy()).unwrap().len(), 29);
        let tagged = reward_account(&pool.reward_account, &current()).unwrap();
        assert_eq!(tagged.len(), 30);
        assert_eq!(tagged[0], THIRD_PARTY);
    }

    #[test]
    fn device_owned_reward_account_needs_2_4() {
        let mut pool = parsed_pool();
        assert!(ensure_encodable(&pool, &legacy()).is_ok());

        pool.reward_account = PoolRewardAccount::DeviceOwned("m/1852'/1815'/0'/2/0".parse().unwrap());
        assert!(matches!(
            ensure_encodable(&pool, &legacy()),
            Err(LedgerError::DeviceVersionUnsupported(_))
        ));
        assert!(ensure_encodable(&pool, &v2_4()).is_ok());
        assert_eq!(reward_account(&pool.reward_account, &v2_4()).unwrap()[0], DEVICE_OWNED);
    }

    #[test]
    fn financials_layout() {
        let bytes = financials(&parsed_pool());
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[..8], &50_000_000_000u64.to_be_bytes());
        assert_eq!(&bytes[16..24], &3u64.to_be_bytes());
        assert_eq!(&bytes[24..], &100u64.to_be_bytes());
    }

    #[test]
    fn relays_layout() {
        let pool = parsed_pool();
        assert_eq!(
            relay(&pool.relays[0]),
            vec![
                RELAY_SINGLE_HOST_IP,
                OPTION_YES, 0x0B, 0xB8,
                OPTION_YES, 54, 228, 75, 154,
                OPTION_NO,
            ]
        );
        let ipv6_only = relay(&pool.relays[1]);
        assert_eq!(&ipv6_only[..4], &[RELAY_SINGLE_HOST_IP, OPTION_NO, OPTION_NO, OPTION_YES]);
        assert_eq!(ipv6_only.len(), 4 + 16);

        let mut expected = vec![RELAY_MULTI_HOST];
        expected.extend_from_slice(b"pools.example.com");
        assert_eq!(relay(&pool.relays[3]), expected);
    }

    #[test]
    fn metadata_layout() {
        let pool = parsed_pool();
        assert_eq!(metadata(None), vec![OPTION_NO]);
        let bytes = metadata(pool.metadata.as_ref());
        assert_eq!(bytes[0], OPTION_YES);
        assert_eq!(&bytes[33..], b"https://example.com/pool.json");
    }

    #[test]
    fn init_counts() {
        let pool = parsed_pool();
        assert_eq!(init(&pool), vec![0, 0, 0, 1, 0, 0, 0, 4]);
        assert_eq!(owner(&pool.owners[0])[0], DEVICE_OWNED);
    }
}
