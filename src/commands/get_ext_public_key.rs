use crate::apdu::Instruction;
use crate::error::LedgerError;
use crate::protocol;
use crate::transport::Transport;
use crate::types::{DerivationPath, ExtendedPublicKey};

/// Response: `[public key (32)][chain code (32)]`
pub fn exec(
    transport: &dyn Transport,
    path: &DerivationPath,
) -> Result<ExtendedPublicKey, LedgerError> {
    let result = protocol::send(
        transport,
        Instruction::GetExtPublicKey,
        0x00,
        0x00,
        path.serialize(),
        64,
    )?;
    Ok(parse_ext_public_key(&result))
}

/// `data` is exactly 64 bytes, enforced by the exchange.
pub(crate) fn parse_ext_public_key(data: &[u8]) -> ExtendedPublicKey {
    let mut public_key = [0u8; 32];
    let mut chain_code = [0u8; 32];
    public_key.copy_from_slice(&data[..32]);
    chain_code.copy_from_slice(&data[32..64]);
    ExtendedPublicKey {
        public_key,
        chain_code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_key_and_chain_code() {
        let mut data = vec![0xAA; 32];
        data.extend_from_slice(&[0xBB; 32]);
        let key = parse_ext_public_key(&data);
        assert_eq!(key.public_key, [0xAA; 32]);
        assert_eq!(key.chain_code, [0xBB; 32]);
        assert_eq!(key.to_string(), format!("{}{}", "aa".repeat(32), "bb".repeat(32)));
    }
}
