use crate::apdu::Instruction;
use crate::compat::DeviceCompatibility;
use crate::error::LedgerError;
use crate::protocol;
use crate::serialize;
use crate::transport::Transport;
use crate::tx::output::MAX_ADDRESS_LENGTH;
use crate::tx::AddressParams;

const P1_RETURN: u8 = 0x01;
const P1_DISPLAY: u8 = 0x02;

/// Returns the raw address bytes.
pub fn exec(
    transport: &dyn Transport,
    params: &AddressParams,
    compat: &DeviceCompatibility,
) -> Result<Vec<u8>, LedgerError> {
    let data = serialize::address::address_params(params, compat)?;
    let address = protocol::send_bounded(
        transport,
        Instruction::DeriveAddress,
        P1_RETURN,
        0x00,
        data,
        MAX_ADDRESS_LENGTH,
    )?;
    if address.is_empty() {
        return Err(LedgerError::InvalidResponse("empty address".into()));
    }
    Ok(address)
}

/// Shows the address on device and waits for user confirmation.
pub fn show(
    transport: &dyn Transport,
    params: &AddressParams,
    compat: &DeviceCompatibility,
) -> Result<(), LedgerError> {
    let data = serialize::address::address_params(params, compat)?;
    protocol::send(transport, Instruction::DeriveAddress, P1_DISPLAY, 0x00, data, 0)?;
    Ok(())
}
