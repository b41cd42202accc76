use crate::apdu::Instruction;
use crate::error::LedgerError;
use crate::protocol;
use crate::transport::Transport;
use crate::types::Serial;

const SERIAL_LENGTH: usize = 7;

pub fn exec(transport: &dyn Transport) -> Result<Serial, LedgerError> {
    let result = protocol::send(
        transport,
        Instruction::GetSerial,
        0x00,
        0x00,
        Vec::new(),
        SERIAL_LENGTH,
    )?;
    let mut serial = [0u8; SERIAL_LENGTH];
    serial.copy_from_slice(&result);
    Ok(Serial(serial))
}
