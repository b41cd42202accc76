//! The two frames exchanged with the Cardano app.
//!
//! Every command carries class byte `0xD7`. Multi-step instructions such as
//! `SIGN_TX` put the stage in P1 and the item within the stage in P2. A
//! reply is the payload followed by a big-endian status word.

use crate::error::TransportError;

pub const CLA: u8 = 0xD7;

/// Largest payload a short APDU can carry.
pub const MAX_DATA_LENGTH: usize = u8::MAX as usize;

/// Instruction codes understood by the Cardano app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Instruction {
    GetVersion = 0x00,
    GetSerial = 0x01,
    GetExtPublicKey = 0x10,
    DeriveAddress = 0x11,
    SignTx = 0x21,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduCommand {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    pub data: Vec<u8>,
}

impl ApduCommand {
    pub fn new(ins: Instruction, p1: u8, p2: u8, data: Vec<u8>) -> Self {
        Self {
            cla: CLA,
            ins: ins as u8,
            p1,
            p2,
            data,
        }
    }

    /// Frame for the wire: header, one length byte, payload.
    ///
    /// Transports call this from `exchange`; a payload over
    /// [`MAX_DATA_LENGTH`] is a communication error.
    pub fn encode(&self) -> Result<Vec<u8>, TransportError> {
        let lc = u8::try_from(self.data.len()).map_err(|_| {
            TransportError::Comm(format!(
                "{} bytes of data exceed a short APDU",
                self.data.len()
            ))
        })?;
        let mut frame = vec![self.cla, self.ins, self.p1, self.p2, lc];
        frame.extend_from_slice(&self.data);
        Ok(frame)
    }
}

/// Raw reply as read from the device.
#[derive(Debug, Clone)]
pub struct ApduAnswer {
    raw: Vec<u8>,
}

impl ApduAnswer {
    pub fn from_raw(raw: Vec<u8>) -> Self {
        Self { raw }
    }

    pub fn new(data: &[u8], status: u16) -> Self {
        let mut raw = data.to_vec();
        raw.extend_from_slice(&status.to_be_bytes());
        Self { raw }
    }

    fn payload_end(&self) -> Option<usize> {
        self.raw.len().checked_sub(2)
    }

    /// `None` when the reply is too short to hold one.
    pub fn status(&self) -> Option<u16> {
        let end = self.payload_end()?;
        Some(u16::from_be_bytes([self.raw[end], self.raw[end + 1]]))
    }

    pub fn data(&self) -> &[u8] {
        match self.payload_end() {
            Some(end) => &self.raw[..end],
            None => &[],
        }
    }
}
