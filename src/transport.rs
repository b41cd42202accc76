//! The byte channel to the device.
//!
//! The physical link (USB HID, BLE, a simulator socket) lives outside this
//! crate. Implement [`Transport`] for it and hand it to
//! [`LedgerCardano::connect`](crate::LedgerCardano::connect).

use crate::apdu::{ApduAnswer, ApduCommand};
use crate::error::TransportError;

/// One request/response exchange with the device.
///
/// Implementations must not pipeline: `exchange` returns only once the reply
/// to `command` has arrived. Timeouts and link recovery belong here, not in
/// the callers. [`ApduCommand::encode`] gives the bytes to write and
/// [`ApduAnswer::from_raw`] wraps the bytes read back.
pub trait Transport: Send + Sync {
    fn exchange(&self, command: &ApduCommand) -> Result<ApduAnswer, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn exchange(&self, command: &ApduCommand) -> Result<ApduAnswer, TransportError> {
        (**self).exchange(command)
    }
}
