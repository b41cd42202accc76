//! Single request/response exchange with the Cardano app.
//!
//! Every instruction is a plain APDU round trip: we send one command, check
//! the status word, then check that the reply has exactly the length the
//! stage declares. Nothing is retried.

use crate::apdu::{ApduCommand, Instruction, MAX_DATA_LENGTH};
use crate::error::{LedgerError, StatusWord};
use crate::transport::Transport;

/// Send one APDU and return its payload if it is `expected_len` bytes long.
pub fn send(
    transport: &dyn Transport,
    ins: Instruction,
    p1: u8,
    p2: u8,
    data: Vec<u8>,
    expected_len: usize,
) -> Result<Vec<u8>, LedgerError> {
    let payload = round_trip(transport, ins, p1, p2, data)?;
    if payload.len() != expected_len {
        return Err(LedgerError::InvalidResponse(format!(
            "{ins:?} p1=0x{p1:02X}: expected {expected_len} bytes, got {}",
            payload.len()
        )));
    }
    Ok(payload)
}

/// Like [`send`] for replies of variable size, such as derived addresses.
pub fn send_bounded(
    transport: &dyn Transport,
    ins: Instruction,
    p1: u8,
    p2: u8,
    data: Vec<u8>,
    max_len: usize,
) -> Result<Vec<u8>, LedgerError> {
    let payload = round_trip(transport, ins, p1, p2, data)?;
    if payload.len() > max_len {
        return Err(LedgerError::InvalidResponse(format!(
            "{ins:?} p1=0x{p1:02X}: expected at most {max_len} bytes, got {}",
            payload.len()
        )));
    }
    Ok(payload)
}

fn round_trip(
    transport: &dyn Transport,
    ins: Instruction,
    p1: u8,
    p2: u8,
    data: Vec<u8>,
) -> Result<Vec<u8>, LedgerError> {
    if data.len() > MAX_DATA_LENGTH {
        return Err(LedgerError::InvalidResponse(format!(
            "payload of {} bytes does not fit one APDU",
            data.len()
        )));
    }

    log::debug!(
        "-> {ins:?} p1=0x{p1:02X} p2=0x{p2:02X} ({} bytes)",
        data.len()
    );
    let cmd = ApduCommand::new(ins, p1, p2, data);
    let answer = transport.exchange(&cmd)?;

    let code = answer
        .status()
        .ok_or_else(|| LedgerError::InvalidResponse("reply without status word".into()))?;
    if !StatusWord::is_success(code) {
        log::debug!("<- status 0x{code:04X}");
        return Err(LedgerError::from_status(code));
    }
    log::debug!("<- {} bytes", answer.data().len());
    Ok(answer.data().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apdu::ApduAnswer;
    use crate::error::TransportError;
    use std::sync::Mutex;

    struct Canned {
        reply: ApduAnswer,
        sent: Mutex<Vec<ApduCommand>>,
    }

    impl Canned {
        fn new(data: &[u8], code: u16) -> Self {
            Self {
                reply: ApduAnswer::new(data, code),
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    impl Transport for Canned {
        fn exchange(&self, command: &ApduCommand) -> Result<ApduAnswer, TransportError> {
            self.sent.lock().unwrap().push(command.clone());
            Ok(self.reply.clone())
        }
    }

    #[test]
    fn returns_payload_of_expected_length() {
        let t = Canned::new(&[4, 1, 0, 0], 0x9000);
        let data = send(&t, Instruction::GetVersion, 0, 0, Vec::new(), 4).unwrap();
        assert_eq!(data, vec![4, 1, 0, 0]);

        let sent = t.sent.lock().unwrap();
        assert_eq!(sent[0].cla, 0xD7);
        assert_eq!(sent[0].ins, 0x00);
    }

    #[test]
    fn wrong_length_is_invalid_response() {
        let t = Canned::new(&[4, 1, 0], 0x9000);
        let err = send(&t, Instruction::GetVersion, 0, 0, Vec::new(), 4).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidResponse(_)));
    }

    #[test]
    fn bounded_reply() {
        let t = Canned::new(&[0x61; 57], 0x9000);
        assert_eq!(
            send_bounded(&t, Instruction::DeriveAddress, 1, 0, Vec::new(), 128).unwrap().len(),
            57
        );
        let err = send_bounded(&t, Instruction::DeriveAddress, 1, 0, Vec::new(), 56).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidResponse(_)));
    }

    #[test]
    fn status_word_maps_to_error() {
        let t = Canned::new(&[], 0x6E09);
        let err = send(&t, Instruction::SignTx, 0x0A, 0, Vec::new(), 32).unwrap_err();
        assert!(matches!(err, LedgerError::UserRejected));
        assert!(err.is_device_rejection());
    }

    #[test]
    fn reply_without_status_word() {
        struct Silent;
        impl Transport for Silent {
            fn exchange(&self, _command: &ApduCommand) -> Result<ApduAnswer, TransportError> {
                Ok(ApduAnswer::from_raw(vec![0x90]))
            }
        }
        let err = send(&Silent, Instruction::GetSerial, 0, 0, Vec::new(), 7).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidResponse(_)));
    }

    #[test]
    fn oversized_payload_never_sent() {
        let t = Canned::new(&[], 0x9000);
        let err = send(&t, Instruction::SignTx, 0x02, 0, vec![0; 256], 0).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidResponse(_)));
        assert!(t.sent.lock().unwrap().is_empty());
    }
}
