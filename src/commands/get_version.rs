use crate::apdu::Instruction;
use crate::error::LedgerError;
use crate::protocol;
use crate::transport::Transport;
use crate::types::{AppVersion, VersionFlags};

const FLAG_IS_DEBUG: u8 = 0x01;
const FLAG_IS_APP_XS: u8 = 0x02;

/// Response: `[major][minor][patch][flags]`
pub fn exec(transport: &dyn Transport) -> Result<AppVersion, LedgerError> {
    let result = protocol::send(transport, Instruction::GetVersion, 0x00, 0x00, Vec::new(), 4)?;
    parse_version_response(&result)
}

pub(crate) fn parse_version_response(data: &[u8]) -> Result<AppVersion, LedgerError> {
    let [major, minor, patch, flags] = data else {
        return Err(LedgerError::InvalidResponse(
            "version response must be 4 bytes - is the Cardano app running?".into(),
        ));
    };

    Ok(AppVersion {
        major: *major,
        minor: *minor,
        patch: *patch,
        flags: VersionFlags {
            is_debug: flags & FLAG_IS_DEBUG != 0,
            is_app_xs: flags & FLAG_IS_APP_XS != 0,
        },
    })
}
