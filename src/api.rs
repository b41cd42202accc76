//! High-level API - [`LedgerCardano`] wraps a transport connection and
//! exposes all supported operations.

use serde_json::Value;

use crate::commands;
use crate::compat::{DeviceCompatibility, MIN_VERSION, RECOMMENDED_VERSION};
use crate::error::LedgerError;
use crate::transport::Transport;
use crate::tx::{self, parse_address_params};
use crate::types::{AppVersion, DerivationPath, ExtendedPublicKey, Network, Serial, SignedTransaction};

/// High-level interface to the Cardano Ledger app.
///
/// The app version is queried once in [`connect`](Self::connect); the
/// derived [`DeviceCompatibility`] decides which features and wire layouts
/// are used for the rest of the connection.
///
/// One exchange is in flight at a time. The methods take `&self`, so callers
/// sharing a connection across threads must serialize their calls.
pub struct LedgerCardano {
    transport: Box<dyn Transport>,
    version: AppVersion,
    compat: DeviceCompatibility,
}

impl LedgerCardano {
    /// Query the app version and refuse apps this library cannot drive.
    pub fn connect(transport: Box<dyn Transport>) -> Result<Self, LedgerError> {
        let version = commands::get_version::exec(transport.as_ref())?;
        let compat = DeviceCompatibility::for_version(&version);
        if !compat.is_compatible {
            return Err(LedgerError::DeviceVersionUnsupported(format!(
                "{version} is not supported - use at least {}.{}.{} (recommended {RECOMMENDED_VERSION})",
                MIN_VERSION.0, MIN_VERSION.1, MIN_VERSION.2,
            )));
        }
        if let Some(recommended) = compat.recommended_version {
            log::info!("connected to {version}, version {recommended} is recommended");
        } else {
            log::info!("connected to {version}");
        }

        Ok(Self {
            transport,
            version,
            compat,
        })
    }

    /// Version reported when the connection was opened.
    pub fn version(&self) -> AppVersion {
        self.version
    }

    pub fn compatibility(&self) -> &DeviceCompatibility {
        &self.compat
    }

    /// Ask the device for its version again.
    pub fn get_version(&self) -> Result<AppVersion, LedgerError> {
        commands::get_version::exec(self.transport.as_ref())
    }

    pub fn get_serial(&self) -> Result<Serial, LedgerError> {
        commands::get_serial::exec(self.transport.as_ref())
    }

    pub fn get_extended_public_key(
        &self,
        path: &DerivationPath,
    ) -> Result<ExtendedPublicKey, LedgerError> {
        commands::get_ext_public_key::exec(self.transport.as_ref(), path)
    }

    /// Derive an address from JSON address parameters and return its raw
    /// bytes.
    pub fn derive_address(
        &self,
        network: Network,
        address_params: &Value,
    ) -> Result<Vec<u8>, LedgerError> {
        let params = parse_address_params(network, address_params)?;
        commands::derive_address::exec(self.transport.as_ref(), &params, &self.compat)
    }

    /// Shows the address on device and waits for user confirmation.
    pub fn show_address(&self, network: Network, address_params: &Value) -> Result<(), LedgerError> {
        let params = parse_address_params(network, address_params)?;
        commands::derive_address::show(self.transport.as_ref(), &params, &self.compat)
    }

    /// Validate a JSON signing request and run the signing session.
    ///
    /// Invalid input fails with [`LedgerError::InvalidData`] and features the
    /// app lacks with [`LedgerError::DeviceVersionUnsupported`], both before
    /// anything is sent to the device.
    pub fn sign_transaction(&self, request: &Value) -> Result<SignedTransaction, LedgerError> {
        let request = tx::parse_signing_request(request)?;
        self.sign_request(&request)
    }

    /// Like [`sign_transaction`](Self::sign_transaction) for an already
    /// parsed request.
    pub fn sign_request(
        &self,
        request: &tx::SigningRequest,
    ) -> Result<SignedTransaction, LedgerError> {
        commands::sign_tx::exec(self.transport.as_ref(), request, &self.compat)
    }
}
