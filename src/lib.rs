//! Rust client for the Cardano Ledger app (`app-cardano` v2.2 to v4.x).
//!
//! Validates signing requests on the host, encodes them in the layout the
//! connected app version expects and drives the staged `SIGN_TX` session.
//! The byte channel is yours: implement [`Transport`] for USB HID, BLE or a
//! simulator socket.
//!
//! # Quick start
//!
//! ```no_run
//! use ledger_cardano::{DerivationPath, LedgerCardano, Transport};
//! use serde_json::json;
//!
//! # fn open_device() -> Box<dyn Transport> { unimplemented!() }
//! let ledger = LedgerCardano::connect(open_device())?;
//! println!("{}", ledger.version());
//!
//! let key = ledger.get_extended_public_key(&DerivationPath::shelley(0, 0, 0))?;
//! println!("public key: {}", hex::encode(key.public_key));
//!
//! let signed = ledger.sign_transaction(&json!({
//!     "signingMode": "ordinary_transaction",
//!     "tx": {
//!         "network": {"networkId": 1, "protocolMagic": 764824073},
//!         "inputs": [{
//!             "txHashHex": "1af8fa0b754ff99253d983894e63a2b09cbb56c833ba18c3384210163f63dcfc",
//!             "outputIndex": 0,
//!             "path": "m/1852'/1815'/0'/0/0",
//!         }],
//!         "outputs": [],
//!         "fee": "170000",
//!         "ttl": "50000000",
//!     },
//! }))?;
//! println!("tx hash: {}", hex::encode(signed.tx_hash));
//! # Ok::<(), ledger_cardano::LedgerError>(())
//! ```
//!
//! # Modules
//!
//! - [`api`] -- high-level [`LedgerCardano`] facade
//! - [`tx`] -- validated transaction model and request parsing
//! - [`witness`] -- which paths a transaction needs signatures for
//! - [`compat`] -- per-version capability table
//! - [`serialize`] -- device wire encoding
//! - [`primitives`] -- field validators shared by the parsers
//! - [`transport`] -- the [`Transport`] trait

pub mod apdu;
pub mod api;
pub(crate) mod commands;
pub mod compat;
pub mod error;
pub mod primitives;
pub(crate) mod protocol;
pub mod serialize;
pub mod transport;
pub mod tx;
pub mod types;
pub mod witness;

pub use api::LedgerCardano;
pub use compat::DeviceCompatibility;
pub use error::{InvalidDataReason, LedgerError, TransportError};
pub use transport::Transport;
pub use tx::{SigningMode, SigningRequest};
pub use types::{
    AppVersion, AuxiliaryDataSupplement, DerivationPath, ExtendedPublicKey, Network, Serial,
    SignedTransaction, Signature, TxHash, Witness,
};
pub use witness::collect_witness_paths;
