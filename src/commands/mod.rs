//! Individual command implementations.
//!
//! You probably want [`LedgerCardano`](crate::api::LedgerCardano) instead.

pub mod derive_address;
pub mod get_ext_public_key;
pub mod get_serial;
pub mod get_version;
pub mod sign_tx;
