//! Instrumented Ethereum JSON-RPC plumbing for latency measurement.
//!
//! The transport records start/end timestamps for every outbound call
//! and reports them to a per-run observer; the typed client, transaction
//! encoding and local signer sit on top of it.

pub mod client;
pub mod errors;
pub mod signer;
pub mod transaction;
pub mod transport;
pub mod types;
pub mod utils;

pub use client::EthClient;
pub use errors::{EthClientError, RpcRequestError};
pub use signer::LocalSigner;
pub use transaction::{Eip1559Transaction, TransferParams};
pub use transport::{InstrumentedTransport, RpcCallRecord, RpcObserver};
pub use types::{BlockIdentifier, BlockTag, RpcBlock, RpcReceipt};
pub use utils::now_millis;
