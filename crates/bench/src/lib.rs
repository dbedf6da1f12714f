//! Transaction-latency benchmarking on top of [`txmeter_rpc`].
//!
//! A benchmark run signs and submits one zero-value self-transfer from a
//! fresh throwaway key and measures the wall-clock window from the first
//! timed RPC call to confirmation. Depending on the selected options the
//! run either submits synchronously via `eth_sendRawTransactionSync` or
//! asynchronously via `eth_sendRawTransaction` plus receipt polling,
//! with any subset of nonce, gas parameters, and chain id resolved ahead
//! of the timed window.

pub mod config;
pub mod live;
pub mod options;
pub mod prefetch;
pub mod result;
pub mod runner;

mod orchestrator;

pub use config::{BenchmarkConfig, ChainConfig, NativeCurrency};
pub use live::CallLog;
pub use options::{SubmissionPlan, TransactionOptions};
pub use orchestrator::{RunOutcome, TransactionBenchmark, compare};
pub use prefetch::{GasBundle, Prefetched};
pub use result::{BenchmarkResult, PartialResult, RunStatus};
pub use runner::{FailureKind, RunError, TransactionRunner};
