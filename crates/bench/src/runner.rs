use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use ethereum_types::{H256, U256};
use tracing::{debug, warn};

use txmeter_rpc::{Eip1559Transaction, EthClient, LocalSigner, TransferParams, now_millis};

use crate::live::CallLog;
use crate::options::{SubmissionPlan, TransactionOptions};
use crate::prefetch::Prefetched;
use crate::result::{BenchmarkResult, RunStatus};

/// Which step of the run a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Signing,
    Submission,
    Confirmation,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Network => write!(f, "network"),
            FailureKind::Signing => write!(f, "signing"),
            FailureKind::Submission => write!(f, "submission"),
            FailureKind::Confirmation => write!(f, "confirmation"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{kind} failure: {message}")]
pub struct RunError {
    pub kind: FailureKind,
    pub message: String,
}

impl RunError {
    pub fn new(kind: FailureKind, error: impl ToString) -> Self {
        let mut message = error.to_string();
        if message.is_empty() {
            message = "unknown error".to_string();
        }
        Self { kind, message }
    }
}

/// Executes exactly one call-sequence variant for a single transaction
/// attempt and produces a terminal [`BenchmarkResult`].
///
/// Per run the state moves Started -> Prepared -> Submitted and ends in
/// exactly one of Confirmed or Failed; every failure is converted into a
/// result value at this boundary.
pub struct TransactionRunner<'a> {
    client: &'a EthClient,
    signer: &'a LocalSigner,
    chain_id: u64,
    log: Arc<CallLog>,
    receipt_poll_interval: Duration,
    receipt_poll_retries: u64,
}

impl<'a> TransactionRunner<'a> {
    pub fn new(
        client: &'a EthClient,
        signer: &'a LocalSigner,
        chain_id: u64,
        log: Arc<CallLog>,
        receipt_poll_interval: Duration,
        receipt_poll_retries: u64,
    ) -> Self {
        Self {
            client,
            signer,
            chain_id,
            log,
            receipt_poll_interval,
            receipt_poll_retries,
        }
    }

    pub async fn run(
        &self,
        options: &TransactionOptions,
        prefetched: &Prefetched,
    ) -> BenchmarkResult {
        let start_time = now_millis();
        let plan = SubmissionPlan::select(options, prefetched);
        debug!(?plan, sync_mode = options.sync_mode, "Starting transaction run");

        let outcome = self.execute(plan, prefetched).await;
        let end_time = now_millis();

        match outcome {
            Ok(tx_hash) => BenchmarkResult {
                start_time,
                end_time,
                duration: end_time.saturating_sub(start_time),
                status: RunStatus::Success,
                tx_hash: format!("{tx_hash:#x}"),
                error: None,
                rpc_calls: self.log.finished_calls(),
                sync_mode: options.sync_mode,
            },
            Err(error) => {
                warn!(%error, "Transaction run failed");
                BenchmarkResult {
                    start_time,
                    end_time,
                    duration: end_time.saturating_sub(start_time),
                    status: RunStatus::Error,
                    tx_hash: String::new(),
                    error: Some(error.to_string()),
                    rpc_calls: self.log.finished_calls(),
                    sync_mode: options.sync_mode,
                }
            }
        }
    }

    /// Zero-value self-transfer with the pre-fetched values injected;
    /// anything left `None` is resolved implicitly during assembly.
    fn base_params(&self, prefetched: &Prefetched) -> TransferParams {
        TransferParams {
            to: self.signer.address,
            value: U256::zero(),
            data: Bytes::new(),
            nonce: prefetched.nonce,
            max_fee_per_gas: prefetched.gas.map(|gas| gas.max_fee_per_gas),
            max_priority_fee_per_gas: prefetched.gas.map(|gas| gas.max_priority_fee_per_gas),
            gas: prefetched.gas.map(|gas| gas.gas),
        }
    }

    async fn execute(
        &self,
        plan: SubmissionPlan,
        prefetched: &Prefetched,
    ) -> Result<H256, RunError> {
        match plan {
            SubmissionPlan::Sync => {
                let tx = self
                    .client
                    .build_transfer(self.signer.address, &self.base_params(prefetched))
                    .await
                    .map_err(|error| RunError::new(FailureKind::Network, error))?;
                let raw = self.signer.sign_transaction(&tx);
                let receipt = self
                    .client
                    .send_raw_transaction_sync(&raw)
                    .await
                    .map_err(|error| RunError::new(FailureKind::Submission, error))?;
                Ok(receipt.transaction_hash)
            }
            SubmissionPlan::AsyncPrefetched => {
                let (Some(nonce), Some(gas), Some(chain_id)) =
                    (prefetched.nonce, prefetched.gas, prefetched.chain_id)
                else {
                    return Err(RunError::new(
                        FailureKind::Signing,
                        "fully pre-fetched plan selected without pre-fetched values",
                    ));
                };
                // The cached chain id is about to be baked into the
                // signing payload; refuse if it no longer matches the
                // configured target.
                if chain_id != self.chain_id {
                    return Err(RunError::new(
                        FailureKind::Signing,
                        format!(
                            "cached chain id {chain_id} does not match target chain id {}",
                            self.chain_id
                        ),
                    ));
                }
                let tx = Eip1559Transaction {
                    chain_id,
                    nonce,
                    max_priority_fee_per_gas: gas.max_priority_fee_per_gas,
                    max_fee_per_gas: gas.max_fee_per_gas,
                    gas_limit: gas.gas,
                    to: self.signer.address,
                    value: U256::zero(),
                    data: Bytes::new(),
                };
                let raw = self.signer.sign_transaction(&tx);
                let tx_hash = self
                    .client
                    .send_raw_transaction(&raw)
                    .await
                    .map_err(|error| RunError::new(FailureKind::Submission, error))?;
                self.confirm(tx_hash).await
            }
            SubmissionPlan::AsyncStandard => {
                let tx = self
                    .client
                    .build_transfer(self.signer.address, &self.base_params(prefetched))
                    .await
                    .map_err(|error| RunError::new(FailureKind::Network, error))?;
                let raw = self.signer.sign_transaction(&tx);
                let tx_hash = self
                    .client
                    .send_raw_transaction(&raw)
                    .await
                    .map_err(|error| RunError::new(FailureKind::Submission, error))?;
                self.confirm(tx_hash).await
            }
        }
    }

    async fn confirm(&self, tx_hash: H256) -> Result<H256, RunError> {
        let receipt = self
            .client
            .wait_for_transaction_receipt(
                tx_hash,
                self.receipt_poll_retries,
                self.receipt_poll_interval,
            )
            .await
            .map_err(|error| RunError::new(FailureKind::Confirmation, error))?;
        Ok(receipt.transaction_hash)
    }
}
