use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use ethereum_types::U256;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use txmeter_rpc::{
    EthClient, InstrumentedTransport, LocalSigner, RpcCallRecord, TransferParams, now_millis,
};

use crate::config::BenchmarkConfig;
use crate::live::CallLog;
use crate::options::TransactionOptions;
use crate::prefetch::run_prefetch;
use crate::result::{BenchmarkResult, PartialResult, RunStatus};
use crate::runner::TransactionRunner;

/// One finished benchmark run: the measured result plus the calls made
/// during the un-timed pre-fetch phase, kept apart from the timed window.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub result: BenchmarkResult,
    pub prefetch_calls: Vec<RpcCallRecord>,
}

/// Drives one benchmark run end to end: ephemeral key, pre-fetch phase,
/// timed window, live progress and elapsed-time channels.
///
/// Each instance owns its channels outright, so two orchestrators never
/// observe each other's progress.
pub struct TransactionBenchmark {
    config: BenchmarkConfig,
    partial: Arc<watch::Sender<Option<PartialResult>>>,
    elapsed: Arc<watch::Sender<u64>>,
}

impl TransactionBenchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        let (partial, _) = watch::channel(None);
        let (elapsed, _) = watch::channel(0);
        Self {
            config,
            partial: Arc::new(partial),
            elapsed: Arc::new(elapsed),
        }
    }

    /// Live snapshots of the in-flight run. `None` between runs.
    pub fn partial_results(&self) -> watch::Receiver<Option<PartialResult>> {
        self.partial.subscribe()
    }

    /// Coarse elapsed-time ticker for display. The final value is
    /// overwritten with the measured duration when the run settles.
    pub fn elapsed_ms(&self) -> watch::Receiver<u64> {
        self.elapsed.subscribe()
    }

    pub async fn run(&self, options: TransactionOptions) -> RunOutcome {
        // Fresh key per run so no nonce or balance state leaks between runs.
        let signer = LocalSigner::random();
        info!(
            chain = %self.config.chain.name,
            signer = %signer.address,
            sync_mode = options.sync_mode,
            "Starting benchmark run"
        );

        let prefetch_log = Arc::new(CallLog::new(now_millis(), options.sync_mode));
        let prefetch_client = match InstrumentedTransport::new(self.config.chain.rpc_url.as_str())
        {
            Ok(transport) => {
                EthClient::with_transport(transport.with_observer(prefetch_log.clone()))
            }
            Err(error) => {
                return self.failed_before_start(&options, error.to_string(), Vec::new());
            }
        };

        let params = TransferParams {
            to: signer.address,
            value: U256::zero(),
            data: Bytes::new(),
            nonce: None,
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
            gas: None,
        };

        let prefetched =
            match run_prefetch(&prefetch_client, signer.address, &params, &options).await {
                Ok(prefetched) => prefetched,
                Err(error) => {
                    warn!(%error, "Pre-fetch phase failed, aborting run");
                    return self.failed_before_start(
                        &options,
                        error.to_string(),
                        prefetch_log.finished_calls(),
                    );
                }
            };

        if let Some(chain_id) = prefetched.chain_id {
            if chain_id != self.config.chain.chain_id {
                return self.failed_before_start(
                    &options,
                    format!(
                        "target reported chain id {chain_id}, configured for {}",
                        self.config.chain.chain_id
                    ),
                    prefetch_log.finished_calls(),
                );
            }
        }

        let run_start = now_millis();
        let run_log = Arc::new(CallLog::with_publisher(
            run_start,
            options.sync_mode,
            self.partial.clone(),
        ));
        self.partial.send_replace(Some(run_log.snapshot(false)));

        let mut transport = match InstrumentedTransport::new(self.config.chain.rpc_url.as_str()) {
            Ok(transport) => transport.with_observer(run_log.clone()),
            Err(error) => {
                return self.failed_before_start(
                    &options,
                    error.to_string(),
                    prefetch_log.finished_calls(),
                );
            }
        };
        if let Some(chain_id) = prefetched.chain_id {
            transport = transport.with_cached_chain_id(chain_id);
        }
        let client = EthClient::with_transport(transport);

        let ticker = self.spawn_ticker();

        let runner = TransactionRunner::new(
            &client,
            &signer,
            self.config.chain.chain_id,
            run_log.clone(),
            self.config.receipt_poll_interval(),
            self.config.receipt_poll_retries,
        );
        let result = runner.run(&options, &prefetched).await;

        ticker.abort();
        self.elapsed.send_replace(result.duration);
        run_log.mark_complete();
        self.partial.send_replace(None);

        debug!(
            duration = result.duration,
            status = ?result.status,
            "Benchmark run settled"
        );
        RunOutcome {
            result,
            prefetch_calls: prefetch_log.finished_calls(),
        }
    }

    /// A run that died before the timed window opened. The result
    /// carries a zero-length window anchored at a single timestamp.
    fn failed_before_start(
        &self,
        options: &TransactionOptions,
        message: String,
        prefetch_calls: Vec<RpcCallRecord>,
    ) -> RunOutcome {
        let at = now_millis();
        RunOutcome {
            result: BenchmarkResult {
                start_time: at,
                end_time: at,
                duration: 0,
                status: RunStatus::Error,
                tx_hash: String::new(),
                error: Some(message),
                rpc_calls: Vec::new(),
                sync_mode: options.sync_mode,
            },
            prefetch_calls,
        }
    }

    fn spawn_ticker(&self) -> tokio::task::JoinHandle<()> {
        let elapsed = self.elapsed.clone();
        let tick = self.config.tick_interval();
        let started = Instant::now();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            loop {
                interval.tick().await;
                elapsed.send_replace(started.elapsed().as_millis() as u64);
            }
        })
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }
}

/// Run the asynchronous and synchronous variants side by side against
/// the same target. Each side gets its own orchestrator, key, and
/// channels; only the chain configuration is shared.
pub async fn compare(
    config: &BenchmarkConfig,
    async_options: TransactionOptions,
    sync_options: TransactionOptions,
) -> (RunOutcome, RunOutcome) {
    let async_side = TransactionBenchmark::new(config.clone());
    let sync_side = TransactionBenchmark::new(config.clone());
    tokio::join!(async_side.run(async_options), sync_side.run(sync_options))
}
