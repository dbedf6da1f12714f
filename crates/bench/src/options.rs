use serde::{Deserialize, Serialize};

use crate::prefetch::Prefetched;

/// Per-run configuration. Frozen once a run starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOptions {
    pub prefetch_nonce: bool,
    pub prefetch_gas_params: bool,
    pub prefetch_chain_id: bool,
    pub sync_mode: bool,
}

/// The call sequence a run will execute, resolved once from the options
/// instead of branching on booleans throughout the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPlan {
    /// Assemble, sign, submit through the single blocking send call.
    Sync,
    /// Everything resolved up front: sign a manually assembled request,
    /// fire the raw send, poll for the receipt.
    AsyncPrefetched,
    /// Standard assemble-sign-send, then poll for the receipt.
    AsyncStandard,
}

impl SubmissionPlan {
    pub fn select(options: &TransactionOptions, prefetched: &Prefetched) -> Self {
        if options.sync_mode {
            return SubmissionPlan::Sync;
        }
        let fully_prefetched =
            options.prefetch_nonce && options.prefetch_gas_params && options.prefetch_chain_id;
        if fully_prefetched
            && prefetched.nonce.is_some()
            && prefetched.gas.is_some()
            && prefetched.chain_id.is_some()
        {
            SubmissionPlan::AsyncPrefetched
        } else {
            SubmissionPlan::AsyncStandard
        }
    }
}
