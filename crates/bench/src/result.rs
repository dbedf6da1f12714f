use serde::{Deserialize, Serialize};

use txmeter_rpc::RpcCallRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

/// Terminal outcome of one run. Constructed exactly once, when the run
/// concludes; immutable afterwards.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkResult {
    pub start_time: u64,
    pub end_time: u64,
    /// Wall clock `end_time - start_time`, measured by the runner. Never
    /// a sum of call durations; those overlap and include client-side
    /// work off the network path.
    pub duration: u64,
    pub status: RunStatus,
    /// Empty on failure.
    pub tx_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Completion-ordered records of every timed call the run issued.
    pub rpc_calls: Vec<RpcCallRecord>,
    pub sync_mode: bool,
}

/// Live snapshot published while a run is in progress. Replaced
/// wholesale on every update and discarded when the run terminates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialResult {
    pub start_time: u64,
    pub rpc_calls: Vec<RpcCallRecord>,
    pub is_complete: bool,
    pub sync_mode: bool,
}
