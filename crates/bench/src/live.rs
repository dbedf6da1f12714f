use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use txmeter_rpc::{RpcCallRecord, RpcObserver};

use crate::result::PartialResult;

#[derive(Default)]
struct LogState {
    pending: Vec<RpcCallRecord>,
    finished: Vec<RpcCallRecord>,
}

/// Per-run call log. Receives transport events, keeps finished records
/// in completion order, and republishes a fresh [`PartialResult`]
/// snapshot on every event. Owned exclusively by one run.
pub struct CallLog {
    start_time: u64,
    sync_mode: bool,
    state: Mutex<LogState>,
    publisher: Option<Arc<watch::Sender<Option<PartialResult>>>>,
}

impl CallLog {
    pub fn new(start_time: u64, sync_mode: bool) -> Self {
        Self {
            start_time,
            sync_mode,
            state: Mutex::new(LogState::default()),
            publisher: None,
        }
    }

    pub fn with_publisher(
        start_time: u64,
        sync_mode: bool,
        publisher: Arc<watch::Sender<Option<PartialResult>>>,
    ) -> Self {
        Self {
            publisher: Some(publisher),
            ..Self::new(start_time, sync_mode)
        }
    }

    /// Finalized records only, in completion order.
    pub fn finished_calls(&self) -> Vec<RpcCallRecord> {
        self.state
            .lock()
            .map(|state| state.finished.clone())
            .unwrap_or_default()
    }

    /// A fresh snapshot: finished records first, then whatever is still
    /// in flight.
    pub fn snapshot(&self, is_complete: bool) -> PartialResult {
        let rpc_calls = self
            .state
            .lock()
            .map(|state| {
                let mut calls = state.finished.clone();
                calls.extend(state.pending.iter().cloned());
                calls
            })
            .unwrap_or_default();
        PartialResult {
            start_time: self.start_time,
            rpc_calls,
            is_complete,
            sync_mode: self.sync_mode,
        }
    }

    pub fn mark_complete(&self) {
        if let Some(publisher) = &self.publisher {
            publisher.send_replace(Some(self.snapshot(true)));
        }
    }

    fn publish(&self) {
        if let Some(publisher) = &self.publisher {
            publisher.send_replace(Some(self.snapshot(false)));
        }
    }
}

impl RpcObserver for CallLog {
    fn on_call_started(&self, method: &str, start_time: u64) {
        if let Ok(mut state) = self.state.lock() {
            state.pending.push(RpcCallRecord {
                method: method.to_string(),
                start_time,
                end_time: start_time,
                duration: 0,
                is_pending: Some(true),
            });
        }
        self.publish();
    }

    fn on_call_finished(&self, record: RpcCallRecord) {
        if let Ok(mut state) = self.state.lock() {
            if let Some(position) = state
                .pending
                .iter()
                .position(|call| call.method == record.method && call.start_time == record.start_time)
            {
                state.pending.remove(position);
            }
            state.finished.push(record);
        }
        self.publish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(method: &str, start_time: u64, end_time: u64) -> RpcCallRecord {
        RpcCallRecord {
            method: method.to_string(),
            start_time,
            end_time,
            duration: end_time - start_time,
            is_pending: None,
        }
    }

    #[test]
    fn pending_calls_show_up_in_snapshots_then_resolve() {
        let log = CallLog::new(0, false);
        log.on_call_started("eth_estimateGas", 10);

        let snapshot = log.snapshot(false);
        assert_eq!(snapshot.rpc_calls.len(), 1);
        assert_eq!(snapshot.rpc_calls[0].is_pending, Some(true));
        assert!(log.finished_calls().is_empty());

        log.on_call_finished(record("eth_estimateGas", 10, 25));
        let snapshot = log.snapshot(false);
        assert_eq!(snapshot.rpc_calls.len(), 1);
        assert_eq!(snapshot.rpc_calls[0].is_pending, None);
        assert_eq!(log.finished_calls().len(), 1);
    }

    #[test]
    fn concurrent_calls_land_in_completion_order() {
        let log = CallLog::new(0, false);
        log.on_call_started("eth_getBlockByNumber", 10);
        log.on_call_started("eth_maxPriorityFeePerGas", 10);

        // The second-dispatched call resolves first.
        log.on_call_finished(record("eth_maxPriorityFeePerGas", 10, 20));
        log.on_call_finished(record("eth_getBlockByNumber", 10, 30));

        let methods: Vec<_> = log
            .finished_calls()
            .iter()
            .map(|call| call.method.clone())
            .collect();
        assert_eq!(methods, vec!["eth_maxPriorityFeePerGas", "eth_getBlockByNumber"]);
    }

    #[test]
    fn publisher_receives_fresh_snapshots() {
        let (sender, receiver) = watch::channel(None);
        let log = CallLog::with_publisher(5, true, Arc::new(sender));

        log.on_call_started("eth_sendRawTransactionSync", 6);
        let published = receiver.borrow().clone().unwrap();
        assert_eq!(published.start_time, 5);
        assert!(published.sync_mode);
        assert!(!published.is_complete);

        log.mark_complete();
        assert!(receiver.borrow().clone().unwrap().is_complete);
    }
}
