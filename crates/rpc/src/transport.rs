use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;
use url::Url;

use crate::errors::EthClientError;
use crate::utils::{RpcRequest, RpcResponse, RpcSuccessResponse, now_millis};

/// One entry per outbound remote call. Created when the call is
/// dispatched, finalized exactly once when it resolves or rejects.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RpcCallRecord {
    pub method: String,
    pub start_time: u64,
    pub end_time: u64,
    pub duration: u64,
    /// Set while the call is in flight (for live display), absent once
    /// the call has resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_pending: Option<bool>,
}

/// Per-run subscriber for transport events. The transport emits
/// `on_call_started` immediately before dispatch and `on_call_finished`
/// once per call, in completion order.
pub trait RpcObserver: Send + Sync {
    fn on_call_started(&self, _method: &str, _start_time: u64) {}
    fn on_call_finished(&self, record: RpcCallRecord);
}

/// HTTP JSON-RPC transport that times every call that crosses it.
///
/// The transport holds no per-call state: only the endpoint, the
/// observer, and an optional cached chain id supplied at construction.
/// When a cached chain id is present, `eth_chainId` is answered locally
/// without dispatching and without emitting any timing record. No other
/// method is eligible for bypass.
#[derive(Clone)]
pub struct InstrumentedTransport {
    client: reqwest::Client,
    url: Url,
    observer: Option<Arc<dyn RpcObserver>>,
    cached_chain_id: Option<u64>,
}

impl InstrumentedTransport {
    pub fn new(url: &str) -> Result<Self, EthClientError> {
        let url = Url::parse(url)
            .map_err(|_| EthClientError::ParseUrlError("Failed to parse url".to_string()))?;
        Ok(Self {
            client: reqwest::Client::new(),
            url,
            observer: None,
            cached_chain_id: None,
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn RpcObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_cached_chain_id(mut self, chain_id: u64) -> Self {
        self.cached_chain_id = Some(chain_id);
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Dispatch a single request, timing it and notifying the observer.
    /// Failures are re-raised unchanged; the wrapper only observes.
    pub async fn request(&self, request: &RpcRequest) -> Result<RpcResponse, EthClientError> {
        if request.method == "eth_chainId" {
            if let Some(chain_id) = self.cached_chain_id {
                trace!(chain_id, "Answering eth_chainId from cache, no RPC call");
                return Ok(RpcResponse::Success(RpcSuccessResponse {
                    id: request.id.clone(),
                    jsonrpc: "2.0".to_string(),
                    result: Value::String(format!("{chain_id:#x}")),
                }));
            }
        }

        let body = serde_json::to_string(request).map_err(|error| {
            EthClientError::FailedToSerializeRequestBody(format!("{error}: {request:?}"))
        })?;

        let start_time = now_millis();
        if let Some(observer) = &self.observer {
            observer.on_call_started(&request.method, start_time);
        }

        let response = self.dispatch(body).await;

        let end_time = now_millis();
        if let Some(observer) = &self.observer {
            observer.on_call_finished(RpcCallRecord {
                method: request.method.clone(),
                start_time,
                end_time,
                duration: end_time.saturating_sub(start_time),
                is_pending: None,
            });
        }

        response
    }

    async fn dispatch(&self, body: String) -> Result<RpcResponse, EthClientError> {
        self.client
            .post(self.url.as_str())
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .inspect(|_| trace!(endpoint = %self.url, "Request finished successfully"))?
            .json::<RpcResponse>()
            .await
            .inspect_err(|err| trace!(endpoint = %self.url, %err, "Failed to deserialize response"))
            .map_err(EthClientError::from)
    }
}
