use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Once};

use axum::{Json, Router, extract::State, routing::post};
use serde_json::{Value, json};
use url::Url;

use txmeter_bench::{BenchmarkConfig, ChainConfig, NativeCurrency};

pub const TX_HASH: &str = "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b";
pub const CHAIN_ID: u64 = 0x2b74;

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

#[derive(Default)]
pub struct Stub {
    pub calls: Mutex<Vec<String>>,
    pub responses: HashMap<String, Value>,
    pub errors: HashMap<String, String>,
    /// Number of receipt lookups that answer `null` before the receipt
    /// shows up.
    pub receipt_delay: AtomicU64,
}

impl Stub {
    pub fn with_standard_responses() -> Self {
        Self {
            responses: standard_responses(),
            ..Default::default()
        }
    }

    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

pub fn standard_responses() -> HashMap<String, Value> {
    let receipt = json!({
        "transactionHash": TX_HASH,
        "blockNumber": "0x11",
        "status": "0x1",
        "gasUsed": "0x5208",
    });
    HashMap::from([
        ("eth_chainId".to_string(), json!("0x2b74")),
        ("eth_getTransactionCount".to_string(), json!("0x7")),
        (
            "eth_getBlockByNumber".to_string(),
            json!({ "number": "0x10", "baseFeePerGas": "0x3b9aca00" }),
        ),
        ("eth_maxPriorityFeePerGas".to_string(), json!("0x59682f00")),
        ("eth_estimateGas".to_string(), json!("0x5208")),
        ("eth_sendRawTransaction".to_string(), json!(TX_HASH)),
        ("eth_sendRawTransactionSync".to_string(), receipt.clone()),
        ("eth_getTransactionReceipt".to_string(), receipt),
    ])
}

async fn rpc_handler(State(stub): State<Arc<Stub>>, Json(request): Json<Value>) -> Json<Value> {
    let method = request["method"].as_str().unwrap_or_default().to_string();
    stub.calls.lock().unwrap().push(method.clone());
    let id = request["id"].clone();

    if let Some(message) = stub.errors.get(&method) {
        return Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": -32000, "message": message },
        }));
    }

    if method == "eth_getTransactionReceipt" {
        let remaining = stub.receipt_delay.load(Ordering::SeqCst);
        if remaining > 0 {
            stub.receipt_delay.store(remaining - 1, Ordering::SeqCst);
            return Json(json!({ "jsonrpc": "2.0", "id": id, "result": Value::Null }));
        }
    }

    let result = stub.responses.get(&method).cloned().unwrap_or(Value::Null);
    Json(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
}

pub async fn serve(stub: Arc<Stub>) -> String {
    let app = Router::new().route("/", post(rpc_handler)).with_state(stub);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/")
}

pub fn config_for(url: &str) -> BenchmarkConfig {
    let mut config = BenchmarkConfig::new(ChainConfig {
        name: "testnet".to_string(),
        rpc_url: Url::parse(url).unwrap(),
        chain_id: CHAIN_ID,
        native_currency: NativeCurrency::default(),
    });
    config.receipt_poll_interval_ms = 5;
    config
}
