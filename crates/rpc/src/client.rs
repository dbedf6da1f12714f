use std::time::Duration;

use ethereum_types::{Address, H256};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::debug;

use crate::errors::{EthClientError, RpcRequestError};
use crate::transaction::{Eip1559Transaction, TransferParams};
use crate::transport::InstrumentedTransport;
use crate::types::{BlockIdentifier, BlockTag, RpcBlock, RpcReceipt};
use crate::utils::{RpcRequest, RpcResponse};

/// Typed client over one instrumented transport. Every method issues a
/// single JSON-RPC call; timing happens in the transport, not here.
#[derive(Clone)]
pub struct EthClient {
    transport: InstrumentedTransport,
}

impl EthClient {
    pub fn new(url: &str) -> Result<EthClient, EthClientError> {
        Ok(Self {
            transport: InstrumentedTransport::new(url)?,
        })
    }

    pub fn with_transport(transport: InstrumentedTransport) -> EthClient {
        Self { transport }
    }

    pub async fn send_request(&self, request: RpcRequest) -> Result<RpcResponse, EthClientError> {
        self.transport.request(&request).await
    }

    /// Send a request and deserialize the successful result, converting
    /// RPC-level errors into method-tagged ones.
    pub async fn send_request_parsed<T: DeserializeOwned>(
        &self,
        request: RpcRequest,
    ) -> Result<T, EthClientError> {
        let method = request.method.clone();
        match self.send_request(request).await? {
            RpcResponse::Success(result) => serde_json::from_value(result.result)
                .map_err(|source| RpcRequestError::SerdeJSONError { method, source }.into()),
            RpcResponse::Error(error_response) => Err(RpcRequestError::RPCError {
                method,
                message: error_response.error.message,
                data: error_response.error.data,
            }
            .into()),
        }
    }

    /// Send a request whose result is a quantity encoded as a hex string.
    async fn send_request_hex_u64(&self, request: RpcRequest) -> Result<u64, EthClientError> {
        let method = request.method.clone();
        let hex_string: String = self.send_request_parsed(request).await?;
        let trimmed = hex_string.strip_prefix("0x").unwrap_or(&hex_string);
        u64::from_str_radix(trimmed, 16)
            .map_err(|source| RpcRequestError::ParseIntError { method, source }.into())
    }

    pub async fn get_chain_id(&self) -> Result<u64, EthClientError> {
        self.send_request_hex_u64(RpcRequest::new("eth_chainId", None))
            .await
    }

    pub async fn get_nonce(&self, address: Address) -> Result<u64, EthClientError> {
        let params = Some(vec![json!(format!("{address:#x}")), json!("latest")]);
        self.send_request_hex_u64(RpcRequest::new("eth_getTransactionCount", params))
            .await
    }

    pub async fn get_block_by_number(
        &self,
        block: BlockIdentifier,
    ) -> Result<RpcBlock, EthClientError> {
        let params = Some(vec![block.into(), json!(false)]);
        self.send_request_parsed(RpcRequest::new("eth_getBlockByNumber", params))
            .await
    }

    pub async fn get_max_priority_fee(&self) -> Result<u64, EthClientError> {
        self.send_request_hex_u64(RpcRequest::new("eth_maxPriorityFeePerGas", None))
            .await
    }

    pub async fn estimate_gas(
        &self,
        from: Address,
        params: &TransferParams,
    ) -> Result<u64, EthClientError> {
        let mut data = json!({
            "from": format!("{from:#x}"),
            "to": format!("{:#x}", params.to),
            "value": format!("{:#x}", params.value),
        });
        if let Value::Object(ref mut map) = data {
            if !params.data.is_empty() {
                map.insert(
                    "input".to_owned(),
                    json!(format!("0x{}", hex::encode(&params.data))),
                );
            }
            // Add the nonce just if present, otherwise the RPC will use the latest nonce
            if let Some(nonce) = params.nonce {
                map.insert("nonce".to_owned(), json!(format!("{nonce:#x}")));
            }
        }
        self.send_request_hex_u64(RpcRequest::new(
            "eth_estimateGas",
            Some(vec![data, json!("latest")]),
        ))
        .await
    }

    pub async fn send_raw_transaction(&self, data: &[u8]) -> Result<H256, EthClientError> {
        let params = Some(vec![json!("0x".to_string() + &hex::encode(data))]);
        self.send_request_parsed(RpcRequest::new("eth_sendRawTransaction", params))
            .await
    }

    /// Single blocking submission: the node answers only once the
    /// transaction is included, with its receipt.
    pub async fn send_raw_transaction_sync(
        &self,
        data: &[u8],
    ) -> Result<RpcReceipt, EthClientError> {
        let params = Some(vec![json!("0x".to_string() + &hex::encode(data))]);
        self.send_request_parsed(RpcRequest::new("eth_sendRawTransactionSync", params))
            .await
    }

    pub async fn get_transaction_receipt(
        &self,
        tx_hash: H256,
    ) -> Result<Option<RpcReceipt>, EthClientError> {
        let params = Some(vec![json!(format!("{tx_hash:#x}"))]);
        self.send_request_parsed(RpcRequest::new("eth_getTransactionReceipt", params))
            .await
    }

    pub async fn wait_for_transaction_receipt(
        &self,
        tx_hash: H256,
        max_retries: u64,
        poll_interval: Duration,
    ) -> Result<RpcReceipt, EthClientError> {
        let mut receipt = self.get_transaction_receipt(tx_hash).await?;
        let mut r#try = 1;
        while receipt.is_none() {
            debug!(%tx_hash, r#try, max_retries, "Retrying to get transaction receipt");

            if max_retries == r#try {
                return Err(EthClientError::Custom(format!(
                    "Transaction receipt for {tx_hash:#x} not found after {max_retries} retries"
                )));
            }
            r#try += 1;

            tokio::time::sleep(poll_interval).await;

            receipt = self.get_transaction_receipt(tx_hash).await?;
        }
        receipt.ok_or(EthClientError::Custom(
            "Transaction receipt is None".to_owned(),
        ))
    }

    /// Assemble a transfer, filling every field the caller didn't supply
    /// with its own RPC lookup. Each implicit resolution is a separately
    /// timed call on the transport.
    pub async fn build_transfer(
        &self,
        from: Address,
        params: &TransferParams,
    ) -> Result<Eip1559Transaction, EthClientError> {
        let nonce = match params.nonce {
            Some(nonce) => nonce,
            None => self.get_nonce(from).await?,
        };

        let (max_fee_per_gas, max_priority_fee_per_gas) =
            match (params.max_fee_per_gas, params.max_priority_fee_per_gas) {
                (Some(max_fee), Some(priority_fee)) => (max_fee, priority_fee),
                _ => {
                    let block = self
                        .get_block_by_number(BlockIdentifier::Tag(BlockTag::Latest))
                        .await?;
                    let priority_fee = self.get_max_priority_fee().await?;
                    let base_fee = block.base_fee_per_gas.map(|fee| fee.as_u64());
                    let derived_max_fee =
                        base_fee.map_or(priority_fee, |fee| fee.saturating_add(priority_fee));
                    (
                        params.max_fee_per_gas.unwrap_or(derived_max_fee),
                        params.max_priority_fee_per_gas.unwrap_or(priority_fee),
                    )
                }
            };

        let gas_limit = match params.gas {
            Some(gas) => gas,
            None => self.estimate_gas(from, params).await?,
        };

        let chain_id = self.get_chain_id().await?;

        Ok(Eip1559Transaction {
            chain_id,
            nonce,
            max_priority_fee_per_gas,
            max_fee_per_gas,
            gas_limit,
            to: params.to,
            value: params.value,
            data: params.data.clone(),
        })
    }
}
