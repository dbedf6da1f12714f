/// A single error type for all RPC request failures, tagged with the
/// method that produced them.
#[derive(Debug, thiserror::Error)]
pub enum RpcRequestError {
    #[error("{method}: {source}")]
    SerdeJSONError {
        method: String,
        source: serde_json::Error,
    },
    #[error("{method}: {message}")]
    RPCError {
        method: String,
        message: String,
        data: Option<String>,
    },
    #[error("{method}: {source}")]
    ParseIntError {
        method: String,
        source: std::num::ParseIntError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum EthClientError {
    #[error("reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("RPC request error: {0}")]
    RpcRequestError(#[from] RpcRequestError),
    #[error("Failed to serialize request body: {0}")]
    FailedToSerializeRequestBody(String),
    #[error("Parse Url Error. {0}")]
    ParseUrlError(String),
    #[error("Error: {0}")]
    Custom(String),
}
