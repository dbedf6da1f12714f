use ethereum_types::{H256, U64};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Clone, Copy)]
pub enum BlockTag {
    Earliest,
    Latest,
    Pending,
}

#[derive(Debug, Clone, Copy)]
pub enum BlockIdentifier {
    Number(u64),
    Tag(BlockTag),
}

impl From<BlockIdentifier> for Value {
    fn from(value: BlockIdentifier) -> Self {
        match value {
            BlockIdentifier::Number(number) => json!(format!("{number:#x}")),
            BlockIdentifier::Tag(BlockTag::Earliest) => json!("earliest"),
            BlockIdentifier::Tag(BlockTag::Latest) => json!("latest"),
            BlockIdentifier::Tag(BlockTag::Pending) => json!("pending"),
        }
    }
}

/// The slice of a block this tool reads: enough for fee derivation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcBlock {
    pub number: U64,
    #[serde(default)]
    pub base_fee_per_gas: Option<U64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    pub transaction_hash: H256,
    pub block_number: U64,
    pub status: U64,
    pub gas_used: U64,
}

impl RpcReceipt {
    pub fn succeeded(&self) -> bool {
        self.status == U64::one()
    }
}
