use ethereum_types::Address;
use serde::Serialize;
use tracing::debug;

use txmeter_rpc::{BlockIdentifier, BlockTag, EthClient, EthClientError, TransferParams};

use crate::options::TransactionOptions;

/// Gas parameters resolved before the timed window begins.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GasBundle {
    pub max_fee_per_gas: u64,
    pub max_priority_fee_per_gas: u64,
    pub gas: u64,
}

/// Everything the pre-fetch phase produced for one run.
#[derive(Debug, Clone, Copy, Default)]
pub struct Prefetched {
    pub nonce: Option<u64>,
    pub gas: Option<GasBundle>,
    pub chain_id: Option<u64>,
}

/// Fetch the gas triple concurrently. All three lookups must resolve
/// before the bundle is constructed; their completion order is
/// unspecified.
pub async fn prefetch_gas_bundle(
    client: &EthClient,
    from: Address,
    params: &TransferParams,
) -> Result<GasBundle, EthClientError> {
    let (block, priority_fee, gas) = tokio::try_join!(
        client.get_block_by_number(BlockIdentifier::Tag(BlockTag::Latest)),
        client.get_max_priority_fee(),
        client.estimate_gas(from, params),
    )?;

    let base_fee = block.base_fee_per_gas.map(|fee| fee.as_u64());
    let max_fee_per_gas = base_fee.map_or(priority_fee, |fee| fee.saturating_add(priority_fee));

    Ok(GasBundle {
        max_fee_per_gas,
        max_priority_fee_per_gas: priority_fee,
        gas,
    })
}

/// Resolve whatever the options ask for, outside the timed window.
pub async fn run_prefetch(
    client: &EthClient,
    from: Address,
    params: &TransferParams,
    options: &TransactionOptions,
) -> Result<Prefetched, EthClientError> {
    let mut prefetched = Prefetched::default();

    if options.prefetch_chain_id {
        prefetched.chain_id = Some(client.get_chain_id().await?);
    }
    if options.prefetch_nonce {
        prefetched.nonce = Some(client.get_nonce(from).await?);
    }
    if options.prefetch_gas_params {
        prefetched.gas = Some(prefetch_gas_bundle(client, from, params).await?);
    }

    debug!(?prefetched, "Pre-fetch phase finished");
    Ok(prefetched)
}
