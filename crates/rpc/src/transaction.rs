use alloy_rlp::{Encodable, Header};
use bytes::Bytes;
use ethereum_types::{Address, Signature, U256};

pub const EIP1559_TX_TYPE: u8 = 0x02;

/// Caller-supplied transfer parameters. The optional fields are the
/// pre-fetch injection points: anything left `None` is resolved with its
/// own RPC lookup when the request is built.
#[derive(Debug, Clone, Default)]
pub struct TransferParams {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub nonce: Option<u64>,
    pub max_fee_per_gas: Option<u64>,
    pub max_priority_fee_per_gas: Option<u64>,
    pub gas: Option<u64>,
}

/// A fully assembled type-2 transaction, ready to sign. Access list is
/// always empty for the transfer shape this tool submits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Eip1559Transaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub max_priority_fee_per_gas: u64,
    pub max_fee_per_gas: u64,
    pub gas_limit: u64,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

impl Eip1559Transaction {
    fn encode_fields(&self, out: &mut Vec<u8>) {
        self.chain_id.encode(out);
        self.nonce.encode(out);
        self.max_priority_fee_per_gas.encode(out);
        self.max_fee_per_gas.encode(out);
        self.gas_limit.encode(out);
        self.to.as_bytes().encode(out);
        encode_u256(&self.value, out);
        self.data.as_ref().encode(out);
        Header {
            list: true,
            payload_length: 0,
        }
        .encode(out);
    }

    /// `0x02 || rlp([chain_id, nonce, max_priority_fee, max_fee, gas,
    /// to, value, data, access_list])` — the payload whose keccak is
    /// signed.
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut fields = Vec::new();
        self.encode_fields(&mut fields);
        wrap_typed(&fields)
    }

    /// The raw signed transaction: the signing fields followed by
    /// `y_parity, r, s`.
    pub fn encode_signed(&self, signature: &Signature) -> Vec<u8> {
        let mut fields = Vec::new();
        self.encode_fields(&mut fields);

        let sig = signature.as_bytes();
        (sig[64] == 1).encode(&mut fields);
        trim_leading_zeros(&sig[0..32]).encode(&mut fields);
        trim_leading_zeros(&sig[32..64]).encode(&mut fields);

        wrap_typed(&fields)
    }
}

fn wrap_typed(fields: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(fields.len() + 4);
    out.push(EIP1559_TX_TYPE);
    Header {
        list: true,
        payload_length: fields.len(),
    }
    .encode(&mut out);
    out.extend_from_slice(fields);
    out
}

fn encode_u256(value: &U256, out: &mut Vec<u8>) {
    let buf = value.to_big_endian();
    trim_leading_zeros(&buf).encode(out);
}

fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let first = bytes
        .iter()
        .position(|byte| *byte != 0)
        .unwrap_or(bytes.len());
    &bytes[first..]
}
