use bytes::Bytes;
use ethereum_types::{Address, Signature};
use keccak_hash::keccak;
use secp256k1::{Message, SECP256K1, SecretKey};

use crate::transaction::Eip1559Transaction;

/// In-process signing identity. Addresses are derived from the
/// uncompressed public key the usual way.
#[derive(Clone, Debug)]
pub struct LocalSigner {
    private_key: SecretKey,
    pub address: Address,
}

impl LocalSigner {
    pub fn new(private_key: SecretKey) -> Self {
        let address = Address::from(keccak(
            &private_key.public_key(SECP256K1).serialize_uncompressed()[1..],
        ));
        Self {
            private_key,
            address,
        }
    }

    /// One-time-use identity with a fresh random key. Generated per run
    /// so every run starts from a clean nonce space.
    pub fn random() -> Self {
        Self::new(SecretKey::new(&mut rand::rngs::OsRng))
    }

    pub fn sign(&self, data: Bytes) -> Signature {
        let hash = keccak(data);
        let msg = Message::from_digest(hash.0);
        let (recovery_id, signature) = SECP256K1
            .sign_ecdsa_recoverable(&msg, &self.private_key)
            .serialize_compact();

        Signature::from_slice(&[signature.as_slice(), &[recovery_id.to_i32() as u8]].concat())
    }

    /// Sign an assembled transaction, returning the raw payload ready
    /// for `eth_sendRawTransaction`.
    pub fn sign_transaction(&self, tx: &Eip1559Transaction) -> Vec<u8> {
        let signature = self.sign(tx.signing_payload().into());
        tx.encode_signed(&signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::EIP1559_TX_TYPE;
    use hex_literal::hex;
    use std::str::FromStr;

    #[test]
    fn derives_the_expected_address() {
        // The EIP-155 example key.
        let key =
            SecretKey::from_slice(&hex!(
                "4646464646464646464646464646464646464646464646464646464646464646"
            ))
            .unwrap();
        let signer = LocalSigner::new(key);
        assert_eq!(
            signer.address,
            Address::from_str("0x9d8a62f656a8d1615c1294fd71e9cfb3e4855a4f").unwrap()
        );
    }

    #[test]
    fn ephemeral_identities_never_repeat() {
        assert_ne!(LocalSigner::random().address, LocalSigner::random().address);
    }

    #[test]
    fn signed_transaction_is_typed_and_longer_than_the_payload() {
        let signer = LocalSigner::random();
        let tx = Eip1559Transaction {
            chain_id: 1,
            gas_limit: 21000,
            to: signer.address,
            ..Default::default()
        };
        let raw = signer.sign_transaction(&tx);
        assert_eq!(raw[0], EIP1559_TX_TYPE);
        assert!(raw.len() > tx.signing_payload().len());
    }
}
