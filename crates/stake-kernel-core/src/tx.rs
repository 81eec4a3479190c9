//! Transaction and block shapes consumed by the kernel.
//!
//! Only the fields the kernel reads are modelled. Identifiers are computed
//! by whichever layer owns serialization and are carried here as data.

use serde::{Deserialize, Serialize};

use crate::types::{Amount, BlockHash, OutPoint, Timestamp, TxId};

/// A transaction input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxIn {
    pub prevout: OutPoint,
    /// Unlocking script.
    pub script_sig: Vec<u8>,
}

/// A transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    pub value: Amount,
    /// Locking script.
    pub script_pubkey: Vec<u8>,
}

impl TxOut {
    /// An empty output (zero value, empty script), used as the coinstake marker.
    pub fn empty() -> Self {
        Self {
            value: 0,
            script_pubkey: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value == 0 && self.script_pubkey.is_empty()
    }
}

/// A transaction together with its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub txid: TxId,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
}

impl Transaction {
    /// A coinbase has exactly one input spending the null outpoint.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].prevout.is_null()
    }

    /// A coinstake spends a real output and marks itself with an empty first output.
    pub fn is_coinstake(&self) -> bool {
        !self.inputs.is_empty()
            && !self.inputs[0].prevout.is_null()
            && self.outputs.len() >= 2
            && self.outputs[0].is_empty()
    }

    /// Look up an output by index.
    pub fn output(&self, index: u32) -> Option<&TxOut> {
        self.outputs.get(index as usize)
    }
}

/// The header fields the kernel needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub hash: BlockHash,
    pub prev_hash: BlockHash,
    pub time: Timestamp,
    /// Compact difficulty target.
    pub bits: u32,
}

/// A block as handed to proof-of-stake validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// The coinstake slot: a stake block carries its coinstake at index 1.
    pub fn coinstake(&self) -> Option<&Transaction> {
        self.transactions.get(1)
    }

    pub fn is_proof_of_stake(&self) -> bool {
        self.coinstake().map_or(false, Transaction::is_coinstake)
    }
}

/// The coin being tested for stake eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeCandidate {
    pub value: Amount,
    pub prevout: OutPoint,
    /// Hash of the block that created the output.
    pub block_from: BlockHash,
    /// Timestamp of the block that created the output.
    pub block_from_time: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(prevout: OutPoint) -> TxIn {
        TxIn {
            prevout,
            script_sig: vec![0x01],
        }
    }

    fn output(value: Amount) -> TxOut {
        TxOut {
            value,
            script_pubkey: vec![0x51],
        }
    }

    #[test]
    fn test_coinstake_shape() {
        let tx = Transaction {
            txid: TxId::from_bytes([2; 32]),
            inputs: vec![input(OutPoint::new(TxId::from_bytes([1; 32]), 0))],
            outputs: vec![TxOut::empty(), output(50)],
        };
        assert!(tx.is_coinstake());
        assert!(!tx.is_coinbase());
    }

    #[test]
    fn test_coinbase_is_not_coinstake() {
        let tx = Transaction {
            txid: TxId::from_bytes([3; 32]),
            inputs: vec![input(OutPoint::NULL)],
            outputs: vec![TxOut::empty(), output(50)],
        };
        assert!(tx.is_coinbase());
        assert!(!tx.is_coinstake());
    }

    #[test]
    fn test_coinstake_requires_empty_marker() {
        let tx = Transaction {
            txid: TxId::from_bytes([4; 32]),
            inputs: vec![input(OutPoint::new(TxId::from_bytes([1; 32]), 0))],
            outputs: vec![output(1), output(50)],
        };
        assert!(!tx.is_coinstake());
    }
}
