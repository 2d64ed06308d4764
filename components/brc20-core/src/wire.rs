//! Types exchanged with the external block source. The source is an out-of-process
//! collaborator that has already resolved inscription discovery and ordinal-theory location
//! tracking; this crate only consumes the events below.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub block_height: u64,
    pub tx_id: String,
    pub address: Option<String>,
    pub offset: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InscriptionEvent {
    Genesis {
        inscription_id: String,
        number: i64,
        genesis_id: String,
        payload: Vec<u8>,
        mime: String,
        location: Location,
    },
    Transfer {
        inscription_id: String,
        location: Location,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockApply {
    pub height: u64,
    pub hash: String,
    pub prev_hash: String,
    pub inscriptions: Vec<InscriptionEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRollback {
    pub height: u64,
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockEvent {
    Apply(BlockApply),
    Rollback(BlockRollback),
}

impl BlockEvent {
    pub fn height(&self) -> u64 {
        match self {
            BlockEvent::Apply(b) => b.height,
            BlockEvent::Rollback(b) => b.height,
        }
    }
}
