use serde::{Deserialize, Serialize};

use super::DurableStore;
use crate::checkpoint::Checkpoint;
use crate::common::{AriesError, Result};
use crate::log_mod::LogRecord;

/// Everything that survives a crash: the forced log prefix, the latest
/// checkpoint and the durable store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurableImage {
    pub log: Vec<LogRecord>,
    pub checkpoint: Option<Checkpoint>,
    pub disk: DurableStore,
}

impl DurableImage {
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(AriesError::Serialization)
    }

    pub fn deserialize(data: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(data)?)
    }
}
