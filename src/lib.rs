pub mod buffer;
pub mod checkpoint;
pub mod common;
pub mod engine;
pub mod log_mod;
pub mod operation;
pub mod recovery;
pub mod storage;
pub mod transaction;

pub use buffer::{BufferManager, DirtyPageTable};
pub use checkpoint::{Checkpoint, CheckpointManager};
pub use common::{AriesError, EngineConfig, PageID, Result, TransactionID, LSN};
pub use engine::{Engine, EngineSnapshot};
pub use log_mod::{LogManager, LogRecord, LogRecordType};
pub use operation::{Operation, Outcome};
pub use recovery::{RecoveryReport, RecoveryState};
pub use storage::{DurableImage, DurableStore};
pub use transaction::{TransactionStatus, TransactionTable};
