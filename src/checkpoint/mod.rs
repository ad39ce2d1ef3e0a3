mod checkpoint_manager;

pub use checkpoint_manager::{Checkpoint, CheckpointManager};
