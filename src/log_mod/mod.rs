mod log_manager;
mod log_record;

pub use log_manager::LogManager;
pub use log_record::{LogRecord, LogRecordType, NewLogRecord};
