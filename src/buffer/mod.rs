mod buffer_manager;
mod dirty_page_table;

pub use buffer_manager::{BufferManager, BufferPage};
pub use dirty_page_table::{DirtyPageEntry, DirtyPageTable};
