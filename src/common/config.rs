#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Flush every buffered page a transaction updated before its End record.
    pub force_pages_on_end: bool,
    /// Commit transactions that reached End since the previous checkpoint.
    pub fold_ended_on_checkpoint: bool,
    /// Scan persisted records after the checkpoint during analysis.
    pub analyze_log_tail: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            force_pages_on_end: true,
            fold_ended_on_checkpoint: true,
            analyze_log_tail: false,
        }
    }
}
