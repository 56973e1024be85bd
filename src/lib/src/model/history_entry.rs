/// A successfully synced index commit, appended to `update_history`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub commit_id: String,
    pub timestamp: String,
}
