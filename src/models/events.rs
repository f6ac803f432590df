use serde::Serialize;

use crate::models::result::ResultRow;

/// Messages emitted by the classification worker over its channel. One
/// channel, distinct variants, consumed by a single reader loop on the
/// interactive side; the worker never touches the result table directly.
#[derive(Debug, Clone, Serialize)]
pub enum WorkerEvent {
    /// Percent complete in [0,100] plus a status line.
    Progress { percent: u8, message: String },

    /// One batch's rows, emitted as a unit so the table grows once per
    /// batch rather than once per file.
    BatchResult {
        batch_index: usize,
        rows: Vec<ResultRow>,
    },

    /// Line for the user-facing output pane.
    Log(String),

    /// Error report. `fatal` marks the unreachable-endpoint class that
    /// aborts the run; everything else is per-batch and the run continues.
    Error { message: String, fatal: bool },

    /// Always the final message of a run, whether it completed, failed, or
    /// was cancelled.
    Done,
}
