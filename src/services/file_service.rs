use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::models::result::ResultRow;
use crate::services::expand_service::expand_entry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    Move,
    Copy,
}

impl TransferMode {
    fn done_label(self) -> &'static str {
        match self {
            Self::Move => "Moved",
            Self::Copy => "Copied",
        }
    }

    fn doing_label(self) -> &'static str {
        match self {
            Self::Move => "moving",
            Self::Copy => "copying",
        }
    }
}

/// Concrete transfers derived from the selected rows, with sequence
/// placeholders expanded. `missing` holds row sources that resolved to no
/// files at all.
#[derive(Debug, Clone, Default)]
pub struct TransferPlan {
    pub pairs: Vec<(String, String)>,
    pub missing: Vec<String>,
}

/// Aggregate result of executing a plan. Partial success is expected;
/// nothing is rolled back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    pub completed: usize,
    pub failed: usize,
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// Build the concrete (source, destination) pairs for the selected rows.
/// Each expanded file keeps its own basename under the directory of the
/// row's destination, so a sequence lands as siblings in one folder rather
/// than a single literal `####` file.
pub fn plan_transfers(rows: &[ResultRow], selection: &[String]) -> TransferPlan {
    let mut plan = TransferPlan::default();
    for row in rows.iter().filter(|row| row.selected) {
        let files = expand_entry(&row.source, selection);
        if files.is_empty() {
            plan.missing.push(row.source.clone());
            continue;
        }
        let dst_dir = Path::new(&row.destination)
            .parent()
            .unwrap_or_else(|| Path::new(""));
        for file in files {
            let Some(name) = Path::new(&file).file_name() else {
                continue;
            };
            let target = dst_dir.join(name).to_string_lossy().replace('\\', "/");
            plan.pairs.push((file, target));
        }
    }
    plan
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

fn move_file(src: &Path, dst: &Path) -> std::io::Result<()> {
    if fs::rename(src, dst).is_ok() {
        return Ok(());
    }
    // Rename cannot cross filesystems; fall back to copy plus remove.
    fs::copy(src, dst)?;
    fs::remove_file(src)
}

/// Execute the planned pairs one file at a time. Failures are tallied and
/// reported on the log callback; the remaining files still run. Progress is
/// `(processed, total)` before each file and once more at the end.
pub fn transfer_files(
    pairs: &[(String, String)],
    mode: TransferMode,
    mut on_progress: impl FnMut(usize, usize),
    mut on_log: impl FnMut(String),
) -> TransferOutcome {
    let total = pairs.len();
    let mut outcome = TransferOutcome::default();

    for (index, (src, dst)) in pairs.iter().enumerate() {
        on_progress(index, total);
        let src_path = Path::new(src);
        let dst_path = Path::new(dst);
        let name = src_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| src.clone());

        let result = dst_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(fs::create_dir_all)
            .unwrap_or(Ok(()))
            .and_then(|_| match mode {
                TransferMode::Move => move_file(src_path, dst_path),
                TransferMode::Copy => fs::copy(src_path, dst_path).map(|_| ()),
            });

        match result {
            Ok(()) => {
                outcome.completed += 1;
                on_log(format!("{}: {name} -> {dst}", mode.done_label()));
            }
            Err(err) => {
                outcome.failed += 1;
                on_log(format!("Error {} {name}: {err}", mode.doing_label()));
            }
        }
    }
    on_progress(total, total);
    outcome
}
