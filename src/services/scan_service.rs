use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::AppError;
use crate::models::records::{SaveMode, ScanRecord};

/// Marker substituted for the frame number in a sequence placeholder.
pub const SEQUENCE_MARKER: &str = "####";

/// Frame-numbered filename: `<prefix><optional [._-]><3-4 digits><.ext>`.
static SELECTION_SEQUENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)([._-])?(\d{3,4})(\.[^.]+)$").unwrap());

/// Looser variant for the bulk scanner: any digit run before the extension
/// counts as a frame number.
static BULK_SEQUENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)(\d+)(\.[^.]*)$").unwrap());

/// Sequence key for a frame-numbered filename (`shot_0010.exr` →
/// `shot_####.exr`), or `None` when the name does not look like a frame.
pub fn sequence_key(file_name: &str) -> Option<String> {
    let caps = SELECTION_SEQUENCE.captures(file_name)?;
    let prefix = caps.get(1).map_or("", |m| m.as_str());
    let sep = caps.get(2).map_or("", |m| m.as_str());
    let ext = caps.get(4).map_or("", |m| m.as_str());
    Some(format!("{prefix}{sep}{SEQUENCE_MARKER}{ext}"))
}

fn bulk_sequence_key(file_name: &str) -> Option<String> {
    let caps = BULK_SEQUENCE.captures(file_name)?;
    let prefix = caps.get(1).map_or("", |m| m.as_str());
    let ext = caps.get(3).map_or("", |m| m.as_str());
    Some(format!("{prefix}{SEQUENCE_MARKER}{ext}"))
}

/// Percent for a scan progress pair, clamped to [0,100].
pub fn scan_percent(processed: usize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    ((processed as f64 / total as f64) * 100.0)
        .floor()
        .clamp(0.0, 100.0) as usize
}

/// Visited-set key: canonical where possible so symlink loops are caught
/// even when the queue holds distinct path spellings.
fn visit_key(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Count directories reachable from `root`, mirroring the walk in
/// [`scan_selection`], to size its progress denominator.
fn count_dirs(root: &Path) -> usize {
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut queue: VecDeque<PathBuf> = VecDeque::new();
    queue.push_back(root.to_path_buf());
    let mut total = 0usize;

    while let Some(current) = queue.pop_front() {
        if !visited.insert(visit_key(&current)) {
            continue;
        }
        let Ok(entries) = fs::read_dir(&current) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                queue.push_back(path);
            }
        }
        total += 1;
    }
    total
}

/// Walk `root` breadth-first and emit one logical entry per group: the bare
/// `####` key for a multi-file frame sequence, the absolute path otherwise.
/// Entries already in `present` are suppressed, as are repeats within the
/// walk. Unreadable directories are skipped. Symlinked directories are
/// followed; the canonicalized visited set breaks loops. The progress
/// callback receives `(processed_dirs, total_dirs)`.
pub fn scan_selection<F>(root: &Path, present: &HashSet<String>, mut on_progress: F) -> Vec<String>
where
    F: FnMut(usize, usize),
{
    let total_dirs = count_dirs(root);
    on_progress(0, total_dirs);

    // Groups are scoped to the directory that produced them.
    let mut groups: HashMap<(PathBuf, String), Vec<String>> = HashMap::new();
    let mut order: Vec<(PathBuf, String)> = Vec::new();
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut queue: VecDeque<PathBuf> = VecDeque::new();
    queue.push_back(root.to_path_buf());
    let mut processed = 0usize;

    while let Some(current) = queue.pop_front() {
        if !visited.insert(visit_key(&current)) {
            continue;
        }
        let Ok(entries) = fs::read_dir(&current) else {
            tracing::debug!(dir = %current.display(), "skipping unreadable directory");
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                queue.push_back(path);
            } else if path.is_file() {
                let name = entry.file_name().to_string_lossy().to_string();
                let key = sequence_key(&name).unwrap_or_else(|| name.clone());
                let group = (current.clone(), key);
                match groups.get_mut(&group) {
                    Some(members) => members.push(name),
                    None => {
                        groups.insert(group.clone(), vec![name]);
                        order.push(group);
                    }
                }
            }
        }
        processed += 1;
        on_progress(processed, total_dirs);
    }

    let mut seen: HashSet<String> = present.clone();
    let mut emitted = Vec::new();
    for group in order {
        let members = &groups[&group];
        let (dir, key) = group;
        let rep = if members.len() > 1 && key.contains(SEQUENCE_MARKER) {
            key
        } else {
            dir.join(&members[0]).to_string_lossy().to_string()
        };
        if seen.insert(rep.clone()) {
            emitted.push(rep);
        }
    }
    emitted
}

/// Count every entry reachable from `roots`, to size the bulk scanner's
/// progress denominator.
pub fn count_bulk_entries(roots: &[PathBuf]) -> usize {
    let mut queue: VecDeque<PathBuf> = roots.iter().cloned().collect();
    let mut count = 0usize;

    while let Some(current) = queue.pop_front() {
        let Ok(entries) = fs::read_dir(&current) else {
            continue;
        };
        for entry in entries.flatten() {
            count += 1;
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                queue.push_back(entry.path());
            }
        }
    }
    count
}

/// Bulk scan for the persisted records file: every directory is recorded
/// and enqueued, every plain file is recorded, and frame-numbered files
/// collapse to one record per sequence key using a synthetic path in the
/// containing directory. Symlinked directories are not followed. Records
/// come back sorted by path.
pub fn scan_folders_bulk<F>(roots: &[PathBuf], mut on_progress: F) -> Vec<ScanRecord>
where
    F: FnMut(&Path, usize),
{
    let mut records = Vec::new();
    let mut sequences: HashSet<(String, String)> = HashSet::new();
    let mut queue: VecDeque<PathBuf> = roots.iter().cloned().collect();
    let mut count = 0usize;

    while let Some(current) = queue.pop_front() {
        let Ok(entries) = fs::read_dir(&current) else {
            tracing::debug!(dir = %current.display(), "skipping unreadable directory");
            continue;
        };
        for entry in entries.flatten() {
            count += 1;
            let path = entry.path();
            on_progress(&path, count);

            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            let name = entry.file_name().to_string_lossy().to_string();
            if file_type.is_dir() {
                records.push(ScanRecord::new(&path.to_string_lossy(), &name));
                queue.push_back(path);
            } else if let Some(key) = bulk_sequence_key(&name) {
                let seq_path = current.join(&key).to_string_lossy().to_string();
                sequences.insert((seq_path, key));
            } else {
                records.push(ScanRecord::new(&path.to_string_lossy(), &name));
            }
        }
    }

    for (path, file) in sequences {
        records.push(ScanRecord { path, file });
    }
    records.sort_by(|a, b| a.path.cmp(&b.path));
    records
}

// ---------------------------------------------------------------------------
// Record persistence
// ---------------------------------------------------------------------------

pub const DEFAULT_RECORDS_FILENAME: &str = "ai_folder_structure.json";

pub fn load_records(path: &Path) -> Result<Vec<ScanRecord>, AppError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Write scan records as pretty JSON. Append mode folds the new records
/// into the existing file, skipping `(Path, File)` pairs already present;
/// an existing file that cannot be read falls back to the new records
/// alone. Returns the number of records written.
pub fn save_records(
    path: &Path,
    records: Vec<ScanRecord>,
    mode: SaveMode,
) -> Result<usize, AppError> {
    let merged = match mode {
        SaveMode::Overwrite => records,
        SaveMode::Append => match load_records(path) {
            Ok(mut existing) => {
                let seen: HashSet<(&str, &str)> = existing
                    .iter()
                    .map(|r| (r.path.as_str(), r.file.as_str()))
                    .collect();
                let fresh: Vec<ScanRecord> = records
                    .into_iter()
                    .filter(|r| !seen.contains(&(r.path.as_str(), r.file.as_str())))
                    .collect();
                existing.extend(fresh);
                existing
            }
            Err(err) => {
                tracing::warn!(file = %path.display(), %err, "could not read existing records, overwriting");
                records
            }
        },
    };
    let json = serde_json::to_string_pretty(&merged)?;
    fs::write(path, json)?;
    Ok(merged.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("wrangle_test_{name}"));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn touch(path: &Path) {
        File::create(path).unwrap();
    }

    #[test]
    fn sequence_key_detects_frame_patterns() {
        assert_eq!(sequence_key("shot_001.exr"), Some("shot_####.exr".into()));
        assert_eq!(
            sequence_key("frame.0010.dpx"),
            Some("frame.####.dpx".into())
        );
        assert_eq!(sequence_key("plate-1234.tif"), Some("plate-####.tif".into()));
        assert_eq!(sequence_key("shot001.tga"), Some("shot####.tga".into()));
        // Too few digits, or nothing before the run.
        assert_eq!(sequence_key("clip10.mov"), None);
        assert_eq!(sequence_key("001.exr"), None);
        assert_eq!(sequence_key("notes.txt"), None);
    }

    #[test]
    fn sequence_key_takes_trailing_digits_of_long_runs() {
        assert_eq!(
            sequence_key("render01234.exr"),
            Some("render0####.exr".into())
        );
    }

    #[test]
    fn scan_collapses_sequences_and_keeps_singles() {
        let base = temp_dir("scan_collapse");
        for frame in ["shot_001.exr", "shot_002.exr", "shot_003.exr"] {
            touch(&base.join(frame));
        }
        touch(&base.join("lone_004.exr"));
        touch(&base.join("notes.txt"));

        let entries = scan_selection(&base, &HashSet::new(), |_, _| {});

        assert_eq!(entries.len(), 3);
        assert!(entries.contains(&"shot_####.exr".to_string()));
        assert!(entries
            .iter()
            .any(|e| e.ends_with("lone_004.exr") && Path::new(e).is_absolute()));
        assert!(entries.iter().any(|e| e.ends_with("notes.txt")));

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn scan_walks_nested_directories_without_recursion_limits() {
        let base = temp_dir("scan_nested");
        let mut dir = base.clone();
        for depth in 0..40 {
            dir = dir.join(format!("d{depth}"));
        }
        fs::create_dir_all(&dir).unwrap();
        touch(&dir.join("deep_0001.exr"));
        touch(&dir.join("deep_0002.exr"));

        let mut last = (0usize, 0usize);
        let entries = scan_selection(&base, &HashSet::new(), |done, total| {
            assert!(done >= last.0);
            last = (done, total);
        });

        assert_eq!(entries, vec!["deep_####.exr".to_string()]);
        assert_eq!(last.0, last.1);
        assert_eq!(last.1, 41);

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    #[cfg(unix)]
    fn scan_follows_symlinked_directories_and_skips_cycles() {
        use std::os::unix::fs::symlink;

        let base = temp_dir("scan_symlink");
        let real = base.join("real");
        let target = base.join("target");
        fs::create_dir_all(&real).unwrap();
        fs::create_dir_all(&target).unwrap();
        touch(&real.join("plain.txt"));
        touch(&target.join("inside.txt"));
        symlink(&target, real.join("linked")).unwrap();
        symlink(&real, real.join("cycle")).unwrap();

        let mut last = (0usize, 0usize);
        let entries = scan_selection(&real, &HashSet::new(), |done, total| last = (done, total));

        assert_eq!(entries.len(), 2);
        assert!(entries.iter().any(|e| e.ends_with("real/plain.txt")));
        assert!(entries.iter().any(|e| e.ends_with("linked/inside.txt")));
        // Two directories visited: the root and the linked target. The cycle
        // canonicalizes to the root and is skipped.
        assert_eq!(last, (2, 2));

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn scan_suppresses_entries_already_present() {
        let base = temp_dir("scan_dedupe");
        touch(&base.join("shot_001.exr"));
        touch(&base.join("shot_002.exr"));
        touch(&base.join("extra.mov"));

        let mut present = HashSet::new();
        present.insert("shot_####.exr".to_string());

        let entries = scan_selection(&base, &present, |_, _| {});
        assert_eq!(entries.len(), 1);
        assert!(entries[0].ends_with("extra.mov"));

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn scan_percent_is_clamped() {
        assert_eq!(scan_percent(0, 10), 0);
        assert_eq!(scan_percent(5, 10), 50);
        assert_eq!(scan_percent(10, 10), 100);
        assert_eq!(scan_percent(12, 10), 100);
        assert_eq!(scan_percent(3, 0), 0);
    }

    #[test]
    fn bulk_scan_records_dirs_files_and_sequences() {
        let base = temp_dir("bulk_scan");
        let plates = base.join("plates");
        fs::create_dir_all(&plates).unwrap();
        touch(&plates.join("beauty_1.exr"));
        touch(&plates.join("beauty_2.exr"));
        touch(&base.join("readme.md"));

        let mut seen = 0usize;
        let records = scan_folders_bulk(&[base.clone()], |_, count| seen = count);

        // One dir record, one collapsed sequence record, one plain file.
        assert_eq!(records.len(), 3);
        assert_eq!(seen, 4);
        assert_eq!(count_bulk_entries(&[base.clone()]), seen);
        assert!(records
            .iter()
            .any(|r| r.file == "plates" && r.path.ends_with("plates")));
        assert!(records
            .iter()
            .any(|r| r.file == "beauty_####.exr" && r.path.ends_with("beauty_####.exr")));
        assert!(records.iter().any(|r| r.file == "readme.md"));

        let sorted: Vec<_> = records.iter().map(|r| r.path.clone()).collect();
        let mut expected = sorted.clone();
        expected.sort();
        assert_eq!(sorted, expected);

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn append_mode_skips_records_already_saved() {
        let base = temp_dir("records_append");
        let out = base.join(DEFAULT_RECORDS_FILENAME);

        let first = vec![
            ScanRecord::new("/a/plates", "plates"),
            ScanRecord::new("/a/readme.md", "readme.md"),
        ];
        let count = save_records(&out, first, SaveMode::Overwrite).unwrap();
        assert_eq!(count, 2);

        let second = vec![
            ScanRecord::new("/a/readme.md", "readme.md"),
            ScanRecord::new("/a/new.mov", "new.mov"),
        ];
        let count = save_records(&out, second, SaveMode::Append).unwrap();
        assert_eq!(count, 3);

        let loaded = load_records(&out).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[2].file, "new.mov");

        // Field names persist in their serialized spelling.
        let text = fs::read_to_string(&out).unwrap();
        assert!(text.contains("\"Path\""));
        assert!(text.contains("\"File\""));

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn append_over_unreadable_file_keeps_only_new_records() {
        let base = temp_dir("records_corrupt");
        let out = base.join(DEFAULT_RECORDS_FILENAME);
        fs::write(&out, "not json at all").unwrap();

        let records = vec![ScanRecord::new("/a/x.mov", "x.mov")];
        let count = save_records(&out, records, SaveMode::Append).unwrap();
        assert_eq!(count, 1);
        assert_eq!(load_records(&out).unwrap().len(), 1);

        let _ = fs::remove_dir_all(&base);
    }
}
