use std::fs;
use std::path::Path;

use crate::services::scan_service::SEQUENCE_MARKER;

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Resolve a selection entry to concrete files at move/copy time.
///
/// A placeholder entry has its `####` marker treated as a wildcard and is
/// matched against the directory of each selection entry in turn; the first
/// directory with matches supplies them all, sorted by name. A plain entry
/// resolves through exact-basename lookup against the selection, then a
/// literal existence check. Returns an empty list when nothing resolves.
pub fn expand_entry(entry: &str, selection: &[String]) -> Vec<String> {
    let as_path = Path::new(entry);
    if as_path.is_absolute() && as_path.exists() {
        return vec![entry.to_string()];
    }

    if let Some(marker) = entry.find(SEQUENCE_MARKER) {
        let prefix = &entry[..marker];
        let suffix = &entry[marker + SEQUENCE_MARKER.len()..];
        for item in selection {
            let Some(dir) = Path::new(item).parent() else {
                continue;
            };
            if dir.as_os_str().is_empty() {
                continue;
            }
            let matches = match_frames(dir, prefix, suffix);
            if !matches.is_empty() {
                return matches;
            }
        }
    } else {
        for item in selection {
            if basename(item) == entry {
                return vec![item.clone()];
            }
        }
    }

    if as_path.exists() {
        let resolved = std::path::absolute(as_path).unwrap_or_else(|_| as_path.to_path_buf());
        return vec![resolved.to_string_lossy().to_string()];
    }
    Vec::new()
}

/// Files in `dir` matching `<prefix>*<suffix>`, sorted for a stable order.
fn match_frames(dir: &Path, prefix: &str, suffix: &str) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut matches: Vec<String> = entries
        .flatten()
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().to_string();
            (name.len() >= prefix.len() + suffix.len()
                && name.starts_with(prefix)
                && name.ends_with(suffix))
            .then(|| e.path().to_string_lossy().to_string())
        })
        .collect();
    matches.sort();
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::path::PathBuf;

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
    fn placeholder_expands_to_every_wildcard_match() {
        let base = temp_dir("expand_seq");
        for name in ["shot_001.exr", "shot_002.exr", "shot_final.exr"] {
            touch(&base.join(name));
        }
        // Selection holds the placeholder plus one concrete sibling whose
        // directory anchors the search.
        let selection = vec![
            "shot_####.exr".to_string(),
            base.join("shot_001.exr").to_string_lossy().to_string(),
        ];

        let expanded = expand_entry("shot_####.exr", &selection);
        let names: Vec<&str> = expanded.iter().map(|p| basename(p)).collect();
        assert_eq!(names, vec!["shot_001.exr", "shot_002.exr", "shot_final.exr"]);

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn absolute_existing_entry_resolves_to_itself() {
        let base = temp_dir("expand_abs");
        let file = base.join("clip.mov");
        touch(&file);

        let entry = file.to_string_lossy().to_string();
        assert_eq!(expand_entry(&entry, &[]), vec![entry.clone()]);

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn bare_name_resolves_through_selection_basenames() {
        let base = temp_dir("expand_lookup");
        let file = base.join("notes.txt");
        touch(&file);
        let selection = vec![file.to_string_lossy().to_string()];

        assert_eq!(
            expand_entry("notes.txt", &selection),
            vec![file.to_string_lossy().to_string()]
        );

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn unresolvable_entry_expands_to_nothing() {
        assert!(expand_entry("missing_####.exr", &[]).is_empty());
        assert!(expand_entry("nowhere.mov", &[]).is_empty());
    }
}
