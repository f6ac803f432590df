use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::AppError;

/// Placeholder used in prompts when the project root cannot be listed.
pub const INACCESSIBLE_ROOT: &str = "(Project folder does not exist or is not accessible)";

/// Render the directory tree under `root` for prompt context: directories
/// only, alphabetical, one name per line with a trailing `/` and two spaces
/// of indent per level. Unreadable subtrees are silently elided. Symlinked
/// directories are descended; the depth cap bounds the walk even through a
/// symlink loop.
pub fn render_folder_tree(root: &Path, max_depth: usize) -> String {
    let mut lines = Vec::new();
    render_level(root, 1, max_depth, &mut lines);
    lines.join("\n")
}

fn render_level(dir: &Path, depth: usize, max_depth: usize, lines: &mut Vec<String>) {
    if depth > max_depth {
        return;
    }
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    let mut subdirs: Vec<(String, PathBuf)> = entries
        .flatten()
        .map(|e| (e.file_name().to_string_lossy().to_string(), e.path()))
        .filter(|(_, path)| path.is_dir())
        .collect();
    subdirs.sort_by(|a, b| a.0.cmp(&b.0));
    for (name, path) in subdirs {
        lines.push(format!("{}{}/", "  ".repeat(depth - 1), name));
        render_level(&path, depth + 1, max_depth, lines);
    }
}

/// Tree render with the inaccessible-root placeholder substituted when the
/// root is missing or not a directory.
pub fn folder_tree_or_placeholder(root: &Path, max_depth: usize) -> String {
    if !root.is_dir() {
        return INACCESSIBLE_ROOT.to_string();
    }
    render_folder_tree(root, max_depth)
}

/// Full recursive structure of `root` as nested JSON: one object per
/// directory keyed by child directory name, with plain files collected
/// under a `__files__` array. Symlinked directories are not descended.
pub fn scan_folder_structure(root: &Path) -> Result<Value, AppError> {
    let mut map = serde_json::Map::new();
    let mut files: Vec<String> = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if entry.file_type()?.is_dir() {
            map.insert(name, scan_folder_structure(&entry.path())?);
        } else {
            files.push(name);
        }
    }
    if !files.is_empty() {
        files.sort();
        map.insert(
            "__files__".to_string(),
            Value::Array(files.into_iter().map(Value::String).collect()),
        );
    }
    Ok(Value::Object(map))
}
