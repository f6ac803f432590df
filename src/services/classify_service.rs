use std::path::Path;

use crate::models::result::ResultRow;
use crate::services::structure_service;
use crate::services::template_service;

/// Extensions accepted for classification, per template style. The union of
/// both lists is what validation checks. Both carry the 3D interchange and
/// CAD formats alongside the plate, NLE, audio and document ones.
const ALLOWED_EXTENSIONS_VFX: &[&str] = &[
    ".exr", ".dpx", ".tif", ".png", ".mov", ".mxf", ".avi", ".psd", ".ai", ".jpg", ".mp4",
    ".docx", ".pdf", ".xlsx", ".pptx", ".wav", ".mp3", ".aiff", ".nk", ".aep", ".prproj", ".drp",
    ".xml", ".edl", ".json", ".txt", ".aaf", ".fbx", ".obj", ".max", ".c4d", ".abc", ".blend",
    ".ma", ".mb", ".3ds", ".stl", ".ply", ".gltf", ".glb", ".usd", ".usda", ".usdc", ".usdz",
    ".xsi", ".lwo", ".lws", ".bgeo", ".vdb", ".prt", ".rib", ".ass", ".ifc", ".dae", ".igs",
    ".iges", ".step", ".stp", ".x3d", ".wrl", ".vrml", ".dxf", ".dwg", ".skp", ".sldprt",
    ".sldasm", ".objf", ".fbx7", ".3mf", ".amf",
];
const ALLOWED_EXTENSIONS_COMMERCIAL: &[&str] = &[
    ".exr", ".dpx", ".tif", ".png", ".mov", ".mxf", ".avi", ".psd", ".ai", ".jpg", ".mp4",
    ".docx", ".pdf", ".xlsx", ".pptx", ".wav", ".mp3", ".aiff", ".nk", ".aep", ".prproj", ".drp",
    ".xml", ".edl", ".json", ".txt", ".aaf", ".fbx", ".obj", ".max", ".c4d", ".abc", ".blend",
    ".ma", ".mb", ".3ds", ".stl", ".ply", ".gltf", ".glb", ".usd", ".usda", ".usdc", ".usdz",
    ".xsi", ".lwo", ".lws", ".bgeo", ".vdb", ".prt", ".rib", ".ass", ".ifc", ".dae", ".igs",
    ".iges", ".step", ".stp", ".x3d", ".wrl", ".vrml", ".dxf", ".dwg", ".skp", ".sldprt",
    ".sldasm", ".objf", ".fbx7", ".3mf", ".amf",
];

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Lowercased extension including the dot, or empty. A leading dot alone
/// (hidden files) does not count as an extension.
fn extension_of(name: &str) -> String {
    let base = basename(name);
    match base.rfind('.') {
        Some(idx) if idx > 0 => base[idx..].to_lowercase(),
        _ => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Files that survived extension validation, plus the rejects with the
/// extension that was detected for them.
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    pub valid: Vec<String>,
    pub skipped: Vec<(String, String)>,
}

/// Keep entries whose extension is in either allow-list. Sequence
/// placeholders carry a real extension and validate like plain files.
pub fn validate_files(files: &[String]) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();
    for file in files {
        let ext = extension_of(file);
        if ALLOWED_EXTENSIONS_VFX.contains(&ext.as_str())
            || ALLOWED_EXTENSIONS_COMMERCIAL.contains(&ext.as_str())
        {
            outcome.valid.push(file.clone());
        } else {
            outcome.skipped.push((file.clone(), ext));
        }
    }
    outcome
}

// ---------------------------------------------------------------------------
// Batching
// ---------------------------------------------------------------------------

pub fn batch_count(total: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        return 0;
    }
    total.div_ceil(batch_size)
}

/// Dispatch-time percent for a batch, floored and clamped to [0,100].
pub fn batch_percent(batch_index: usize, num_batches: usize) -> u8 {
    if num_batches == 0 {
        return 0;
    }
    ((batch_index as f64 / num_batches as f64) * 100.0)
        .floor()
        .clamp(0.0, 100.0) as u8
}

/// Render the classification prompt for one batch: basenames one per line,
/// the destination tree render (or its placeholder) and the project root
/// substituted into the template.
pub fn build_batch_prompt(
    template: &str,
    batch: &[String],
    project_root: &str,
    folder_depth: usize,
) -> String {
    let file_list = batch
        .iter()
        .map(|file| basename(file))
        .collect::<Vec<_>>()
        .join("\n");
    let structure =
        structure_service::folder_tree_or_placeholder(Path::new(project_root), folder_depth);
    template_service::render_classification(template, &file_list, project_root, &structure)
}

// ---------------------------------------------------------------------------
// Mapping to rows
// ---------------------------------------------------------------------------

/// Resolve a model-reported filename back to a full source path: the batch
/// first, then the whole valid list, then the bare name as given. The bare
/// fallback covers a model renaming or inventing a file.
pub fn resolve_source(name: &str, batch: &[String], all_files: &[String]) -> String {
    batch
        .iter()
        .find(|file| basename(file) == name)
        .or_else(|| all_files.iter().find(|file| basename(file) == name))
        .cloned()
        .unwrap_or_else(|| name.to_string())
}

/// Collapse `.` and `..` segments and squeeze separators, keeping the
/// result `/`-separated.
fn normalize_destination(path: &str) -> String {
    let slashed = path.replace('\\', "/");
    let rooted = slashed.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in slashed.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    if rooted {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Absolute destination for one classified file: the model's folder under
/// the project root, with the filename as the final segment.
pub fn build_destination(project_root: &str, folder: &str, name: &str) -> String {
    let folder = folder.trim_start_matches(['/', '\\']);
    normalize_destination(&format!(
        "{}/{}/{}",
        project_root.trim_end_matches('/'),
        folder,
        name
    ))
}

/// Turn an extracted mapping into unselected result rows for one batch.
pub fn rows_from_mapping(
    mapping: &[(String, String)],
    batch: &[String],
    all_files: &[String],
    project_root: &str,
) -> Vec<ResultRow> {
    mapping
        .iter()
        .map(|(name, folder)| {
            let source = resolve_source(name, batch, all_files);
            let destination = build_destination(project_root, folder, name);
            ResultRow::new(&source, &destination)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_accepts_union_and_reports_detected_extension() {
        let files = vec![
            "/a/shot_####.exr".to_string(),
            "/a/Notes.TXT".to_string(),
            "/a/rawscan.r3d".to_string(),
            "/a/.hidden".to_string(),
        ];
        let outcome = validate_files(&files);
        assert_eq!(
            outcome.valid,
            vec!["/a/shot_####.exr".to_string(), "/a/Notes.TXT".to_string()]
        );
        assert_eq!(
            outcome.skipped,
            vec![
                ("/a/rawscan.r3d".to_string(), ".r3d".to_string()),
                ("/a/.hidden".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn validation_accepts_3d_interchange_extensions() {
        let files = vec![
            "/proj/model.fbx".to_string(),
            "/proj/cache.abc".to_string(),
            "/proj/rig.ma".to_string(),
            "/proj/scene.blend".to_string(),
            "/proj/volume.vdb".to_string(),
            "/proj/asset.usd".to_string(),
        ];
        let outcome = validate_files(&files);
        assert_eq!(outcome.valid, files);
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn batch_count_is_ceiling_division() {
        assert_eq!(batch_count(0, 15), 0);
        assert_eq!(batch_count(1, 15), 1);
        assert_eq!(batch_count(15, 15), 1);
        assert_eq!(batch_count(16, 15), 2);
        assert_eq!(batch_count(45, 15), 3);
    }

    #[test]
    fn chunked_batches_partition_without_loss() {
        let files: Vec<String> = (0..37).map(|i| format!("f{i:03}.exr")).collect();
        let batches: Vec<&[String]> = files.chunks(15).collect();

        assert_eq!(batches.len(), batch_count(files.len(), 15));
        assert!(batches.iter().all(|b| !b.is_empty()));
        let rejoined: Vec<String> = batches.concat();
        assert_eq!(rejoined, files);
    }

    #[test]
    fn batch_percent_floors_and_finishes_at_caller_discretion() {
        assert_eq!(batch_percent(0, 3), 0);
        assert_eq!(batch_percent(1, 3), 33);
        assert_eq!(batch_percent(2, 3), 66);
        assert_eq!(batch_percent(0, 0), 0);
    }

    #[test]
    fn source_resolution_prefers_batch_then_full_list_then_bare() {
        let batch = vec!["/b/one.exr".to_string()];
        let all = vec!["/b/one.exr".to_string(), "/c/two.exr".to_string()];

        assert_eq!(resolve_source("one.exr", &batch, &all), "/b/one.exr");
        assert_eq!(resolve_source("two.exr", &batch, &all), "/c/two.exr");
        assert_eq!(resolve_source("ghost.exr", &batch, &all), "ghost.exr");
    }

    #[test]
    fn destination_joins_under_root_and_normalizes() {
        assert_eq!(
            build_destination("/proj/", "/vfx/plates", "a.exr"),
            "/proj/vfx/plates/a.exr"
        );
        assert_eq!(
            build_destination("/proj", "vfx\\comp", "b.exr"),
            "/proj/vfx/comp/b.exr"
        );
        assert_eq!(
            build_destination("/proj", "x/./y/../z", "c.exr"),
            "/proj/x/z/c.exr"
        );
        assert_eq!(build_destination("/", "docs", "d.pdf"), "/docs/d.pdf");
    }

    #[test]
    fn rows_carry_resolved_source_and_rooted_destination() {
        let batch = vec!["/src/plates/sh_####.exr".to_string()];
        let mapping = vec![("sh_####.exr".to_string(), "vfx/plates".to_string())];

        let rows = rows_from_mapping(&mapping, &batch, &batch, "/proj");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].source, "/src/plates/sh_####.exr");
        assert_eq!(rows[0].destination, "/proj/vfx/plates/sh_####.exr");
        assert!(!rows[0].selected);
    }

    #[test]
    fn prompt_carries_basenames_and_placeholder_structure() {
        let batch = vec!["/deep/tree/a.exr".to_string(), "/deep/b.mov".to_string()];
        let rendered = build_batch_prompt(
            "files:\n{file_list}\nroot: {project_root}\ntree:\n{project_structure}",
            &batch,
            "/definitely/not/a/real/root/path",
            3,
        );
        assert!(rendered.contains("files:\na.exr\nb.mov"));
        assert!(rendered.contains("root: /definitely/not/a/real/root/path"));
        assert!(rendered.contains(structure_service::INACCESSIBLE_ROOT));
    }
}
