use std::fs;
use std::path::Path;

use crate::error::AppError;
use crate::models::result::ResultRow;
use crate::settings::TemplateChoice;

/// Classification template tuned for VFX project trees.
const CLASSIFY_VFX: &str = r#"You are organizing files for a VFX project.

Project root: {project_root}

Current folder structure of the project (directories only):
{project_structure}

Sort each of the following files into the most appropriate folder. Frame
sequences are listed once with #### in place of the frame number and must be
treated as a single unit. Prefer existing folders from the structure above;
propose a new folder path only when nothing fits. Typical destinations are
plates, renders, comp, assets, reference, audio and editorial.

Files:
{file_list}

Respond with ONLY a JSON object mapping each filename to a folder path
relative to the project root, like:
{"shot_010_####.exr": "vfx/plates/shot_010", "cut_v2.mov": "editorial/cuts"}
No other text."#;

/// Classification template tuned for commercial deliverable trees.
const CLASSIFY_COMMERCIAL: &str = r#"You are organizing files for a commercial production.

Project root: {project_root}

Current folder structure of the project (directories only):
{project_structure}

Assign every file below to a folder. Frame sequences appear once with ####
in place of the frame number and move as a single unit. Prefer existing
folders from the structure above. Typical destinations are footage, audio,
gfx, deliverables, docs and workfiles.

Files:
{file_list}

Respond with ONLY a JSON object mapping each filename to a folder path
relative to the project root, like:
{"spot_30s_master.mov": "deliverables/masters", "vo_take3.wav": "audio/vo"}
No other text."#;

/// Refinement template: corrects destinations for an already classified set.
const REFINE: &str = r#"You previously classified files for this project.

Current folder structure of the project (directories only):
{project_structure}

These files were selected for correction, shown as
"source -> current destination relative to the project root":
{selected_files}

Operator feedback:
{user_feedback}

Apply the feedback. Respond with ONLY a JSON object mapping each affected
filename to its corrected folder path relative to the project root. Include
only files that should move. No other text."#;

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Strip Markdown heading lines: a line whose trimmed form starts with `#`
/// is dropped, unless it is exactly `#`.
pub fn strip_markdown_headings(text: &str) -> String {
    text.lines()
        .filter(|line| {
            let t = line.trim();
            !t.starts_with('#') || t == "#"
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Load a template from a Markdown file, dropping heading lines.
pub fn load_template(path: &Path) -> Result<String, AppError> {
    let text = fs::read_to_string(path)?;
    let stripped = strip_markdown_headings(&text);
    if stripped.trim().is_empty() {
        return Err(AppError::Template(format!(
            "template {} is empty after removing headings",
            path.display()
        )));
    }
    Ok(stripped)
}

/// The three prompt templates a run needs. Built-ins ship in the binary;
/// any of them can be overridden by a Markdown file on disk.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    pub vfx: String,
    pub commercial: String,
    pub refine: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            vfx: CLASSIFY_VFX.to_string(),
            commercial: CLASSIFY_COMMERCIAL.to_string(),
            refine: REFINE.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Load overrides from `dir`, keeping the built-in for any file that is
    /// not present. Expected names: `classify_vfx.md`, `classify_commercial.md`,
    /// `refine.md`.
    pub fn from_dir(dir: &Path) -> Result<Self, AppError> {
        let mut templates = Self::default();
        for (name, slot) in [
            ("classify_vfx.md", &mut templates.vfx),
            ("classify_commercial.md", &mut templates.commercial),
            ("refine.md", &mut templates.refine),
        ] {
            let path = dir.join(name);
            if path.is_file() {
                *slot = load_template(&path)?;
            }
        }
        Ok(templates)
    }

    pub fn classification(&self, choice: TemplateChoice) -> &str {
        match choice {
            TemplateChoice::Vfx => &self.vfx,
            TemplateChoice::Commercial => &self.commercial,
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Substitute the classification placeholders. Substitution is literal, so
/// braces elsewhere in the template survive untouched.
pub fn render_classification(
    template: &str,
    file_list: &str,
    project_root: &str,
    project_structure: &str,
) -> String {
    template
        .replace("{file_list}", file_list)
        .replace("{project_root}", project_root)
        .replace("{project_structure}", project_structure)
}

/// Substitute the refinement placeholders.
pub fn render_refinement(
    template: &str,
    selected_files: &str,
    user_feedback: &str,
    project_structure: &str,
) -> String {
    template
        .replace("{selected_files}", selected_files)
        .replace("{user_feedback}", user_feedback)
        .replace("{project_structure}", project_structure)
}

/// Render the selected rows for the refinement prompt, one per line as
/// `<source> -> <destination relative to project_root>`. Destinations
/// outside the root are shown as-is.
pub fn format_selected_rows(rows: &[ResultRow], project_root: &str) -> String {
    let root = project_root.trim_end_matches('/');
    rows.iter()
        .filter(|row| row.selected)
        .map(|row| {
            // Relative only on a path-segment boundary, so a sibling like
            // `<root>2/...` is not half-stripped.
            let rel = match row.destination.strip_prefix(root) {
                Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/'),
                _ => &row.destination,
            };
            format!("{} -> {}", row.source, rel)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
