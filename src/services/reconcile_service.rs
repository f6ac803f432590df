use std::collections::HashMap;

use crate::models::result::ResultRow;

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Append a classification batch to the table. Classification rounds only
/// ever add rows; nothing existing is rewritten.
pub fn merge_classification(rows: &mut Vec<ResultRow>, batch: Vec<ResultRow>) {
    rows.extend(batch);
}

/// Apply a refinement mapping to the table. Only rows whose source basename
/// matches a mapping key (by basename) are touched; the first mapping entry
/// wins when several share a basename. Destinations are relative: they are
/// re-rooted under `project_root`, get the filename appended as the final
/// segment when the model dropped it, and come out with `/` separators.
/// Selection flags are never altered. Returns the number of rows rewritten.
pub fn merge_refinement(
    rows: &mut [ResultRow],
    mapping: &[(String, String)],
    project_root: &str,
) -> usize {
    let mut by_basename: HashMap<&str, &str> = HashMap::new();
    for (key, value) in mapping {
        by_basename.entry(basename(key)).or_insert(value.as_str());
    }

    let root = project_root.trim_end_matches('/');
    let mut updated = 0;
    for row in rows.iter_mut() {
        let src_base = basename(&row.source);
        let Some(raw) = by_basename.get(src_base) else {
            continue;
        };
        let normalized = raw.trim_start_matches(['/', '\\']).replace('\\', "/");
        let rel = if normalized.is_empty() {
            src_base.to_string()
        } else if normalized == src_base || normalized.ends_with(&format!("/{src_base}")) {
            normalized
        } else {
            format!("{}/{src_base}", normalized.trim_end_matches('/'))
        };
        row.destination = format!("{root}/{rel}");
        updated += 1;
    }
    updated
}

// ---------------------------------------------------------------------------
// Selection. The merges above never touch these flags; all selection writes
// go through here.
// ---------------------------------------------------------------------------

pub fn select_all(rows: &mut [ResultRow]) {
    for row in rows.iter_mut() {
        row.selected = true;
    }
}

pub fn select_none(rows: &mut [ResultRow]) {
    for row in rows.iter_mut() {
        row.selected = false;
    }
}

/// Flip one row's selection flag. Out-of-range indexes are ignored.
pub fn toggle_selection(rows: &mut [ResultRow], index: usize) {
    if let Some(row) = rows.get_mut(index) {
        row.selected = !row.selected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(source: &str, destination: &str, selected: bool) -> ResultRow {
        ResultRow {
            source: source.to_string(),
            destination: destination.to_string(),
            selected,
        }
    }

    #[test]
    fn classification_merge_appends_in_order() {
        let mut rows = vec![row("/src/a.exr", "/proj/x/a.exr", true)];
        merge_classification(
            &mut rows,
            vec![
                row("/src/b.exr", "/proj/y/b.exr", false),
                row("/src/c.mov", "/proj/z/c.mov", false),
            ],
        );
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].source, "/src/a.exr");
        assert_eq!(rows[2].source, "/src/c.mov");
        assert!(rows[0].selected);
    }

    #[test]
    fn refinement_rewrites_matching_rows_and_appends_filename() {
        let mut rows = vec![
            row("/src/shots/a.exr", "/proj/old/a.exr", true),
            row("/src/b.mov", "/proj/edit/b.mov", false),
        ];
        let mapping = vec![("renders/a.exr".to_string(), "vfx/renders".to_string())];

        let updated = merge_refinement(&mut rows, &mapping, "/proj");

        assert_eq!(updated, 1);
        assert_eq!(rows[0].destination, "/proj/vfx/renders/a.exr");
        assert!(rows[0].selected);
        // Untouched row stays byte-identical.
        assert_eq!(rows[1], row("/src/b.mov", "/proj/edit/b.mov", false));
    }

    #[test]
    fn refinement_keeps_destination_ending_in_filename() {
        let mut rows = vec![row("/src/a.exr", "/proj/old/a.exr", false)];
        let mapping = vec![("a.exr".to_string(), "vfx/plates/a.exr".to_string())];

        merge_refinement(&mut rows, &mapping, "/proj");
        assert_eq!(rows[0].destination, "/proj/vfx/plates/a.exr");
    }

    #[test]
    fn refinement_first_mapping_entry_wins_per_basename() {
        let mut rows = vec![row("/src/a.exr", "/proj/old/a.exr", false)];
        let mapping = vec![
            ("deep/a.exr".to_string(), "first".to_string()),
            ("a.exr".to_string(), "second".to_string()),
        ];

        merge_refinement(&mut rows, &mapping, "/proj");
        assert_eq!(rows[0].destination, "/proj/first/a.exr");
    }

    #[test]
    fn refinement_normalizes_separators_and_leading_slashes() {
        let mut rows = vec![row("C:/src/a.exr", "/proj/old/a.exr", false)];
        let mapping = vec![("a.exr".to_string(), "\\vfx\\plates\\".to_string())];

        merge_refinement(&mut rows, &mapping, "/proj/");
        assert_eq!(rows[0].destination, "/proj/vfx/plates/a.exr");
    }

    #[test]
    fn refinement_with_empty_destination_reroots_under_project() {
        let mut rows = vec![row("/src/a.exr", "/proj/old/a.exr", false)];
        let mapping = vec![("a.exr".to_string(), "".to_string())];

        merge_refinement(&mut rows, &mapping, "/proj");
        assert_eq!(rows[0].destination, "/proj/a.exr");
    }

    #[test]
    fn refinement_does_not_treat_suffix_as_final_segment() {
        let mut rows = vec![row("/src/shot.exr", "/proj/old/shot.exr", false)];
        let mapping = vec![("shot.exr".to_string(), "vfx/my_shot.exr".to_string())];

        merge_refinement(&mut rows, &mapping, "/proj");
        assert_eq!(rows[0].destination, "/proj/vfx/my_shot.exr/shot.exr");
    }

    #[test]
    fn selection_controls_flip_flags_and_tolerate_bad_indexes() {
        let mut rows = vec![
            row("/src/a.exr", "/proj/a.exr", false),
            row("/src/b.mov", "/proj/b.mov", true),
        ];

        select_all(&mut rows);
        assert!(rows.iter().all(|r| r.selected));

        toggle_selection(&mut rows, 1);
        assert!(rows[0].selected);
        assert!(!rows[1].selected);

        toggle_selection(&mut rows, 99);
        assert!(rows[0].selected);

        select_none(&mut rows);
        assert!(rows.iter().all(|r| !r.selected));
    }
}
